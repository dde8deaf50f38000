//! Sequence bridge
//!
//! Turns an [`Input`] into a lazy, single-pass iterator of bytes, fixed-size
//! chunks, NUL-terminated strings, newline-terminated lines or bit groups, and
//! writes such sequences into an [`Output`].
//!
//! Iterators hold no state beyond the stream's own cursor: consuming the
//! iterator consumes the stream. Each yields `Result` items, stops after end of
//! stream, and stops after the first error it reports.

use std::iter::FusedIterator;

use crate::codec::bits::{BitReader, BitWriter};
use crate::config::LineEnding;
use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;

impl<A: Clone + Send + 'static> Input<A> {
    /// Read up to the next `\n`, without the terminator. A `\r` right before
    /// the `\n` is dropped too. The last line may lack a terminator.
    ///
    /// # Errors
    /// `NoMoreInput` if the stream is already exhausted, `InputClosed`.
    pub fn read_line(&self) -> Result<Vec<u8>> {
        let mut line = self.read_until(b'\n')?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Read up to the next NUL byte, without it. The last string may lack
    /// a terminator.
    ///
    /// # Errors
    /// `NoMoreInput` if the stream is already exhausted, `InputClosed`.
    pub fn read_cstring(&self) -> Result<Vec<u8>> {
        self.read_until(0)
    }

    fn read_until(&self, terminator: u8) -> Result<Vec<u8>> {
        let _guard = self.guard();
        let mut out = Vec::new();
        loop {
            match self.read_byte() {
                Ok(byte) if byte == terminator => return Ok(out),
                Ok(byte) => out.push(byte),
                Err(StreamError::NoMoreInput) if !out.is_empty() => return Ok(out),
                Err(e) => return Err(e),
            }
        }
    }
}

impl<A: Clone + Send + 'static> Output<A> {
    /// Write `line` followed by the host line terminator
    ///
    /// # Errors
    /// `OutputClosed` or a provider failure.
    pub fn write_line(&self, line: &[u8]) -> Result<()> {
        self.write_line_with(line, LineEnding::Host)
    }

    /// Write `line` followed by `ending`
    ///
    /// # Errors
    /// `OutputClosed` or a provider failure.
    pub fn write_line_with(&self, line: &[u8], ending: LineEnding) -> Result<()> {
        let _guard = self.guard();
        self.write_all(line)?;
        self.write_all(ending.as_bytes())
    }

    /// Write `bytes` followed by a NUL byte
    ///
    /// # Errors
    /// `OutputClosed` or a provider failure.
    pub fn write_cstring(&self, bytes: &[u8]) -> Result<()> {
        let _guard = self.guard();
        self.write_all(bytes)?;
        self.write_byte(0)
    }
}

/// Iterator state shared by all readers: turns end of stream into `None` and
/// stops after the first error
struct Pull<A> {
    input: Input<A>,
    done: bool,
}

impl<A: Clone + Send + 'static> Pull<A> {
    fn new(input: &Input<A>) -> Self {
        Self {
            input: input.clone(),
            done: false,
        }
    }

    fn next_with<T>(&mut self, read: impl FnOnce(&Input<A>) -> Result<T>) -> Option<Result<T>> {
        if self.done {
            return None;
        }
        match read(&self.input) {
            Ok(item) => Some(Ok(item)),
            Err(StreamError::NoMoreInput) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub struct Bytes<A = ()>(Pull<A>);

impl<A: Clone + Send + 'static> Iterator for Bytes<A> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_with(Input::read_byte)
    }
}

impl<A: Clone + Send + 'static> FusedIterator for Bytes<A> {}

pub struct Chunks<A = ()> {
    pull: Pull<A>,
    size: usize,
}

impl<A: Clone + Send + 'static> Iterator for Chunks<A> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let size = self.size;
        self.pull.next_with(|input| input.nread(size))
    }
}

impl<A: Clone + Send + 'static> FusedIterator for Chunks<A> {}

pub struct CStrings<A = ()>(Pull<A>);

impl<A: Clone + Send + 'static> Iterator for CStrings<A> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_with(Input::read_cstring)
    }
}

impl<A: Clone + Send + 'static> FusedIterator for CStrings<A> {}

pub struct Lines<A = ()>(Pull<A>);

impl<A: Clone + Send + 'static> Iterator for Lines<A> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_with(Input::read_line)
    }
}

impl<A: Clone + Send + 'static> FusedIterator for Lines<A> {}

/// Groups of `nbits` bits, most-significant first. A trailing group that the
/// stream cannot complete is not returned.
pub struct Bits<A = ()> {
    reader: BitReader<A>,
    nbits: i32,
    done: bool,
}

impl<A: Clone + Send + 'static> Iterator for Bits<A> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_bits(self.nbits) {
            Ok(value) => Some(Ok(value)),
            Err(StreamError::NoMoreInput) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<A: Clone + Send + 'static> FusedIterator for Bits<A> {}

#[must_use]
pub fn bytes<A: Clone + Send + 'static>(input: &Input<A>) -> Bytes<A> {
    Bytes(Pull::new(input))
}

/// Chunks of `size` bytes; only the last may be shorter
///
/// # Errors
/// `InvalidArgument` for a zero `size`.
pub fn chunks<A: Clone + Send + 'static>(input: &Input<A>, size: usize) -> Result<Chunks<A>> {
    if size == 0 {
        return Err(StreamError::invalid("chunk size must be positive"));
    }
    Ok(Chunks {
        pull: Pull::new(input),
        size,
    })
}

#[must_use]
pub fn cstrings<A: Clone + Send + 'static>(input: &Input<A>) -> CStrings<A> {
    CStrings(Pull::new(input))
}

/// Lines terminated by LF or CRLF, terminators removed
#[must_use]
pub fn lines<A: Clone + Send + 'static>(input: &Input<A>) -> Lines<A> {
    Lines(Pull::new(input))
}

/// # Errors
/// `BitRange` for `nbits` outside `1..=31`.
pub fn bits<A: Clone + Send + 'static>(input: &Input<A>, nbits: i32) -> Result<Bits<A>> {
    // zero-width groups would never reach end of stream
    if !(1..=crate::codec::MAX_BITS).contains(&nbits) {
        return Err(StreamError::bit_range(nbits, 0));
    }
    Ok(Bits {
        reader: BitReader::new(input.clone()),
        nbits,
        done: false,
    })
}

/// # Errors
/// The first write failure.
pub fn write_bytes<A: Clone + Send + 'static>(
    output: &Output<A>,
    bytes: impl IntoIterator<Item = u8>,
) -> Result<()> {
    let _guard = output.guard();
    for byte in bytes {
        output.write_byte(byte)?;
    }
    Ok(())
}

/// # Errors
/// The first write failure.
pub fn write_chunks<A, I>(output: &Output<A>, chunks: I) -> Result<()>
where
    A: Clone + Send + 'static,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let _guard = output.guard();
    for chunk in chunks {
        output.write_all(chunk.as_ref())?;
    }
    Ok(())
}

/// # Errors
/// The first write failure.
pub fn write_cstrings<A, I>(output: &Output<A>, strings: I) -> Result<()>
where
    A: Clone + Send + 'static,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let _guard = output.guard();
    for s in strings {
        output.write_cstring(s.as_ref())?;
    }
    Ok(())
}

/// Write each line followed by the host terminator
///
/// # Errors
/// The first write failure.
pub fn write_lines<A, I>(output: &Output<A>, lines: I) -> Result<()>
where
    A: Clone + Send + 'static,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    write_lines_with(output, lines, LineEnding::Host)
}

/// # Errors
/// The first write failure.
pub fn write_lines_with<A, I>(output: &Output<A>, lines: I, ending: LineEnding) -> Result<()>
where
    A: Clone + Send + 'static,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let _guard = output.guard();
    for line in lines {
        output.write_line_with(line.as_ref(), ending)?;
    }
    Ok(())
}

/// Pack `values` into `nbits`-bit groups and pad the last byte with zeros
///
/// # Errors
/// `BitRange` for a bad `nbits` or a value that does not fit; any write failure.
pub fn write_all_bits<A: Clone + Send + 'static>(
    output: &Output<A>,
    values: impl IntoIterator<Item = i64>,
    nbits: i32,
) -> Result<()> {
    let _guard = output.guard();
    let mut writer = BitWriter::new(output.clone());
    for value in values {
        writer.write_bits(value, nbits)?;
    }
    writer.flush_bits()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{input_bytes, input_string, output_buffer};

    #[test]
    fn test_lines_accept_lf_and_crlf() {
        let input = input_string("one\r\ntwo\nthree");
        let got: Vec<Vec<u8>> = lines(&input).collect::<Result<_>>().unwrap();
        assert_eq!(got, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let input = input_string("\n\na\n");
        let got: Vec<Vec<u8>> = lines(&input).collect::<Result<_>>().unwrap();
        assert_eq!(got, vec![Vec::new(), Vec::new(), b"a".to_vec()]);
    }

    #[test]
    fn test_cstrings() {
        let input = input_bytes(b"ab\0\0cd\0tail".to_vec());
        let got: Vec<Vec<u8>> = cstrings(&input).collect::<Result<_>>().unwrap();
        assert_eq!(got, vec![b"ab".to_vec(), Vec::new(), b"cd".to_vec(), b"tail".to_vec()]);
    }

    #[test]
    fn test_chunks_last_is_short() {
        let input = input_bytes((0u8..10).collect());
        let sizes: Vec<usize> = chunks(&input, 4).unwrap().map(|c| c.unwrap().len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert!(chunks(&input, 0).is_err());
    }

    #[test]
    fn test_iterator_consumes_the_stream() {
        let input = input_string("xyz");
        assert_eq!(bytes(&input).take(2).count(), 2);
        assert_eq!(input.read_byte().unwrap(), b'z');
    }

    #[test]
    fn test_error_is_reported_once() {
        let input = input_string("abc");
        input.close().unwrap();
        let mut it = bytes(&input);
        assert!(matches!(it.next(), Some(Err(StreamError::InputClosed))));
        assert!(it.next().is_none());
    }

    #[test]
    fn test_write_lines_with_crlf() {
        let out = output_buffer();
        write_lines_with(&out, ["a", "b"], LineEnding::Crlf).unwrap();
        write_cstrings(&out, [b"c".as_slice()]).unwrap();
        assert_eq!(out.close().unwrap(), b"a\r\nb\r\nc\0");
    }

    #[test]
    fn test_bits_round_trip() {
        let out = output_buffer();
        write_all_bits(&out, [1, 2, 3, 4, 5], 3).unwrap();
        let input = input_bytes(out.close().unwrap());
        let got: Vec<u32> = bits(&input, 3).unwrap().collect::<Result<_>>().unwrap();
        // the padding bit is too short for a group and is not returned
        assert_eq!(got, vec![1, 2, 3, 4, 5]);
        assert!(bits(&input, 0).is_err());
    }
}
