//! Position counters
//!
//! A counting wrapper forwards every byte and counts it. The count is readable
//! at any time through the returned [`Position`] and is also the wrapper's
//! accumulator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::capability::{Closable, Readable, Writable};
use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;
use crate::stream::Ownership;

/// Live view of a counter
#[derive(Debug, Clone, Default)]
pub struct Position(Arc<AtomicU64>);

impl Position {
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    fn advance(&self, n: usize) {
        self.0.fetch_add(n as u64, Ordering::AcqRel);
    }
}

struct CountingSource<A> {
    base: Input<A>,
    position: Position,
}

impl<A: Clone + Send + 'static> Readable for CountingSource<A> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.base.read_available(buf)?;
        self.position.advance(n);
        Ok(n)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        match self.base.read_byte() {
            Ok(byte) => {
                self.position.advance(1);
                Ok(Some(byte))
            }
            Err(StreamError::NoMoreInput) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<A> Closable for CountingSource<A> {
    type Acc = u64;

    fn close(&mut self) -> Result<u64> {
        Ok(self.position.get())
    }
}

struct CountingSink<A> {
    base: Output<A>,
    position: Position,
}

impl<A: Clone + Send + 'static> Writable for CountingSink<A> {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.base.write_bulk(buf, 0, buf.len())?;
        self.position.advance(n);
        Ok(n)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.base.write_byte(byte)?;
        self.position.advance(1);
        Ok(())
    }
}

impl<A> Closable for CountingSink<A> {
    type Acc = u64;

    fn close(&mut self) -> Result<u64> {
        Ok(self.position.get())
    }
}

/// Count the bytes read through the returned input
#[must_use]
pub fn counting_input<A: Clone + Send + 'static>(
    input: &Input<A>,
    ownership: Ownership,
) -> (Input<u64>, Position) {
    let position = Position::default();
    let source = CountingSource {
        base: input.clone(),
        position: position.clone(),
    };
    (Input::wrap_one(source, input, ownership), position)
}

/// Count the bytes written through the returned output
#[must_use]
pub fn counting_output<A: Clone + Send + 'static>(
    output: &Output<A>,
    ownership: Ownership,
) -> (Output<u64>, Position) {
    let position = Position::default();
    let sink = CountingSink {
        base: output.clone(),
        position: position.clone(),
    };
    (Output::wrap_one(sink, output, ownership), position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{input_bytes, output_buffer};

    #[test]
    fn test_counting_input() {
        let base = input_bytes(b"0123456789".to_vec());
        let (counted, position) = counting_input(&base, Ownership::Borrowed);
        counted.read_byte().unwrap();
        counted.nread(4).unwrap();
        assert_eq!(position.get(), 5);
        counted.read_all().unwrap();
        assert_eq!(counted.close().unwrap(), 10);
        assert!(!base.is_closed());
    }

    #[test]
    fn test_counting_output() {
        let base = output_buffer();
        let (counted, position) = counting_output(&base, Ownership::Owned);
        counted.write_all(b"hello").unwrap();
        counted.write_byte(b'!').unwrap();
        assert_eq!(position.get(), 6);
        assert_eq!(counted.close().unwrap(), 6);
        assert!(base.is_closed());
        assert_eq!(base.close().unwrap(), b"hello!");
    }
}
