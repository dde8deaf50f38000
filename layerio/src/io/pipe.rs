//! Blocking in-memory pipe
//!
//! [`pipe`] returns a connected `(Input, Output)` pair. Bytes written to the
//! output are read from the input in order. A read on an empty pipe blocks
//! until the writer writes or closes; once the writer is closed and the
//! buffered bytes are drained, the input reports end of stream.
//!
//! Writing after the reader closed fails with a broken-pipe error.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::capability::{Closable, Readable, Writable};
use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;

#[derive(Default)]
struct PipeState {
    data: VecDeque<u8>,
    written: u64,
    writer_closed: bool,
    reader_closed: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<PipeState>,
    ready: Condvar,
}

/// Reader side of the pipe
pub struct PipeReader {
    shared: Arc<Shared>,
}

impl Readable for PipeReader {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock();
        while state.data.is_empty() && !state.writer_closed {
            self.shared.ready.wait(&mut state);
        }
        let n = state.data.len().min(buf.len());
        for (dst, src) in buf.iter_mut().zip(state.data.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Closable for PipeReader {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.reader_closed = true;
        state.data.clear();
        drop(state);
        self.shared.ready.notify_all();
        Ok(())
    }
}

impl fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        write!(
            f,
            "PipeReader(buffered={}, writer_closed={})",
            state.data.len(),
            state.writer_closed
        )
    }
}

/// Writer side of the pipe. The accumulator is the total count of bytes written.
pub struct PipeWriter {
    shared: Arc<Shared>,
}

impl Writable for PipeWriter {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock();
        if state.reader_closed {
            return Err(StreamError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "pipe reader is closed",
            )));
        }
        state.data.extend(buf);
        state.written += buf.len() as u64;
        drop(state);
        // Notify outside lock
        self.shared.ready.notify_all();
        Ok(buf.len())
    }
}

impl Closable for PipeWriter {
    type Acc = u64;

    fn close(&mut self) -> Result<u64> {
        let mut state = self.shared.state.lock();
        state.writer_closed = true;
        let written = state.written;
        drop(state);
        self.shared.ready.notify_all();
        Ok(written)
    }
}

impl fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        write!(
            f,
            "PipeWriter(written={}, reader_closed={})",
            state.written, state.reader_closed
        )
    }
}

/// Create a connected pipe
#[must_use]
pub fn pipe() -> (Input, Output<u64>) {
    let shared = Arc::new(Shared::default());
    let reader = PipeReader {
        shared: Arc::clone(&shared),
    };
    let writer = PipeWriter { shared };
    (Input::new(reader), Output::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drained_after_writer_close() {
        let (input, output) = pipe();
        output.write_all(b"abc").unwrap();
        assert_eq!(output.close().unwrap(), 3);
        assert_eq!(input.read_all().unwrap(), b"abc");
        assert!(input.read_byte().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_write_after_reader_close_fails() {
        let (input, output) = pipe();
        input.close().unwrap();
        let err = output.write_all(b"x").unwrap_err();
        assert!(matches!(err, StreamError::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_reader_waits_for_writer_thread() {
        let (input, output) = pipe();
        std::thread::scope(|s| {
            s.spawn(move || {
                for chunk in [b"one ".as_slice(), b"two ".as_slice(), b"three"] {
                    output.write_all(chunk).unwrap();
                }
                output.close().unwrap();
            });
            assert_eq!(input.read_all().unwrap(), b"one two three");
        });
    }
}
