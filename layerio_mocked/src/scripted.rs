//! Providers whose behavior is scripted by the bytes they carry

use layerio::{Closable, Input, Output, Readable, Result, StreamError, Writable};

use crate::{IO_INTERRUPT, WANT_ERROR};

fn scripted_error(what: &str) -> StreamError {
    StreamError::Io(std::io::Error::other(format!("scripted {what} failure")))
}

/// Reads `data`, stopping each read after `IO_INTERRUPT` and failing on
/// `WANT_ERROR`
#[derive(Debug, Default)]
pub struct ScriptedSource {
    data: Vec<u8>,
    pos: usize,
    fail_close: bool,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

impl Readable for ScriptedSource {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut n = 0;
        while n < buf.len() && self.pos < self.data.len() {
            let byte = self.data[self.pos];
            if byte == WANT_ERROR {
                // bytes before the error byte are delivered first
                if n == 0 {
                    return Err(scripted_error("read"));
                }
                break;
            }
            buf[n] = byte;
            n += 1;
            self.pos += 1;
            if byte == IO_INTERRUPT {
                break;
            }
        }
        Ok(n)
    }
}

impl Closable for ScriptedSource {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        if self.fail_close {
            return Err(scripted_error("close"));
        }
        Ok(())
    }
}

/// Collects bytes, accepting each write only up to and including
/// `IO_INTERRUPT` and failing on `WANT_ERROR`. The accumulator is the bytes
/// accepted.
#[derive(Debug, Default)]
pub struct ScriptedSink {
    written: Vec<u8>,
    fail_close: bool,
    fail_flush: bool,
}

impl ScriptedSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    #[must_use]
    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }
}

impl Writable for ScriptedSink {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        let mut n = 0;
        for &byte in buf {
            if byte == WANT_ERROR {
                if n == 0 {
                    return Err(scripted_error("write"));
                }
                break;
            }
            self.written.push(byte);
            n += 1;
            if byte == IO_INTERRUPT {
                break;
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        if self.fail_flush {
            return Err(scripted_error("flush"));
        }
        Ok(())
    }
}

impl Closable for ScriptedSink {
    type Acc = Vec<u8>;

    fn close(&mut self) -> Result<Vec<u8>> {
        if self.fail_close {
            return Err(scripted_error("close"));
        }
        Ok(std::mem::take(&mut self.written))
    }
}

#[must_use]
pub fn scripted_input(data: impl Into<Vec<u8>>) -> Input {
    Input::new(ScriptedSource::new(data))
}

#[must_use]
pub fn scripted_output() -> Output<Vec<u8>> {
    Output::new(ScriptedSink::new())
}
