//! Bridges to `embedded_io` and `std::io`
//!
//! Foreign readers and writers become providers through [`IoSource`],
//! [`IoSink`], [`StdSource`] and [`StdSink`]. In the other direction, [`Input`]
//! implements `embedded_io::Read` and `std::io::Read`, and [`Output`] implements
//! `embedded_io::Write` and `std::io::Write`, so streams can be handed to code
//! written against either trait family.

use std::io;

use embedded_io::Error as _;

use crate::capability::{Closable, Readable, Writable};
use crate::error::{error_kind_to_io_kind, error_kind_to_str, Result, StreamError};
use crate::input::Input;
use crate::output::Output;

fn from_embedded<E: embedded_io::Error>(e: &E) -> StreamError {
    let kind = e.kind();
    StreamError::Io(io::Error::new(error_kind_to_io_kind(kind), error_kind_to_str(kind)))
}

/// Provider over an `embedded_io::Read`
pub struct IoSource<R> {
    reader: Option<R>,
}

impl<R> IoSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

impl<R: embedded_io::Read> Readable for IoSource<R> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };
        loop {
            match reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == embedded_io::ErrorKind::Interrupted => {}
                Err(e) => return Err(from_embedded(&e)),
            }
        }
    }
}

impl<R> Closable for IoSource<R> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }
}

/// Provider over an `embedded_io::Write`
pub struct IoSink<W> {
    writer: Option<W>,
}

impl<W> IoSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }
}

impl<W: embedded_io::Write> Writable for IoSink<W> {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        let writer = self.writer.as_mut().ok_or(StreamError::OutputClosed)?;
        loop {
            match writer.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == embedded_io::ErrorKind::Interrupted => {}
                Err(e) => return Err(from_embedded(&e)),
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush().map_err(|e| from_embedded(&e)),
            None => Ok(()),
        }
    }
}

impl<W> Closable for IoSink<W> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        self.writer = None;
        Ok(())
    }
}

/// Provider over a `std::io::Read`
pub struct StdSource<R> {
    reader: Option<R>,
}

impl<R> StdSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

impl<R: io::Read> Readable for StdSource<R> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };
        loop {
            match reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R> Closable for StdSource<R> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }
}

/// Provider over a `std::io::Write`
pub struct StdSink<W> {
    writer: Option<W>,
}

impl<W> StdSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }
}

impl<W: io::Write> Writable for StdSink<W> {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        let writer = self.writer.as_mut().ok_or(StreamError::OutputClosed)?;
        loop {
            match writer.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => Ok(writer.flush()?),
            None => Ok(()),
        }
    }
}

impl<W> Closable for StdSink<W> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        self.writer = None;
        Ok(())
    }
}

pub fn input_from_embedded<R: embedded_io::Read + Send + 'static>(reader: R) -> Input {
    Input::new(IoSource::new(reader))
}

pub fn output_from_embedded<W: embedded_io::Write + Send + 'static>(writer: W) -> Output {
    Output::new(IoSink::new(writer))
}

pub fn input_from_std<R: io::Read + Send + 'static>(reader: R) -> Input {
    Input::new(StdSource::new(reader))
}

pub fn output_from_std<W: io::Write + Send + 'static>(writer: W) -> Output {
    Output::new(StdSink::new(writer))
}

impl<A> embedded_io::ErrorType for Input<A> {
    type Error = StreamError;
}

impl<A: Clone + Send + 'static> embedded_io::Read for Input<A> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_available(buf)
    }
}

impl<A> embedded_io::ErrorType for Output<A> {
    type Error = StreamError;
}

impl<A: Clone + Send + 'static> embedded_io::Write for Output<A> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.write_bulk(buf, 0, buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Output::flush(self)
    }
}

impl<A: Clone + Send + 'static> io::Read for Input<A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_available(buf).map_err(Into::into)
    }
}

impl<A: Clone + Send + 'static> io::Write for Output<A> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bulk(buf, 0, buf.len()).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Output::flush(self).map_err(Into::into)
    }
}
