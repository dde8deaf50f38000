//! Capability primitives
//!
//! Providers (files, sockets, in-memory buffers, transformation layers) implement
//! the minimal traits below. [`Input`](crate::Input) and [`Output`](crate::Output)
//! add the lifecycle on top: closed-state checks, idempotent close, flush
//! cascades and dependency bookkeeping.
//!
//! ```text
//!   Source = Readable + Closable        Sink = Writable + Closable
//!      │                                  │
//!      ▼                                  ▼
//!   Input<A>  ── wraps ──▶  Input<B>   Output<A> ── wraps ──▶ Output<B>
//! ```
//!
//! End of stream is an outcome, not an error: `read_into` returns `Ok(0)` and
//! `read_byte` returns `Ok(None)`.

use crate::error::{Result, StreamError};

/// Something bytes can be pulled from
pub trait Readable {
    /// Read at most `buf.len()` bytes. `Ok(0)` for a non-empty `buf` means
    /// the source is exhausted.
    ///
    /// # Errors
    /// Any provider failure.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read one byte, `Ok(None)` at end of stream.
    ///
    /// # Errors
    /// Any provider failure.
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read_into(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

/// Something bytes can be pushed into
pub trait Writable {
    /// Accept at most `buf.len()` bytes, returning how many were taken.
    ///
    /// # Errors
    /// Any provider failure.
    fn write_from(&mut self, buf: &[u8]) -> Result<usize>;

    /// Accept one byte.
    ///
    /// # Errors
    /// Any provider failure, or a sink that refuses to take the byte.
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        match self.write_from(&[byte])? {
            0 => Err(write_zero()),
            _ => Ok(()),
        }
    }

    /// Make buffered bytes observable downstream.
    ///
    /// # Errors
    /// Any provider failure.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The end of a provider's lifecycle. Called at most once by the stream layer.
pub trait Closable {
    /// Value handed back to whoever closes the stream
    type Acc;

    /// Release the provider's resources and produce the accumulator.
    ///
    /// # Errors
    /// Any provider failure. The stream is considered closed regardless.
    fn close(&mut self) -> Result<Self::Acc>;
}

/// A provider usable as the driver of an [`Input`](crate::Input)
pub trait Source: Readable + Closable + Send {}

impl<T: Readable + Closable + Send> Source for T {}

/// A provider usable as the driver of an [`Output`](crate::Output)
pub trait Sink: Writable + Closable + Send {}

impl<T: Writable + Closable + Send> Sink for T {}

pub(crate) fn write_zero() -> StreamError {
    StreamError::Io(std::io::Error::new(
        std::io::ErrorKind::WriteZero,
        "sink accepted no bytes",
    ))
}

type ReadFn = Box<dyn FnMut(&mut [u8]) -> Result<usize> + Send>;
type ReadByteFn = Box<dyn FnMut() -> Result<Option<u8>> + Send>;
type WriteFn = Box<dyn FnMut(&[u8]) -> Result<usize> + Send>;
type WriteByteFn = Box<dyn FnMut(u8) -> Result<()> + Send>;
type FlushFn = Box<dyn FnMut() -> Result<()> + Send>;
type CloseFn<A> = Box<dyn FnOnce() -> Result<A> + Send>;

/// A source assembled from closures
///
/// ```
/// use layerio::{FnSource, Input};
///
/// let mut left = 3u8;
/// let input = Input::new(FnSource::new(
///     move |buf: &mut [u8]| {
///         if left == 0 || buf.is_empty() {
///             return Ok(0);
///         }
///         buf[0] = b'x';
///         left -= 1;
///         Ok(1)
///     },
///     || Ok(()),
/// ));
/// assert_eq!(input.read_all().unwrap(), b"xxx");
/// ```
pub struct FnSource<A> {
    read: ReadFn,
    read_byte: Option<ReadByteFn>,
    close: Option<CloseFn<A>>,
}

impl<A> FnSource<A> {
    pub fn new(
        read: impl FnMut(&mut [u8]) -> Result<usize> + Send + 'static,
        close: impl FnOnce() -> Result<A> + Send + 'static,
    ) -> Self {
        Self {
            read: Box::new(read),
            read_byte: None,
            close: Some(Box::new(close)),
        }
    }

    /// Use a dedicated single-byte read instead of a one-byte bulk read
    #[must_use]
    pub fn with_read_byte(
        mut self,
        read_byte: impl FnMut() -> Result<Option<u8>> + Send + 'static,
    ) -> Self {
        self.read_byte = Some(Box::new(read_byte));
        self
    }
}

impl<A> Readable for FnSource<A> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        (self.read)(buf)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        match self.read_byte.as_mut() {
            Some(f) => f(),
            None => {
                let mut byte = [0u8; 1];
                match (self.read)(&mut byte)? {
                    0 => Ok(None),
                    _ => Ok(Some(byte[0])),
                }
            }
        }
    }
}

impl<A> Closable for FnSource<A> {
    type Acc = A;

    fn close(&mut self) -> Result<A> {
        match self.close.take() {
            Some(f) => f(),
            None => Err(StreamError::InputClosed),
        }
    }
}

/// A sink assembled from closures
pub struct FnSink<A> {
    write: WriteFn,
    write_byte: Option<WriteByteFn>,
    flush: Option<FlushFn>,
    close: Option<CloseFn<A>>,
}

impl<A> FnSink<A> {
    pub fn new(
        write: impl FnMut(&[u8]) -> Result<usize> + Send + 'static,
        close: impl FnOnce() -> Result<A> + Send + 'static,
    ) -> Self {
        Self {
            write: Box::new(write),
            write_byte: None,
            flush: None,
            close: Some(Box::new(close)),
        }
    }

    /// Use a dedicated single-byte write instead of a one-byte bulk write
    #[must_use]
    pub fn with_write_byte(mut self, write_byte: impl FnMut(u8) -> Result<()> + Send + 'static) -> Self {
        self.write_byte = Some(Box::new(write_byte));
        self
    }

    #[must_use]
    pub fn with_flush(mut self, flush: impl FnMut() -> Result<()> + Send + 'static) -> Self {
        self.flush = Some(Box::new(flush));
        self
    }
}

impl<A> Writable for FnSink<A> {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        (self.write)(buf)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        match self.write_byte.as_mut() {
            Some(f) => f(byte),
            None => match (self.write)(&[byte])? {
                0 => Err(write_zero()),
                _ => Ok(()),
            },
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.flush.as_mut() {
            Some(f) => f(),
            None => Ok(()),
        }
    }
}

impl<A> Closable for FnSink<A> {
    type Acc = A;

    fn close(&mut self) -> Result<A> {
        match self.close.take() {
            Some(f) => f(),
            None => Err(StreamError::OutputClosed),
        }
    }
}
