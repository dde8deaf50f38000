//! Readable streams
//!
//! An [`Input`] is a cheap, clonable handle: clones share one driver, one
//! closed flag and one identity. A wrapping input keeps handles of the inputs
//! it was built over; closing it never closes them unless it was built with
//! [`Ownership::Owned`].

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::capability::Source;
use crate::config::DEFAULT_BUFFER_SIZE;
use crate::dependency::{Dependency, Lifecycle};
use crate::error::{Result, StreamError};
use crate::idgen::StreamId;
use crate::stream::{check_range, short_type_name, Ownership, StreamHeader, StreamKind, StreamState};
use crate::sync::{StreamGuard, StreamLock};

type BoxedSource<A> = Box<dyn Source<Acc = A>>;

pub(crate) struct InputCore<A> {
    header: StreamHeader,
    state: Mutex<StreamState<BoxedSource<A>, A>>,
}

impl<A: Clone + Send + 'static> InputCore<A> {
    fn cached(&self) -> Result<A> {
        match &*self.state.lock() {
            StreamState::Closed(Some(acc)) => Ok(acc.clone()),
            _ => Err(StreamError::InputClosed),
        }
    }

    fn close(&self) -> Result<A> {
        let _closing = self.header.closing();
        if !self.header.mark_closed() {
            log::debug!("Input::close() on already closed input {}", self.header.id);
            return self.cached();
        }
        // reads started before the mark finish first; new ones fail
        let taken = std::mem::replace(&mut *self.state.lock(), StreamState::Closed(None));
        let StreamState::Open(source) = taken else {
            return Err(StreamError::InputClosed);
        };
        self.finish_close(source)
    }

    fn finish_close(&self, mut source: BoxedSource<A>) -> Result<A> {
        log::debug!("closing input {} ({})", self.header.id, self.header.label);
        let acc = source.close();
        drop(source);
        let cascade = self.header.after_close();
        match acc {
            Ok(acc) => {
                *self.state.lock() = StreamState::Closed(Some(acc.clone()));
                cascade.map(|()| acc)
            }
            Err(e) => {
                log::warn!("close callback of input {} failed: {e}", self.header.id);
                Err(e)
            }
        }
    }
}

impl<A: Clone + Send + 'static> Lifecycle for InputCore<A> {
    fn header(&self) -> &StreamHeader {
        &self.header
    }

    fn is_closed(&self) -> bool {
        self.header.is_closed()
    }

    fn flush_buffers(&self) -> Result<()> {
        Ok(())
    }

    fn flush_stream(&self) -> Result<()> {
        Ok(())
    }

    fn close_stream(&self) -> Result<()> {
        self.close().map(|_| ())
    }
}

impl<A> Drop for InputCore<A> {
    fn drop(&mut self) {
        self.header.mark_closed();
        if let StreamState::Open(mut source) =
            std::mem::replace(self.state.get_mut(), StreamState::Closed(None))
        {
            log::debug!("input {} dropped while open, closing", self.header.id);
            if let Err(e) = source.close() {
                log::warn!("close of dropped input {} failed: {e}", self.header.id);
            }
            drop(source);
            if let Err(e) = self.header.after_close() {
                log::warn!("cascade of dropped input {} failed: {e}", self.header.id);
            }
        }
    }
}

/// A readable stream producing an accumulator of type `A` when closed
pub struct Input<A = ()> {
    core: Arc<InputCore<A>>,
}

impl<A> Clone for Input<A> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<A: Clone + Send + 'static> Input<A> {
    /// Base constructor: a stream with no underlying streams
    pub fn new<S: Source<Acc = A> + 'static>(source: S) -> Self {
        Self::build(Box::new(source), short_type_name::<S>(), Vec::new(), Ownership::Borrowed, None)
    }

    /// Wrapping constructor: a stream layered over `deps`
    ///
    /// # Errors
    /// `InvalidArgument` if `deps` is empty.
    pub fn wrap<S: Source<Acc = A> + 'static>(
        source: S,
        deps: Vec<Dependency>,
        ownership: Ownership,
    ) -> Result<Self> {
        if deps.is_empty() {
            return Err(StreamError::invalid("a wrapping stream needs at least one dependency"));
        }
        Ok(Self::build(Box::new(source), short_type_name::<S>(), deps, ownership, None))
    }

    /// Wrapping constructor for the common single-dependency case
    pub fn wrap_one<S: Source<Acc = A> + 'static>(
        source: S,
        dep: impl Into<Dependency>,
        ownership: Ownership,
    ) -> Self {
        Self::build(Box::new(source), short_type_name::<S>(), vec![dep.into()], ownership, None)
    }

    pub(crate) fn build(
        source: BoxedSource<A>,
        label: String,
        deps: Vec<Dependency>,
        ownership: Ownership,
        lock: Option<StreamLock>,
    ) -> Self {
        let header = StreamHeader::new(StreamKind::Input, label, deps, ownership, lock);
        let core = Arc::new(InputCore {
            header,
            state: Mutex::new(StreamState::Open(source)),
        });
        let weak: Weak<InputCore<A>> = Arc::downgrade(&core);
        let weak: Weak<dyn Lifecycle> = weak;
        for dep in &core.header.deps {
            dep.node().header().add_dependent(weak.clone());
        }
        log::debug!(
            "opened input {} ({}) over {:?}",
            core.header.id,
            core.header.label,
            core.header.deps.iter().map(Dependency::id).collect::<Vec<_>>()
        );
        Self { core }
    }

    fn with_source<R>(&self, f: impl FnOnce(&mut dyn Source<Acc = A>) -> Result<R>) -> Result<R> {
        if self.core.header.is_closed() {
            return Err(StreamError::InputClosed);
        }
        let mut state = self.core.state.lock();
        match &mut *state {
            StreamState::Open(source) => f(source.as_mut()),
            StreamState::Closed(_) => Err(StreamError::InputClosed),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        self.with_source(|_| Ok(()))
    }

    /// Read one byte
    ///
    /// # Errors
    /// `NoMoreInput` at end of stream, `InputClosed` after close.
    pub fn read_byte(&self) -> Result<u8> {
        let _guard = self.core.header.guard();
        self.with_source(|s| s.read_byte())?
            .ok_or(StreamError::NoMoreInput)
    }

    /// Read up to `len` bytes into `buf[offset..offset + len]`, returning the
    /// count. Never returns 0 for `len > 0`: an exhausted stream fails with
    /// `NoMoreInput` instead.
    ///
    /// # Errors
    /// `InvalidArgument` for a range outside `buf`, `NoMoreInput`, `InputClosed`.
    pub fn read_bulk(&self, buf: &mut [u8], offset: usize, len: usize) -> Result<usize> {
        check_range(buf.len(), offset, len)?;
        let _guard = self.core.header.guard();
        if len == 0 {
            return self.ensure_open().map(|()| 0);
        }
        self.read_chunk(&mut buf[offset..offset + len])
    }

    /// Slice form of [`read_bulk`](Self::read_bulk)
    ///
    /// # Errors
    /// Same as `read_bulk`.
    pub fn read_some(&self, buf: &mut [u8]) -> Result<usize> {
        self.read_bulk(buf, 0, buf.len())
    }

    /// Like `read_some`, but end of stream is reported as `Ok(0)`
    ///
    /// # Errors
    /// `InputClosed` or a provider failure.
    pub fn read_available(&self, buf: &mut [u8]) -> Result<usize> {
        let _guard = self.core.header.guard();
        self.with_source(|s| s.read_into(buf))
    }

    fn read_chunk(&self, dst: &mut [u8]) -> Result<usize> {
        match self.with_source(|s| s.read_into(dst))? {
            0 => Err(StreamError::NoMoreInput),
            n => Ok(n),
        }
    }

    /// Read exactly `len` bytes into `buf[offset..offset + len]`.
    ///
    /// On `NoMoreInput` the bytes already obtained are left in `buf` but their
    /// count is not reported; use [`fill`](Self::fill) when it matters.
    ///
    /// # Errors
    /// `InvalidArgument`, `NoMoreInput` if the stream ends first, `InputClosed`.
    pub fn read_exact(&self, buf: &mut [u8], offset: usize, len: usize) -> Result<()> {
        let filled = self.fill(buf, offset, len)?;
        if filled < len {
            return Err(StreamError::NoMoreInput);
        }
        Ok(())
    }

    /// Read until `len` bytes are obtained or the stream ends, returning the
    /// count obtained.
    ///
    /// # Errors
    /// `InvalidArgument`, `InputClosed` or a provider failure.
    pub fn fill(&self, buf: &mut [u8], offset: usize, len: usize) -> Result<usize> {
        check_range(buf.len(), offset, len)?;
        let _guard = self.core.header.guard();
        let mut filled = 0;
        while filled < len {
            match self.read_chunk(&mut buf[offset + filled..offset + len]) {
                Ok(n) => filled += n,
                Err(StreamError::NoMoreInput) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Read everything up to the end of the stream
    ///
    /// # Errors
    /// `InputClosed` or a provider failure.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let _guard = self.core.header.guard();
        let mut out = Vec::new();
        let mut chunk = vec![0u8; DEFAULT_BUFFER_SIZE];
        loop {
            match self.read_chunk(&mut chunk) {
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(StreamError::NoMoreInput) => return Ok(out),
                Err(e) => return Err(e),
            }
        }
    }

    /// Read up to `n` bytes; fewer only if the stream ends
    ///
    /// # Errors
    /// `NoMoreInput` if `n > 0` and nothing is left, `InputClosed`.
    pub fn nread(&self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let filled = self.fill(&mut buf, 0, n)?;
        if n > 0 && filled == 0 {
            return Err(StreamError::NoMoreInput);
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// Read exactly `n` bytes
    ///
    /// # Errors
    /// `NoMoreInput` if fewer than `n` bytes are left, `InputClosed`.
    pub fn really_nread(&self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf, 0, n)?;
        Ok(buf)
    }

    /// Close the stream and return its accumulator.
    ///
    /// The first call runs the close callback, then closes owned dependencies.
    /// Later calls return the same accumulator without side effects. Borrowed
    /// dependencies are never closed.
    ///
    /// The stream is marked closed before a read still in progress returns:
    /// from then on new reads fail and `is_closed()` is true, while the close
    /// itself waits for that read.
    ///
    /// # Errors
    /// Failure of the close callback or of an owned dependency's close. The
    /// stream is closed regardless. A failed close produced no accumulator, so
    /// every later call returns `InputClosed`.
    pub fn close(&self) -> Result<A> {
        let _guard = self.core.header.guard();
        self.core.close()
    }

    /// Hold this stream's operation lock, if any, across a compound operation
    pub(crate) fn guard(&self) -> Option<StreamGuard<'_>> {
        self.core.header.guard()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    #[must_use]
    pub fn id(&self) -> StreamId {
        self.core.header.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.core.header.label
    }

    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.core.header.ownership
    }

    /// Ids of the streams this input was layered over
    #[must_use]
    pub fn dependencies(&self) -> Vec<StreamId> {
        self.core.header.deps.iter().map(Dependency::id).collect()
    }

    /// Ids of the open streams layered over this input
    #[must_use]
    pub fn dependents(&self) -> Vec<StreamId> {
        self.core
            .header
            .live_dependents()
            .iter()
            .map(|d| d.header().id)
            .collect()
    }

    /// Register `hook` to run after the close callback; runs now if already closed
    pub fn on_close(&self, hook: impl FnOnce() + Send + 'static) {
        self.core.header.push_hook(Box::new(hook));
    }

    #[must_use]
    pub fn as_dependency(&self) -> Dependency {
        let node: Arc<dyn Lifecycle> = Arc::clone(&self.core) as Arc<dyn Lifecycle>;
        Dependency::from_node(node)
    }

    /// Render the dependency tree of this input
    #[must_use]
    pub fn describe(&self) -> String {
        self.as_dependency().describe()
    }
}

impl<A: Clone + Send + 'static> From<&Input<A>> for Dependency {
    fn from(input: &Input<A>) -> Self {
        input.as_dependency()
    }
}

impl<A: Clone + Send + 'static> From<Input<A>> for Dependency {
    fn from(input: Input<A>) -> Self {
        input.as_dependency()
    }
}

impl<A> fmt::Debug for Input<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let closed = self.core.header.is_closed();
        write!(
            f,
            "Input(id={}, label={}, closed={closed}, deps={})",
            self.core.header.id,
            self.core.header.label,
            self.core.header.deps.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::input_bytes;

    #[test]
    fn test_read_byte_until_end() {
        let input = input_bytes(b"ab".to_vec());
        assert_eq!(input.read_byte().unwrap(), b'a');
        assert_eq!(input.read_byte().unwrap(), b'b');
        assert!(input.read_byte().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_read_bulk_rejects_bad_range() {
        let input = input_bytes(b"abc".to_vec());
        let mut buf = [0u8; 4];
        let err = input.read_bulk(&mut buf, 3, 2).unwrap_err();
        assert!(matches!(err, StreamError::InvalidArgument(_)));
    }

    #[test]
    fn test_read_bulk_zero_len_is_not_end_of_stream() {
        let input = input_bytes(Vec::new());
        let mut buf = [0u8; 4];
        assert_eq!(input.read_bulk(&mut buf, 0, 0).unwrap(), 0);
        assert!(input.read_bulk(&mut buf, 0, 4).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_fill_reports_partial_count() {
        let input = input_bytes(b"xyz".to_vec());
        let mut buf = [0u8; 8];
        assert_eq!(input.fill(&mut buf, 2, 6).unwrap(), 3);
        assert_eq!(&buf[2..5], b"xyz");
    }

    #[test]
    fn test_nread() {
        let input = input_bytes(b"hello".to_vec());
        assert_eq!(input.nread(3).unwrap(), b"hel");
        assert_eq!(input.nread(10).unwrap(), b"lo");
        assert!(input.nread(1).unwrap_err().is_end_of_stream());
        assert_eq!(input.nread(0).unwrap(), b"");
    }

    #[test]
    fn test_closed_input_rejects_reads() {
        let input = input_bytes(b"abc".to_vec());
        input.close().unwrap();
        assert!(matches!(input.read_byte(), Err(StreamError::InputClosed)));
        let mut buf = [0u8; 2];
        assert!(matches!(input.read_some(&mut buf), Err(StreamError::InputClosed)));
        input.close().unwrap();
    }
}
