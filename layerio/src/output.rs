//! Writable streams
//!
//! An [`Output`] is a clonable handle like [`Input`](crate::Input). Flushing
//! and closing cascade in two directions:
//!
//! - towards dependents: before an output flushes or closes, the open streams
//!   layered over it push their buffered bytes into it;
//! - towards dependencies: after a wrapping output flushes or closes, the
//!   outputs it writes into are flushed (borrowed wrap) or closed (owned wrap).
//!
//! A borrowed wrap never closes the output it writes into.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::capability::{write_zero, Sink};
use crate::dependency::{Dependency, Lifecycle};
use crate::error::{Result, StreamError};
use crate::idgen::StreamId;
use crate::stream::{check_range, short_type_name, Ownership, StreamHeader, StreamKind, StreamState};
use crate::sync::{StreamGuard, StreamLock};

type BoxedSink<A> = Box<dyn Sink<Acc = A>>;

pub(crate) struct OutputCore<A> {
    header: StreamHeader,
    state: Mutex<StreamState<BoxedSink<A>, A>>,
}

impl<A: Clone + Send + 'static> OutputCore<A> {
    fn cached(&self) -> Result<A> {
        match &*self.state.lock() {
            StreamState::Closed(Some(acc)) => Ok(acc.clone()),
            _ => Err(StreamError::OutputClosed),
        }
    }

    fn close(&self) -> Result<A> {
        let _closing = self.header.closing();
        if self.header.is_closed() {
            log::debug!("Output::close() on already closed output {}", self.header.id);
            return self.cached();
        }

        // Bytes buffered in streams layered over this one are destined for it
        let first_err = self.header.flush_dependents().err();

        self.header.mark_closed();
        // writes started before the mark finish first; new ones fail
        let taken = std::mem::replace(&mut *self.state.lock(), StreamState::Closed(None));
        let StreamState::Open(sink) = taken else {
            return Err(StreamError::OutputClosed);
        };

        let result = self.finish_close(sink);
        match (result, first_err) {
            (Ok(_), Some(e)) | (Err(e), _) => Err(e),
            (Ok(acc), None) => Ok(acc),
        }
    }

    fn finish_close(&self, mut sink: BoxedSink<A>) -> Result<A> {
        log::debug!("closing output {} ({})", self.header.id, self.header.label);
        let flushed = sink.flush();
        let acc = sink.close();
        drop(sink);
        let cascade = self.header.after_close();
        match acc {
            Ok(acc) => {
                *self.state.lock() = StreamState::Closed(Some(acc.clone()));
                flushed.and(cascade).map(|()| acc)
            }
            Err(e) => {
                log::warn!("close callback of output {} failed: {e}", self.header.id);
                Err(e)
            }
        }
    }
}

impl<A: Clone + Send + 'static> Lifecycle for OutputCore<A> {
    fn header(&self) -> &StreamHeader {
        &self.header
    }

    fn is_closed(&self) -> bool {
        self.header.is_closed()
    }

    fn flush_buffers(&self) -> Result<()> {
        if self.header.is_closed() {
            return Ok(());
        }
        let dependents = self.header.flush_dependents();
        let own = match &mut *self.state.lock() {
            StreamState::Open(sink) => sink.flush(),
            StreamState::Closed(_) => Ok(()),
        };
        dependents.and(own)
    }

    fn flush_stream(&self) -> Result<()> {
        let own = self.flush_buffers();
        let deps = self.header.flush_dependencies();
        own.and(deps)
    }

    fn close_stream(&self) -> Result<()> {
        self.close().map(|_| ())
    }
}

impl<A> Drop for OutputCore<A> {
    fn drop(&mut self) {
        self.header.mark_closed();
        if let StreamState::Open(mut sink) =
            std::mem::replace(self.state.get_mut(), StreamState::Closed(None))
        {
            log::debug!("output {} dropped while open, closing", self.header.id);
            if let Err(e) = sink.flush().and_then(|()| sink.close().map(|_| ())) {
                log::warn!("close of dropped output {} failed: {e}", self.header.id);
            }
            drop(sink);
            if let Err(e) = self.header.after_close() {
                log::warn!("cascade of dropped output {} failed: {e}", self.header.id);
            }
        }
    }
}

/// A writable stream producing an accumulator of type `A` when closed
pub struct Output<A = ()> {
    core: Arc<OutputCore<A>>,
}

impl<A> Clone for Output<A> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<A: Clone + Send + 'static> Output<A> {
    /// Base constructor: a stream with no underlying streams
    pub fn new<S: Sink<Acc = A> + 'static>(sink: S) -> Self {
        Self::build(Box::new(sink), short_type_name::<S>(), Vec::new(), Ownership::Borrowed, None)
    }

    /// Wrapping constructor: a stream layered over `deps`
    ///
    /// With [`Ownership::Borrowed`], closing the new output flushes the
    /// outputs among `deps` but leaves them open.
    ///
    /// # Errors
    /// `InvalidArgument` if `deps` is empty.
    pub fn wrap<S: Sink<Acc = A> + 'static>(
        sink: S,
        deps: Vec<Dependency>,
        ownership: Ownership,
    ) -> Result<Self> {
        if deps.is_empty() {
            return Err(StreamError::invalid("a wrapping stream needs at least one dependency"));
        }
        Ok(Self::build(Box::new(sink), short_type_name::<S>(), deps, ownership, None))
    }

    /// Wrapping constructor for the common single-dependency case
    pub fn wrap_one<S: Sink<Acc = A> + 'static>(
        sink: S,
        dep: impl Into<Dependency>,
        ownership: Ownership,
    ) -> Self {
        Self::build(Box::new(sink), short_type_name::<S>(), vec![dep.into()], ownership, None)
    }

    pub(crate) fn build(
        sink: BoxedSink<A>,
        label: String,
        deps: Vec<Dependency>,
        ownership: Ownership,
        lock: Option<StreamLock>,
    ) -> Self {
        let header = StreamHeader::new(StreamKind::Output, label, deps, ownership, lock);
        let core = Arc::new(OutputCore {
            header,
            state: Mutex::new(StreamState::Open(sink)),
        });
        let weak: Weak<OutputCore<A>> = Arc::downgrade(&core);
        let weak: Weak<dyn Lifecycle> = weak;
        for dep in &core.header.deps {
            dep.node().header().add_dependent(weak.clone());
        }
        log::debug!(
            "opened output {} ({}) over {:?}",
            core.header.id,
            core.header.label,
            core.header.deps.iter().map(Dependency::id).collect::<Vec<_>>()
        );
        Self { core }
    }

    fn with_sink<R>(&self, f: impl FnOnce(&mut dyn Sink<Acc = A>) -> Result<R>) -> Result<R> {
        if self.core.header.is_closed() {
            return Err(StreamError::OutputClosed);
        }
        let mut state = self.core.state.lock();
        match &mut *state {
            StreamState::Open(sink) => f(sink.as_mut()),
            StreamState::Closed(_) => Err(StreamError::OutputClosed),
        }
    }

    /// Write one byte
    ///
    /// # Errors
    /// `OutputClosed` or a provider failure.
    pub fn write_byte(&self, byte: u8) -> Result<()> {
        let _guard = self.core.header.guard();
        self.with_sink(|s| s.write_byte(byte))
    }

    /// Write up to `len` bytes from `buf[offset..offset + len]`, returning the
    /// count accepted by the sink.
    ///
    /// # Errors
    /// `InvalidArgument` for a range outside `buf`, `OutputClosed`.
    pub fn write_bulk(&self, buf: &[u8], offset: usize, len: usize) -> Result<usize> {
        check_range(buf.len(), offset, len)?;
        let _guard = self.core.header.guard();
        self.with_sink(|s| {
            if len == 0 {
                return Ok(0);
            }
            s.write_from(&buf[offset..offset + len])
        })
    }

    /// Write all of `buf[offset..offset + len]`
    ///
    /// # Errors
    /// `InvalidArgument`, `OutputClosed`, or a sink that stops accepting bytes.
    pub fn write_exact(&self, buf: &[u8], offset: usize, len: usize) -> Result<()> {
        check_range(buf.len(), offset, len)?;
        let _guard = self.core.header.guard();
        let mut written = 0;
        while written < len {
            let chunk = &buf[offset + written..offset + len];
            match self.with_sink(|s| s.write_from(chunk))? {
                0 => return Err(write_zero()),
                n => written += n,
            }
        }
        Ok(())
    }

    /// Write every byte of `bytes`
    ///
    /// # Errors
    /// Same as [`write_exact`](Self::write_exact).
    pub fn write_all(&self, bytes: &[u8]) -> Result<()> {
        self.write_exact(bytes, 0, bytes.len())
    }

    /// Write the UTF-8 bytes of `s`
    ///
    /// # Errors
    /// Same as [`write_exact`](Self::write_exact).
    pub fn write_str(&self, s: &str) -> Result<()> {
        self.write_all(s.as_bytes())
    }

    /// Make buffered bytes observable: first those of streams layered over
    /// this one, then this stream's own, then the outputs it writes into.
    /// No-op on a closed output.
    ///
    /// # Errors
    /// A provider failure during any of the flushes.
    pub fn flush(&self) -> Result<()> {
        let _guard = self.core.header.guard();
        if self.is_closed() {
            return Ok(());
        }
        self.core.flush_stream()
    }

    /// Close the stream and return its accumulator.
    ///
    /// The first call flushes dependents into this stream, flushes and closes
    /// the sink, then flushes (borrowed) or closes (owned) the outputs it writes
    /// into. Later calls return the same accumulator without side effects.
    ///
    /// # Errors
    /// Failure of any flush or of the close callback. The stream is closed
    /// regardless. A failed close produced no accumulator, so every later call
    /// returns `OutputClosed`.
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

    /// Ids of the streams this output was layered over
    #[must_use]
    pub fn dependencies(&self) -> Vec<StreamId> {
        self.core.header.deps.iter().map(Dependency::id).collect()
    }

    /// Ids of the open streams layered over this output
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

    /// Render the dependency tree of this output
    #[must_use]
    pub fn describe(&self) -> String {
        self.as_dependency().describe()
    }
}

impl<A: Clone + Send + 'static> From<&Output<A>> for Dependency {
    fn from(output: &Output<A>) -> Self {
        output.as_dependency()
    }
}

impl<A: Clone + Send + 'static> From<Output<A>> for Dependency {
    fn from(output: Output<A>) -> Self {
        output.as_dependency()
    }
}

impl<A> fmt::Debug for Output<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let closed = self.core.header.is_closed();
        write!(
            f,
            "Output(id={}, label={}, closed={closed}, deps={})",
            self.core.header.id,
            self.core.header.label,
            self.core.header.deps.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::output_buffer;

    #[test]
    fn test_accumulator_is_concatenation() {
        let out = output_buffer();
        out.write_all(b"Hello").unwrap();
        out.write_byte(b',').unwrap();
        out.write_str(" world").unwrap();
        assert_eq!(out.close().unwrap(), b"Hello, world");
    }

    #[test]
    fn test_second_close_returns_same_accumulator() {
        let out = output_buffer();
        out.write_all(b"once").unwrap();
        let first = out.close().unwrap();
        let second = out.close().unwrap();
        assert_eq!(first, second);
        assert!(out.flush().is_ok());
    }

    #[test]
    fn test_write_after_close_fails() {
        let out = output_buffer();
        out.close().unwrap();
        assert!(matches!(out.write_byte(1), Err(StreamError::OutputClosed)));
        assert!(matches!(out.write_all(b"x"), Err(StreamError::OutputClosed)));
    }

    #[test]
    fn test_write_bulk_range_checked() {
        let out = output_buffer();
        let err = out.write_bulk(b"abc", 2, 2).unwrap_err();
        assert!(matches!(err, StreamError::InvalidArgument(_)));
        assert_eq!(out.write_bulk(b"abc", 1, 2).unwrap(), 2);
        assert_eq!(out.close().unwrap(), b"bc");
    }

    #[test]
    fn test_on_close_hook_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let out = output_buffer();
        let counter = Arc::clone(&calls);
        out.on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        out.close().unwrap();
        out.close().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
