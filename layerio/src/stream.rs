//! Bookkeeping shared by inputs and outputs
//!
//! Every stream carries a [`StreamHeader`]: its identity, the streams it was
//! layered over (dependencies), weak links to the streams layered over it
//! (dependents), whether it owns its dependencies, an optional operation lock
//! and close hooks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::dependency::{Dependency, Lifecycle};
use crate::error::{Result, StreamError};
use crate::idgen::StreamId;
use crate::registry;
use crate::sync::{StreamGuard, StreamLock};

/// Whether closing a wrapping stream also closes the streams it wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    /// The caller closes the underlying streams separately
    #[default]
    Borrowed,
    /// Closing the wrapper closes the underlying streams after its own close
    Owned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Input,
    Output,
}

/// Driver slot of a stream. Once `Closed`, the accumulator produced by the
/// first close is kept for repeated `close()` calls.
pub(crate) enum StreamState<D, A> {
    Open(D),
    Closed(Option<A>),
}

type Hook = Box<dyn FnOnce() + Send>;

pub(crate) struct StreamHeader {
    pub(crate) id: StreamId,
    pub(crate) kind: StreamKind,
    pub(crate) label: String,
    pub(crate) deps: Vec<Dependency>,
    pub(crate) ownership: Ownership,
    pub(crate) lock: Option<StreamLock>,
    dependents: Mutex<Vec<Weak<dyn Lifecycle>>>,
    // `None` once the hooks have run
    hooks: Mutex<Option<Vec<Hook>>>,
    tracked: AtomicBool,
    // set before the driver is taken, so it never waits on a pending operation
    closed: AtomicBool,
    closing: ReentrantMutex<()>,
}

impl StreamHeader {
    pub(crate) fn new(
        kind: StreamKind,
        label: String,
        deps: Vec<Dependency>,
        ownership: Ownership,
        lock: Option<StreamLock>,
    ) -> Self {
        Self {
            id: StreamId::next(),
            kind,
            label,
            deps,
            ownership,
            lock,
            dependents: Mutex::new(Vec::new()),
            hooks: Mutex::new(Some(Vec::new())),
            tracked: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            closing: ReentrantMutex::new(()),
        }
    }

    /// Hold the operation lock, if this stream has one
    pub(crate) fn guard(&self) -> Option<StreamGuard<'_>> {
        self.lock.as_ref().map(StreamLock::lock)
    }

    pub(crate) fn add_dependent(&self, dependent: Weak<dyn Lifecycle>) {
        let mut dependents = self.dependents.lock();
        dependents.retain(|w| w.strong_count() > 0);
        dependents.push(dependent);
    }

    /// Streams layered over this one that are still alive and open
    pub(crate) fn live_dependents(&self) -> Vec<std::sync::Arc<dyn Lifecycle>> {
        let dependents = self.dependents.lock();
        dependents
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|d| !d.is_closed())
            .collect()
    }

    /// Push the buffered bytes of every open dependent into this stream.
    /// All dependents are visited; the first failure is reported.
    pub(crate) fn flush_dependents(&self) -> Result<()> {
        let mut first_err = None;
        for dependent in self.live_dependents() {
            if let Err(e) = dependent.flush_buffers() {
                log::warn!(
                    "flush of dependent {} into {} failed: {e}",
                    dependent.header().id,
                    self.id
                );
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Flush the outputs this stream writes into (never closes them)
    pub(crate) fn flush_dependencies(&self) -> Result<()> {
        let mut first_err = None;
        for dep in self.deps.iter().filter(|d| d.kind() == StreamKind::Output) {
            if let Err(e) = dep.node().flush_stream() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Close the streams this one owns, in construction order
    pub(crate) fn close_dependencies(&self) -> Result<()> {
        let mut first_err = None;
        for dep in &self.deps {
            log::debug!("{} closes owned dependency {}", self.id, dep.id());
            if let Err(e) = dep.node().close_stream() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Held for the whole of a close; a second close waits here for the first
    pub(crate) fn closing(&self) -> ReentrantMutexGuard<'_, ()> {
        self.closing.lock()
    }

    /// Returns false if the stream was already marked closed
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Queue `hook` for the close; runs it now if the hooks already ran
    pub(crate) fn push_hook(&self, hook: Hook) {
        let mut hooks = self.hooks.lock();
        if let Some(pending) = hooks.as_mut() {
            pending.push(hook);
            return;
        }
        drop(hooks);
        hook();
    }

    /// Run close hooks once, after the close callback
    pub(crate) fn run_hooks(&self) {
        let hooks = self.hooks.lock().take().unwrap_or_default();
        for hook in hooks {
            hook();
        }
    }

    pub(crate) fn mark_tracked(&self) -> bool {
        !self.tracked.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn untrack(&self) {
        if self.tracked.swap(false, Ordering::AcqRel) {
            registry::forget(self.id);
        }
    }

    /// Everything that happens after the driver's close callback returned
    pub(crate) fn after_close(&self) -> Result<()> {
        let cascade = match (self.ownership, self.kind) {
            (Ownership::Owned, _) => self.close_dependencies(),
            (Ownership::Borrowed, StreamKind::Output) => self.flush_dependencies(),
            (Ownership::Borrowed, StreamKind::Input) => Ok(()),
        };
        self.run_hooks();
        self.untrack();
        cascade
    }
}

/// Check that `offset..offset + len` lies inside a buffer of `buf_len` bytes
pub(crate) fn check_range(buf_len: usize, offset: usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= buf_len => Ok(()),
        _ => Err(StreamError::invalid(format!(
            "range {offset}+{len} is outside a buffer of {buf_len} bytes"
        ))),
    }
}

/// Last path segment of a provider's type name, used as a debug label
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
