//! Process-wide shutdown registry
//!
//! Streams opt in with [`track`]. The registry starts empty, loses an entry
//! whenever a tracked stream is closed explicitly, and is drained by
//! [`close_all`], the terminal sweep run once at shutdown. Nothing else in the
//! crate consults it.

use std::collections::HashMap;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::dependency::Dependency;
use crate::idgen::StreamId;

lazy_static! {
    static ref TRACKED: Mutex<HashMap<StreamId, Dependency>> = Mutex::new(HashMap::new());
}

/// Add a stream to the shutdown sweep. Tracking a closed stream, or one that
/// is already tracked, does nothing.
pub fn track(stream: impl Into<Dependency>) {
    let dep = stream.into();
    if dep.is_closed() || !dep.node().header().mark_tracked() {
        return;
    }
    tracing::trace!(stream = %dep.id(), label = dep.label(), "tracking stream");
    TRACKED.lock().insert(dep.id(), dep);
}

/// Remove a stream from the sweep; called when the stream closes
pub(crate) fn forget(id: StreamId) {
    // dropped after the registry lock is released: the last handle of a
    // stream may go away here and its drop closes through `forget` again
    let removed = TRACKED.lock().remove(&id);
    drop(removed);
}

#[must_use]
pub fn is_tracked(id: StreamId) -> bool {
    TRACKED.lock().contains_key(&id)
}

#[must_use]
pub fn tracked_count() -> usize {
    TRACKED.lock().len()
}

/// Close every tracked stream, newest first, so wrappers push their buffered
/// bytes into the streams they were built over before those close.
///
/// Failures are logged and skipped. Returns how many open streams were closed.
pub fn close_all() -> usize {
    let mut streams: Vec<Dependency> = std::mem::take(&mut *TRACKED.lock())
        .into_values()
        .collect();
    streams.sort_by_key(|dep| std::cmp::Reverse(dep.id()));

    tracing::debug!(count = streams.len(), "closing all tracked streams");
    let mut closed = 0;
    for dep in streams {
        if dep.is_closed() {
            continue;
        }
        closed += 1;
        if let Err(e) = dep.close() {
            tracing::warn!(stream = %dep.id(), label = dep.label(), error = %e, "close failed during sweep");
            log::warn!("close of {} {} failed during sweep: {e}", dep.label(), dep.id());
        }
    }
    closed
}

/// Dependency trees of all tracked streams, oldest first
#[must_use]
pub fn describe_all() -> String {
    let mut streams: Vec<Dependency> = TRACKED.lock().values().cloned().collect();
    streams.sort_by_key(Dependency::id);
    streams.iter().map(Dependency::describe).collect()
}
