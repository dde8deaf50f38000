//! Synchronization wrapper
//!
//! [`synchronize_input`] and [`synchronize_output`] layer a forwarding stream
//! over an existing one. Every public operation of the wrapper holds the lock
//! for its whole duration, including loops such as `write_exact` and
//! `read_all`, so concurrent callers observe each call as one unit.
//!
//! The lock is reentrant: a thread already inside a guarded call (a close
//! cascade, a nested wrapper sharing the lock) does not deadlock on itself.
//!
//! Which lock is used is decided by a [`SyncPolicy`] passed at construction.
//! There is no process-wide default lock.

use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use serde::Deserialize;

use crate::capability::{Closable, Readable, Writable};
use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;
use crate::stream::Ownership;

pub type StreamGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// Mutual-exclusion token; clones share the same lock
#[derive(Clone)]
pub struct StreamLock(Arc<ReentrantMutex<()>>);

impl StreamLock {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(ReentrantMutex::new(())))
    }

    /// Block until the lock is held by the calling thread
    pub fn lock(&self) -> StreamGuard<'_> {
        self.0.lock()
    }

    /// True if both tokens guard the same lock
    #[must_use]
    pub fn same_as(&self, other: &StreamLock) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for StreamLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StreamLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamLock({:p})", Arc::as_ptr(&self.0))
    }
}

/// How a synchronized wrapper gets its lock
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// No lock: the wrapper only forwards
    #[default]
    #[serde(alias = "none")]
    Unlocked,
    /// A fresh lock for each wrapper
    PerStream,
    /// One lock shared by several wrappers, serializing them against each other
    #[serde(skip)]
    Shared(StreamLock),
}

impl SyncPolicy {
    fn make_lock(&self) -> Option<StreamLock> {
        match self {
            Self::Unlocked => None,
            Self::PerStream => Some(StreamLock::new()),
            Self::Shared(lock) => Some(lock.clone()),
        }
    }
}

struct SyncSource<A> {
    base: Input<A>,
}

impl<A: Clone + Send + 'static> Readable for SyncSource<A> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.base.read_available(buf)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        match self.base.read_byte() {
            Ok(byte) => Ok(Some(byte)),
            Err(StreamError::NoMoreInput) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<A> Closable for SyncSource<A> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct SyncSink<A> {
    base: Output<A>,
}

impl<A: Clone + Send + 'static> Writable for SyncSink<A> {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        self.base.write_bulk(buf, 0, buf.len())
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.base.write_byte(byte)
    }
}

impl<A> Closable for SyncSink<A> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Guard every operation on `input` with a lock of its own
#[must_use]
pub fn synchronize_input<A: Clone + Send + 'static>(input: &Input<A>) -> Input {
    synchronize_input_with(input, &SyncPolicy::PerStream, Ownership::Borrowed)
}

/// Guard every operation on `input` as `policy` says.
///
/// With [`Ownership::Owned`], closing the wrapper closes `input`; its
/// accumulator stays available from `input.close()`.
#[must_use]
pub fn synchronize_input_with<A: Clone + Send + 'static>(
    input: &Input<A>,
    policy: &SyncPolicy,
    ownership: Ownership,
) -> Input {
    Input::build(
        Box::new(SyncSource {
            base: input.clone(),
        }),
        "Synchronized".to_string(),
        vec![input.as_dependency()],
        ownership,
        policy.make_lock(),
    )
}

/// Guard every operation on `output` with a lock of its own
#[must_use]
pub fn synchronize_output<A: Clone + Send + 'static>(output: &Output<A>) -> Output {
    synchronize_output_with(output, &SyncPolicy::PerStream, Ownership::Borrowed)
}

/// Guard every operation on `output` as `policy` says.
///
/// Closing a borrowed wrapper flushes `output` and leaves it open.
#[must_use]
pub fn synchronize_output_with<A: Clone + Send + 'static>(
    output: &Output<A>,
    policy: &SyncPolicy,
    ownership: Ownership,
) -> Output {
    Output::build(
        Box::new(SyncSink {
            base: output.clone(),
        }),
        "Synchronized".to_string(),
        vec![output.as_dependency()],
        ownership,
        policy.make_lock(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{input_bytes, output_buffer};

    #[test]
    fn test_policy_from_json() {
        let policy: SyncPolicy = serde_json::from_str("\"per_stream\"").unwrap();
        assert!(matches!(policy, SyncPolicy::PerStream));
        let policy: SyncPolicy = serde_json::from_str("\"none\"").unwrap();
        assert!(matches!(policy, SyncPolicy::Unlocked));
        assert!(serde_json::from_str::<SyncPolicy>("\"shared\"").is_err());
    }

    #[test]
    fn test_shared_lock_is_one_lock() {
        let lock = StreamLock::new();
        let policy = SyncPolicy::Shared(lock.clone());
        let made = policy.make_lock().unwrap();
        assert!(made.same_as(&lock));
        assert!(!StreamLock::new().same_as(&lock));
    }

    #[test]
    fn test_lock_is_reentrant() {
        let lock = StreamLock::new();
        let _outer = lock.lock();
        let _inner = lock.lock();
    }

    #[test]
    fn test_synchronized_output_close_leaves_base_open() {
        let base = output_buffer();
        let synced = synchronize_output(&base);
        synced.write_all(b"abc").unwrap();
        synced.close().unwrap();
        assert!(!base.is_closed());
        base.write_all(b"def").unwrap();
        assert_eq!(base.close().unwrap(), b"abcdef");
    }

    #[test]
    fn test_synchronized_input_reads_through() {
        let base = input_bytes(b"hello".to_vec());
        let synced = synchronize_input(&base);
        assert_eq!(synced.read_byte().unwrap(), b'h');
        assert_eq!(synced.read_all().unwrap(), b"ello");
        assert!(synced.read_byte().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_owned_wrapper_closes_base() {
        let base = output_buffer();
        let synced = synchronize_output_with(&base, &SyncPolicy::PerStream, Ownership::Owned);
        synced.write_all(b"xyz").unwrap();
        synced.close().unwrap();
        assert!(base.is_closed());
        assert_eq!(base.close().unwrap(), b"xyz");
    }
}
