//! Shared byte buffer with internal locking
//!
//! Backs the in-memory providers: [`output_buffer`](crate::io::memory::output_buffer)
//! appends to one, and a test can keep a clone to watch bytes arrive while the
//! stream is still open.

use parking_lot::{Mutex, MutexGuard};
use std::ops::Deref;
use std::sync::Arc;

/// Read-only guard to buffer contents
///
/// Holds the lock and provides read-only access to the underlying data.
/// The lock is released when the guard is dropped.
pub struct BufferReadGuard<'a>(MutexGuard<'a, Vec<u8>>);

impl Deref for BufferReadGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for BufferReadGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Shared buffer with internal locking
///
/// A thread-safe buffer backed by `Arc<Mutex<Vec<u8>>>`. Multiple clones
/// share the same underlying data.
///
/// # Example
///
/// ```
/// use layerio::io::Buffer;
///
/// let buffer = Buffer::new();
/// buffer.append(b"hello");
///
/// let guard = buffer.lock();
/// assert_eq!(&*guard, b"hello");
/// ```
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self(Arc::new(Mutex::new(data)))
    }

    pub fn append(&self, data: &[u8]) {
        self.0.lock().extend_from_slice(data);
    }

    pub fn push(&self, byte: u8) {
        self.0.lock().push(byte);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Copy of the current contents
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    /// Lock the buffer for reading
    ///
    /// The lock is held until the guard is dropped; appends from other
    /// threads wait meanwhile.
    #[must_use]
    pub fn lock(&self) -> BufferReadGuard<'_> {
        BufferReadGuard(self.0.lock())
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Buffer(len={})", self.len())
    }
}
