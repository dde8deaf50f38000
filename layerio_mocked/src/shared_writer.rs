//! A `std::io::Write` that keeps written data for later inspection.
//!
//! # Example
//! ```
//! use layerio_mocked::SharedWriter;
//! use std::io::Write;
//!
//! let mut writer = SharedWriter::new();
//! writer.write_all(b"Hello, world!").unwrap();
//! assert_eq!(writer.get_output(), "Hello, world!");
//! ```

use std::io::{Result, Write};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone, Default)]
pub struct SharedWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner.lock().write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl SharedWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get_output(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).to_string()
    }

    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().clone()
    }
}
