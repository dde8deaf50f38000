//! Sink that records the calls it receives

use std::sync::Arc;

use layerio::{Closable, Output, Result, Writable};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Write(Vec<u8>),
    WriteByte(u8),
    Flush,
    Close,
}

/// Shared, append-only call log
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    #[must_use]
    pub fn count(&self, call: &Call) -> usize {
        self.0.lock().iter().filter(|c| *c == call).count()
    }

    /// All bytes received, whichever write call carried them
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for call in self.0.lock().iter() {
            match call {
                Call::Write(data) => out.extend_from_slice(data),
                Call::WriteByte(byte) => out.push(*byte),
                Call::Flush | Call::Close => {}
            }
        }
        out
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    log: CallLog,
    data: Vec<u8>,
}

impl RecordingSink {
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            data: Vec::new(),
        }
    }
}

impl Writable for RecordingSink {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        self.log.push(Call::Write(buf.to_vec()));
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.log.push(Call::WriteByte(byte));
        self.data.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.log.push(Call::Flush);
        Ok(())
    }
}

impl Closable for RecordingSink {
    type Acc = Vec<u8>;

    fn close(&mut self) -> Result<Vec<u8>> {
        self.log.push(Call::Close);
        Ok(std::mem::take(&mut self.data))
    }
}

/// An output recording into a fresh log
#[must_use]
pub fn recording_output() -> (Output<Vec<u8>>, CallLog) {
    let log = CallLog::new();
    (Output::new(RecordingSink::new(log.clone())), log)
}
