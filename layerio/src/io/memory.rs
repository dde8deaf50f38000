//! In-memory providers

use crate::capability::{Closable, Readable, Writable};
use crate::error::Result;
use crate::input::Input;
use crate::io::Buffer;
use crate::output::Output;

/// Source over an owned byte vector
#[derive(Debug)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
}

impl MemorySource {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not read yet
    #[must_use]
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

impl Readable for MemorySource {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let rest = self.remaining();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }
}

impl Closable for MemorySource {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        self.data = Vec::new();
        self.pos = 0;
        Ok(())
    }
}

/// Sink appending to a shared [`Buffer`]; the accumulator is everything written
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    buffer: Buffer,
}

impl BufferSink {
    #[must_use]
    pub fn new(buffer: Buffer) -> Self {
        Self { buffer }
    }
}

impl Writable for BufferSink {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        self.buffer.append(buf);
        Ok(buf.len())
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.buffer.push(byte);
        Ok(())
    }
}

impl Closable for BufferSink {
    type Acc = Vec<u8>;

    fn close(&mut self) -> Result<Vec<u8>> {
        Ok(self.buffer.to_vec())
    }
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl Writable for NullSink {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }
}

impl Closable for NullSink {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[must_use]
pub fn input_bytes(data: Vec<u8>) -> Input {
    Input::new(MemorySource::new(data))
}

#[must_use]
pub fn input_string(text: &str) -> Input {
    input_bytes(text.as_bytes().to_vec())
}

/// An output whose accumulator is the bytes written to it
#[must_use]
pub fn output_buffer() -> Output<Vec<u8>> {
    Output::new(BufferSink::default())
}

/// Like [`output_buffer`], writing into `buffer` so the bytes can be watched
/// before the output closes
#[must_use]
pub fn output_into(buffer: Buffer) -> Output<Vec<u8>> {
    Output::new(BufferSink::new(buffer))
}

#[must_use]
pub fn null_output() -> Output {
    Output::new(NullSink)
}
