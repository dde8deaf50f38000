//! Indenting output
//!
//! Lines are passed on whole, so a partially written line stays in the
//! wrapper until its newline arrives, the wrapper is flushed, or the output
//! under it flushes or closes.

use crate::capability::{Closable, Writable};
use crate::error::{Result, StreamError};
use crate::output::Output;
use crate::stream::Ownership;

struct TabSink<A> {
    base: Output<A>,
    indent: usize,
    at_line_start: bool,
    pending: Vec<u8>,
}

impl<A: Clone + Send + 'static> TabSink<A> {
    // bytes held back for a closed base could never be delivered
    fn ensure_base_open(&self) -> Result<()> {
        if self.base.is_closed() {
            return Err(StreamError::OutputClosed);
        }
        Ok(())
    }

    fn push(&mut self, byte: u8) -> Result<()> {
        if self.at_line_start && byte != b'\n' {
            self.pending.resize(self.pending.len() + self.indent, b' ');
        }
        self.pending.push(byte);
        self.at_line_start = byte == b'\n';
        if self.at_line_start {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            self.base.write_all(&self.pending)?;
            self.pending.clear();
        }
        Ok(())
    }
}

impl<A: Clone + Send + 'static> Writable for TabSink<A> {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        self.ensure_base_open()?;
        for &byte in buf {
            self.push(byte)?;
        }
        Ok(buf.len())
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.ensure_base_open()?;
        self.push(byte)
    }

    fn flush(&mut self) -> Result<()> {
        self.drain()
    }
}

impl<A> Closable for TabSink<A> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Indent every non-empty line written through the returned output by
/// `indent` spaces
#[must_use]
pub fn tab_output<A: Clone + Send + 'static>(
    output: &Output<A>,
    indent: usize,
    ownership: Ownership,
) -> Output {
    let sink = TabSink {
        base: output.clone(),
        indent,
        at_line_start: true,
        pending: Vec::new(),
    };
    Output::wrap_one(sink, output, ownership)
}
