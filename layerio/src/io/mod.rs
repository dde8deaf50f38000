//! In-memory providers
//!
//! ```text
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │  MemorySource                │      │  BufferSink / NullSink       │
//! │  input_bytes, input_string   │      │  output_buffer, null_output  │
//! └──────────────────────────────┘      └──────────────────────────────┘
//!                                                  │ appends to
//!                                                  ▼
//!                                       ┌──────────────────────────────┐
//!                                       │  Buffer                      │
//!                                       │  Arc<Mutex<Vec<u8>>>         │
//!                                       └──────────────────────────────┘
//!
//!   pipe():  Output<u64> ──▶ VecDeque + Condvar ──▶ Input
//! ```
//!
//! These are not transports; tests, the demo and configuration loading use
//! them.

pub mod buffer;
pub mod memory;
pub mod pipe;

pub use buffer::{Buffer, BufferReadGuard};
pub use memory::{
    input_bytes, input_string, null_output, output_buffer, output_into, BufferSink, MemorySource,
    NullSink,
};
pub use pipe::{pipe, PipeReader, PipeWriter};
