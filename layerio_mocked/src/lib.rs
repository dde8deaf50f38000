//! Test doubles for `layerio`
//!
//! - `ScriptedSource` / `ScriptedSink`: providers driven by their data. A
//!   `WANT_ERROR` byte makes the read or write fail; an `IO_INTERRUPT` byte ends
//!   the current read or write early (short count). Close and flush can be set
//!   to fail.
//! - `RecordingSink`: logs every call it receives into a shared `CallLog` that
//!   stays readable after the stream is closed or dropped.
//! - `SharedWriter`: a `std::io::Write` whose bytes can be inspected later.

pub mod recording;
pub mod scripted;
pub mod shared_writer;

pub use recording::{recording_output, Call, CallLog, RecordingSink};
pub use scripted::{scripted_input, scripted_output, ScriptedSource, ScriptedSink};
pub use shared_writer::SharedWriter;

pub const WANT_ERROR: u8 = 0x01;
pub const IO_INTERRUPT: u8 = b'\n';
