//! Layered byte streams
//!
//! Providers (in-memory buffers, `std::io` and `embedded_io` readers and
//! writers, pipes) become base [`Input`] and [`Output`] streams. Wrapping
//! functions layer new streams over existing ones (counting, tee, indentation,
//! chaining, synchronization) and record dependency edges, so that:
//!
//! - closing a wrapper never closes the streams under it, unless it was built
//!   as [`Ownership::Owned`];
//! - closing or flushing a stream first pulls buffered bytes out of the open
//!   wrappers layered over it.
//!
//! ```
//! use layerio::{copy, io, tab_output, Ownership};
//!
//! let src = io::input_string("a\nb\n");
//! let dst = io::output_buffer();
//! let tabbed = tab_output(&dst, 2, Ownership::Borrowed);
//! copy(&src, &tabbed).unwrap();
//! tabbed.close().unwrap();
//! assert_eq!(dst.close().unwrap(), b"  a\n  b\n");
//! ```

pub mod adapters;
pub mod capability;
pub mod codec;
pub mod config;
pub mod copy;
pub mod dependency;
pub mod error;
pub mod idgen;
pub mod input;
pub mod io;
pub mod output;
pub mod registry;
pub mod seq;
pub mod stream;
pub mod sync;
pub mod wrappers;

pub use adapters::{
    input_from_embedded, input_from_std, output_from_embedded, output_from_std, IoSink, IoSource,
    StdSink, StdSource,
};
pub use capability::{Closable, FnSink, FnSource, Readable, Sink, Source, Writable};
pub use config::{LineEnding, StreamConfig, DEFAULT_BUFFER_SIZE};
pub use copy::{copy, copy_with_buffer_size};
pub use dependency::Dependency;
pub use error::{Result, StreamError};
pub use idgen::StreamId;
pub use input::Input;
pub use output::Output;
pub use stream::{Ownership, StreamKind};
pub use sync::{
    synchronize_input, synchronize_input_with, synchronize_output, synchronize_output_with,
    StreamLock, SyncPolicy,
};
pub use wrappers::{
    chain_inputs, chain_inputs_owned, counting_input, counting_output, tab_output, tee, tee_owned,
    Position,
};
