//! Stream-layer configuration
//!
//! ```json
//! {"buffer_size": 8192, "line_ending": "crlf", "locking": "per_stream", "track": true}
//! ```
//!
//! Every field is optional.

use serde::Deserialize;

use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;
use crate::registry;
use crate::stream::Ownership;
use crate::sync::{synchronize_input_with, synchronize_output_with, SyncPolicy};

/// Buffer size used by `copy` and bulk helpers when none is given
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Terminator appended by `write_line`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    Lf,
    Crlf,
    /// CRLF on Windows, LF elsewhere
    #[default]
    Host,
}

impl LineEnding {
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::Crlf => b"\r\n",
            Self::Host if cfg!(windows) => b"\r\n",
            Self::Host => b"\n",
        }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    pub line_ending: LineEnding,
    pub locking: SyncPolicy,
    pub track: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            line_ending: LineEnding::default(),
            locking: SyncPolicy::default(),
            track: false,
        }
    }
}

impl StreamConfig {
    /// Parse a configuration from JSON text
    ///
    /// # Errors
    /// `InvalidArgument` for malformed JSON, unknown keys or a zero buffer size.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_slice(text.as_bytes())
    }

    /// Read JSON from `reader` until it reports end of data, then parse it
    ///
    /// # Errors
    /// `InvalidArgument` for malformed JSON, `Io` if reading fails.
    pub fn from_reader(mut reader: impl embedded_io::Read) -> Result<Self> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match embedded_io::Read::read(&mut reader, &mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    let kind = embedded_io::Error::kind(&e);
                    return Err(StreamError::Io(std::io::Error::new(
                        crate::error::error_kind_to_io_kind(kind),
                        format!(
                            "failed to read stream config: {}",
                            crate::error::error_kind_to_str(kind)
                        ),
                    )));
                }
            }
        }
        Self::from_slice(&buffer)
    }

    /// Read the whole of `input` and parse it. The input is left open.
    ///
    /// # Errors
    /// Same as [`from_json`](Self::from_json), plus any read failure.
    pub fn from_input<A: Clone + Send + 'static>(input: &Input<A>) -> Result<Self> {
        let bytes = input.read_all()?;
        Self::from_slice(&bytes)
    }

    fn from_slice(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(bytes)
            .map_err(|e| StreamError::invalid(format!("failed to parse stream config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `InvalidArgument` if `buffer_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(StreamError::invalid("buffer_size must be positive"));
        }
        Ok(())
    }

    /// Synchronized, non-owning wrapper over `input` with the configured policy
    #[must_use]
    pub fn synchronize_input<A: Clone + Send + 'static>(&self, input: &Input<A>) -> Input {
        let synced = synchronize_input_with(input, &self.locking, Ownership::Borrowed);
        if self.track {
            registry::track(&synced);
        }
        synced
    }

    /// Synchronized, non-owning wrapper over `output` with the configured policy
    #[must_use]
    pub fn synchronize_output<A: Clone + Send + 'static>(&self, output: &Output<A>) -> Output {
        let synced = synchronize_output_with(output, &self.locking, Ownership::Borrowed);
        if self.track {
            registry::track(&synced);
        }
        synced
    }

    /// Add `stream` to the shutdown registry if tracking is on
    pub fn maybe_track(&self, stream: impl Into<crate::Dependency>) {
        if self.track {
            registry::track(stream);
        }
    }
}
