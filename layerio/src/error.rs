//! Error types for stream operations
//!
//! Every failure surfaced by this crate is a [`StreamError`]. Providers report
//! end of stream as an outcome (`Ok(0)` / `Ok(None)`); the stream layer turns it
//! into [`StreamError::NoMoreInput`] only for operations that cannot return a
//! partial result.

use std::io;

/// Error type for stream operations
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Attempted to read past the end of the stream
    #[error("no more input")]
    NoMoreInput,

    /// Operation attempted on a closed input
    #[error("input is closed")]
    InputClosed,

    /// Operation attempted on a closed output
    #[error("output is closed")]
    OutputClosed,

    /// Bad offset, length, buffer size or configuration value
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Numeric value does not fit the requested representation
    #[error("value does not fit the requested representation")]
    Overflow,

    /// Bit count outside `0..=31`, or value wider than the bit count
    #[error("bit range error: nbits={nbits}, value={value}")]
    BitRange { nbits: i32, value: i64 },

    /// Failure reported by the underlying provider
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failure reported by a provider that has no `io::Error` to give
    #[error("provider error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    /// True for the "stream is exhausted" outcome
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::NoMoreInput)
    }

    /// True if the stream was already closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::InputClosed | Self::OutputClosed)
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn bit_range(nbits: i32, value: i64) -> Self {
        Self::BitRange { nbits, value }
    }
}

impl embedded_io::Error for StreamError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NoMoreInput | Self::Provider(_) => embedded_io::ErrorKind::Other,
            Self::InputClosed | Self::OutputClosed => embedded_io::ErrorKind::BrokenPipe,
            Self::InvalidArgument(_) | Self::BitRange { .. } => {
                embedded_io::ErrorKind::InvalidInput
            }
            Self::Overflow => embedded_io::ErrorKind::InvalidData,
            Self::Io(e) => io_kind_to_error_kind(e.kind()),
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(e) => e,
            StreamError::NoMoreInput => io::Error::new(io::ErrorKind::UnexpectedEof, e.to_string()),
            StreamError::InputClosed | StreamError::OutputClosed => {
                io::Error::new(io::ErrorKind::BrokenPipe, e.to_string())
            }
            StreamError::InvalidArgument(_) | StreamError::BitRange { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
            }
            StreamError::Overflow => io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
            StreamError::Provider(_) => io::Error::other(e.to_string()),
        }
    }
}

/// Convert `std::io::ErrorKind` to `embedded_io::ErrorKind`
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn io_kind_to_error_kind(kind: io::ErrorKind) -> embedded_io::ErrorKind {
    match kind {
        io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
        io::ErrorKind::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
        io::ErrorKind::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
        io::ErrorKind::ConnectionAborted => embedded_io::ErrorKind::ConnectionAborted,
        io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
        io::ErrorKind::AddrInUse => embedded_io::ErrorKind::AddrInUse,
        io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
        io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
        io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
        io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
        io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
        io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
        io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
        io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
        io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
        _ => embedded_io::ErrorKind::Other,
    }
}

/// Convert `embedded_io::ErrorKind` to `std::io::ErrorKind`
#[must_use]
pub fn error_kind_to_io_kind(kind: embedded_io::ErrorKind) -> io::ErrorKind {
    match kind {
        embedded_io::ErrorKind::NotFound => io::ErrorKind::NotFound,
        embedded_io::ErrorKind::PermissionDenied => io::ErrorKind::PermissionDenied,
        embedded_io::ErrorKind::ConnectionRefused => io::ErrorKind::ConnectionRefused,
        embedded_io::ErrorKind::ConnectionReset => io::ErrorKind::ConnectionReset,
        embedded_io::ErrorKind::ConnectionAborted => io::ErrorKind::ConnectionAborted,
        embedded_io::ErrorKind::NotConnected => io::ErrorKind::NotConnected,
        embedded_io::ErrorKind::AddrInUse => io::ErrorKind::AddrInUse,
        embedded_io::ErrorKind::AddrNotAvailable => io::ErrorKind::AddrNotAvailable,
        embedded_io::ErrorKind::BrokenPipe => io::ErrorKind::BrokenPipe,
        embedded_io::ErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
        embedded_io::ErrorKind::InvalidInput => io::ErrorKind::InvalidInput,
        embedded_io::ErrorKind::InvalidData => io::ErrorKind::InvalidData,
        embedded_io::ErrorKind::TimedOut => io::ErrorKind::TimedOut,
        embedded_io::ErrorKind::Interrupted => io::ErrorKind::Interrupted,
        embedded_io::ErrorKind::Unsupported => io::ErrorKind::Unsupported,
        embedded_io::ErrorKind::OutOfMemory => io::ErrorKind::OutOfMemory,
        _ => io::ErrorKind::Other,
    }
}

/// Convert error kind to a static string description
#[must_use]
pub fn error_kind_to_str(kind: embedded_io::ErrorKind) -> &'static str {
    match kind {
        embedded_io::ErrorKind::NotFound => "not found",
        embedded_io::ErrorKind::PermissionDenied => "permission denied",
        embedded_io::ErrorKind::ConnectionRefused => "connection refused",
        embedded_io::ErrorKind::ConnectionReset => "connection reset",
        embedded_io::ErrorKind::ConnectionAborted => "connection aborted",
        embedded_io::ErrorKind::NotConnected => "not connected",
        embedded_io::ErrorKind::AddrInUse => "address in use",
        embedded_io::ErrorKind::AddrNotAvailable => "address not available",
        embedded_io::ErrorKind::BrokenPipe => "broken pipe",
        embedded_io::ErrorKind::AlreadyExists => "already exists",
        embedded_io::ErrorKind::InvalidInput => "invalid input",
        embedded_io::ErrorKind::InvalidData => "invalid data",
        embedded_io::ErrorKind::TimedOut => "timed out",
        embedded_io::ErrorKind::Interrupted => "interrupted",
        embedded_io::ErrorKind::Unsupported => "unsupported",
        embedded_io::ErrorKind::OutOfMemory => "out of memory",
        embedded_io::ErrorKind::Other => "other error",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Error as _;

    #[test]
    fn test_closed_maps_to_broken_pipe() {
        assert_eq!(StreamError::OutputClosed.kind(), embedded_io::ErrorKind::BrokenPipe);
        let e: io::Error = StreamError::InputClosed.into();
        assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_end_of_stream_maps_to_unexpected_eof() {
        let e: io::Error = StreamError::NoMoreInput.into();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
        assert!(StreamError::NoMoreInput.is_end_of_stream());
        assert!(!StreamError::Overflow.is_end_of_stream());
    }

    #[test]
    fn test_io_error_round_trip() {
        let original = io::Error::new(io::ErrorKind::TimedOut, "slow peer");
        let e = StreamError::from(original);
        assert_eq!(e.kind(), embedded_io::ErrorKind::TimedOut);
        let back: io::Error = e.into();
        assert_eq!(back.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_error_kind_to_str() {
        assert_eq!(error_kind_to_str(embedded_io::ErrorKind::BrokenPipe), "broken pipe");
        assert_eq!(error_kind_to_str(embedded_io::ErrorKind::Other), "other error");
    }
}
