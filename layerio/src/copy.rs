//! Buffered copy between streams

use crate::config::DEFAULT_BUFFER_SIZE;
use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;

/// Copy everything from `input` to `output` with the default buffer size
///
/// # Errors
/// Any failure of either stream other than end of input.
pub fn copy<A, B>(input: &Input<A>, output: &Output<B>) -> Result<u64>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    copy_with_buffer_size(input, output, DEFAULT_BUFFER_SIZE)
}

/// Copy everything from `input` to `output` through a buffer of
/// `buffer_size` bytes, returning the number of bytes copied.
///
/// Neither stream is closed or flushed.
///
/// # Errors
/// `InvalidArgument` for a zero buffer size; any failure of either stream
/// other than end of input, unchanged.
pub fn copy_with_buffer_size<A, B>(
    input: &Input<A>,
    output: &Output<B>,
    buffer_size: usize,
) -> Result<u64>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    if buffer_size == 0 {
        return Err(StreamError::invalid("copy buffer size must be positive"));
    }
    let mut buf = vec![0u8; buffer_size];
    let mut total: u64 = 0;
    loop {
        let n = match input.read_bulk(&mut buf, 0, buffer_size) {
            Ok(n) => n,
            Err(StreamError::NoMoreInput) => break,
            Err(e) => {
                tracing::debug!(from = %input.id(), to = %output.id(), copied = total, error = %e, "copy failed reading");
                return Err(e);
            }
        };
        output.write_exact(&buf, 0, n)?;
        total += n as u64;
    }
    tracing::debug!(from = %input.id(), to = %output.id(), copied = total, "copy finished");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{input_bytes, output_buffer};

    #[test]
    fn test_copy_small_buffer() {
        let data: Vec<u8> = (0..=255).collect();
        let input = input_bytes(data.clone());
        let output = output_buffer();
        assert_eq!(copy_with_buffer_size(&input, &output, 1).unwrap(), 256);
        assert_eq!(output.close().unwrap(), data);
        assert!(!input.is_closed());
    }

    #[test]
    fn test_copy_zero_buffer_rejected() {
        let input = input_bytes(b"x".to_vec());
        let output = output_buffer();
        let err = copy_with_buffer_size(&input, &output, 0).unwrap_err();
        assert!(matches!(err, StreamError::InvalidArgument(_)));
    }

    #[test]
    fn test_copy_into_closed_output_fails() {
        let input = input_bytes(b"data".to_vec());
        let output = output_buffer();
        output.close().unwrap();
        assert!(matches!(copy(&input, &output), Err(StreamError::OutputClosed)));
    }
}
