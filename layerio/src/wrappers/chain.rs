//! Sequential reader over several inputs
//!
//! When the current input reaches end of stream, reading moves on to the next
//! one. The chain ends when the last input is exhausted. The chained inputs
//! are not closed when they run out; closing them is up to their owner unless
//! the chain was built with [`Ownership::Owned`].

use std::collections::VecDeque;

use crate::capability::{Closable, Readable};
use crate::dependency::Dependency;
use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::stream::Ownership;

struct ChainSource<A> {
    pending: VecDeque<Input<A>>,
}

impl<A: Clone + Send + 'static> Readable for ChainSource<A> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while let Some(current) = self.pending.front() {
            match current.read_available(buf)? {
                0 => {
                    log::debug!("chain: input {} exhausted, moving on", current.id());
                    self.pending.pop_front();
                }
                n => return Ok(n),
            }
        }
        Ok(0)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        while let Some(current) = self.pending.front() {
            match current.read_byte() {
                Ok(byte) => return Ok(Some(byte)),
                Err(StreamError::NoMoreInput) => {
                    self.pending.pop_front();
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

impl<A> Closable for ChainSource<A> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        self.pending.clear();
        Ok(())
    }
}

/// Read `inputs` one after another
///
/// # Errors
/// `InvalidArgument` if `inputs` is empty.
pub fn chain_inputs<A: Clone + Send + 'static>(inputs: &[Input<A>]) -> Result<Input> {
    chain_inputs_with(inputs, Ownership::Borrowed)
}

/// Like [`chain_inputs`]; closing the chain also closes every input
///
/// # Errors
/// `InvalidArgument` if `inputs` is empty.
pub fn chain_inputs_owned<A: Clone + Send + 'static>(inputs: &[Input<A>]) -> Result<Input> {
    chain_inputs_with(inputs, Ownership::Owned)
}

fn chain_inputs_with<A: Clone + Send + 'static>(
    inputs: &[Input<A>],
    ownership: Ownership,
) -> Result<Input> {
    let deps: Vec<Dependency> = inputs.iter().map(Input::as_dependency).collect();
    Input::wrap(
        ChainSource {
            pending: inputs.iter().cloned().collect(),
        },
        deps,
        ownership,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::input_bytes;

    #[test]
    fn test_reads_inputs_in_order() {
        let a = input_bytes(b"ab".to_vec());
        let b = input_bytes(Vec::new());
        let c = input_bytes(b"cd".to_vec());
        let chain = chain_inputs(&[a.clone(), b, c]).unwrap();
        assert_eq!(chain.read_byte().unwrap(), b'a');
        assert_eq!(chain.read_all().unwrap(), b"bcd");
        chain.close().unwrap();
        assert!(!a.is_closed());
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = chain_inputs::<()>(&[]).unwrap_err();
        assert!(matches!(err, StreamError::InvalidArgument(_)));
    }

    #[test]
    fn test_owned_chain_closes_inputs() {
        let a = input_bytes(b"a".to_vec());
        let b = input_bytes(b"b".to_vec());
        let chain = chain_inputs_owned(&[a.clone(), b.clone()]).unwrap();
        chain.close().unwrap();
        assert!(a.is_closed());
        assert!(b.is_closed());
    }
}
