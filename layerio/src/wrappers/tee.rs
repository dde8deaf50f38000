//! Output duplicating every write to several outputs

use crate::capability::{Closable, Writable};
use crate::dependency::Dependency;
use crate::error::Result;
use crate::output::Output;
use crate::stream::Ownership;

struct TeeSink<A> {
    targets: Vec<Output<A>>,
}

impl<A: Clone + Send + 'static> Writable for TeeSink<A> {
    fn write_from(&mut self, buf: &[u8]) -> Result<usize> {
        for target in &self.targets {
            target.write_all(buf)?;
        }
        Ok(buf.len())
    }
}

impl<A> Closable for TeeSink<A> {
    type Acc = ();

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Write everything to each of `outputs`, in order. Closing the tee flushes
/// the outputs and leaves them open.
///
/// # Errors
/// `InvalidArgument` if `outputs` is empty.
pub fn tee<A: Clone + Send + 'static>(outputs: &[Output<A>]) -> Result<Output> {
    tee_with(outputs, Ownership::Borrowed)
}

/// Like [`tee`]; closing the tee also closes every output
///
/// # Errors
/// `InvalidArgument` if `outputs` is empty.
pub fn tee_owned<A: Clone + Send + 'static>(outputs: &[Output<A>]) -> Result<Output> {
    tee_with(outputs, Ownership::Owned)
}

fn tee_with<A: Clone + Send + 'static>(outputs: &[Output<A>], ownership: Ownership) -> Result<Output> {
    let deps: Vec<Dependency> = outputs.iter().map(Output::as_dependency).collect();
    Output::wrap(
        TeeSink {
            targets: outputs.to_vec(),
        },
        deps,
        ownership,
    )
}
