//! Dependency edges between streams
//!
//! A wrapping stream holds a [`Dependency`] for every stream it was layered
//! over. The edge keeps the underlying stream alive and tells the wrapper what
//! to flush (borrowed wrap) or close (owned wrap) when it closes. The underlying
//! stream keeps only a weak back-link, used to pull buffered bytes out of the
//! wrapper before the underlying stream flushes or closes itself.
//!
//! ```text
//!   tee ──▶ counting ──▶ file
//!     └──────────────▶ socket
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::Result;
use crate::idgen::StreamId;
use crate::stream::{Ownership, StreamHeader, StreamKind};

/// Type-erased view of a stream's lifecycle
pub(crate) trait Lifecycle: Send + Sync {
    fn header(&self) -> &StreamHeader;

    fn is_closed(&self) -> bool;

    /// Move this stream's buffered output downstream, after doing the same
    /// for every open stream layered over it. Does not flush dependencies.
    fn flush_buffers(&self) -> Result<()>;

    /// `flush_buffers` followed by a flush of the outputs this stream writes to
    fn flush_stream(&self) -> Result<()>;

    /// Close, discarding the accumulator
    fn close_stream(&self) -> Result<()>;
}

/// Handle to a stream used as the base of a wrapping stream
#[derive(Clone)]
pub struct Dependency {
    node: Arc<dyn Lifecycle>,
}

impl Dependency {
    pub(crate) fn from_node(node: Arc<dyn Lifecycle>) -> Self {
        Self { node }
    }

    pub(crate) fn node(&self) -> &Arc<dyn Lifecycle> {
        &self.node
    }

    #[must_use]
    pub fn id(&self) -> StreamId {
        self.node.header().id
    }

    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.node.header().kind
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.node.is_closed()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.node.header().label
    }

    /// Close the stream behind this edge, discarding its accumulator
    ///
    /// # Errors
    /// Failure of the stream's close callback.
    pub fn close(&self) -> Result<()> {
        self.node.close_stream()
    }

    /// Render the dependency tree rooted at this stream
    #[must_use]
    pub fn describe(&self) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();
        describe_recursive(&self.node, "", true, &mut output, &mut visited);
        output
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dependency({} {}, closed={})",
            self.label(),
            self.id(),
            self.is_closed()
        )
    }
}

fn describe_recursive(
    node: &Arc<dyn Lifecycle>,
    prefix: &str,
    is_last: bool,
    output: &mut String,
    visited: &mut HashSet<StreamId>,
) {
    let header = node.header();
    let connector = if is_last { "└── " } else { "├── " };
    let state = if node.is_closed() { "closed" } else { "open" };
    let owned = match header.ownership {
        Ownership::Owned if !header.deps.is_empty() => ", owns deps",
        _ => "",
    };
    let _ = writeln!(
        output,
        "{prefix}{connector}{} {} [{state}{owned}]",
        header.label, header.id
    );

    // `visited` holds the current path only: a base shared by two branches is printed under both
    if !visited.insert(header.id) {
        let extension = if is_last { "    " } else { "│   " };
        let _ = writeln!(output, "{prefix}{extension}[circular reference]");
        return;
    }

    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    for (idx, dep) in header.deps.iter().enumerate() {
        let is_last_child = idx == header.deps.len() - 1;
        describe_recursive(dep.node(), &child_prefix, is_last_child, output, visited);
    }

    visited.remove(&header.id);
}
