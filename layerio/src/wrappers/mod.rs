//! Stock wrapping streams
//!
//! Each wrapper is built with the wrapping constructor, so it registers with
//! the streams it was layered over. Unless built as owned, closing a wrapper
//! leaves those streams open.

pub mod chain;
pub mod counting;
pub mod tab;
pub mod tee;

pub use chain::{chain_inputs, chain_inputs_owned};
pub use counting::{counting_input, counting_output, Position};
pub use tab::tab_output;
pub use tee::{tee, tee_owned};
