//! Validated subgraph replacement.
//!
//! - [`boundary`] - [`SubgraphBoundary`] and its input/output slots
//! - [`rewriter`] - [`SubgraphRewriter`], the splice-and-replace surgery

pub mod boundary;
pub mod rewriter;

pub use boundary::{SubgraphBoundary, SubgraphInput, SubgraphOutput};
pub use rewriter::SubgraphRewriter;
