//! Error types for matching, boundary bookkeeping and rewriting.

use graft_ir::{InAnchor, NodeId, NodeIo};
use snafu::Snafu;

/// Result type for fusion operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the fusion engine.
///
/// Rewrite validation errors are raised before the target graph is touched;
/// [`Error::CycleIntroduced`] is the only rewrite error raised after mutation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Graph IR operation failed.
    #[snafu(display("graph error: {source}"))]
    Graph { source: graft_ir::Error },

    // =========================================================================
    // Pattern validation
    // =========================================================================
    /// Pattern graph violates a structural requirement.
    #[snafu(display("invalid pattern '{pattern}': {reason}"))]
    InvalidPattern { pattern: String, reason: String },

    // =========================================================================
    // Match results
    // =========================================================================
    /// A pattern node was mapped to two different target nodes, or two pattern
    /// nodes to one target node.
    #[snafu(display("inconsistent mapping: pattern node {pattern} vs target node {target}"))]
    InconsistentMapping { pattern: NodeId, target: NodeId },

    /// Capture index was not resolved by this match.
    #[snafu(display("captured tensor {index} was not resolved by this match"))]
    CaptureNotResolved { index: usize },

    /// Pattern declares no outputs, so no boundary can be derived.
    #[snafu(display("pattern '{pattern}' declares no outputs"))]
    NoPatternOutputs { pattern: String },

    /// Output slot resolved to zero or several producers.
    #[snafu(display("pattern output {index} resolved to {count} producers, expected exactly one"))]
    AmbiguousOutput { index: usize, count: usize },

    // =========================================================================
    // Boundary bookkeeping
    // =========================================================================
    /// Boundary input fed by a second, different producer.
    #[snafu(display("subgraph input consumer {consumer} is fed by {actual}, but the input producer is {expected}"))]
    ProducerConflict { consumer: InAnchor, expected: NodeIo, actual: NodeIo },

    /// Boundary input consumer has no producer.
    #[snafu(display("subgraph input consumer {consumer} has no producer"))]
    UnconnectedInput { consumer: InAnchor },

    /// Consumer registered twice on the same input.
    #[snafu(display("consumer {consumer} is already registered"))]
    DuplicateConsumer { consumer: InAnchor },

    /// Output slot already set.
    #[snafu(display("subgraph output is already set to {current}"))]
    OutputAlreadySet { current: NodeIo },

    /// Anchor does not name an existing node port.
    #[snafu(display("anchor {anchor} does not exist: {source}"))]
    DanglingAnchor { anchor: NodeIo, source: graft_ir::Error },

    /// Boundary slot index already used.
    #[snafu(display("boundary {kind} index {index} is already used"))]
    IndexAlreadyUsed { kind: &'static str, index: usize },

    /// Boundary input index missing.
    #[snafu(display("boundary input {index} not found"))]
    InputNotFound { index: usize },

    /// Boundary output index missing.
    #[snafu(display("boundary output {index} not found"))]
    OutputNotFound { index: usize },

    /// Boundary slot without a producer.
    #[snafu(display("boundary {kind} {index} has no producer"))]
    EmptySlot { kind: &'static str, index: usize },

    // =========================================================================
    // Rewrite validation (no mutation has happened)
    // =========================================================================
    /// Replacement input count differs from the boundary.
    #[snafu(display("replacement has {replacement} inputs, not equal with boundary input size {boundary}"))]
    InputCountMismatch { replacement: usize, boundary: usize },

    /// Replacement output count differs from the boundary.
    #[snafu(display("replacement has {replacement} outputs, not equal with boundary output size {boundary}"))]
    OutputCountMismatch { replacement: usize, boundary: usize },

    /// Boundary slot indices are not `0..n`.
    #[snafu(display("boundary {kind} indices {indices:?} are not contiguous from 0"))]
    NonContiguousBoundary { kind: &'static str, indices: Vec<usize> },

    /// Boundary references a node that is not part of the target graph.
    #[snafu(display("boundary references {node}, which is not a node of target graph '{graph}'"))]
    CrossGraphBoundary { node: NodeId, graph: String },

    /// Enclosed node feeds an undeclared external consumer.
    #[snafu(display("boundary is not self contained: {producer} feeds external {consumer}"))]
    NotSelfContained { producer: NodeIo, consumer: String },

    /// Replacement graph is malformed.
    #[snafu(display("invalid replacement '{graph}': {reason}"))]
    InvalidReplacement { graph: String, reason: String },

    // =========================================================================
    // Rewrite after mutation
    // =========================================================================
    /// Splice created a dependency cycle; the graph is left mutated.
    #[snafu(display("replacement introduced a cycle into graph '{graph}'"))]
    CycleIntroduced { graph: String },

    // =========================================================================
    // Passes
    // =========================================================================
    /// A pass failed.
    #[snafu(display("fusion pass '{pass}' failed: {source}"))]
    Pass {
        pass: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },

    /// A pass kept reporting changes past the iteration limit.
    #[snafu(display("fusion pass '{pass}' did not reach a fixpoint after {iterations} iterations"))]
    NoFixpoint { pass: String, iterations: usize },
}
