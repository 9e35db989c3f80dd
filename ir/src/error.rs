use snafu::Snafu;

use crate::types::{GraphId, InAnchor, NodeId, NodeIo};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Node id does not refer to a live node of this graph.
    #[snafu(display("node {node} not found in graph {graph}"))]
    NodeNotFound { node: NodeId, graph: GraphId },

    /// Node id belongs to a different graph.
    #[snafu(display("node {node} belongs to graph {}, not graph {expected}", node.graph))]
    ForeignNode { node: NodeId, expected: GraphId },

    /// Output port index out of range.
    #[snafu(display("output port {} out of range: node {} has {count} outputs", anchor.index, anchor.node))]
    OutputOutOfRange { anchor: NodeIo, count: usize },

    /// Input port index out of range.
    #[snafu(display("input port {} out of range: node {} has {count} inputs", anchor.index, anchor.node))]
    InputOutOfRange { anchor: InAnchor, count: usize },

    /// Input anchor already has a producer.
    #[snafu(display("input {anchor} is already connected to {producer}"))]
    InputAlreadyConnected { anchor: InAnchor, producer: NodeIo },

    /// Control edge would connect a node to itself.
    #[snafu(display("control edge from {node} to itself"))]
    SelfControlEdge { node: NodeId },

    /// Graph contains a dependency cycle.
    #[snafu(display("graph '{graph}' contains a cycle through {remaining} nodes"))]
    GraphHasCycle { graph: String, remaining: usize },

    /// Builder received an anchor it did not create.
    #[snafu(display("builder for '{graph}' received foreign anchor {anchor}"))]
    ForeignAnchor { graph: String, anchor: NodeIo },

    /// Data node index declared twice.
    #[snafu(display("data index {index} declared twice in graph '{graph}'"))]
    DuplicateDataIndex { graph: String, index: i64 },
}
