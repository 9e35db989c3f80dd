//! Identity types for graph elements.
//!
//! Nodes live in a per-graph arena and are addressed by [`NodeId`], which
//! embeds the owning [`GraphId`]. Tensors are addressed by an output anchor
//! ([`NodeIo`]) and edges terminate at an input anchor ([`InAnchor`]).

use std::sync::atomic::{AtomicU32, Ordering};

use derive_more::Display;

/// Operator type of a free graph input.
pub const DATA: &str = "Data";

/// Operator type of the node that declares graph outputs.
pub const NET_OUTPUT: &str = "NETOUTPUT";

/// Operator types recognized as constant producers.
pub const CONSTANT_TYPES: &[&str] = &["Const", "Constant"];

/// Attribute carrying the input index of a `Data` node.
pub const ATTR_INDEX: &str = "index";

/// Attribute carrying the payload of a constant node.
pub const ATTR_VALUE: &str = "value";

/// Process-unique graph identity.
///
/// Cloning a graph keeps its id, so a snapshot can be restored in place
/// without invalidating node ids held by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("g{_0}")]
pub struct GraphId(u32);

impl GraphId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Arena slot of a node. Slots are never reused, so `index` order is
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{graph}:n{index}")]
pub struct NodeId {
    pub graph: GraphId,
    pub index: u32,
}

/// Output anchor: a (node, output port) pair used as a tensor reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{node}.out{index}")]
pub struct NodeIo {
    pub node: NodeId,
    pub index: u32,
}

impl NodeIo {
    pub fn new(node: NodeId, index: u32) -> Self {
        Self { node, index }
    }
}

/// Input anchor: a (node, input port) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{node}.in{index}")]
pub struct InAnchor {
    pub node: NodeId,
    pub index: u32,
}

impl InAnchor {
    pub fn new(node: NodeId, index: u32) -> Self {
        Self { node, index }
    }
}

/// Element type of a constant tensor payload.
///
/// The discriminant is the tag byte of the canonical attribute encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum DataType {
    Bool,
    Int8,
    Int32,
    Int64,
    UInt8,
    Float16,
    BFloat16,
    Float32,
    Float64,
}
