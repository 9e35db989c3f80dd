//! Graph IR for the graft fusion engine.
//!
//! This crate defines the mutable dataflow graph that fusion patterns are
//! matched against and rewritten in.
//!
//! # Module Organization
//!
//! - [`types`] - Node, anchor and graph identities plus well-known operator names
//! - [`attr`] - Typed attribute values with byte-exact comparison
//! - [`node`] - Node records stored in the graph arena
//! - [`graph`] - [`ComputeGraph`], the arena-backed graph
//! - [`builder`] - [`GraphBuilder`] for authoring patterns and replacements
//! - [`cycle`] - Cycle detection used to guard fusion
//! - [`error`] - Error types and result handling

pub mod attr;
pub mod builder;
pub mod cycle;
mod debug;
pub mod error;
pub mod graph;
pub mod node;
pub mod prelude;
pub mod types;


pub use attr::{AttrValue, TensorValue};
pub use builder::GraphBuilder;
pub use cycle::{CycleDetector, ReachabilityDetector};
pub use error::{Error, Result};
pub use graph::ComputeGraph;
pub use node::Node;
pub use types::{
    ATTR_INDEX, ATTR_VALUE, CONSTANT_TYPES, DATA, DataType, GraphId, InAnchor, NET_OUTPUT, NodeId, NodeIo,
};
