//! Common imports for working with graphs.
//!
//! ```rust,ignore
//! use graft_ir::prelude::*;
//! ```

pub use crate::attr::{AttrValue, TensorValue};
pub use crate::builder::GraphBuilder;
pub use crate::cycle::{CycleDetector, ReachabilityDetector};
pub use crate::graph::ComputeGraph;
pub use crate::node::Node;
pub use crate::types::{DataType, InAnchor, NodeId, NodeIo};
