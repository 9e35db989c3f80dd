//! Node roles and role-specific node matchers.

use std::collections::BTreeSet;

use graft_ir::Node;

use crate::config::MatcherConfig;

/// Identity shared by every constant producer, regardless of its op type.
pub const CONSTANT_IDENTITY: &str = "Constant";

/// Role of a pattern node, decided once from the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Free input wildcard; matches any producer and marks a boundary input.
    Data { index: i64 },
    /// Matches any constant producer.
    Constant,
    /// Matches nodes of the same operator type.
    Operator,
}

impl NodeRole {
    pub fn of(node: &Node) -> Self {
        if node.is_data() {
            NodeRole::Data { index: node.data_index().unwrap_or_default() }
        } else if node.is_constant() {
            NodeRole::Constant
        } else {
            NodeRole::Operator
        }
    }

    pub fn is_data(self) -> bool {
        matches!(self, NodeRole::Data { .. })
    }

    /// Does `target` satisfy pattern node `pattern` playing this role?
    pub fn matches(self, pattern: &Node, target: &Node, config: &MatcherConfig) -> bool {
        match self {
            NodeRole::Data { .. } => true,
            NodeRole::Constant => target.is_constant() && (!config.match_const_value || const_value_eq(pattern, target)),
            NodeRole::Operator => {
                pattern.op_type() == target.op_type() && (!config.match_ir_attrs || ir_attrs_eq(pattern, target))
            }
        }
    }
}

/// Operator type, or [`CONSTANT_IDENTITY`] for any constant producer.
pub fn matchable_identity(node: &Node) -> &str {
    if node.is_constant() { CONSTANT_IDENTITY } else { node.op_type() }
}

// A pattern constant without payload accepts every payload.
fn const_value_eq(pattern: &Node, target: &Node) -> bool {
    match (pattern.constant_value(), target.constant_value()) {
        (None, _) => true,
        (Some(p), Some(t)) => p.bytes_eq(t),
        (Some(_), None) => false,
    }
}

fn ir_attrs_eq(pattern: &Node, target: &Node) -> bool {
    let names: BTreeSet<&String> = pattern.ir_attr_names().iter().chain(target.ir_attr_names()).collect();
    names.into_iter().all(|name| match (pattern.attr(name), target.attr(name)) {
        (None, None) => true,
        (Some(p), Some(t)) => p.bytes_eq(t),
        _ => false,
    })
}
