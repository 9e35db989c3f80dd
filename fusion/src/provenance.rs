//! Provenance stamping for rewritten nodes.
//!
//! Every node introduced by [`SubgraphRewriter`](crate::SubgraphRewriter)
//! records which original nodes it replaced and which pass produced it:
//!
//! - `_origin_op_types` - operator types of the replaced nodes
//! - `_origin_op_names` - names of the replaced nodes
//! - `_fusion_pass` - name of the active pass
//!
//! Replacing nodes that were themselves produced by a rewrite accumulates
//! their origin lists instead of their synthesized names, so provenance always
//! points back at nodes of the source graph.
//!
//! The active pass name lives in a thread-local stack managed by [`PassScope`].

use std::cell::RefCell;
use std::marker::PhantomData;

use graft_ir::{AttrValue, ComputeGraph, Node, NodeId};

pub const ATTR_ORIGIN_OP_TYPES: &str = "_origin_op_types";
pub const ATTR_ORIGIN_OP_NAMES: &str = "_origin_op_names";
pub const ATTR_FUSION_PASS: &str = "_fusion_pass";

/// Caller-assigned scheduling attributes carried over to replacement nodes.
pub const INHERITED_ATTRS: &[&str] = &["_user_stream_label", "_user_stream_priority"];

/// Pass name recorded when no [`PassScope`] is active.
pub const DEFAULT_PASS_NAME: &str = "manual_rewrite";

thread_local! {
    static ACTIVE_PASSES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// RAII guard marking a pass as active on the current thread.
///
/// Scopes nest; the innermost one names the pass.
#[derive(Debug)]
#[must_use = "the pass is only active while the scope is alive"]
pub struct PassScope {
    _not_send: PhantomData<*const ()>,
}

impl PassScope {
    pub fn enter(name: impl Into<String>) -> Self {
        ACTIVE_PASSES.with_borrow_mut(|stack| stack.push(name.into()));
        Self { _not_send: PhantomData }
    }
}

impl Drop for PassScope {
    fn drop(&mut self) {
        ACTIVE_PASSES.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

/// Name of the innermost active pass, or [`DEFAULT_PASS_NAME`].
pub fn active_pass_name() -> String {
    ACTIVE_PASSES.with_borrow(|stack| stack.last().cloned()).unwrap_or_else(|| DEFAULT_PASS_NAME.to_string())
}

/// Origin lists gathered from the nodes being replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Origins {
    pub op_types: Vec<String>,
    pub op_names: Vec<String>,
}

impl Origins {
    pub fn collect(graph: &ComputeGraph, originals: impl IntoIterator<Item = NodeId>) -> Self {
        let mut origins = Self::default();
        for node in originals.into_iter().filter_map(|id| graph.node(id)) {
            let types = node.attr(ATTR_ORIGIN_OP_TYPES).and_then(AttrValue::as_str_list);
            let names = node.attr(ATTR_ORIGIN_OP_NAMES).and_then(AttrValue::as_str_list);
            match (types, names) {
                (Some(types), Some(names)) => {
                    origins.op_types.extend(types.iter().cloned());
                    origins.op_names.extend(names.iter().cloned());
                }
                _ => {
                    origins.op_types.push(node.op_type().to_string());
                    origins.op_names.push(node.name().to_string());
                }
            }
        }
        origins
    }

    pub fn stamp(&self, node: &mut Node, pass: &str) {
        node.set_attr(ATTR_ORIGIN_OP_TYPES, self.op_types.clone());
        node.set_attr(ATTR_ORIGIN_OP_NAMES, self.op_names.clone());
        node.set_attr(ATTR_FUSION_PASS, pass);
    }
}

/// Value of inherited attribute `name` for a replacement node of `op_type`.
///
/// An original of the same operator type wins; otherwise the value is used
/// only when every original carrying the attribute agrees on it.
pub(crate) fn inherited_value(
    graph: &ComputeGraph,
    originals: &[NodeId],
    op_type: &str,
    name: &str,
) -> Option<AttrValue> {
    let carriers: Vec<&Node> =
        originals.iter().filter_map(|&id| graph.node(id)).filter(|n| n.attr(name).is_some()).collect();

    if let Some(same) = carriers.iter().find(|n| n.op_type() == op_type) {
        return same.attr(name).cloned();
    }
    let first = carriers.first()?.attr(name)?;
    carriers.iter().all(|n| n.attr(name).is_some_and(|v| v.bytes_eq(first))).then(|| first.clone())
}
