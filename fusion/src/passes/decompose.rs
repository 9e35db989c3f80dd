//! Single-node decomposition passes.

use graft_ir::{ComputeGraph, InAnchor, Node, NodeId, NodeIo};
use snafu::ResultExt;
use tracing::{debug, trace};

use super::{FusionBasePass, PassContext, PassStatus};
use crate::error::{PassSnafu, Result};
use crate::provenance::PassScope;
use crate::rewrite::{SubgraphBoundary, SubgraphInput, SubgraphOutput, SubgraphRewriter};

/// Hooks of a decomposition pass. Run it through [`Decompose`].
pub trait DecomposePass {
    fn name(&self) -> &str;

    /// Operator types this pass rewrites.
    fn op_types(&self) -> &[&str];

    fn meet_requirements(&self, _node: &Node) -> bool {
        true
    }

    /// Replacement for `node`: Data `i` stands for input `i`, output `j` for
    /// output port `j`.
    fn replacement(&self, node: &Node) -> Result<ComputeGraph>;
}

/// Drives a [`DecomposePass`] over every node of a registered type.
#[derive(Debug, Clone, Default)]
pub struct Decompose<D> {
    pass: D,
}

impl<D: DecomposePass> Decompose<D> {
    pub fn new(pass: D) -> Self {
        Self { pass }
    }

    pub fn inner(&self) -> &D {
        &self.pass
    }
}

/// Boundary made of the node's own anchors, or `None` if an input is
/// unconnected.
fn node_boundary(graph: &ComputeGraph, node: &Node) -> Result<Option<SubgraphBoundary>> {
    let mut boundary = SubgraphBoundary::new();
    for index in 0..node.num_inputs() {
        if node.input(index).is_none() {
            return Ok(None);
        }
        let mut input = SubgraphInput::default();
        input.add_input(graph, InAnchor::new(node.id(), index as u32))?;
        boundary.add_input(index, input)?;
    }
    for index in 0..node.num_outputs() {
        let mut output = SubgraphOutput::default();
        output.set_output(graph, NodeIo::new(node.id(), index as u32))?;
        boundary.add_output(index, output)?;
    }
    Ok(Some(boundary))
}

impl<D: DecomposePass> FusionBasePass for Decompose<D> {
    fn name(&self) -> &str {
        self.pass.name()
    }

    fn run(&mut self, graph: &mut ComputeGraph, _ctx: &mut PassContext) -> Result<PassStatus> {
        let name = self.pass.name();
        let candidates: Vec<NodeId> = graph
            .nodes()
            .filter(|n| self.pass.op_types().contains(&n.op_type()))
            .map(Node::id)
            .collect();

        let mut replaced = 0;
        for id in candidates {
            let Some(node) = graph.node(id) else { continue };
            if !self.pass.meet_requirements(node) {
                continue;
            }
            let Some(boundary) = node_boundary(graph, node).context(PassSnafu { pass: name })? else {
                trace!(pass = name, node = %id, "skipping node with unconnected inputs");
                continue;
            };
            let replacement = self.pass.replacement(node).context(PassSnafu { pass: name })?;

            let snapshot = graph.clone();
            let result = {
                let _scope = PassScope::enter(name);
                SubgraphRewriter::replace(graph, &boundary, &replacement)
            };
            if let Err(e) = result {
                *graph = snapshot;
                return Err(e).context(PassSnafu { pass: name });
            }
            replaced += 1;
        }
        debug!(pass = name, replaced, "decomposition finished");
        Ok(if replaced > 0 { PassStatus::Changed } else { PassStatus::NotChanged })
    }
}
