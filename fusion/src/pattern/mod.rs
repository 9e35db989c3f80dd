//! Pattern templates and the backtracking matcher.
//!
//! A [`Pattern`] owns a small template graph. Its graph outputs, in declared
//! order, are the pattern *output slots*; its `Data` nodes are wildcards that
//! become the external inputs of every match.
//!
//! # Module Organization
//!
//! - [`role`] - Node roles (Data / Constant / Operator) and their matchers
//! - [`coordinate`] - Candidate sequences per output slot
//! - [`result`] - [`MatchResult`], the mapping produced by one match
//! - [`matcher`] - [`PatternMatcher`], the enumeration driver

pub mod coordinate;
pub mod matcher;
pub mod result;
pub mod role;

use std::collections::BTreeSet;

use graft_ir::{ComputeGraph, NodeId, NodeIo};

use crate::error::{InvalidPatternSnafu, Result};

pub use coordinate::{Cursor, MatchCoordinate, MatchCoordinateSeq};
pub use matcher::PatternMatcher;
pub use result::MatchResult;
pub use role::NodeRole;

/// Template graph plus an ordered list of captured tensors.
#[derive(Debug, Clone)]
pub struct Pattern {
    graph: ComputeGraph,
    captures: Vec<NodeIo>,
}

impl Pattern {
    pub fn new(graph: ComputeGraph) -> Self {
        Self { graph, captures: Vec::new() }
    }

    /// Register `tensor` as the next capture index.
    ///
    /// Captures must be registered before the pattern is handed to a matcher.
    pub fn capture_tensor(&mut self, tensor: NodeIo) -> &mut Self {
        self.captures.push(tensor);
        self
    }

    pub fn graph(&self) -> &ComputeGraph {
        &self.graph
    }

    pub fn name(&self) -> &str {
        self.graph.name()
    }

    pub fn captured_tensors(&self) -> &[NodeIo] {
        &self.captures
    }

    /// Output slots in declared order.
    pub fn outputs(&self) -> &[NodeIo] {
        self.graph.outputs()
    }

    /// Check the structural requirements a matcher relies on.
    pub fn validate(&self) -> Result<()> {
        let graph = &self.graph;
        let fail = |reason: String| InvalidPatternSnafu { pattern: graph.name().to_string(), reason }.fail();

        if graph.topological_order().is_err() {
            return fail("pattern graph is not a DAG".into());
        }

        for node in graph.nodes() {
            if !node.subgraphs().is_empty() {
                return fail(format!("node '{}' owns nested subgraphs", node.name()));
            }
            if node.has_dynamic_io() {
                return fail(format!("node '{}' has dynamic io", node.name()));
            }
            for &succ in node.control_outputs() {
                let allowed = node.is_data()
                    || node.is_net_output()
                    || graph.node(succ).is_some_and(|s| s.is_data() || s.is_net_output());
                if !allowed {
                    return fail(format!("control edge {} -> {succ} between operator nodes", node.id()));
                }
            }
        }

        let outputs = graph.outputs();
        if outputs.is_empty() {
            return fail("no outputs declared".into());
        }
        for &output in outputs {
            if graph.check_output(output).is_err() {
                return fail(format!("output {output} does not exist"));
            }
            if graph.node(output.node).is_some_and(|n| n.is_data()) {
                return fail(format!("output {output} is a Data wildcard"));
            }
        }

        let mut indices = Vec::new();
        for node in graph.nodes().filter(|n| n.is_data()) {
            match node.data_index() {
                Some(index) => indices.push(index),
                None => return fail(format!("Data node '{}' has no index", node.name())),
            }
        }
        indices.sort_unstable();
        let expected: Vec<i64> = (0..indices.len() as i64).collect();
        if indices != expected {
            return fail(format!("Data indices {indices:?} are not unique and contiguous from 0"));
        }

        let reachable = self.output_ancestors();
        if let Some(orphan) = graph.nodes().find(|n| !n.is_net_output() && !reachable.contains(&n.id())) {
            return fail(format!("node '{}' does not reach any output", orphan.name()));
        }

        for &capture in &self.captures {
            if graph.check_output(capture).is_err() {
                return fail(format!("captured tensor {capture} does not exist"));
            }
        }
        Ok(())
    }

    /// Nodes with a data path to some output slot (outputs included).
    fn output_ancestors(&self) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<NodeId> = self.outputs().iter().map(|o| o.node).collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.graph.node(id) {
                stack.extend(node.inputs().iter().flatten().map(|p| p.node));
            }
        }
        seen
    }
}
