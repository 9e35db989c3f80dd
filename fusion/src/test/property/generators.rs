//! Generators for property-based testing.
//!
//! Random DAGs are described as a list of nodes whose inputs only refer to
//! earlier nodes, so every generated graph is acyclic by construction.

use graft_ir::{ComputeGraph, GraphBuilder, NodeIo};
use proptest::prelude::*;

/// Operator types of generated target graphs.
pub const OP_TYPES: &[&str] = &["Abs", "Exp", "Relu", "Add", "Mul"];

/// Unary operator types usable in generated chain patterns.
pub const UNARY_OPS: &[&str] = &["Abs", "Exp", "Relu"];

/// Shape of a random DAG: per node, an operator index and input picks.
#[derive(Debug, Clone)]
pub struct DagSpec {
    pub inputs: usize,
    pub nodes: Vec<(usize, Vec<usize>)>,
}

impl DagSpec {
    /// Materialize the spec; the last value is the graph output.
    pub fn build(&self) -> ComputeGraph {
        let mut b = GraphBuilder::new("random_dag");
        let mut values: Vec<NodeIo> = (0..self.inputs as i64).map(|i| b.data(i)).collect();
        for (op, picks) in &self.nodes {
            let op_type = OP_TYPES[*op % OP_TYPES.len()];
            let arity = if matches!(op_type, "Add" | "Mul") { 2 } else { 1 };
            let inputs: Vec<NodeIo> = (0..arity).map(|i| values[picks[i % picks.len()] % values.len()]).collect();
            values.push(b.op(op_type, &inputs));
        }
        let last = *values.last().expect("at least one input");
        b.build(&[last]).expect("generated DAG is well formed")
    }
}

pub fn arb_dag() -> impl Strategy<Value = DagSpec> {
    (1usize..3, prop::collection::vec((0usize..16, prop::collection::vec(0usize..64, 1..3)), 1..24))
        .prop_map(|(inputs, nodes)| DagSpec { inputs, nodes })
}

/// Operator sequence for [`chain_pattern`](crate::test::helpers::chain_pattern).
pub fn arb_chain() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(UNARY_OPS), 1..3)
}
