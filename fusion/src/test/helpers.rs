//! Graph and pattern builders shared by the fusion tests.

use graft_ir::{ComputeGraph, GraphBuilder, NodeIo};

use crate::pattern::Pattern;

/// Target graph of `blocks` chained `Abs -> {Exp, Relu} -> Add` blocks.
///
/// ```text
/// data_0 -> abs_0 -> exp_0  -> add_0 -> abs_1 -> ...
///                 -> relu_0 ->
/// ```
///
/// The last `Add` is the graph output.
pub fn abs_exp_relu_blocks(blocks: usize) -> ComputeGraph {
    let mut b = GraphBuilder::new("blocks");
    let mut x = b.data(0);
    for _ in 0..blocks {
        let abs = b.op("Abs", &[x]);
        let exp = b.op("Exp", &[abs]);
        let relu = b.op("Relu", &[abs]);
        x = b.op("Add", &[exp, relu]);
    }
    b.net_output(&[x]);
    b.build(&[]).expect("block graph")
}

/// Two-output pattern `Abs -> (Exp, Relu)`, capturing `Abs` and `Exp`.
pub fn abs_exp_relu_pattern() -> Pattern {
    let mut b = GraphBuilder::new("abs_exp_relu");
    let x = b.data(0);
    let abs = b.op("Abs", &[x]);
    let exp = b.op("Exp", &[abs]);
    let relu = b.op("Relu", &[abs]);
    let mut pattern = Pattern::new(b.build(&[exp, relu]).expect("pattern graph"));
    pattern.capture_tensor(abs).capture_tensor(exp);
    pattern
}

/// Single-output replacement with `inputs` Data nodes feeding one `op_type` node.
pub fn fused_replacement(op_type: &str, inputs: usize, outputs: usize) -> ComputeGraph {
    let mut b = GraphBuilder::new(format!("{}_replacement", op_type.to_lowercase()));
    let data: Vec<NodeIo> = (0..inputs as i64).map(|i| b.data(i)).collect();
    let fused = b.op_multi(op_type, &data, outputs);
    b.net_output(&fused);
    b.build(&[]).expect("replacement graph")
}

/// Single-op chain pattern `Data -> op_types[0] -> op_types[1] -> ...`.
pub fn chain_pattern(op_types: &[&str]) -> Pattern {
    let mut b = GraphBuilder::new(op_types.join("_"));
    let mut x = b.data(0);
    for op in op_types {
        x = b.op(op, &[x]);
    }
    Pattern::new(b.build(&[x]).expect("chain pattern"))
}

/// Count live nodes of `op_type`.
pub fn count_op(graph: &ComputeGraph, op_type: &str) -> usize {
    graph.nodes().filter(|n| n.op_type() == op_type).count()
}
