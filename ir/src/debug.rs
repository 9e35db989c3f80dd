//! Simple debug printing for graphs.

use std::fmt::Write;

use crate::graph::ComputeGraph;

impl ComputeGraph {
    /// Render the graph as one line per node in creation order.
    ///
    /// ```text
    /// graph 'fused' (g3, 4 nodes)
    ///   [0] x: Data(index=0)
    ///   [1] abs: Abs(n0.0) -> [n2.in0]
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "graph '{}' ({}, {} nodes)", self.name(), self.id(), self.len());
        for node in self.nodes() {
            let inputs: Vec<String> = node
                .inputs()
                .iter()
                .map(|i| match i {
                    Some(io) => format!("n{}.{}", io.node.index, io.index),
                    None => "_".to_string(),
                })
                .collect();
            let attrs: Vec<String> = node.attrs().iter().map(|(k, v)| format!("{k}={v}")).collect();
            let _ = write!(out, "  [{}] {}: {}({})", node.id().index, node.name(), node.op_type(), inputs.join(", "));
            if !attrs.is_empty() {
                let _ = write!(out, " {{{}}}", attrs.join(", "));
            }
            if !node.control_inputs().is_empty() {
                let ctrl: Vec<String> = node.control_inputs().iter().map(|c| format!("n{}", c.index)).collect();
                let _ = write!(out, " ctrl<-[{}]", ctrl.join(", "));
            }
            out.push('\n');
        }
        if !self.outputs().is_empty() {
            let outs: Vec<String> = self.outputs().iter().map(|o| format!("n{}.{}", o.node.index, o.index)).collect();
            let _ = writeln!(out, "  outputs: [{}]", outs.join(", "));
        }
        out
    }
}

impl std::fmt::Display for ComputeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dump())
    }
}
