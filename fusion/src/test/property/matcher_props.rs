//! Property tests for match enumeration and replacement.

use graft_ir::ComputeGraph;
use proptest::prelude::*;

use crate::error::Result;
use crate::passes::{FusionBasePass, PassContext, PassStatus, PatternFusion, PatternFusionPass};
use crate::pattern::{MatchResult, Pattern, PatternMatcher};
use crate::rewrite::SubgraphRewriter;
use crate::test::helpers::{chain_pattern, count_op, fused_replacement};

use super::generators::*;

struct ChainFusion(Vec<&'static str>);

impl PatternFusionPass for ChainFusion {
    fn name(&self) -> &str {
        "chain_fusion"
    }

    fn patterns(&self) -> Vec<Pattern> {
        vec![chain_pattern(&self.0)]
    }

    fn replacement(&self, _graph: &ComputeGraph, _matched: &MatchResult) -> Result<ComputeGraph> {
        Ok(fused_replacement("Fused", 1, 1))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Enumeration terminates and every match can be replaced on its own.
    #[test]
    fn every_match_is_replaceable(spec in arb_dag(), ops in arb_chain()) {
        let graph = spec.build();
        let mut matcher = PatternMatcher::new(chain_pattern(&ops), &graph);
        let mut seen = 0;

        while let Some(result) = matcher.match_next(&graph) {
            seen += 1;
            prop_assert!(seen <= graph.len(), "match_next does not terminate");
            prop_assert_eq!(result.matched_nodes().len(), ops.len());

            let boundary = result.to_subgraph_boundary(&graph).unwrap();
            let mut rewritten = graph.clone();
            SubgraphRewriter::replace(&mut rewritten, &boundary, &fused_replacement("Fused", 1, 1)).unwrap();
            prop_assert!(!rewritten.has_cycle());
            prop_assert_eq!(rewritten.len(), graph.len() - ops.len() + 1);
        }
    }

    /// A fusion pass settles after one run and keeps the graph acyclic.
    #[test]
    fn fusion_pass_settles(spec in arb_dag(), ops in arb_chain()) {
        let mut graph = spec.build();
        let original = graph.len();
        let mut pass = PatternFusion::new(ChainFusion(ops.clone()));
        let mut ctx = PassContext::new();

        let status = pass.run(&mut graph, &mut ctx).unwrap();
        prop_assert!(!graph.has_cycle());
        let fused = count_op(&graph, "Fused");
        prop_assert_eq!(status.changed(), fused > 0);
        prop_assert_eq!(graph.len(), original - fused * (ops.len() - 1));

        let settled = graph.dump();
        prop_assert_eq!(pass.run(&mut graph, &mut ctx).unwrap(), PassStatus::NotChanged);
        prop_assert_eq!(graph.dump(), settled);
    }
}
