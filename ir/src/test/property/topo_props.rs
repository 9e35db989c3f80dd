//! Property tests for topological ordering and cycle detection.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::cycle::{CycleDetector, ReachabilityDetector};

use super::generators::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every edge of a generated DAG points forward in the topological order.
    #[test]
    fn topological_order_respects_edges(spec in arb_dag()) {
        let graph = spec.build();
        let order = graph.topological_order().expect("generated graph is acyclic");
        prop_assert_eq!(order.len(), graph.len());

        let position: HashMap<_, _> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for node in graph.nodes() {
            for succ in graph.successors(node.id()) {
                prop_assert!(position[&node.id()] < position[&succ]);
            }
        }
    }

    /// Fusing a single node never creates a cycle.
    #[test]
    fn singleton_fusion_is_acyclic(spec in arb_dag(), pick in 0usize..64) {
        let graph = spec.build();
        let ids = graph.node_ids();
        let target = ids[pick % ids.len()];
        let mut detector = ReachabilityDetector::new(&graph);
        prop_assert!(!detector.would_cause_cycle(&graph, &[target]));
    }

    /// Fusing a producer with a consumer two hops away always closes a cycle
    /// through the node in between.
    #[test]
    fn fusing_endpoints_of_a_chain_is_cyclic(spec in arb_dag()) {
        let graph = spec.build();
        let mut detector = ReachabilityDetector::new(&graph);
        for node in graph.nodes() {
            for mid in graph.successors(node.id()) {
                for end in graph.successors(mid) {
                    if end == node.id() {
                        continue;
                    }
                    prop_assert!(detector.would_cause_cycle(&graph, &[node.id(), end]));
                }
            }
        }
    }
}
