//! Pattern-driven match-and-replace passes.

use graft_ir::{ComputeGraph, CycleDetector, ReachabilityDetector};
use snafu::ResultExt;
use tracing::debug;

use super::{FusionBasePass, PassContext, PassStatus};
use crate::config::MatcherConfig;
use crate::error::{PassSnafu, Result};
use crate::pattern::{MatchResult, Pattern, PatternMatcher};
use crate::provenance::PassScope;
use crate::rewrite::SubgraphRewriter;

/// Hooks of a pattern fusion pass. Run it through [`PatternFusion`].
pub trait PatternFusionPass {
    fn name(&self) -> &str;

    /// Patterns tried in order; each is drained before the next one.
    fn patterns(&self) -> Vec<Pattern>;

    /// Admit or reject a match. Accepts everything by default.
    fn meet_requirements(&self, _graph: &ComputeGraph, _matched: &MatchResult) -> bool {
        true
    }

    /// Replacement graph for an admitted match.
    fn replacement(&self, graph: &ComputeGraph, matched: &MatchResult) -> Result<ComputeGraph>;

    fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig::default()
    }
}

/// Drives a [`PatternFusionPass`]: match, admit, cycle pre-check, replace.
///
/// Each replacement runs against a snapshot; a failed rewrite restores the
/// snapshot and fails the run, so the graph is never left half-rewritten.
#[derive(Debug, Clone, Default)]
pub struct PatternFusion<P> {
    pass: P,
}

impl<P: PatternFusionPass> PatternFusion<P> {
    pub fn new(pass: P) -> Self {
        Self { pass }
    }

    pub fn inner(&self) -> &P {
        &self.pass
    }

    fn run_pattern(
        &self,
        pattern: Pattern,
        graph: &mut ComputeGraph,
        detector: &mut ReachabilityDetector,
        ctx: &mut PassContext,
    ) -> Result<usize> {
        let name = self.pass.name();
        let mut matcher = PatternMatcher::with_config(pattern, graph, self.pass.matcher_config());
        let mut replaced = 0;

        while let Some(matched) = matcher.match_next(graph) {
            if !self.pass.meet_requirements(graph, &matched) {
                debug!(pass = name, "match rejected by requirements");
                continue;
            }
            let fused = matched.matched_nodes();
            if detector.would_cause_cycle(graph, &fused) {
                debug!(pass = name, nodes = ?fused, "fusion skipped, would create a cycle");
                ctx.note(format!("{name}: skipped match of {} nodes, fusion would create a cycle", fused.len()));
                continue;
            }

            let replacement = self.pass.replacement(graph, &matched).context(PassSnafu { pass: name })?;
            let boundary = matched.to_subgraph_boundary(graph).context(PassSnafu { pass: name })?;

            let snapshot = graph.clone();
            let summary = {
                let _scope = PassScope::enter(name);
                SubgraphRewriter::replace_tracked(graph, &boundary, &replacement)
            };
            match summary {
                Ok(summary) => {
                    detector.update(graph, &summary.removed, &summary.added);
                    replaced += 1;
                }
                Err(e) => {
                    *graph = snapshot;
                    return Err(e).context(PassSnafu { pass: name });
                }
            }
        }
        Ok(replaced)
    }
}

impl<P: PatternFusionPass> FusionBasePass for PatternFusion<P> {
    fn name(&self) -> &str {
        self.pass.name()
    }

    fn run(&mut self, graph: &mut ComputeGraph, ctx: &mut PassContext) -> Result<PassStatus> {
        let mut detector = ReachabilityDetector::new(graph);
        let mut replaced = 0;
        for pattern in self.pass.patterns() {
            replaced += self.run_pattern(pattern, graph, &mut detector, ctx)?;
        }
        debug!(pass = self.pass.name(), replaced, "pattern fusion finished");
        Ok(if replaced > 0 { PassStatus::Changed } else { PassStatus::NotChanged })
    }
}
