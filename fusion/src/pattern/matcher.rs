//! Backtracking enumeration of pattern occurrences.
//!
//! # Algorithm
//!
//! Every call to [`PatternMatcher::match_next`] rescans the target graph and
//! builds one [`MatchCoordinateSeq`] per pattern output slot. A stack of
//! frames, one per slot currently being attempted, is driven by slot 0:
//!
//! - The top frame's candidate is matched backwards (breadth-first, from the
//!   output towards the Data wildcards) against a scratch copy of the frame's
//!   base result.
//! - Success on the last slot commits the result once the matched region is
//!   self-contained. Success on an earlier slot pushes a frame for the next
//!   slot seeded with the scratch result.
//! - Failure advances the frame; an exhausted frame is popped and its parent
//!   advances.
//!
//! Frames hold [`Cursor`]s keyed by node id, so the enumeration resumes
//! correctly against a rescan. If the graph was mutated since the last
//! returned match, only frames whose seeded result refers to removed nodes or
//! rewired boundary edges are dropped; their parent retries its current
//! candidate, which resolves to the next live one when it was removed.

use std::collections::VecDeque;
use std::sync::Arc;

use graft_ir::{ComputeGraph, GraphId, InAnchor, NodeIo};
use smallvec::{SmallVec, smallvec};
use tracing::{debug, trace, warn};

use super::coordinate::{Cursor, MatchCoordinate, MatchCoordinateSeq};
use super::result::MatchResult;
use super::role::{NodeRole, matchable_identity};
use super::Pattern;
use crate::config::MatcherConfig;

/// Why a branch failed; internal backtracking control flow only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchMismatch {
    Role,
    Arity,
    Port,
    Unconnected,
    Mapping,
}

#[derive(Debug, Clone)]
struct Frame {
    slot: usize,
    cursor: Cursor,
    base: MatchResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Validation {
    Pending,
    Valid,
    Invalid,
}

/// Stateful enumerator of the occurrences of one pattern in one target graph.
///
/// Successive matches may overlap; callers typically replace each match
/// before asking for the next one.
#[derive(Debug)]
pub struct PatternMatcher {
    pattern: Arc<Pattern>,
    target: GraphId,
    config: MatcherConfig,
    validation: Validation,
    frames: SmallVec<[Frame; 4]>,
    returned_version: Option<u64>,
}

impl PatternMatcher {
    pub fn new(pattern: impl Into<Arc<Pattern>>, target: &ComputeGraph) -> Self {
        Self::with_config(pattern, target, MatcherConfig::default())
    }

    pub fn with_config(pattern: impl Into<Arc<Pattern>>, target: &ComputeGraph, config: MatcherConfig) -> Self {
        let pattern = pattern.into();
        let root = Frame { slot: 0, cursor: Cursor::Start, base: MatchResult::new(pattern.clone()) };
        Self {
            pattern,
            target: target.id(),
            config,
            validation: Validation::Pending,
            frames: smallvec![root],
            returned_version: None,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    fn ensure_valid(&mut self) -> bool {
        if self.validation == Validation::Pending {
            self.validation = match self.pattern.validate() {
                Ok(()) => Validation::Valid,
                Err(e) => {
                    warn!(pattern = self.pattern.name(), error = %e, "pattern rejected, matcher reports no matches");
                    self.frames.clear();
                    Validation::Invalid
                }
            };
        }
        self.validation == Validation::Valid
    }

    fn scan(&self, target: &ComputeGraph) -> Vec<MatchCoordinateSeq> {
        let graph = self.pattern.graph();
        self.pattern
            .outputs()
            .iter()
            .enumerate()
            .map(|(slot, output)| match graph.node(output.node) {
                Some(node) => MatchCoordinateSeq::scan(target, slot, matchable_identity(node), output.index),
                None => MatchCoordinateSeq::default(),
            })
            .collect()
    }

    /// Pop every frame seeded with a result the mutated target no longer
    /// supports. Bases only grow towards the top, so the first stale frame
    /// and everything above it go.
    fn drop_stale_frames(&mut self, target: &ComputeGraph) {
        if let Some(stale) = self.frames.iter().position(|f| !f.base.is_live(target)) {
            trace!(pattern = self.pattern.name(), kept = stale, "target mutated, dropping stale frames");
            self.frames.truncate(stale);
        }
    }

    /// Next occurrence of the pattern, or `None` once the search is exhausted.
    pub fn match_next(&mut self, target: &ComputeGraph) -> Option<MatchResult> {
        if target.id() != self.target {
            warn!(expected = %self.target, actual = %target.id(), "matcher used against a foreign graph");
            return None;
        }
        if !self.ensure_valid() {
            return None;
        }

        if self.returned_version.take().is_some_and(|version| version != target.version()) {
            self.drop_stale_frames(target);
        }

        let sequences = self.scan(target);
        let slots = sequences.len();

        loop {
            let frame = self.frames.last_mut()?;
            let Some(coordinate) = sequences[frame.slot].resolve(frame.cursor) else {
                self.frames.pop();
                if let Some(parent) = self.frames.last_mut() {
                    parent.cursor = parent.cursor.advanced();
                }
                continue;
            };
            frame.cursor = Cursor::At(coordinate.node);

            let mut scratch = frame.base.clone();
            if let Err(reason) = match_branch(&self.pattern, &self.config, target, coordinate, &mut scratch) {
                trace!(slot = coordinate.slot, candidate = %coordinate.node, ?reason, "branch mismatch");
                frame.cursor = frame.cursor.advanced();
                continue;
            }

            if frame.slot + 1 < slots {
                let next = Frame { slot: frame.slot + 1, cursor: Cursor::Start, base: scratch };
                self.frames.push(next);
                continue;
            }

            frame.cursor = frame.cursor.advanced();
            if !scratch.is_self_contained(target) {
                trace!(candidate = %coordinate.node, "match is not self contained");
                continue;
            }
            debug!(pattern = self.pattern.name(), nodes = ?scratch.matched_nodes(), "pattern matched");
            self.returned_version = Some(target.version());
            return Some(scratch);
        }
    }
}

/// Match the pattern backwards from one output slot candidate.
fn match_branch(
    pattern: &Pattern,
    config: &MatcherConfig,
    target: &ComputeGraph,
    coordinate: MatchCoordinate,
    result: &mut MatchResult,
) -> Result<(), BranchMismatch> {
    let pattern_graph = pattern.graph();
    let seed_pattern = pattern.outputs()[coordinate.slot];
    let seed_target = NodeIo::new(coordinate.node, seed_pattern.index);

    let mut queue: VecDeque<(NodeIo, NodeIo, Option<InAnchor>)> = VecDeque::new();
    queue.push_back((seed_pattern, seed_target, None));

    while let Some((pattern_io, target_io, consumer)) = queue.pop_front() {
        let (Some(p_node), Some(t_node)) = (pattern_graph.node(pattern_io.node), target.node(target_io.node)) else {
            return Err(BranchMismatch::Unconnected);
        };
        let role = NodeRole::of(p_node);

        let revisit = result.matched_node(pattern_io.node).is_some();
        if revisit && result.matched_node(pattern_io.node) != Some(target_io.node) {
            return Err(BranchMismatch::Mapping);
        }
        if !role.matches(p_node, t_node, config) {
            return Err(BranchMismatch::Role);
        }
        result
            .append_node_match_pair(target, pattern_io, target_io, consumer)
            .map_err(|_| BranchMismatch::Mapping)?;

        if role.is_data() || revisit {
            continue;
        }
        if p_node.num_inputs() != t_node.num_inputs() {
            return Err(BranchMismatch::Arity);
        }
        for (index, p_input) in p_node.inputs().iter().enumerate() {
            let anchor = InAnchor::new(t_node.id(), index as u32);
            let (Some(p_producer), Some(t_producer)) = (*p_input, t_node.input(index)) else {
                return Err(BranchMismatch::Unconnected);
            };
            let producer_is_data = pattern_graph.node(p_producer.node).is_some_and(|n| n.is_data());
            if !producer_is_data && p_producer.index != t_producer.index {
                return Err(BranchMismatch::Port);
            }
            queue.push_back((p_producer, t_producer, Some(anchor)));
        }
    }
    Ok(())
}
