//! Candidate sequences used for backtracking enumeration.

use graft_ir::{ComputeGraph, NodeId};

use super::role::matchable_identity;

/// A target node that could satisfy a pattern output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchCoordinate {
    pub node: NodeId,
    pub slot: usize,
}

/// Position inside a [`MatchCoordinateSeq`].
///
/// Cursors are keyed by node id rather than by offset, so a cursor taken
/// from one scan stays meaningful against a rescan of a mutated graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Start,
    /// Currently at this node (or the first live candidate after it).
    At(NodeId),
    /// Strictly after this node.
    After(NodeId),
}

impl Cursor {
    /// Cursor positioned past the current candidate.
    pub fn advanced(self) -> Self {
        match self {
            Cursor::At(node) => Cursor::After(node),
            other => other,
        }
    }
}

/// Deduplicated candidates for one output slot, ordered by creation order.
#[derive(Debug, Clone, Default)]
pub struct MatchCoordinateSeq {
    coordinates: Vec<MatchCoordinate>,
}

impl MatchCoordinateSeq {
    /// Collect every target node whose matchable identity is `identity` and
    /// which has output port `port`.
    pub fn scan(target: &ComputeGraph, slot: usize, identity: &str, port: u32) -> Self {
        let coordinates = target
            .nodes()
            .filter(|n| matchable_identity(n) == identity && (port as usize) < n.num_outputs())
            .map(|n| MatchCoordinate { node: n.id(), slot })
            .collect();
        // `nodes()` yields creation order, so the sequence is sorted and unique.
        Self { coordinates }
    }

    /// First candidate at or after `cursor`.
    pub fn resolve(&self, cursor: Cursor) -> Option<MatchCoordinate> {
        let start = match cursor {
            Cursor::Start => 0,
            Cursor::At(node) => self.coordinates.partition_point(|c| c.node < node),
            Cursor::After(node) => self.coordinates.partition_point(|c| c.node <= node),
        };
        self.coordinates.get(start).copied()
    }
}
