//! Pattern matching and subgraph rewriting for graph fusion.
//!
//! Given a small template graph ([`Pattern`]) and a target [`ComputeGraph`],
//! [`PatternMatcher`] enumerates occurrences of the pattern one
//! [`MatchResult`] at a time. A match converts into a [`SubgraphBoundary`],
//! which [`SubgraphRewriter`] replaces with a replacement graph while keeping
//! external connectivity and provenance intact.
//!
//! Passes package this loop: [`PatternFusionPass`] for pattern-driven fusion,
//! [`DecomposePass`] for single-node decomposition. Both are scheduled through
//! a [`PassRegistry`] and run to a fixpoint by [`run_stage`].
//!
//! # Module Organization
//!
//! - [`pattern`] - Patterns, node roles, match results and the matcher
//! - [`rewrite`] - Subgraph boundaries and the rewriter
//! - [`provenance`] - Provenance attributes and the active pass scope
//! - [`passes`] - Pass traits, drivers, registry and pipeline
//! - [`config`] - Matcher and pipeline configuration
//! - [`error`] - Error types and result handling
//!
//! [`ComputeGraph`]: graft_ir::ComputeGraph

pub mod config;
pub mod error;
pub mod passes;
pub mod pattern;
pub mod prelude;
pub mod provenance;
pub mod rewrite;


pub use config::{MatcherConfig, PipelineConfig};
pub use error::{Error, Result};
pub use passes::{
    Decompose, DecomposePass, FusionBasePass, FusionPassRegData, PassContext, PassRegistry, PassStage, PassStatus,
    PatternFusion, PatternFusionPass, run_stage,
};
pub use pattern::{MatchCoordinate, MatchCoordinateSeq, MatchResult, NodeRole, Pattern, PatternMatcher};
pub use provenance::PassScope;
pub use rewrite::{SubgraphBoundary, SubgraphInput, SubgraphOutput, SubgraphRewriter};
