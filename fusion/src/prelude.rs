//! Commonly used types for writing fusion passes.
//!
//! ```rust,ignore
//! use graft_fusion::prelude::*;
//! ```

pub use graft_ir::prelude::*;

pub use crate::config::{MatcherConfig, PipelineConfig};
pub use crate::error::{Error, Result};
pub use crate::passes::{
    Decompose, DecomposePass, FusionBasePass, PassContext, PassRegistry, PassStage, PassStatus, PatternFusion,
    PatternFusionPass, run_stage,
};
pub use crate::pattern::{MatchResult, Pattern, PatternMatcher};
pub use crate::rewrite::{SubgraphBoundary, SubgraphInput, SubgraphOutput, SubgraphRewriter};
