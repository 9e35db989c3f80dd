//! Matcher and pipeline configuration.
//!
//! Both configurations are plain values built with bon builders; `from_env`
//! reads the `GRAFT_*` variables for callers that want process-level switches.

use std::collections::BTreeSet;

use bon::bon;

// ============================================================================
// MATCHER CONFIGURATION
// ============================================================================

/// Strictness of node comparison during matching.
///
/// Both checks compare bytes exactly and are therefore off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Require constant payloads to be byte-identical.
    pub match_const_value: bool,
    /// Require operator-defined attributes to be byte-identical.
    pub match_ir_attrs: bool,
}

#[bon]
impl MatcherConfig {
    /// Create a matcher configuration with builder pattern.
    #[builder(finish_fn = build)]
    pub fn builder(
        #[builder(default = false)] match_const_value: bool,
        #[builder(default = false)] match_ir_attrs: bool,
    ) -> Self {
        Self { match_const_value, match_ir_attrs }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `GRAFT_MATCH_CONST_VALUE` - Compare constant payloads if set
    /// * `GRAFT_MATCH_IR_ATTRS` - Compare operator attributes if set
    pub fn from_env() -> Self {
        Self {
            match_const_value: std::env::var("GRAFT_MATCH_CONST_VALUE").is_ok(),
            match_ir_attrs: std::env::var("GRAFT_MATCH_IR_ATTRS").is_ok(),
        }
    }
}

// ============================================================================
// PIPELINE CONFIGURATION
// ============================================================================

/// Configuration for running registered passes to a fixpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound on `run` calls per pass before giving up on a fixpoint.
    pub max_iterations: usize,
    /// Pass names that are registered but must not run.
    pub disabled_passes: BTreeSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_iterations: 16, disabled_passes: BTreeSet::new() }
    }
}

#[bon]
impl PipelineConfig {
    /// Create a pipeline configuration with builder pattern.
    #[builder(finish_fn = build)]
    pub fn builder(
        #[builder(default = 16)] max_iterations: usize,
        #[builder(default, into)] disabled_passes: BTreeSet<String>,
    ) -> Self {
        Self { max_iterations, disabled_passes }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `GRAFT_FUSION_MAX_ITERATIONS` - Fixpoint iteration limit (default: 16)
    /// * `GRAFT_DISABLED_FUSION_PASSES` - Comma separated pass names to skip
    pub fn from_env() -> Self {
        let max_iterations =
            std::env::var("GRAFT_FUSION_MAX_ITERATIONS").ok().and_then(|s| s.parse().ok()).unwrap_or(16);
        let disabled_passes = std::env::var("GRAFT_DISABLED_FUSION_PASSES")
            .map(|s| parse_pass_list(&s))
            .unwrap_or_default();
        Self { max_iterations, disabled_passes }
    }

    pub fn is_disabled(&self, pass: &str) -> bool {
        self.disabled_passes.contains(pass)
    }
}

pub(crate) fn parse_pass_list(list: &str) -> BTreeSet<String> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}
