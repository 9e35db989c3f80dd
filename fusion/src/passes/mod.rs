//! Fusion passes and the infrastructure that schedules them.
//!
//! # Module Organization
//!
//! - [`pattern_fusion`] - [`PatternFusionPass`] hooks and the [`PatternFusion`] driver
//! - [`decompose`] - [`DecomposePass`] hooks and the [`Decompose`] driver
//! - [`registry`] - [`PassRegistry`], the name/stage catalog
//! - [`pipeline`] - [`run_stage`], fixpoint execution of a registry stage

pub mod decompose;
pub mod pattern_fusion;
pub mod pipeline;
pub mod registry;

use graft_ir::ComputeGraph;

use crate::error::Result;

pub use decompose::{Decompose, DecomposePass};
pub use pattern_fusion::{PatternFusion, PatternFusionPass};
pub use pipeline::run_stage;
pub use registry::{FusionPassFactory, FusionPassRegData, PassRegistry, PassStage};

/// Outcome of a successful pass run. Failures are reported as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PassStatus {
    Changed,
    NotChanged,
}

impl PassStatus {
    pub fn changed(self) -> bool {
        self == PassStatus::Changed
    }

    /// `Changed` if either side changed.
    pub fn merge(self, other: PassStatus) -> PassStatus {
        if self.changed() || other.changed() { PassStatus::Changed } else { PassStatus::NotChanged }
    }
}

/// Diagnostics sink handed to every pass run.
#[derive(Debug, Default)]
pub struct PassContext {
    notes: Vec<String>,
}

impl PassContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

/// A graph transformation that can be run repeatedly until it reports
/// [`PassStatus::NotChanged`].
pub trait FusionBasePass {
    fn name(&self) -> &str;

    fn run(&mut self, graph: &mut ComputeGraph, ctx: &mut PassContext) -> Result<PassStatus>;
}
