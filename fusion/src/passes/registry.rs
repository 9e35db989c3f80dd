//! Name and stage catalog of fusion passes.
//!
//! The registry is an explicit object: whoever assembles the pipeline creates
//! one, registers passes into it and hands it to [`run_stage`](super::run_stage).

use std::collections::HashMap;
use std::sync::Arc;

use strum::{Display, EnumIter};
use tracing::{debug, warn};

use super::FusionBasePass;

/// Point of the compilation pipeline at which a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum PassStage {
    BeforeInferShape,
    AfterInferShape,
    AfterAssignLogicStream,
    AfterBuiltinFusion,
}

/// Creates a fresh pass instance for one pipeline run.
pub type FusionPassFactory = Arc<dyn Fn() -> Box<dyn FusionBasePass> + Send + Sync>;

/// One registration.
#[derive(Clone)]
pub struct FusionPassRegData {
    pub name: String,
    pub stage: PassStage,
    pub factory: FusionPassFactory,
}

impl FusionPassRegData {
    pub fn create(&self) -> Box<dyn FusionBasePass> {
        (self.factory)()
    }
}

impl std::fmt::Debug for FusionPassRegData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionPassRegData").field("name", &self.name).field("stage", &self.stage).finish()
    }
}

/// Registered passes in registration order.
#[derive(Debug, Default)]
pub struct PassRegistry {
    entries: Vec<FusionPassRegData>,
    by_name: HashMap<String, usize>,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pass. The first registration of a name wins; later ones
    /// are logged and ignored. Returns whether the pass was registered.
    pub fn register_fusion_pass<F>(&mut self, name: impl Into<String>, stage: PassStage, factory: F) -> bool
    where
        F: Fn() -> Box<dyn FusionBasePass> + Send + Sync + 'static,
    {
        let name = name.into();
        if let Some(&existing) = self.by_name.get(&name) {
            let registered = self.entries[existing].stage;
            warn!(pass = %name, %stage, %registered, "duplicate fusion pass registration ignored");
            return false;
        }
        debug!(pass = %name, %stage, "fusion pass registered");
        self.by_name.insert(name.clone(), self.entries.len());
        self.entries.push(FusionPassRegData { name, stage, factory: Arc::new(factory) });
        true
    }

    /// Registrations for `stage`, in registration order.
    pub fn fusion_pass_reg_data_by_stage(&self, stage: PassStage) -> Vec<&FusionPassRegData> {
        self.entries.iter().filter(|e| e.stage == stage).collect()
    }

    pub fn get(&self, name: &str) -> Option<&FusionPassRegData> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
