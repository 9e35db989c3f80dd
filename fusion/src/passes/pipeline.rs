//! Fixpoint execution of the passes registered for a stage.

use graft_ir::ComputeGraph;
use snafu::ensure;
use tracing::{debug, warn};

use super::registry::{PassRegistry, PassStage};
use super::{PassContext, PassStatus};
use crate::config::PipelineConfig;
use crate::error::{NoFixpointSnafu, Result};

/// Run every enabled pass registered for `stage`, each until it stops
/// changing the graph.
///
/// Returns `Changed` if any pass changed the graph. A pass still changing the
/// graph after `max_iterations` runs fails with [`NoFixpoint`](crate::Error::NoFixpoint).
pub fn run_stage(
    registry: &PassRegistry,
    stage: PassStage,
    graph: &mut ComputeGraph,
    ctx: &mut PassContext,
    config: &PipelineConfig,
) -> Result<PassStatus> {
    let mut status = PassStatus::NotChanged;
    for entry in registry.fusion_pass_reg_data_by_stage(stage) {
        if config.is_disabled(&entry.name) {
            warn!(pass = %entry.name, %stage, "fusion pass disabled by configuration");
            continue;
        }

        let mut pass = entry.create();
        let mut iterations = 0;
        loop {
            ensure!(iterations < config.max_iterations, NoFixpointSnafu { pass: entry.name.as_str(), iterations });
            iterations += 1;
            let outcome = pass.run(graph, ctx)?;
            status = status.merge(outcome);
            if !outcome.changed() {
                break;
            }
        }
        debug!(pass = %entry.name, %stage, iterations, "fusion pass reached fixpoint");
    }
    Ok(status)
}
