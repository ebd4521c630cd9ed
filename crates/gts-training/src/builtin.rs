//! The full dispatch table, assembled in one place.

use crate::args::{EngineFamily, TaskType};
use crate::command::{CommandInferencePreparer, CommandInferenceRunner, CommandTrainPipeline};
use crate::config::EngineConfig;
use crate::error::TrainingResult;
use crate::registry::{DuplicatePolicy, PipelineRegistry};
use std::sync::Arc;
use tracing::info;

/// Engine/task pairs that ship with an implementation.
pub const SUPPORTED_PAIRS: &[(EngineFamily, TaskType)] = &[
    (EngineFamily::Bagualu, TaskType::Classification),
    (EngineFamily::Qiankunding, TaskType::Classification),
    (EngineFamily::Qiankunding, TaskType::Similarity),
    (EngineFamily::Qiankunding, TaskType::Nli),
];

/// Register every `(role, qualifier)` pair this build supports.
pub fn standard_registry(config: &Arc<EngineConfig>) -> TrainingResult<PipelineRegistry> {
    let policy = if config.strict_registration { DuplicatePolicy::Strict } else { DuplicatePolicy::Overwrite };
    let mut registry = PipelineRegistry::new(policy);

    for (engine, task_type) in SUPPORTED_PAIRS {
        let qualifier = format!("{engine}_{task_type}");
        registry.register_train(&qualifier, Arc::new(CommandTrainPipeline::new(&qualifier, Arc::clone(config))))?;
        registry.register_prepare_inference(&qualifier, Arc::new(CommandInferencePreparer::new(Arc::clone(config))))?;
        registry.register_inference(&qualifier, Arc::new(CommandInferenceRunner::new(Arc::clone(config))))?;
    }

    info!(entries = registry.len(), "pipeline registry ready");
    Ok(registry)
}
