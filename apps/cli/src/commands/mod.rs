//! Command implementations for the GTS CLI.

pub mod infer;
pub mod list;
pub mod status;
pub mod train;
pub mod types;

pub use types::TrainArgs;

use anyhow::{Context, Result};
use gts_training::{EngineConfig, FactoryTable, Orchestrator};
use std::sync::Arc;

/// Build the dispatch table and orchestrator from configuration.
pub fn build_orchestrator(config: EngineConfig) -> Result<Orchestrator> {
    let config = Arc::new(config);
    let registry = gts_training::standard_registry(&config).context("Failed to build pipeline registry")?;
    Ok(Orchestrator::new(Arc::new(registry), FactoryTable::standard()))
}
