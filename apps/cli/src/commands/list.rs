//! List command implementation.

use anyhow::Result;
use colored::Colorize;
use gts_training::EngineConfig;
use serde_json::json;

/// Print the dispatch table: registry keys and the factory per train mode.
pub fn execute(config: EngineConfig, json_output: bool) -> Result<()> {
    let orchestrator = super::build_orchestrator(config)?;
    let registry = orchestrator.registry();
    let factories = orchestrator.factories();

    if json_output {
        let keys: Vec<String> = registry.keys().map(ToString::to_string).collect();
        let modes: Vec<_> = factories
            .iter()
            .map(|f| {
                json!({
                    "train_mode": f.train_mode(),
                    "training_pipeline": f.training_pipeline_identity().as_str(),
                    "inference_engine": f.inference_engine_identity().as_str(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "registry": keys, "factories": modes }))?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Registry ({})", registry.len()).bold().cyan());
    for key in registry.keys() {
        println!("  {:<20} {}", key.role.to_string().dimmed(), key.qualifier.cyan());
    }
    println!();
    println!("{}", "Module factories".bold().cyan());
    println!("  {:<10} {:<10} {}", "Mode", "Training", "Inference");
    println!("  {}", "─".repeat(32));
    for factory in factories.iter() {
        println!(
            "  {:<10} {:<10} {}",
            factory.train_mode().to_string(),
            factory.training_pipeline_identity(),
            factory.inference_engine_identity()
        );
    }
    println!();
    Ok(())
}
