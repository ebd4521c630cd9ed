//! Training command implementation.

use crate::commands::types::TrainArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use gts_training::{EngineConfig, TaskStatus};

pub async fn execute(config: EngineConfig, args: TrainArgs) -> Result<()> {
    let json_output = args.json;
    let task_args = args.into_task_args();
    let orchestrator = super::build_orchestrator(config)?;

    let record = orchestrator
        .run(&task_args)
        .await
        .with_context(|| format!("Training failed for task {}", task_args.task_dir.display()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!();
    if record.status == TaskStatus::TrainSuccess {
        println!("{}", "Training complete".bold().green());
    } else {
        println!("{}", format!("Training ended: {}", record.status).bold().yellow());
    }
    println!("  Task: {}", task_args.task_dir.display().to_string().cyan());
    println!("  Pipeline: {}", task_args.qualifier().cyan());
    if let Some(save_path) = &record.save_path {
        println!("  Saved to: {}", save_path.display().to_string().dimmed());
    }
    println!();
    Ok(())
}
