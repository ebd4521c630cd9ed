//! Status command implementation.

use anyhow::Result;
use colored::Colorize;
use gts_training::{FileStatusStore, TaskStatus, TaskTracker};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Show the persisted status of a task directory.
///
/// Reads the status file directly; no registry or config is needed.
pub fn execute(task_dir: PathBuf, json_output: bool) -> Result<()> {
    let tracker = TaskTracker::new(&task_dir, Arc::new(FileStatusStore));
    let record = tracker.load()?;

    if json_output {
        let out = match &record {
            Some(record) => serde_json::to_value(record)?,
            None => json!({
                "status": TaskStatus::Created,
                "status_code": TaskStatus::Created.code(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", "Task Status".bold().cyan());
    println!("  Task: {}", task_dir.display().to_string().dimmed());

    let Some(record) = record else {
        println!("  Status: {}", TaskStatus::Created.to_string().yellow());
        println!("  {}", "No task_info.json yet; the task has not been trained.".dimmed());
        println!();
        return Ok(());
    };

    let status = match record.status {
        TaskStatus::TrainSuccess => record.status.to_string().green(),
        TaskStatus::TrainFailed => record.status.to_string().red(),
        TaskStatus::OnTraining | TaskStatus::Created => record.status.to_string().yellow(),
    };
    println!("  Status: {} ({})", status, record.status_code);
    if let Some(pid) = record.train_pid {
        println!("  Train pid: {}", pid);
    }
    if let Some(train) = &record.train_data {
        println!("  Train data: {}", train);
    }
    if let Some(val) = &record.val_data {
        println!("  Validation data: {}", val);
    }
    if let Some(save_path) = &record.save_path {
        println!("  Saved to: {}", save_path.display().to_string().dimmed());
    }
    println!();
    Ok(())
}
