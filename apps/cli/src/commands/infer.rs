//! Inference command implementation.

use anyhow::{Context, Result};
use gts_training::EngineConfig;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn read_records(path: &Path) -> Result<Vec<Value>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read input: {}", path.display()))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {} of {}", idx + 1, path.display()))
        })
        .collect()
}

/// Run a trained model over a JSONL file of `{"content": ...}` records.
pub async fn execute(config: EngineConfig, save_path: PathBuf, input: PathBuf, json_output: bool) -> Result<()> {
    let records = read_records(&input)?;
    let orchestrator = super::build_orchestrator(config)?;

    let handle = orchestrator
        .prepare_inference(&save_path)
        .await
        .with_context(|| format!("Failed to prepare inference from {}", save_path.display()))?;
    let results = orchestrator.inference(&handle, &records).await.context("Inference failed")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{}", serde_json::to_string(result)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records_skips_blank_lines() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("in.jsonl");
        std::fs::write(&path, "{\"content\": \"a\"}\n\n{\"content\": \"b\"}\n").unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["content"], "b");
    }

    #[test]
    fn test_read_records_reports_line() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("in.jsonl");
        std::fs::write(&path, "{}\nnot json\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
