//! Shared helpers for the `gts` integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A classification task on disk with every required input present.
pub struct Task {
    pub root: TempDir,
    pub task_dir: PathBuf,
    pub data_dir: PathBuf,
    pub pretrained: PathBuf,
}

pub fn task(labels: &[&str]) -> Task {
    let root = TempDir::new().unwrap();
    let task_dir = root.path().join("task");
    let data_dir = task_dir.join("data");
    let pretrained = root.path().join("pretrained");
    fs::create_dir_all(&data_dir).unwrap();
    fs::create_dir_all(&pretrained).unwrap();
    fs::write(data_dir.join("train.json"), "{}\n").unwrap();
    fs::write(data_dir.join("dev.json"), "{}\n").unwrap();
    fs::write(data_dir.join("labels.json"), serde_json::json!({ "labels": labels }).to_string()).unwrap();
    Task { root, task_dir, data_dir, pretrained }
}

impl Task {
    /// Write a config file into the temp root and return its path.
    pub fn config(&self, contents: &str) -> PathBuf {
        let path = self.root.path().join("gts.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    /// `gts train` for a bagualu/standard/classification task, isolated from
    /// any user-level config.
    pub fn train_cmd(&self, config: &Path) -> Command {
        self.train_cmd_for(config, "bagualu", "classification")
    }

    pub fn train_cmd_for(&self, config: &Path, engine: &str, task_type: &str) -> Command {
        let mut cmd = gts(self.root.path());
        cmd.arg("--config")
            .arg(config)
            .arg("train")
            .args(["--engine-type", engine, "--train-mode", "standard", "--task-type", task_type])
            .arg("--task-dir")
            .arg(&self.task_dir)
            .arg("--pretrained-model-dir")
            .arg(&self.pretrained)
            .arg("--data-dir")
            .arg(&self.data_dir)
            .args(["--train-data", "train.json", "--valid-data", "dev.json", "--label-data", "labels.json"]);
        cmd
    }

    pub fn status_record(&self) -> serde_json::Value {
        let raw = fs::read_to_string(self.task_dir.join("task_info.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

/// The `gts` binary with HOME and the working directory pinned to `dir`.
pub fn gts(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gts").unwrap();
    cmd.current_dir(dir).env("HOME", dir);
    cmd
}
