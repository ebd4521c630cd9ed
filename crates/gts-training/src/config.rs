//! Engine configuration file support.
//!
//! ```toml
//! strict_registration = false
//! log_level = "info"
//!
//! [pipelines.ft_std]
//! program = "python"
//! args = ["-m", "bagualu.entrances.text_classification.train_std"]
//!
//! # Overrides `ft_std` for one engine/task pair only.
//! [pipelines."qiankunding_nli.ft_std"]
//! program = "python"
//! args = ["-m", "qiankunding.nli.train"]
//! ```

use crate::error::{TrainingError, TrainingResult};
use crate::pipeline::ImplementationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How to launch one implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fail instead of overwrite when a registry key is registered twice.
    #[serde(default)]
    pub strict_registration: bool,

    #[serde(default)]
    pub log_level: Option<String>,

    /// Launch commands keyed by implementation identity, or by
    /// `<qualifier>.<identity>` for a per-engine override.
    #[serde(default)]
    pub pipelines: BTreeMap<String, CommandSpec>,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> TrainingResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrainingError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| TrainingError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".gts")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from("gts.toml")
    }

    /// Global config first, then the local file on top.
    ///
    /// Missing files are skipped; a file that exists but does not parse is an
    /// error.
    pub fn discover_and_load() -> TrainingResult<Self> {
        let mut config = Self::default();
        for path in [Self::default_global_path(), Self::default_local_path()] {
            if path.is_file() {
                config.merge(Self::load_from_file(&path)?);
            }
        }
        Ok(config)
    }

    /// Values from `other` override values in `self`.
    pub fn merge(&mut self, other: Self) {
        self.strict_registration |= other.strict_registration;
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        self.pipelines.extend(other.pipelines);
    }

    pub fn validate(&self) -> TrainingResult<()> {
        for (name, spec) in &self.pipelines {
            if spec.program.trim().is_empty() {
                return Err(TrainingError::Config(format!("pipelines.{name}.program must not be empty")));
            }
        }
        Ok(())
    }

    /// Command for `identity`, preferring a `<qualifier>.<identity>` override.
    pub fn command(&self, qualifier: &str, identity: ImplementationId) -> TrainingResult<&CommandSpec> {
        self.pipelines
            .get(&format!("{qualifier}.{identity}"))
            .or_else(|| self.pipelines.get(identity.as_str()))
            .ok_or_else(|| {
                TrainingError::Config(format!(
                    "no command configured for `{identity}` (looked up `{qualifier}.{identity}` and `{identity}`)"
                ))
            })
    }
}
