use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TrainingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(TrainingError::InvalidEnumValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Speed/accuracy tier; selects the module factory.
    TrainMode, "train_mode" {
        Fast => "fast",
        Standard => "standard",
        Advanced => "advanced",
    }
}

string_enum! {
    /// Top-level family of pipeline implementations.
    EngineFamily, "engine_type" {
        Qiankunding => "qiankunding",
        Bagualu => "bagualu",
    }
}

string_enum! {
    TaskType, "task_type" {
        Classification => "classification",
        Similarity => "similarity",
        Nli => "nli",
    }
}

/// Hyper-parameters forwarded to the training pipeline untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHyperParams {
    pub num_workers: u32,
    pub train_batchsize: u32,
    pub valid_batchsize: u32,
    pub test_batchsize: u32,
    pub max_len: u32,
    pub lr: f64,
    pub gradient_checkpointing: bool,
}

impl Default for TrainingHyperParams {
    fn default() -> Self {
        Self {
            num_workers: 8,
            train_batchsize: 1,
            valid_batchsize: 4,
            test_batchsize: 4,
            max_len: 512,
            lr: 2e-5,
            gradient_checkpointing: true,
        }
    }
}

impl TrainingHyperParams {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.train_batchsize == 0 || self.valid_batchsize == 0 || self.test_batchsize == 0 {
            return Err(TrainingError::InvalidSpec("batch sizes must be >= 1".to_string()));
        }
        if self.max_len == 0 {
            return Err(TrainingError::InvalidSpec("max_len must be >= 1".to_string()));
        }
        if !(self.lr.is_finite()) || self.lr <= 0.0 {
            return Err(TrainingError::InvalidSpec("lr must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Caller-facing description of one training or inference request.
///
/// Built once from the invocation surface and never mutated afterwards. The
/// split filenames are relative to `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericTaskArgs {
    pub engine_type: EngineFamily,
    pub train_mode: TrainMode,
    pub task_type: TaskType,
    pub task_dir: PathBuf,
    pub pretrained_model_dir: PathBuf,
    pub data_dir: PathBuf,
    pub save_path: PathBuf,
    pub train_data: String,
    pub valid_data: String,
    #[serde(default)]
    pub test_data: Option<String>,
    #[serde(default)]
    pub label_data: Option<String>,
    pub gpus: u32,
    pub seed: u64,
    #[serde(default)]
    pub hyperparams: TrainingHyperParams,
}

impl GenericTaskArgs {
    /// `<engine>_<task_type>`, the qualifier half of a registry key.
    #[must_use]
    pub fn qualifier(&self) -> String {
        format!("{}_{}", self.engine_type, self.task_type)
    }

    #[must_use]
    pub fn train_data_path(&self) -> PathBuf {
        self.data_dir.join(&self.train_data)
    }

    #[must_use]
    pub fn valid_data_path(&self) -> PathBuf {
        self.data_dir.join(&self.valid_data)
    }

    #[must_use]
    pub fn test_data_path(&self) -> Option<PathBuf> {
        self.test_data.as_ref().map(|name| self.data_dir.join(name))
    }

    #[must_use]
    pub fn label_data_path(&self) -> Option<PathBuf> {
        self.label_data.as_ref().map(|name| self.data_dir.join(name))
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.train_data.trim().is_empty() {
            return Err(TrainingError::MissingField("train_data"));
        }
        if self.valid_data.trim().is_empty() {
            return Err(TrainingError::MissingField("valid_data"));
        }
        self.hyperparams.validate()
    }

    /// Persist a snapshot of these arguments as `args.json` under `save_path`.
    pub fn save(&self, save_path: &Path) -> TrainingResult<PathBuf> {
        let path = save_path.join(ARGS_SNAPSHOT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| TrainingError::persistence(&path, e))?;
        Ok(path)
    }

    /// Reload the snapshot written by [`GenericTaskArgs::save`].
    pub fn load(save_path: &Path) -> TrainingResult<Self> {
        let path = save_path.join(ARGS_SNAPSHOT_FILE);
        if !path.is_file() {
            return Err(TrainingError::MissingArtifact(path));
        }
        let bytes = std::fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub const ARGS_SNAPSHOT_FILE: &str = "args.json";

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::fs;

    /// A task layout on disk with every required input present.
    pub struct TaskFixture {
        pub root: tempfile::TempDir,
        pub args: GenericTaskArgs,
    }

    pub fn task_fixture(labels: &[&str]) -> TaskFixture {
        let root = tempfile::TempDir::new().unwrap();
        let task_dir = root.path().join("task");
        let data_dir = task_dir.join("data");
        let pretrained = root.path().join("pretrained");
        fs::create_dir_all(&data_dir).unwrap();
        fs::create_dir_all(&pretrained).unwrap();

        fs::write(data_dir.join("train.json"), "{}\n").unwrap();
        fs::write(data_dir.join("dev.json"), "{}\n").unwrap();
        fs::write(
            data_dir.join("labels.json"),
            serde_json::json!({ "labels": labels }).to_string(),
        )
        .unwrap();

        let args = GenericTaskArgs {
            engine_type: EngineFamily::Bagualu,
            train_mode: TrainMode::Standard,
            task_type: TaskType::Classification,
            save_path: task_dir.join("outputs"),
            task_dir,
            pretrained_model_dir: pretrained,
            data_dir,
            train_data: "train.json".to_string(),
            valid_data: "dev.json".to_string(),
            test_data: None,
            label_data: Some("labels.json".to_string()),
            gpus: 1,
            seed: 1234,
            hyperparams: TrainingHyperParams::default(),
        };
        TaskFixture { root, args }
    }
}
