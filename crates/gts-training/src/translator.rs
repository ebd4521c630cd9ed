//! Typed argument translation.
//!
//! Turns a [`GenericTaskArgs`] into the flat `--flag value` list a concrete
//! pipeline is launched with, checking every path it hands over on the way.

use crate::args::{GenericTaskArgs, TaskType};
use crate::error::{TrainingError, TrainingResult};
use crate::layout::TaskLayout;
use crate::persist::atomic_write;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Ordered `(flag, value)` pairs for one implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationArgs(Vec<(String, String)>);

impl ImplementationArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: impl Into<String>, value: impl ToString) {
        self.0.push((flag.into(), value.to_string()));
    }

    /// Push only when a value is present. Optional flags are never emitted empty.
    pub fn push_opt<V: ToString>(&mut self, flag: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.push(flag, value);
        }
    }

    pub fn push_path(&mut self, flag: impl Into<String>, path: &Path) {
        self.push(flag, path.display());
    }

    #[must_use]
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.0.iter().find(|(f, _)| f == flag).map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, flag: &str) -> bool {
        self.get(flag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into an argv: `["--flag", "value", ...]`.
    #[must_use]
    pub fn to_argv(&self) -> Vec<String> {
        self.0.iter().flat_map(|(f, v)| [f.clone(), v.clone()]).collect()
    }
}

impl fmt::Display for ImplementationArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_argv().join(" "))
    }
}

/// Per-factory rules for the training flag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingArgShape {
    /// Value of `--gts_train_level`.
    pub train_level: u8,
    /// Whether the pipeline runs EDA augmentation and needs a cache path.
    pub eda_augment: bool,
    /// Forward `--seed` and `--max_len` to the pipeline.
    pub forward_tuning: bool,
}

pub(crate) fn require_dir(field: &'static str, path: &Path) -> TrainingResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(TrainingError::InvalidPath { field, path: path.to_path_buf() })
    }
}

pub(crate) fn require_file(field: &'static str, path: &Path) -> TrainingResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TrainingError::InvalidPath { field, path: path.to_path_buf() })
    }
}

/// Paths from a [`GenericTaskArgs`] after existence checks.
#[derive(Debug, Clone)]
struct TypeCheckedTrainArgs {
    task_dir: PathBuf,
    pretrained_model_dir: PathBuf,
    save_path: PathBuf,
    train_data_path: PathBuf,
    valid_data_path: PathBuf,
    test_data_path: Option<PathBuf>,
    label2id_path: Option<PathBuf>,
    eda_cache_path: PathBuf,
    logs_dir: PathBuf,
}

impl TypeCheckedTrainArgs {
    fn check(args: &GenericTaskArgs) -> TrainingResult<Self> {
        require_dir("task_dir", &args.task_dir)?;
        require_dir("pretrained_model_dir", &args.pretrained_model_dir)?;
        require_dir("data_dir", &args.data_dir)?;

        let train_data_path = args.train_data_path();
        require_file("train_data", &train_data_path)?;
        let valid_data_path = args.valid_data_path();
        require_file("valid_data", &valid_data_path)?;

        let test_data_path = args.test_data_path();
        if let Some(path) = &test_data_path {
            require_file("test_data", path)?;
        }

        let layout = TaskLayout::new(&args.task_dir);
        // label2id itself is produced later by prepare_training; only the
        // source label file has to exist now.
        let label2id_path = match args.label_data_path() {
            Some(path) => {
                require_file("label_data", &path)?;
                Some(layout.label2id_path(&args.train_data))
            }
            None => None,
        };

        Ok(Self {
            pretrained_model_dir: args.pretrained_model_dir.clone(),
            save_path: args.save_path.clone(),
            train_data_path,
            valid_data_path,
            test_data_path,
            label2id_path,
            eda_cache_path: layout.eda_cache_path(&args.train_data),
            logs_dir: layout.logs_dir(),
            task_dir: args.task_dir.clone(),
        })
    }
}

/// Build the training flag list for `shape`.
pub fn training_args(args: &GenericTaskArgs, shape: TrainingArgShape) -> TrainingResult<ImplementationArgs> {
    let checked = TypeCheckedTrainArgs::check(args)?;
    if args.task_type == TaskType::Classification && checked.label2id_path.is_none() {
        return Err(TrainingError::MissingField("label_data"));
    }

    let mut out = ImplementationArgs::new();
    out.push_path("--gts_input_path", &checked.task_dir);
    out.push_path("--gts_pretrained_model_path", &checked.pretrained_model_dir);
    out.push_path("--gts_output_dir", &checked.save_path);
    out.push("--gts_train_level", shape.train_level);
    out.push("--gpu_num", args.gpus);
    out.push("--run_mode", "online");
    out.push_path("--train_data_path", &checked.train_data_path);
    out.push_path("--dev_data_path", &checked.valid_data_path);
    if shape.eda_augment {
        out.push_path("--aug_eda_path", &checked.eda_cache_path);
    }
    out.push_opt("--test_data_path", checked.test_data_path.as_deref().map(Path::display));
    out.push_opt("--label2id_path", checked.label2id_path.as_deref().map(Path::display));
    if shape.forward_tuning {
        out.push("--seed", args.seed);
        out.push("--max_len", args.hyperparams.max_len);
    }
    out.push_path("--log_dir", &checked.logs_dir);
    Ok(out)
}

/// Build the inference flag list. The trained model and the label mapping
/// must already be on disk.
pub fn inference_args(args: &GenericTaskArgs) -> TrainingResult<ImplementationArgs> {
    let layout = TaskLayout::new(&args.task_dir);

    let label2id_path = layout.label2id_path(&args.train_data);
    if !label2id_path.is_file() {
        return Err(TrainingError::MissingArtifact(label2id_path));
    }
    let model_save_dir = layout.model_output_dir();
    if !model_save_dir.is_dir() {
        return Err(TrainingError::MissingArtifact(model_save_dir));
    }

    let mut out = ImplementationArgs::new();
    out.push_path("--model_save_dir", &model_save_dir);
    out.push_path("--label2id_path", &label2id_path);
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct LabelData {
    labels: Vec<String>,
}

/// Read the `{"labels": [...]}` file referenced by `label_data`.
pub fn load_labels(path: &Path) -> TrainingResult<Vec<String>> {
    require_file("label_data", path)?;
    let bytes = std::fs::read(path)?;
    let data: LabelData = serde_json::from_slice(&bytes).map_err(|e| {
        TrainingError::InvalidSpec(format!("label file {} is malformed: {e}", path.display()))
    })?;
    Ok(data.labels)
}

/// `{label: {"id": n, "label_desc_zh": label}}`, ids in list order.
pub fn label2id(labels: &[String]) -> TrainingResult<Map<String, Value>> {
    if labels.is_empty() {
        return Err(TrainingError::InvalidSpec("label list must not be empty".to_string()));
    }
    let mut out = Map::new();
    for (idx, label) in labels.iter().enumerate() {
        let entry = serde_json::json!({ "id": idx, "label_desc_zh": label });
        if out.insert(label.clone(), entry).is_some() {
            return Err(TrainingError::InvalidSpec(format!("duplicate label: {label}")));
        }
    }
    Ok(out)
}

/// Write the label mapping to `path`. Same labels in, same bytes out.
///
/// Inference reads this file later, so it is replaced atomically.
pub fn write_label2id(labels: &[String], path: &Path) -> TrainingResult<()> {
    let mapping = label2id(labels)?;
    let json = serde_json::to_string_pretty(&mapping)?;
    atomic_write(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::fixtures::task_fixture;

    const STD: TrainingArgShape = TrainingArgShape { train_level: 1, eda_augment: true, forward_tuning: false };

    #[test]
    fn test_training_args_std_shape() {
        let fixture = task_fixture(&["pos", "neg"]);
        let out = training_args(&fixture.args, STD).unwrap();

        assert_eq!(out.get("--gts_train_level"), Some("1"));
        assert_eq!(out.get("--run_mode"), Some("online"));
        assert_eq!(out.get("--gpu_num"), Some("1"));
        assert!(out.get("--label2id_path").unwrap().ends_with("train_label2id.json"));
        assert!(out.get("--aug_eda_path").unwrap().ends_with("train_eda_augment.json"));
        assert!(!out.contains("--test_data_path"));
        assert!(!out.contains("--seed"));
    }

    #[test]
    fn test_training_args_never_emit_empty_optional() {
        let fixture = task_fixture(&["pos"]);
        let out = training_args(&fixture.args, STD).unwrap();
        assert!(out.iter().all(|(_, v)| !v.is_empty()));
        assert_eq!(out.to_argv().len(), out.len() * 2);
    }

    #[test]
    fn test_training_args_include_test_data_when_present() {
        let mut fixture = task_fixture(&["pos"]);
        std::fs::write(fixture.args.data_dir.join("test.json"), "{}").unwrap();
        fixture.args.test_data = Some("test.json".to_string());

        let out = training_args(&fixture.args, STD).unwrap();
        assert!(out.get("--test_data_path").unwrap().ends_with("test.json"));
    }

    #[test]
    fn test_training_args_reject_missing_paths() {
        let mut fixture = task_fixture(&["pos"]);
        fixture.args.valid_data = "missing.json".to_string();

        let err = training_args(&fixture.args, STD).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidPath { field: "valid_data", .. }));
    }

    #[test]
    fn test_classification_requires_label_data() {
        let mut fixture = task_fixture(&["pos"]);
        fixture.args.label_data = None;

        let err = training_args(&fixture.args, STD).unwrap_err();
        assert!(matches!(err, TrainingError::MissingField("label_data")));
    }

    #[test]
    fn test_label2id_is_order_stable() {
        let labels: Vec<String> = ["a", "b", "c"].iter().map(|s| (*s).to_string()).collect();
        let mapping = label2id(&labels).unwrap();

        let keys: Vec<&String> = mapping.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(mapping["a"]["id"], 0);
        assert_eq!(mapping["b"]["id"], 1);
        assert_eq!(mapping["c"]["id"], 2);
        assert_eq!(mapping["c"]["label_desc_zh"], "c");
    }

    #[test]
    fn test_write_label2id_is_idempotent() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("train_label2id.json");
        let labels = vec!["pos".to_string(), "neg".to_string()];

        write_label2id(&labels, &path).unwrap();
        let first = std::fs::read(&path).unwrap();
        write_label2id(&labels, &path).unwrap();
        assert_eq!(first, std::fs::read(&path).unwrap());
    }

    #[test]
    fn test_write_label2id_replaces_previous_mapping_whole() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("train_label2id.json");
        write_label2id(&["a".to_string(), "b".to_string(), "c".to_string()], &path).unwrap();

        write_label2id(&["pos".to_string()], &path).unwrap();

        let mapping: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(mapping, serde_json::json!({ "pos": { "id": 0, "label_desc_zh": "pos" } }));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_label2id_rejects_duplicates_and_empty() {
        assert!(label2id(&[]).is_err());
        assert!(label2id(&["a".to_string(), "a".to_string()]).is_err());
    }

    #[test]
    fn test_inference_args_require_label2id() {
        let fixture = task_fixture(&["pos"]);
        let err = inference_args(&fixture.args).unwrap_err();
        assert!(matches!(err, TrainingError::MissingArtifact(p) if p.ends_with("train_label2id.json")));
    }

    #[test]
    fn test_inference_args_point_at_model_output() {
        let fixture = task_fixture(&["pos"]);
        let layout = TaskLayout::new(&fixture.args.task_dir);
        std::fs::create_dir_all(layout.model_output_dir()).unwrap();
        write_label2id(&["pos".to_string()], &layout.label2id_path("train.json")).unwrap();

        let out = inference_args(&fixture.args).unwrap();
        assert!(out.get("--model_save_dir").unwrap().ends_with("finetune_output"));
        assert!(out.get("--label2id_path").is_some());
    }
}
