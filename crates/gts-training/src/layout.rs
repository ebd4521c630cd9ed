use std::path::PathBuf;

/// Filesystem layout of a task directory.
///
/// A task directory is both the identity of a job and the home of everything
/// it produces:
///
/// ```text
/// <task_dir>/task_info.json
/// <task_dir>/<stem>_label2id.json
/// <task_dir>/<stem>_eda_augment.json
/// <task_dir>/logs/
/// <task_dir>/outputs/student_output/finetune_output/
/// ```
#[derive(Debug, Clone)]
pub struct TaskLayout {
    root: PathBuf,
}

impl TaskLayout {
    #[must_use]
    pub fn new(task_dir: impl Into<PathBuf>) -> Self {
        Self { root: task_dir.into() }
    }

    #[must_use]
    pub fn status_path(&self) -> PathBuf {
        self.root.join("task_info.json")
    }

    /// Label-to-id mapping derived from the train filename.
    ///
    /// Pure in `(task_dir, train_data)` so inference can recompute it without
    /// any training state.
    #[must_use]
    pub fn label2id_path(&self, train_data: &str) -> PathBuf {
        self.root.join(format!("{}_label2id.json", file_stem(train_data)))
    }

    #[must_use]
    pub fn eda_cache_path(&self, train_data: &str) -> PathBuf {
        self.root.join(format!("{}_eda_augment.json", file_stem(train_data)))
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    #[must_use]
    pub fn model_output_dir(&self) -> PathBuf {
        self.root.join("outputs").join("student_output").join("finetune_output")
    }
}

/// Everything before the first `.` of the bare filename.
fn file_stem(filename: &str) -> &str {
    filename.split('.').next().unwrap_or(filename)
}
