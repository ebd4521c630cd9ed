//! Persisted task status and its state machine.
//!
//! ```text
//! Created ──begin──▶ On Training ──succeed──▶ Train Success
//!    ▲                    │
//!    └─ (absent file)     └──────fail────────▶ Train Failed
//! ```
//!
//! Any state may go back to On Training when a task directory is reused for a
//! new job. Terminal states are only left that way.

use crate::args::GenericTaskArgs;
use crate::error::{TrainingError, TrainingResult};
use crate::layout::TaskLayout;
use crate::persist::atomic_write;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Created")]
    Created,
    #[serde(rename = "On Training")]
    OnTraining,
    #[serde(rename = "Train Success")]
    TrainSuccess,
    #[serde(rename = "Train Failed")]
    TrainFailed,
}

impl TaskStatus {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::OnTraining => 1,
            Self::TrainSuccess => 2,
            Self::TrainFailed => 3,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::TrainSuccess | Self::TrainFailed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::OnTraining => "On Training",
            Self::TrainSuccess => "Train Success",
            Self::TrainFailed => "Train Failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `task_info.json`.
///
/// Keys this type does not know about are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusRecord {
    pub status: TaskStatus,
    pub status_code: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TaskStatusRecord {
    fn default() -> Self {
        Self {
            status: TaskStatus::Created,
            status_code: TaskStatus::Created.code(),
            train_pid: None,
            train_data: None,
            val_data: None,
            test_data: None,
            label_data: None,
            save_path: None,
            extra: Map::new(),
        }
    }
}

impl TaskStatusRecord {
    /// Move to `to`, keeping `status_code` in step.
    pub fn transition(&mut self, to: TaskStatus) -> TrainingResult<()> {
        let allowed = match to {
            TaskStatus::OnTraining => true,
            TaskStatus::TrainSuccess | TaskStatus::TrainFailed => self.status == TaskStatus::OnTraining,
            TaskStatus::Created => false,
        };
        if !allowed {
            return Err(TrainingError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.status_code = to.code();
        Ok(())
    }

    fn force_failed(&mut self) {
        self.status = TaskStatus::TrainFailed;
        self.status_code = TaskStatus::TrainFailed.code();
    }
}

/// Per-run facts recorded on the On Training transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInputs {
    pub pid: u32,
    pub train_data: String,
    pub val_data: String,
    pub test_data: Option<String>,
    pub label_data: Option<String>,
}

impl RunInputs {
    #[must_use]
    pub fn for_current_process(args: &GenericTaskArgs) -> Self {
        Self {
            pid: std::process::id(),
            train_data: args.train_data.clone(),
            val_data: args.valid_data.clone(),
            test_data: args.test_data.clone(),
            label_data: args.label_data.clone(),
        }
    }
}

/// Durable home of status records, keyed by task directory.
pub trait StatusStore: Send + Sync {
    /// `Ok(None)` when the task has no record yet.
    fn load(&self, task_dir: &Path) -> TrainingResult<Option<TaskStatusRecord>>;

    fn save(&self, task_dir: &Path, record: &TaskStatusRecord) -> TrainingResult<()>;
}

/// `task_info.json` inside the task directory, replaced atomically on every
/// write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStatusStore;

impl StatusStore for FileStatusStore {
    fn load(&self, task_dir: &Path) -> TrainingResult<Option<TaskStatusRecord>> {
        let path = TaskLayout::new(task_dir).status_path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TrainingError::persistence(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| TrainingError::CorruptRecord { path, reason: e.to_string() })
    }

    fn save(&self, task_dir: &Path, record: &TaskStatusRecord) -> TrainingResult<()> {
        let path = TaskLayout::new(task_dir).status_path();
        let json = serde_json::to_string_pretty(record)?;
        atomic_write(&path, &json)
    }
}

/// Lifecycle tracker for one task directory.
#[derive(Clone)]
pub struct TaskTracker {
    task_dir: PathBuf,
    store: Arc<dyn StatusStore>,
}

impl TaskTracker {
    #[must_use]
    pub fn new(task_dir: impl Into<PathBuf>, store: Arc<dyn StatusStore>) -> Self {
        Self { task_dir: task_dir.into(), store }
    }

    #[must_use]
    pub fn task_dir(&self) -> &Path {
        &self.task_dir
    }

    pub fn load(&self) -> TrainingResult<Option<TaskStatusRecord>> {
        self.store.load(&self.task_dir)
    }

    /// Current status; an absent record means `Created`.
    pub fn status(&self) -> TrainingResult<TaskStatus> {
        Ok(self.load()?.map_or(TaskStatus::Created, |r| r.status))
    }

    /// Persist On Training and hand back a guard for the rest of the run.
    ///
    /// A previous record is reused so foreign keys survive; a corrupt one is
    /// replaced.
    pub fn begin(&self, inputs: RunInputs) -> TrainingResult<ActiveRun<'_>> {
        let mut record = match self.load() {
            Ok(existing) => existing.unwrap_or_default(),
            Err(TrainingError::CorruptRecord { path, reason }) => {
                warn!(path = %path.display(), %reason, "replacing unreadable status record");
                TaskStatusRecord::default()
            }
            Err(e) => return Err(e),
        };

        if record.status.is_terminal() {
            info!(task_dir = %self.task_dir.display(), previous = %record.status, "reusing task directory");
        }

        record.transition(TaskStatus::OnTraining)?;
        record.train_pid = Some(inputs.pid);
        record.train_data = Some(inputs.train_data);
        record.val_data = Some(inputs.val_data);
        record.test_data = inputs.test_data;
        record.label_data = inputs.label_data;
        record.save_path = None;

        self.store.save(&self.task_dir, &record)?;
        info!(task_dir = %self.task_dir.display(), pid = inputs.pid, "task on training");

        Ok(ActiveRun { tracker: self, record, finished: false })
    }
}

impl fmt::Debug for TaskTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTracker").field("task_dir", &self.task_dir).finish_non_exhaustive()
    }
}

/// An in-flight training run.
///
/// Exactly one terminal transition is persisted: through [`ActiveRun::succeed`],
/// [`ActiveRun::fail`], or, if the guard is dropped without either (panic or a
/// failed success write), Train Failed from `Drop`.
#[derive(Debug)]
pub struct ActiveRun<'a> {
    tracker: &'a TaskTracker,
    record: TaskStatusRecord,
    finished: bool,
}

impl ActiveRun<'_> {
    #[must_use]
    pub fn record(&self) -> &TaskStatusRecord {
        &self.record
    }

    pub fn succeed(mut self, save_path: &Path) -> TrainingResult<TaskStatusRecord> {
        // The pipeline may have added its own keys while running.
        if let Ok(Some(on_disk)) = self.tracker.load() {
            self.record.extra = on_disk.extra;
        }
        self.record.transition(TaskStatus::TrainSuccess)?;
        self.record.save_path = Some(save_path.to_path_buf());
        self.tracker.store.save(&self.tracker.task_dir, &self.record)?;
        self.finished = true;
        info!(task_dir = %self.tracker.task_dir.display(), "train success");
        Ok(self.record.clone())
    }

    pub fn fail(mut self) -> TrainingResult<TaskStatusRecord> {
        self.record.transition(TaskStatus::TrainFailed)?;
        self.tracker.store.save(&self.tracker.task_dir, &self.record)?;
        self.finished = true;
        info!(task_dir = %self.tracker.task_dir.display(), "train failed");
        Ok(self.record.clone())
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(task_dir = %self.tracker.task_dir.display(), "run ended without a terminal status; marking failed");
        self.record.force_failed();
        self.record.save_path = None;
        if let Err(e) = self.tracker.store.save(&self.tracker.task_dir, &self.record) {
            error!(task_dir = %self.tracker.task_dir.display(), error = %e, "could not persist Train Failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// File-backed store that remembers every status it was asked to write.
    #[derive(Default)]
    pub struct RecordingStore {
        inner: FileStatusStore,
        pub writes: Mutex<Vec<TaskStatus>>,
        pub fail_on: Option<TaskStatus>,
    }

    impl RecordingStore {
        pub fn failing_on(status: TaskStatus) -> Self {
            Self { fail_on: Some(status), ..Self::default() }
        }

        pub fn written(&self) -> Vec<TaskStatus> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl StatusStore for RecordingStore {
        fn load(&self, task_dir: &Path) -> TrainingResult<Option<TaskStatusRecord>> {
            self.inner.load(task_dir)
        }

        fn save(&self, task_dir: &Path, record: &TaskStatusRecord) -> TrainingResult<()> {
            if self.fail_on == Some(record.status) {
                return Err(TrainingError::persistence(
                    TaskLayout::new(task_dir).status_path(),
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            self.writes.lock().unwrap().push(record.status);
            self.inner.save(task_dir, record)
        }
    }
}
