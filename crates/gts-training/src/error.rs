use crate::registry::{RegistryKey, Role};
use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

/// Coarse classification of a [`TrainingError`].
///
/// Configuration and registry failures are raised before a run is marked On
/// Training. Once it is, any failure ends in a terminal `Train Failed` record;
/// the orchestrator logs the kind with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Registry,
    Execution,
    Persistence,
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid path for `{field}`: {} does not exist", path.display())]
    InvalidPath { field: &'static str, path: PathBuf },

    #[error("invalid value for `{field}`: {value:?}")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("invalid task spec: {0}")]
    InvalidSpec(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no module factory registered for train mode `{0}`")]
    UnsupportedTrainMode(String),

    #[error("unsupported task type `{qualifier}` for role {role}")]
    UnsupportedTaskType { role: Role, qualifier: String },

    #[error("no implementation registered for {0}")]
    UnregisteredKey(RegistryKey),

    #[error("duplicate registration for {0}")]
    DuplicateKey(RegistryKey),

    #[error("implementation role {actual} does not match key {key}")]
    RoleMismatch { key: RegistryKey, actual: Role },

    #[error("execution error: {0}")]
    Execution(String),

    #[error("invalid status transition from `{from}` to `{to}`")]
    InvalidTransition { from: String, to: String },

    #[error("failed to persist {}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt status record at {}: {reason}", path.display())]
    CorruptRecord { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrainingError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath { .. }
            | Self::InvalidEnumValue { .. }
            | Self::MissingField(_)
            | Self::MissingArtifact(_)
            | Self::InvalidSpec(_)
            | Self::Config(_)
            | Self::UnsupportedTrainMode(_)
            | Self::UnsupportedTaskType { .. } => ErrorKind::Configuration,
            Self::UnregisteredKey(_) | Self::DuplicateKey(_) | Self::RoleMismatch { .. } => {
                ErrorKind::Registry
            }
            Self::Persistence { .. } | Self::CorruptRecord { .. } => ErrorKind::Persistence,
            Self::Execution(_)
            | Self::InvalidTransition { .. }
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Execution,
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_separates_configuration_from_execution() {
        let err = TrainingError::MissingArtifact(PathBuf::from("x_label2id.json"));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = TrainingError::Execution("boom".to_string());
        assert_eq!(err.kind(), ErrorKind::Execution);

        let err = TrainingError::UnregisteredKey(RegistryKey::new(Role::Inference, "bagualu_nli"));
        assert_eq!(err.kind(), ErrorKind::Registry);
    }

    #[test]
    fn test_persistence_keeps_io_error_as_source_only() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = TrainingError::persistence("/task/task_info.json", io);
        assert_eq!(err.to_string(), "failed to persist /task/task_info.json");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("read-only"));
    }

    #[test]
    fn test_invalid_path_message_names_field() {
        let err = TrainingError::InvalidPath { field: "data_dir", path: PathBuf::from("/nope") };
        let msg = err.to_string();
        assert!(msg.contains("data_dir"));
        assert!(msg.contains("/nope"));
    }
}
