use crate::error::{TrainingError, TrainingResult};
use std::path::Path;
use uuid::Uuid;

/// Replace `path` with `content` via a sibling temp file and a rename, so
/// readers see either the old file or the new one.
pub(crate) fn atomic_write(path: &Path, content: &str) -> TrainingResult<()> {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("out.json");
    let temp_path = path.with_file_name(format!("{file_name}.tmp.{}", Uuid::new_v4()));

    std::fs::write(&temp_path, content).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        TrainingError::persistence(&temp_path, e)
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        TrainingError::persistence(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_and_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("train_label2id.json");
        std::fs::write(&path, "old").unwrap();

        atomic_write(&path, "new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_atomic_write_into_missing_dir_is_persistence_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("task_info.json");

        let err = atomic_write(&path, "{}").unwrap_err();
        assert!(matches!(err, TrainingError::Persistence { .. }));
        assert!(!path.exists());
    }
}
