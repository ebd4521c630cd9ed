use crate::error::TrainingResult;
use crate::translator::ImplementationArgs;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Name of a concrete training pipeline or inference engine, e.g. `ft_std`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImplementationId(pub &'static str);

impl ImplementationId {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ImplementationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0)
    }
}

/// Training entry point registered under `train_pipeline:<engine>_<task_type>`.
///
/// Runs `pipeline` to completion with the translated flags, or fails.
#[async_trait]
pub trait TrainPipeline: Send + Sync {
    fn id(&self) -> &'static str;

    /// Checks that `pipeline` can be launched at all. Runs before the task is
    /// marked On Training, so a failure here leaves the task untouched.
    fn preflight(&self, pipeline: ImplementationId) -> TrainingResult<()> {
        let _ = pipeline;
        Ok(())
    }

    async fn train(&self, pipeline: ImplementationId, args: &ImplementationArgs) -> TrainingResult<()>;
}

/// What `prepare_inference` needs to build a handle.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub save_path: PathBuf,
    pub engine: ImplementationId,
    pub args: ImplementationArgs,
}

/// An inference-ready engine description returned by [`InferencePreparer`].
#[derive(Debug, Clone)]
pub struct InferenceHandle {
    pub qualifier: String,
    pub save_path: PathBuf,
    pub engine: ImplementationId,
    pub args: ImplementationArgs,
}

#[async_trait]
pub trait InferencePreparer: Send + Sync {
    fn id(&self) -> &'static str;

    async fn prepare(&self, qualifier: &str, request: InferenceRequest) -> TrainingResult<InferenceHandle>;
}

/// Runs a prepared engine. Returns exactly one result per input, in input order.
#[async_trait]
pub trait InferenceRunner: Send + Sync {
    fn id(&self) -> &'static str;

    async fn infer(&self, handle: &InferenceHandle, records: &[Value]) -> TrainingResult<Vec<Value>>;
}
