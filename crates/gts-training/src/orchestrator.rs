use crate::args::GenericTaskArgs;
use crate::error::{TrainingError, TrainingResult};
use crate::factory::FactoryTable;
use crate::pipeline::{ImplementationId, InferenceHandle, InferenceRequest, TrainPipeline};
use crate::registry::{PipelineRegistry, Role};
use crate::tracker::{FileStatusStore, RunInputs, StatusStore, TaskStatusRecord, TaskTracker};
use crate::translator::ImplementationArgs;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Top-level control for training and inference requests.
///
/// Picks a module factory by train mode and an implementation by
/// `<engine>_<task_type>`, and records training progress through the task
/// tracker. It never registers anything itself.
pub struct Orchestrator {
    registry: Arc<PipelineRegistry>,
    factories: FactoryTable,
    store: Arc<dyn StatusStore>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(registry: Arc<PipelineRegistry>, factories: FactoryTable) -> Self {
        Self { registry, factories, store: Arc::new(FileStatusStore) }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    #[must_use]
    pub fn factories(&self) -> &FactoryTable {
        &self.factories
    }

    #[must_use]
    pub fn tracker(&self, task_dir: &Path) -> TaskTracker {
        TaskTracker::new(task_dir, Arc::clone(&self.store))
    }

    pub fn status(&self, task_dir: &Path) -> TrainingResult<Option<TaskStatusRecord>> {
        self.tracker(task_dir).load()
    }

    /// Run one training job to a terminal status.
    ///
    /// Configuration and registry errors come back before anything is written.
    /// Once On Training is persisted, every outcome ends in exactly one more
    /// write: Train Success, or Train Failed with the error returned.
    #[instrument(skip_all, fields(task_dir = %args.task_dir.display(), qualifier = %args.qualifier(), mode = %args.train_mode))]
    pub async fn run(&self, args: &GenericTaskArgs) -> TrainingResult<TaskStatusRecord> {
        args.validate()?;
        let factory = self.factories.get(args.train_mode)?;
        let qualifier = args.qualifier();
        let pipeline = self
            .registry
            .train_pipeline(&qualifier)
            .map_err(|e| unsupported(e, Role::TrainPipeline, &qualifier))?;
        let identity = factory.training_pipeline_identity();
        let impl_args = factory.parse_training_args(args)?;
        pipeline.preflight(identity)?;
        factory.prepare_training(args)?;

        let tracker = self.tracker(&args.task_dir);
        let run = tracker.begin(RunInputs::for_current_process(args))?;

        match execute(args, identity, &impl_args, pipeline.as_ref()).await {
            Ok(()) => run.succeed(&args.save_path),
            Err(e) => {
                error!(pipeline = %identity, kind = ?e.kind(), error = %error_chain(&e), "training failed");
                if let Err(persist) = run.fail() {
                    error!(error = %persist, "could not record Train Failed");
                }
                Err(e)
            }
        }
    }

    /// Load the args snapshot in `save_path` and build an inference handle.
    #[instrument(skip(self))]
    pub async fn prepare_inference(&self, save_path: &Path) -> TrainingResult<InferenceHandle> {
        let args = GenericTaskArgs::load(save_path)?;
        let factory = self.factories.get(args.train_mode)?;
        let qualifier = args.qualifier();
        let preparer = self
            .registry
            .inference_preparer(&qualifier)
            .map_err(|e| unsupported(e, Role::PrepareInference, &qualifier))?;
        let impl_args = factory.parse_inference_args(&args)?;

        let request = InferenceRequest {
            save_path: save_path.to_path_buf(),
            engine: factory.inference_engine_identity(),
            args: impl_args,
        };
        preparer.prepare(&qualifier, request).await
    }

    /// One result per record, in record order.
    pub async fn inference(&self, handle: &InferenceHandle, records: &[Value]) -> TrainingResult<Vec<Value>> {
        let runner = self
            .registry
            .inference_runner(&handle.qualifier)
            .map_err(|e| unsupported(e, Role::Inference, &handle.qualifier))?;
        let results = runner.infer(handle, records).await?;
        if results.len() != records.len() {
            return Err(TrainingError::Execution(format!(
                "inference returned {} results for {} records",
                results.len(),
                records.len()
            )));
        }
        Ok(results)
    }
}

async fn execute(
    args: &GenericTaskArgs,
    identity: ImplementationId,
    impl_args: &ImplementationArgs,
    pipeline: &dyn TrainPipeline,
) -> TrainingResult<()> {
    std::fs::create_dir_all(&args.save_path)?;
    args.save(&args.save_path)?;
    info!(pipeline = %identity, implementation = pipeline.id(), "starting training");
    pipeline.train(identity, impl_args).await
}

fn unsupported(err: TrainingError, role: Role, qualifier: &str) -> TrainingError {
    match err {
        TrainingError::UnregisteredKey(_) => {
            TrainingError::UnsupportedTaskType { role, qualifier: qualifier.to_string() }
        }
        other => other,
    }
}

fn error_chain(err: &TrainingError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    out
}
