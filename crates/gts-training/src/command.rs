//! Implementations that delegate to an external program.
//!
//! The numeric work (tokenization, models, data loading) lives in whatever the
//! configured command runs. Training gets the translated flags appended to its
//! argv; inference talks JSON lines over stdin/stdout.

use crate::config::{CommandSpec, EngineConfig};
use crate::error::{TrainingError, TrainingResult};
use crate::pipeline::{
    ImplementationId, InferenceHandle, InferencePreparer, InferenceRequest, InferenceRunner, TrainPipeline,
};
use crate::translator::ImplementationArgs;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

fn build_command(spec: &CommandSpec, args: &ImplementationArgs) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).args(args.to_argv()).envs(&spec.env).kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

/// Training pipeline that runs the configured command to completion.
pub struct CommandTrainPipeline {
    qualifier: String,
    config: Arc<EngineConfig>,
}

impl CommandTrainPipeline {
    #[must_use]
    pub fn new(qualifier: impl Into<String>, config: Arc<EngineConfig>) -> Self {
        Self { qualifier: qualifier.into(), config }
    }
}

#[async_trait]
impl TrainPipeline for CommandTrainPipeline {
    fn id(&self) -> &'static str {
        "command"
    }

    fn preflight(&self, pipeline: ImplementationId) -> TrainingResult<()> {
        self.config.command(&self.qualifier, pipeline).map(|_| ())
    }

    async fn train(&self, pipeline: ImplementationId, args: &ImplementationArgs) -> TrainingResult<()> {
        let spec = self.config.command(&self.qualifier, pipeline)?;
        info!(pipeline = %pipeline, program = %spec.program, "launching training pipeline");
        debug!(argv = %args, "pipeline arguments");

        let status = build_command(spec, args)
            .stdin(Stdio::null())
            // Keep our stdout for the command's own output (`--json`).
            .stdout(Stdio::from(std::io::stderr()))
            .status()
            .await
            .map_err(|e| TrainingError::Execution(format!("failed to launch `{}`: {e}", spec.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(TrainingError::Execution(format!("training pipeline `{pipeline}` exited with {status}")))
        }
    }
}

/// Resolves the inference command up front so a missing configuration fails
/// at preparation rather than on the first query.
pub struct CommandInferencePreparer {
    config: Arc<EngineConfig>,
}

impl CommandInferencePreparer {
    #[must_use]
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InferencePreparer for CommandInferencePreparer {
    fn id(&self) -> &'static str {
        "command"
    }

    async fn prepare(&self, qualifier: &str, request: InferenceRequest) -> TrainingResult<InferenceHandle> {
        self.config.command(qualifier, request.engine)?;
        Ok(InferenceHandle {
            qualifier: qualifier.to_string(),
            save_path: request.save_path,
            engine: request.engine,
            args: request.args,
        })
    }
}

/// Sends `{"text": ...}` per input line and expects one JSON line back per
/// input, in order.
pub struct CommandInferenceRunner {
    config: Arc<EngineConfig>,
}

impl CommandInferenceRunner {
    #[must_use]
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

fn encode_samples(records: &[Value]) -> TrainingResult<String> {
    let mut out = String::new();
    for (idx, record) in records.iter().enumerate() {
        let text = record
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| TrainingError::InvalidSpec(format!("record[{idx}] has no string `content` field")))?;
        out.push_str(&serde_json::to_string(&serde_json::json!({ "text": text }))?);
        out.push('\n');
    }
    Ok(out)
}

fn decode_results(stdout: &[u8], expected: usize) -> TrainingResult<Vec<Value>> {
    let text = String::from_utf8_lossy(stdout);
    let results = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| TrainingError::Execution(format!("result line {} is not JSON: {e}", idx + 1)))
        })
        .collect::<TrainingResult<Vec<Value>>>()?;

    if results.len() != expected {
        return Err(TrainingError::Execution(format!(
            "inference engine returned {} results for {expected} inputs",
            results.len()
        )));
    }
    Ok(results)
}

#[async_trait]
impl InferenceRunner for CommandInferenceRunner {
    fn id(&self) -> &'static str {
        "command"
    }

    async fn infer(&self, handle: &InferenceHandle, records: &[Value]) -> TrainingResult<Vec<Value>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let input = encode_samples(records)?;
        let spec = self.config.command(&handle.qualifier, handle.engine)?;

        let mut child = build_command(spec, &handle.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| TrainingError::Execution(format!("failed to launch `{}`: {e}", spec.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TrainingError::Execution("inference engine stdin unavailable".to_string()))?;
        // Feed input concurrently so a chatty engine cannot block on a full stdout pipe.
        let writer = tokio::spawn(async move {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        let written = writer.await;

        if !output.status.success() {
            return Err(TrainingError::Execution(format!(
                "inference engine `{}` exited with {}",
                handle.engine, output.status
            )));
        }
        written.map_err(|e| TrainingError::Execution(format!("stdin writer failed: {e}")))??;
        decode_results(&output.stdout, records.len())
    }
}
