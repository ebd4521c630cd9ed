//! Dispatch table from `(role, <engine>_<task_type>)` to an implementation.

use crate::error::{TrainingError, TrainingResult};
use crate::pipeline::{InferencePreparer, InferenceRunner, TrainPipeline};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    TrainPipeline,
    PrepareInference,
    Inference,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrainPipeline => "train_pipeline",
            Self::PrepareInference => "prepare_inference",
            Self::Inference => "inference",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryKey {
    pub role: Role,
    pub qualifier: String,
}

impl RegistryKey {
    #[must_use]
    pub fn new(role: Role, qualifier: impl Into<String>) -> Self {
        Self { role, qualifier: qualifier.into() }
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.qualifier)
    }
}

/// A registered callable; the variant fixes its role.
#[derive(Clone)]
pub enum Implementation {
    Train(Arc<dyn TrainPipeline>),
    PrepareInference(Arc<dyn InferencePreparer>),
    Inference(Arc<dyn InferenceRunner>),
}

impl Implementation {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Train(_) => Role::TrainPipeline,
            Self::PrepareInference(_) => Role::PrepareInference,
            Self::Inference(_) => Role::Inference,
        }
    }

    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Train(i) => i.id(),
            Self::PrepareInference(i) => i.id(),
            Self::Inference(i) => i.id(),
        }
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation").field("role", &self.role()).field("id", &self.id()).finish()
    }
}

/// What to do when a key is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Last registration wins; a warning is logged.
    #[default]
    Overwrite,
    /// Fail with [`TrainingError::DuplicateKey`].
    Strict,
}

/// Registry of pipeline implementations.
///
/// Filled once at startup and only read afterwards, so it needs no locking;
/// share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    entries: BTreeMap<RegistryKey, Implementation>,
    policy: DuplicatePolicy,
}

impl PipelineRegistry {
    #[must_use]
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { entries: BTreeMap::new(), policy }
    }

    /// Registers an implementation under `key`.
    ///
    /// # Errors
    /// Returns error if the implementation's role differs from the key's, or
    /// if the key is taken and the policy is strict.
    pub fn register(&mut self, key: RegistryKey, implementation: Implementation) -> TrainingResult<()> {
        if implementation.role() != key.role {
            return Err(TrainingError::RoleMismatch { key, actual: implementation.role() });
        }

        if let Some(existing) = self.entries.get(&key) {
            match self.policy {
                DuplicatePolicy::Strict => return Err(TrainingError::DuplicateKey(key)),
                DuplicatePolicy::Overwrite => warn!(
                    key = %key,
                    previous = existing.id(),
                    replacement = implementation.id(),
                    "overwriting registered implementation"
                ),
            }
        }

        debug!(key = %key, implementation = implementation.id(), "registered");
        self.entries.insert(key, implementation);
        Ok(())
    }

    pub fn register_train(&mut self, qualifier: &str, pipeline: Arc<dyn TrainPipeline>) -> TrainingResult<()> {
        self.register(RegistryKey::new(Role::TrainPipeline, qualifier), Implementation::Train(pipeline))
    }

    pub fn register_prepare_inference(
        &mut self,
        qualifier: &str,
        preparer: Arc<dyn InferencePreparer>,
    ) -> TrainingResult<()> {
        self.register(
            RegistryKey::new(Role::PrepareInference, qualifier),
            Implementation::PrepareInference(preparer),
        )
    }

    pub fn register_inference(&mut self, qualifier: &str, runner: Arc<dyn InferenceRunner>) -> TrainingResult<()> {
        self.register(RegistryKey::new(Role::Inference, qualifier), Implementation::Inference(runner))
    }

    /// Gets the implementation registered under `key`.
    ///
    /// # Errors
    /// Returns [`TrainingError::UnregisteredKey`] naming the key.
    pub fn get(&self, key: &RegistryKey) -> TrainingResult<&Implementation> {
        self.entries.get(key).ok_or_else(|| TrainingError::UnregisteredKey(key.clone()))
    }

    pub fn train_pipeline(&self, qualifier: &str) -> TrainingResult<Arc<dyn TrainPipeline>> {
        match self.get(&RegistryKey::new(Role::TrainPipeline, qualifier))? {
            Implementation::Train(p) => Ok(Arc::clone(p)),
            other => Err(Self::mismatch(Role::TrainPipeline, qualifier, other)),
        }
    }

    pub fn inference_preparer(&self, qualifier: &str) -> TrainingResult<Arc<dyn InferencePreparer>> {
        match self.get(&RegistryKey::new(Role::PrepareInference, qualifier))? {
            Implementation::PrepareInference(p) => Ok(Arc::clone(p)),
            other => Err(Self::mismatch(Role::PrepareInference, qualifier, other)),
        }
    }

    pub fn inference_runner(&self, qualifier: &str) -> TrainingResult<Arc<dyn InferenceRunner>> {
        match self.get(&RegistryKey::new(Role::Inference, qualifier))? {
            Implementation::Inference(r) => Ok(Arc::clone(r)),
            other => Err(Self::mismatch(Role::Inference, qualifier, other)),
        }
    }

    fn mismatch(role: Role, qualifier: &str, found: &Implementation) -> TrainingError {
        TrainingError::RoleMismatch { key: RegistryKey::new(role, qualifier), actual: found.role() }
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &RegistryKey> {
        self.entries.keys()
    }

    #[must_use]
    pub fn contains(&self, key: &RegistryKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
