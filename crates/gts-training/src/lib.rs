//! GTS Training
//!
//! Dispatch and lifecycle core for NLP training jobs:
//! - Routing a request to a pipeline by `(role, <engine>_<task_type>)` (`PipelineRegistry`)
//! - Per-train-mode module factories that shape pipeline arguments (`ModuleFactory`)
//! - Typed translation of generic arguments into flag lists (`translator`)
//! - A persisted task status state machine (`TaskTracker`)
//! - Top-level control tying it together (`Orchestrator`)
//!
//! The numeric work itself is delegated to external programs (`command`).

pub mod args;
pub mod builtin;
pub mod command;
pub mod config;
pub mod error;
pub mod factory;
pub mod layout;
pub mod orchestrator;
mod persist;
pub mod pipeline;
pub mod registry;
pub mod tracker;
pub mod translator;

pub use args::{EngineFamily, GenericTaskArgs, TaskType, TrainMode, TrainingHyperParams};
pub use builtin::{standard_registry, SUPPORTED_PAIRS};
pub use config::{CommandSpec, EngineConfig};
pub use error::{ErrorKind, TrainingError, TrainingResult};
pub use factory::{AdvancedModuleFactory, FactoryTable, FastModuleFactory, ModuleFactory, StdModuleFactory};
pub use layout::TaskLayout;
pub use orchestrator::Orchestrator;
pub use pipeline::{
    ImplementationId, InferenceHandle, InferencePreparer, InferenceRequest, InferenceRunner, TrainPipeline,
};
pub use registry::{DuplicatePolicy, Implementation, PipelineRegistry, RegistryKey, Role};
pub use tracker::{ActiveRun, FileStatusStore, RunInputs, StatusStore, TaskStatus, TaskStatusRecord, TaskTracker};
pub use translator::{ImplementationArgs, TrainingArgShape};
