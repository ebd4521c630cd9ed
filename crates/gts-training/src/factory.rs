//! Module factories: one per train mode.
//!
//! A factory decides which training pipeline and inference engine serve its
//! mode, and how generic arguments are shaped for them.

use crate::args::{GenericTaskArgs, TrainMode};
use crate::error::{TrainingError, TrainingResult};
use crate::layout::TaskLayout;
use crate::pipeline::ImplementationId;
use crate::translator::{self, ImplementationArgs, TrainingArgShape};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub trait ModuleFactory: Send + Sync {
    fn train_mode(&self) -> TrainMode;

    fn training_pipeline_identity(&self) -> ImplementationId;

    fn inference_engine_identity(&self) -> ImplementationId;

    fn parse_training_args(&self, args: &GenericTaskArgs) -> TrainingResult<ImplementationArgs>;

    fn parse_inference_args(&self, args: &GenericTaskArgs) -> TrainingResult<ImplementationArgs> {
        translator::inference_args(args)
    }

    /// One-time setup before training. Idempotent.
    fn prepare_training(&self, args: &GenericTaskArgs) -> TrainingResult<()> {
        materialize_label2id(args)
    }
}

/// Turn the label file into `<task_dir>/<stem>_label2id.json`.
///
/// Without a label file there is nothing to write.
fn materialize_label2id(args: &GenericTaskArgs) -> TrainingResult<()> {
    let Some(label_path) = args.label_data_path() else {
        return Ok(());
    };
    let labels = translator::load_labels(&label_path)?;
    let target = TaskLayout::new(&args.task_dir).label2id_path(&args.train_data);
    translator::write_label2id(&labels, &target)?;
    debug!(path = %target.display(), labels = labels.len(), "wrote label2id");
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FastModuleFactory;

impl ModuleFactory for FastModuleFactory {
    fn train_mode(&self) -> TrainMode {
        TrainMode::Fast
    }

    fn training_pipeline_identity(&self) -> ImplementationId {
        ImplementationId("ft_fast")
    }

    fn inference_engine_identity(&self) -> ImplementationId {
        ImplementationId("clf_fast")
    }

    fn parse_training_args(&self, args: &GenericTaskArgs) -> TrainingResult<ImplementationArgs> {
        translator::training_args(
            args,
            TrainingArgShape { train_level: 0, eda_augment: false, forward_tuning: false },
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdModuleFactory;

impl ModuleFactory for StdModuleFactory {
    fn train_mode(&self) -> TrainMode {
        TrainMode::Standard
    }

    fn training_pipeline_identity(&self) -> ImplementationId {
        ImplementationId("ft_std")
    }

    fn inference_engine_identity(&self) -> ImplementationId {
        ImplementationId("clf_std")
    }

    fn parse_training_args(&self, args: &GenericTaskArgs) -> TrainingResult<ImplementationArgs> {
        translator::training_args(
            args,
            TrainingArgShape { train_level: 1, eda_augment: true, forward_tuning: false },
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AdvancedModuleFactory;

impl ModuleFactory for AdvancedModuleFactory {
    fn train_mode(&self) -> TrainMode {
        TrainMode::Advanced
    }

    fn training_pipeline_identity(&self) -> ImplementationId {
        ImplementationId("ft_adv")
    }

    fn inference_engine_identity(&self) -> ImplementationId {
        ImplementationId("clf_adv")
    }

    fn parse_training_args(&self, args: &GenericTaskArgs) -> TrainingResult<ImplementationArgs> {
        translator::training_args(
            args,
            TrainingArgShape { train_level: 2, eda_augment: true, forward_tuning: true },
        )
    }
}

/// Train mode → factory. Built at startup, read-only afterwards.
#[derive(Clone, Default)]
pub struct FactoryTable {
    factories: BTreeMap<TrainMode, Arc<dyn ModuleFactory>>,
}

impl FactoryTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in mode.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(Arc::new(FastModuleFactory));
        table.insert(Arc::new(StdModuleFactory));
        table.insert(Arc::new(AdvancedModuleFactory));
        table
    }

    pub fn insert(&mut self, factory: Arc<dyn ModuleFactory>) {
        self.factories.insert(factory.train_mode(), factory);
    }

    pub fn get(&self, mode: TrainMode) -> TrainingResult<Arc<dyn ModuleFactory>> {
        self.factories
            .get(&mode)
            .cloned()
            .ok_or_else(|| TrainingError::UnsupportedTrainMode(mode.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ModuleFactory>> {
        self.factories.values()
    }
}
