//! Shared clap argument types.

use clap::Args;
use gts_training::{EngineFamily, GenericTaskArgs, TaskType, TrainMode, TrainingHyperParams};
use std::path::PathBuf;

/// Everything `gts train` accepts; becomes a `GenericTaskArgs`.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Engine family (qiankunding, bagualu)
    #[arg(long, value_parser = parse_enum::<EngineFamily>)]
    pub engine_type: EngineFamily,

    /// Training mode (fast, standard, advanced)
    #[arg(long, value_parser = parse_enum::<TrainMode>)]
    pub train_mode: TrainMode,

    /// Task type (classification, similarity, nli)
    #[arg(long, value_parser = parse_enum::<TaskType>)]
    pub task_type: TaskType,

    /// Task directory; holds task_info.json and generated artifacts
    #[arg(long)]
    pub task_dir: PathBuf,

    /// Directory with the pretrained models
    #[arg(long)]
    pub pretrained_model_dir: PathBuf,

    /// Data directory of the task
    #[arg(long)]
    pub data_dir: PathBuf,

    /// Filename of the train dataset
    #[arg(long)]
    pub train_data: String,

    /// Filename of the validation dataset
    #[arg(long)]
    pub valid_data: String,

    /// Filename of the test dataset
    #[arg(long)]
    pub test_data: Option<String>,

    /// Filename of the label data ({"labels": [...]})
    #[arg(long)]
    pub label_data: Option<String>,

    /// Save path for the trained model and logs (defaults to <task_dir>/outputs)
    #[arg(long)]
    pub save_path: Option<PathBuf>,

    /// Number of GPUs handed to the pipeline
    #[arg(long, default_value_t = 1)]
    pub gpus: u32,

    /// Random seed
    #[arg(long, default_value_t = 1234)]
    pub seed: u64,

    /// Number of data preprocessing workers
    #[arg(long, default_value_t = 8)]
    pub num_workers: u32,

    #[arg(long, default_value_t = 1)]
    pub train_batchsize: u32,

    #[arg(long, default_value_t = 4)]
    pub valid_batchsize: u32,

    #[arg(long, default_value_t = 4)]
    pub test_batchsize: u32,

    /// Max length of input text
    #[arg(long, default_value_t = 512)]
    pub max_len: u32,

    /// Learning rate
    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Enable gradient checkpointing
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub gradient_checkpointing: bool,

    /// Print the final status record as JSON
    #[arg(long)]
    pub json: bool,
}

impl TrainArgs {
    pub fn into_task_args(self) -> GenericTaskArgs {
        let save_path = self.save_path.unwrap_or_else(|| self.task_dir.join("outputs"));
        GenericTaskArgs {
            engine_type: self.engine_type,
            train_mode: self.train_mode,
            task_type: self.task_type,
            task_dir: self.task_dir,
            pretrained_model_dir: self.pretrained_model_dir,
            data_dir: self.data_dir,
            save_path,
            train_data: self.train_data,
            valid_data: self.valid_data,
            test_data: self.test_data,
            label_data: self.label_data,
            gpus: self.gpus,
            seed: self.seed,
            hyperparams: TrainingHyperParams {
                num_workers: self.num_workers,
                train_batchsize: self.train_batchsize,
                valid_batchsize: self.valid_batchsize,
                test_batchsize: self.test_batchsize,
                max_len: self.max_len,
                lr: self.lr,
                gradient_checkpointing: self.gradient_checkpointing,
            },
        }
    }
}

fn parse_enum<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr<Err = gts_training::TrainingError>,
{
    s.parse::<T>().map_err(|e| e.to_string())
}
