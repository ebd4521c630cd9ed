//! GTS CLI - command-line surface for the GTS training engine
//!
//! Provides a `gts` command that dispatches NLP training jobs to the
//! configured pipeline implementations, reports task status, and runs
//! inference against trained models.

mod commands;

use clap::{Parser, Subcommand};
use gts_training::EngineConfig;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{infer, list, status, train, TrainArgs};

/// GTS CLI - NLP task dispatch and training lifecycle
#[derive(Parser, Debug)]
#[command(name = "gts", author, version, about = "GTS - NLP training dispatch and task lifecycle")]
struct Args {
    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Engine config file (defaults to ~/.gts/config.toml merged with ./gts.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model for a task directory
    ///
    /// Writes task_info.json in the task directory as the job moves from
    /// On Training to Train Success or Train Failed.
    Train(Box<TrainArgs>),

    /// Show the status of a task directory
    Status {
        /// Task directory
        #[arg(long)]
        task_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run inference with a trained model
    Infer {
        /// Save path of a finished training run (contains args.json)
        #[arg(long)]
        save_path: PathBuf,

        /// JSONL file with one {"content": ...} record per line
        #[arg(long)]
        input: PathBuf,

        /// Output as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List registered pipelines and module factories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::discover_and_load()?,
    };

    // Logs go to stderr so `--json` output stays machine readable.
    let level = parse_level(args.log_level.as_deref().or(config.log_level.as_deref()).unwrap_or("info"));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train(train_args) => train::execute(config, *train_args).await?,
        Command::Status { task_dir, json } => status::execute(task_dir, json)?,
        Command::Infer { save_path, input, json } => infer::execute(config, save_path, input, json).await?,
        Command::List { json } => list::execute(config, json)?,
    }

    Ok(())
}
