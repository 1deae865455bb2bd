//! Command-line parsing.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! model and server code. Every model option can also come from the
//! environment (or a `.env` file), which is how the server is usually deployed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ForestConfig, MaxFeatures, TrainConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "crop-yield", version, about = "Crop-yield scenario predictions (random forest over HTTP)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train on startup, then serve the prediction API (the default).
    Serve(ServeArgs),
    /// Train once and print the training summary.
    Train(TrainArgs),
    /// Train once and print a single prediction.
    Predict(PredictArgs),
}

/// Dataset and random-forest options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// CSV file with the crop-yield scenario table.
    #[arg(long, env = "CROP_YIELD_DATA", default_value = "data/crop_yields.csv")]
    pub data: PathBuf,

    /// Trees per crop.
    #[arg(long, env = "CROP_YIELD_TREES", default_value_t = 100)]
    pub n_estimators: usize,

    /// Random seed for bootstrap sampling (same seed, same model).
    #[arg(long, env = "CROP_YIELD_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Maximum tree depth (unlimited when omitted).
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Minimum rows in a node before it may be split.
    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    /// Minimum rows in each leaf.
    #[arg(long, default_value_t = 1)]
    pub min_samples_leaf: usize,

    /// Features considered per split: `all`, `sqrt`, or a count.
    #[arg(long, default_value = "all")]
    pub max_features: MaxFeatures,

    /// Grow every tree on the full dataset instead of a bootstrap sample.
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Abort if fitting takes longer than this many seconds.
    #[arg(long, env = "CROP_YIELD_FIT_TIMEOUT_SECS")]
    pub fit_timeout_secs: Option<u64>,
}

impl ModelArgs {
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            data_path: self.data.clone(),
            forest: ForestConfig {
                n_estimators: self.n_estimators,
                seed: self.seed,
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                min_samples_leaf: self.min_samples_leaf,
                max_features: self.max_features,
                bootstrap: !self.no_bootstrap,
            },
            fit_timeout: self.fit_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Options for `serve`.
#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Address to bind the HTTP server.
    #[arg(long, env = "CROP_YIELD_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,
}

/// Options for `train`.
#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

/// Options for `predict`.
#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Region (`BLS Region` column).
    #[arg(long)]
    pub country: String,

    /// Time slice, e.g. `2050`.
    #[arg(long)]
    pub time_slice: String,

    /// CO2-effects scenario, e.g. `With CO2`.
    #[arg(long)]
    pub co2_effects: String,

    /// Adaptation strategy.
    #[arg(long)]
    pub adaptation: String,
}
