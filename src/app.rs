//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - trains the model (refusing to serve if that fails)
//! - runs the HTTP server or prints CLI reports

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Command, PredictArgs, ServeArgs, TrainArgs};
use crate::domain::PredictionRequest;
use crate::error::{AppError, EXIT_SERVER};
use crate::models::YieldModel;
use crate::server::AppState;

pub mod pipeline;

/// Entry point for the `crop-yield` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    // `crop-yield` with no subcommand behaves like `crop-yield serve`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Train(args) => handle_train(args),
        Command::Predict(args) => handle_predict(args),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_yield=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = args.model.train_config();
    let model = Arc::new(YieldModel::new());

    // Serving without a model is not an option: a failed fit aborts startup.
    pipeline::train_model(&model, &config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(EXIT_SERVER, format!("Failed to start async runtime: {e}")))?;

    runtime.block_on(crate::server::serve(args.bind, AppState::new(model)))
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let model = YieldModel::new();
    let summary = pipeline::train_model(&model, &args.model.train_config())?;
    println!("{}", crate::report::format_train_summary(&summary));
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let request = PredictionRequest::new(args.country, args.time_slice, args.co2_effects, args.adaptation)?;

    let model = YieldModel::new();
    pipeline::train_model(&model, &args.model.train_config())?;
    let fitted = model.current().ok_or(crate::error::ModelError::NotReady)?;
    let yields = fitted.predict_yields(&request)?;

    println!("{}", crate::report::format_prediction(&request, &yields));
    Ok(())
}

/// Rewrite argv so `crop-yield` defaults to `crop-yield serve`.
///
/// Rules:
/// - `crop-yield`                        -> `crop-yield serve`
/// - `crop-yield --bind 0.0.0.0:80 ...`  -> `crop-yield serve --bind 0.0.0.0:80 ...`
/// - `crop-yield --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("serve".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "serve" | "train" | "predict");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "serve flags".
    if arg1.starts_with('-') {
        argv.insert(1, "serve".to_string());
        return argv;
    }

    argv
}
