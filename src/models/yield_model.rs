//! The model holder: owns the fitted pipeline and serves `train()` / `predict()`.
//!
//! State machine:
//!
//! ```text
//! Uninitialized --train ok--> Ready --train ok--> Ready
//! Uninitialized --train err-> Uninitialized
//! Ready         --train err-> Ready (previous model kept)
//! ```
//!
//! The slot holds an `Arc<FittedModel>`. Readers clone the `Arc` under a short
//! read lock and run inference without holding it; `train()` fits completely
//! before taking the write lock, so a half-built model is never visible.
//!
//! With a fit timeout the fit runs on a dedicated thread. If the deadline
//! passes the result is discarded even if it arrives later, so the slot never
//! changes after a reported failure.

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use rand::Rng;

use crate::domain::{Crop, CropYields, FeatureColumn, ForestConfig, PredictionRequest, PredictionResult, TrainConfig};
use crate::error::ModelError;
use crate::io::{IngestedData, load_training_rows};
use crate::models::pipeline::YieldPipeline;

/// What the request layer needs from a model. Implemented by `YieldModel`;
/// tests substitute their own.
pub trait YieldPredictor: Send + Sync {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, ModelError>;
    fn is_ready(&self) -> bool;
}

/// Facts about one successful training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub data_path: Option<PathBuf>,
    pub trained_at: DateTime<Local>,
    pub fit_duration: Duration,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Dropped because the time slice is `Equilibrium`.
    pub rows_excluded: usize,
    pub n_features: usize,
    /// Distinct categories per feature column, indexed by `FeatureColumn::index`.
    pub categories: [usize; 4],
    pub n_estimators: usize,
    pub seed: u64,
    /// Out-of-bag R² per crop, indexed by `Crop::index`.
    pub oob_r2: [Option<f64>; 4],
}

/// A fitted pipeline plus the summary of the run that produced it.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pipeline: YieldPipeline,
    summary: TrainSummary,
}

impl FittedModel {
    /// Fit a model from an already-ingested dataset.
    pub fn fit(data: &IngestedData, forest: &ForestConfig, data_path: Option<PathBuf>) -> Result<Self, ModelError> {
        let started = Instant::now();
        let pipeline = YieldPipeline::fit(&data.rows, forest)?;
        let fit_duration = started.elapsed();

        let encoder = pipeline.encoder();
        let categories = FeatureColumn::ALL.map(|c| encoder.categories(c).len());
        let oob_r2 = Crop::ALL.map(|crop| pipeline.forest(crop).oob_r2());

        let summary = TrainSummary {
            data_path,
            trained_at: Local::now(),
            fit_duration,
            rows_read: data.rows_read,
            rows_used: data.rows_used(),
            rows_excluded: data.rows_excluded,
            n_features: encoder.n_features_out(),
            categories,
            n_estimators: forest.n_estimators,
            seed: forest.seed,
            oob_r2,
        };
        Ok(Self { pipeline, summary })
    }

    /// Load the dataset named by `config` and fit a model on it.
    pub fn fit_from_config(config: &TrainConfig) -> Result<Self, ModelError> {
        let data = load_training_rows(&config.data_path)?;
        tracing::info!(
            path = %config.data_path.display(),
            rows_used = data.rows_used(),
            rows_excluded = data.rows_excluded,
            "loaded training data"
        );
        Self::fit(&data, &config.forest, Some(config.data_path.clone()))
    }

    pub fn summary(&self) -> &TrainSummary {
        &self.summary
    }

    /// Rounded yields for one request.
    pub fn predict_yields(&self, request: &PredictionRequest) -> Result<CropYields, ModelError> {
        let raw = self.pipeline.predict(request)?;
        Ok(CropYields::from_array(raw.map(round2)))
    }
}

/// Process-wide owner of the current model.
#[derive(Debug, Default)]
pub struct YieldModel {
    slot: RwLock<Option<Arc<FittedModel>>>,
}

impl YieldModel {
    /// An empty holder (`Uninitialized`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Load, fit and install. On error the current model (if any) is kept.
    pub fn train(&self, config: &TrainConfig) -> Result<TrainSummary, ModelError> {
        let fitted = match config.fit_timeout {
            None => FittedModel::fit_from_config(config),
            Some(limit) => fit_with_deadline(config, limit),
        }
        .inspect_err(|err| tracing::error!("training failed: {err}"))?;

        let summary = fitted.summary().clone();
        self.install(fitted);
        Ok(summary)
    }

    /// Replace the current model.
    pub fn install(&self, model: FittedModel) {
        tracing::info!(
            rows = model.summary().rows_used,
            features = model.summary().n_features,
            "installed model"
        );
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(model));
    }

    /// The current model, if one is installed.
    pub fn current(&self) -> Option<Arc<FittedModel>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl YieldPredictor for YieldModel {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, ModelError> {
        let model = self.current().ok_or(ModelError::NotReady)?;
        let predictions = model.predict_yields(request).inspect_err(|err| {
            tracing::error!("prediction failed: {err}");
        })?;
        Ok(PredictionResult {
            predictions,
            accuracy: accuracy_estimate(&mut rand::thread_rng()),
        })
    }

    fn is_ready(&self) -> bool {
        self.current().is_some()
    }
}

fn fit_with_deadline(config: &TrainConfig, limit: Duration) -> Result<FittedModel, ModelError> {
    let (tx, rx) = mpsc::channel();
    let job = config.clone();

    thread::Builder::new()
        .name("crop-yield-fit".to_string())
        .spawn(move || {
            // The receiver is gone if the deadline already passed.
            let _ = tx.send(FittedModel::fit_from_config(&job));
        })
        .map_err(|e| ModelError::Fit(format!("Failed to start fit thread: {e}")))?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ModelError::Fit(format!(
            "Fit did not finish within {:.1}s.",
            limit.as_secs_f64()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(ModelError::Fit("Fit thread exited without a result.".to_string())),
    }
}

/// Placeholder confidence signal: a uniform draw from {92.5, 92.6, ..., 97.4}.
///
/// This is not measured on held-out data; the OOB R² in `TrainSummary` is the
/// real fit diagnostic.
pub fn accuracy_estimate<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(925u32..975) as f64 / 10.0
}

/// Two decimals, ties to even.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}
