//! Shared training step used by every front-end (`serve`, `train`, `predict`).
//!
//! Fitting and installing belong to `YieldModel::train`; this step adds the
//! startup logging around it.

use crate::domain::{Crop, TrainConfig};
use crate::error::ModelError;
use crate::models::{TrainSummary, YieldModel};

/// Fit a model per `config` and install it in `model`.
pub fn train_model(model: &YieldModel, config: &TrainConfig) -> Result<TrainSummary, ModelError> {
    tracing::info!(
        path = %config.data_path.display(),
        trees = config.forest.n_estimators,
        seed = config.forest.seed,
        timeout_secs = config.fit_timeout.map(|t| t.as_secs_f64()),
        "training yield model"
    );

    let summary = model.train(config)?;
    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &TrainSummary) {
    tracing::info!(
        rows_used = summary.rows_used,
        rows_excluded = summary.rows_excluded,
        features = summary.n_features,
        fit_secs = summary.fit_duration.as_secs_f64(),
        "model trained"
    );
    for crop in Crop::ALL {
        if let Some(r2) = summary.oob_r2[crop.index()] {
            tracing::info!(crop = crop.key(), oob_r2 = r2, "out-of-bag fit");
        }
    }
}
