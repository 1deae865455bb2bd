//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{Crop, CropYields, FeatureColumn, PredictionRequest};
use crate::models::TrainSummary;

/// Format the training summary (dataset stats + ensemble diagnostics).
pub fn format_train_summary(summary: &TrainSummary) -> String {
    let mut out = String::new();

    out.push_str("=== crop-yield - training summary ===\n");
    if let Some(path) = &summary.data_path {
        out.push_str(&format!("Data: {}\n", path.display()));
    }
    out.push_str(&format!("Trained: {}\n", summary.trained_at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!(
        "Rows: read={} | used={} | equilibrium={}\n",
        summary.rows_read, summary.rows_used, summary.rows_excluded
    ));

    let cats: Vec<String> = FeatureColumn::ALL
        .iter()
        .map(|c| format!("{}={}", c.header(), summary.categories[c.index()]))
        .collect();
    out.push_str(&format!(
        "Features: {} encoded ({})\n",
        summary.n_features,
        cats.join(", ")
    ));
    out.push_str(&format!(
        "Forest: {} trees per crop | seed={} | fit={:.2}s\n",
        summary.n_estimators,
        summary.seed,
        summary.fit_duration.as_secs_f64()
    ));

    out.push_str("\nOut-of-bag R²:\n");
    for crop in Crop::ALL {
        let r2 = summary.oob_r2[crop.index()]
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!("  {:<14} {r2}\n", crop.key()));
    }

    out
}

/// Format a single prediction as a small table.
pub fn format_prediction(request: &PredictionRequest, yields: &CropYields) -> String {
    let mut out = String::new();

    for column in FeatureColumn::ALL {
        out.push_str(&format!("{:<14} {}\n", column.header(), request.feature(column)));
    }
    out.push('\n');

    out.push_str(&format!("{:<14} {:>10}\n", "crop", "yield"));
    out.push_str(&format!("{:-<14} {:-<10}\n", "", ""));
    for crop in Crop::ALL {
        out.push_str(&format!("{:<14} {:>10.2}\n", crop.key(), yields.get(crop)));
    }

    out
}
