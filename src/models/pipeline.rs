//! Encode + regress pipeline.
//!
//! The pipeline has two stages:
//! - a one-hot encoder over the four categorical columns
//! - one random forest per crop, all fit on the same encoded matrix
//!
//! Fitting is all-or-nothing: a `YieldPipeline` only exists once every stage
//! has been fit.

use crate::domain::{Crop, ForestConfig, PredictionRequest, TrainingRow};
use crate::error::ModelError;
use crate::fit::{FittedForest, fit_forest};
use crate::preprocess::{FittedOneHotEncoder, OneHotEncoder};

#[derive(Debug, Clone, PartialEq)]
pub struct YieldPipeline {
    encoder: FittedOneHotEncoder,
    /// One forest per crop, indexed by `Crop::index`.
    forests: Vec<FittedForest>,
    /// Shape of the encoded matrix the forests were fit on.
    training_shape: (usize, usize),
}

impl YieldPipeline {
    pub fn fit(rows: &[TrainingRow], config: &ForestConfig) -> Result<Self, ModelError> {
        let encoder = OneHotEncoder::new().fit(rows)?;
        let x = encoder.transform(rows);

        let mut forests = Vec::with_capacity(Crop::ALL.len());
        for crop in Crop::ALL {
            let y: Vec<f64> = rows.iter().map(|r| r.target(crop)).collect();
            let forest = fit_forest(&x, &y, config)
                .map_err(|e| ModelError::Fit(format!("{}: {e}", crop.header())))?;
            tracing::debug!(crop = crop.key(), trees = forest.n_trees(), "fit forest");
            forests.push(forest);
        }

        Ok(Self {
            encoder,
            forests,
            training_shape: x.shape(),
        })
    }

    /// Raw (unrounded) predictions for one request, indexed by `Crop::index`.
    pub fn predict(&self, request: &PredictionRequest) -> Result<[f64; 4], ModelError> {
        let x = self.encoder.transform(std::slice::from_ref(request));

        let mut out = [0.0f64; 4];
        for crop in Crop::ALL {
            let forest = self
                .forests
                .get(crop.index())
                .ok_or_else(|| ModelError::Prediction(format!("No fitted regressor for {}.", crop.header())))?;
            let value = forest
                .predict(&x)?
                .first()
                .copied()
                .ok_or_else(|| ModelError::Prediction("Regressor returned no output.".to_string()))?;
            if !value.is_finite() {
                return Err(ModelError::Prediction(format!(
                    "Non-finite prediction for {}.",
                    crop.header()
                )));
            }
            out[crop.index()] = value;
        }
        Ok(out)
    }

    pub fn encoder(&self) -> &FittedOneHotEncoder {
        &self.encoder
    }

    pub fn forest(&self, crop: Crop) -> &FittedForest {
        &self.forests[crop.index()]
    }

    /// `(rows, encoded features)` of the training matrix.
    pub fn training_shape(&self) -> (usize, usize) {
        self.training_shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureColumn;
    use crate::io::read_training_rows;
    use crate::test_support::SAMPLE_CSV;

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_estimators: 20,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn equilibrium_rows_never_reach_the_matrix() {
        let data = read_training_rows(SAMPLE_CSV.as_bytes()).unwrap();
        let pipeline = YieldPipeline::fit(&data.rows, &small_config()).unwrap();

        // 3 regions x 2 CO2 x 3 slices x 2 adaptation levels.
        assert_eq!(pipeline.training_shape(), (36, 10));
        let enc = pipeline.encoder();
        assert!(!enc.categories(FeatureColumn::TimeSlice).iter().any(|c| c == "Equilibrium"));
        assert!(!enc.categories(FeatureColumn::Region).iter().any(|c| c == "Atlantis"));
    }

    #[test]
    fn seen_combination_predicts_near_observed() {
        let data = read_training_rows(SAMPLE_CSV.as_bytes()).unwrap();
        let pipeline = YieldPipeline::fit(&data.rows, &ForestConfig::default()).unwrap();

        let req = PredictionRequest::new("USA", "2050", "With CO2", "None").unwrap();
        let out = pipeline.predict(&req).unwrap();
        // Observed: wheat 1.00, rice 0.50, coarse grains -3.50, protein feed -2.50.
        let observed = [1.0, 0.5, -3.5, -2.5];
        for (pred, obs) in out.iter().zip(observed) {
            assert!((pred - obs).abs() < 3.0, "pred={pred} obs={obs}");
        }
    }

    #[test]
    fn unseen_categories_still_predict() {
        let data = read_training_rows(SAMPLE_CSV.as_bytes()).unwrap();
        let pipeline = YieldPipeline::fit(&data.rows, &small_config()).unwrap();

        let req = PredictionRequest::new("Narnia", "2300", "Maybe CO2", "Terraforming").unwrap();
        let out = pipeline.predict(&req).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
