//! One-hot encoding for the categorical feature columns.
//!
//! Each column contributes one indicator per category observed during `fit`.
//! Categories are the sorted distinct values, so the layout of the encoded
//! matrix is a pure function of the training set.
//!
//! A value that was never seen during `fit` sets no indicator: its block stays
//! all zero. Encoding never fails on unknown categories.

use nalgebra::DMatrix;

use crate::domain::{FeatureColumn, PredictionRequest, TrainingRow};
use crate::error::ModelError;

/// Anything that exposes a value for each categorical column.
pub trait CategoricalRecord {
    fn category(&self, column: FeatureColumn) -> &str;
}

impl CategoricalRecord for TrainingRow {
    fn category(&self, column: FeatureColumn) -> &str {
        self.feature(column)
    }
}

impl CategoricalRecord for PredictionRequest {
    fn category(&self, column: FeatureColumn) -> &str {
        self.feature(column)
    }
}

/// Learns the category vocabulary of each column.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneHotEncoder;

impl OneHotEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn fit<R: CategoricalRecord>(&self, records: &[R]) -> Result<FittedOneHotEncoder, ModelError> {
        if records.is_empty() {
            return Err(ModelError::Fit("Cannot fit one-hot encoder on empty data.".to_string()));
        }

        let mut categories = Vec::with_capacity(FeatureColumn::ALL.len());
        let mut offsets = Vec::with_capacity(FeatureColumn::ALL.len());
        let mut n_features_out = 0usize;

        for column in FeatureColumn::ALL {
            let mut values: Vec<String> = records.iter().map(|r| r.category(column).to_string()).collect();
            values.sort();
            values.dedup();

            offsets.push(n_features_out);
            n_features_out += values.len();
            categories.push(values);
        }

        Ok(FittedOneHotEncoder {
            categories,
            offsets,
            n_features_out,
        })
    }
}

/// Fitted encoder: per-column sorted vocabularies and their block offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedOneHotEncoder {
    categories: Vec<Vec<String>>,
    offsets: Vec<usize>,
    n_features_out: usize,
}

impl FittedOneHotEncoder {
    /// Width of the encoded matrix.
    pub fn n_features_out(&self) -> usize {
        self.n_features_out
    }

    /// Sorted categories learned for `column`.
    pub fn categories(&self, column: FeatureColumn) -> &[String] {
        &self.categories[column.index()]
    }

    /// Encoded column index for `value` in `column`, if it was seen in training.
    pub fn position(&self, column: FeatureColumn, value: &str) -> Option<usize> {
        let vocab = &self.categories[column.index()];
        vocab
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
            .map(|pos| self.offsets[column.index()] + pos)
    }

    /// Encode records into an `n x n_features_out` indicator matrix.
    pub fn transform<R: CategoricalRecord>(&self, records: &[R]) -> DMatrix<f64> {
        let mut out = DMatrix::<f64>::zeros(records.len(), self.n_features_out);
        let mut unknown = 0usize;

        for (i, record) in records.iter().enumerate() {
            for column in FeatureColumn::ALL {
                match self.position(column, record.category(column)) {
                    Some(j) => out[(i, j)] = 1.0,
                    None => unknown += 1,
                }
            }
        }

        if unknown > 0 {
            tracing::debug!(unknown, "encoded unseen categories as zero blocks");
        }
        out
    }
}
