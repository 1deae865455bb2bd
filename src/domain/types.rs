//! Shared domain types.
//!
//! This module defines:
//!
//! - the dataset schema (`FeatureColumn`, `Crop`)
//! - training observations (`TrainingRow`)
//! - prediction inputs/outputs (`PredictionRequest`, `CropYields`, `PredictionResult`)
//! - training configuration (`TrainConfig`, `ForestConfig`, `MaxFeatures`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::ModelError;

/// Time-slice label that marks a non-forecastable scenario. Rows carrying it
/// are dropped before training.
pub const EQUILIBRIUM_TIME_SLICE: &str = "Equilibrium";

/// Categorical input columns, in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    Region,
    Co2Effects,
    TimeSlice,
    Adaptation,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 4] = [
        FeatureColumn::Region,
        FeatureColumn::Co2Effects,
        FeatureColumn::TimeSlice,
        FeatureColumn::Adaptation,
    ];

    /// Column header as it appears in the source dataset.
    pub fn header(self) -> &'static str {
        match self {
            FeatureColumn::Region => "BLS Region",
            FeatureColumn::Co2Effects => "CO2 effects",
            FeatureColumn::TimeSlice => "Time_Slice",
            FeatureColumn::Adaptation => "Adapt- ation",
        }
    }

    pub fn index(self) -> usize {
        match self {
            FeatureColumn::Region => 0,
            FeatureColumn::Co2Effects => 1,
            FeatureColumn::TimeSlice => 2,
            FeatureColumn::Adaptation => 3,
        }
    }
}

/// Target crop categories, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crop {
    Wheat,
    Rice,
    CoarseGrains,
    ProteinFeed,
}

impl Crop {
    pub const ALL: [Crop; 4] = [Crop::Wheat, Crop::Rice, Crop::CoarseGrains, Crop::ProteinFeed];

    /// Column header as it appears in the source dataset.
    pub fn header(self) -> &'static str {
        match self {
            Crop::Wheat => "Wheat",
            Crop::Rice => "Rice",
            Crop::CoarseGrains => "Coarse grains",
            Crop::ProteinFeed => "Protein feed",
        }
    }

    /// Key used in prediction output: the lower-cased header, spaces kept.
    pub fn key(self) -> &'static str {
        match self {
            Crop::Wheat => "wheat",
            Crop::Rice => "rice",
            Crop::CoarseGrains => "coarse grains",
            Crop::ProteinFeed => "protein feed",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Crop::Wheat => 0,
            Crop::Rice => 1,
            Crop::CoarseGrains => 2,
            Crop::ProteinFeed => 3,
        }
    }
}

/// One historical observation from the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    /// Feature values indexed by `FeatureColumn::index`.
    pub features: [String; 4],
    /// Target values indexed by `Crop::index`.
    pub yields: [f64; 4],
}

impl TrainingRow {
    pub fn feature(&self, column: FeatureColumn) -> &str {
        &self.features[column.index()]
    }

    pub fn target(&self, crop: Crop) -> f64 {
        self.yields[crop.index()]
    }

    pub fn is_equilibrium(&self) -> bool {
        self.feature(FeatureColumn::TimeSlice) == EQUILIBRIUM_TIME_SLICE
    }
}

/// The four categorical inputs for one prediction.
///
/// Values are only checked for presence; categories outside the training
/// vocabulary are accepted and encode to a neutral vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    features: [String; 4],
}

impl PredictionRequest {
    pub fn new(
        region: impl Into<String>,
        time_slice: impl Into<String>,
        co2_effects: impl Into<String>,
        adaptation: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let mut features = [String::new(), String::new(), String::new(), String::new()];
        features[FeatureColumn::Region.index()] = region.into();
        features[FeatureColumn::TimeSlice.index()] = time_slice.into();
        features[FeatureColumn::Co2Effects.index()] = co2_effects.into();
        features[FeatureColumn::Adaptation.index()] = adaptation.into();

        if features.iter().any(String::is_empty) {
            return Err(ModelError::Validation("Missing required parameters".to_string()));
        }
        Ok(Self { features })
    }

    pub fn feature(&self, column: FeatureColumn) -> &str {
        &self.features[column.index()]
    }

    pub fn features(&self) -> &[String; 4] {
        &self.features
    }
}

/// Predicted yields keyed by lower-cased crop name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropYields {
    pub wheat: f64,
    pub rice: f64,
    #[serde(rename = "coarse grains")]
    pub coarse_grains: f64,
    #[serde(rename = "protein feed")]
    pub protein_feed: f64,
}

impl CropYields {
    pub fn from_array(values: [f64; 4]) -> Self {
        Self {
            wheat: values[Crop::Wheat.index()],
            rice: values[Crop::Rice.index()],
            coarse_grains: values[Crop::CoarseGrains.index()],
            protein_feed: values[Crop::ProteinFeed.index()],
        }
    }

    pub fn get(&self, crop: Crop) -> f64 {
        match crop {
            Crop::Wheat => self.wheat,
            Crop::Rice => self.rice,
            Crop::CoarseGrains => self.coarse_grains,
            Crop::ProteinFeed => self.protein_feed,
        }
    }
}

/// Output of a successful prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub predictions: CropYields,
    /// Placeholder confidence signal; see `models::accuracy_estimate`.
    pub accuracy: f64,
}

/// How many encoded features a tree considers at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxFeatures {
    /// Every feature (the regression default).
    #[default]
    All,
    /// `ceil(sqrt(n_features))`.
    Sqrt,
    /// A fixed count, capped at the number of features.
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(MaxFeatures::All),
            "sqrt" => Ok(MaxFeatures::Sqrt),
            other => match other.parse::<usize>() {
                Ok(0) => Err("max-features must be >= 1".to_string()),
                Ok(k) => Ok(MaxFeatures::Count(k)),
                Err(_) => Err(format!("invalid max-features '{s}' (expected all, sqrt, or a count)")),
            },
        }
    }
}

/// Random-forest hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub seed: u64,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
        }
    }
}

/// Everything `train()` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub forest: ForestConfig,
    /// Upper bound on wall-clock fit time at startup.
    pub fit_timeout: Option<Duration>,
}

impl TrainConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            forest: ForestConfig::default(),
            fit_timeout: None,
        }
    }
}
