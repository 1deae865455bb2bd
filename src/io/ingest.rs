//! CSV ingest and normalization.
//!
//! This module is responsible for turning the crop-yield scenario table into a
//! clean set of `TrainingRow`s that are safe to fit.
//!
//! Design goals:
//! - **Strict schema** for the eight required columns (clear errors)
//! - **Row-level validation** (a bad row fails the load and names its line)
//! - **Deterministic behavior** (file order is preserved)
//! - **Separation of concerns**: no encoding or fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Crop, FeatureColumn, TrainingRow};
use crate::error::ModelError;

/// Ingest output: training rows + bookkeeping about what was dropped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub rows: Vec<TrainingRow>,
    pub rows_read: usize,
    /// Rows dropped because their time slice is `Equilibrium`.
    pub rows_excluded: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// Load the training table from a CSV file.
pub fn load_training_rows(path: &Path) -> Result<IngestedData, ModelError> {
    let file = File::open(path).map_err(|e| {
        ModelError::data_load(format!("Failed to open dataset '{}': {e}", path.display()))
    })?;
    read_training_rows(file)
}

/// Parse the training table from any reader.
pub fn read_training_rows<R: Read>(reader: R) -> Result<IngestedData, ModelError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| ModelError::data_load(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map)?;

    let mut rows = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_excluded = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = result.map_err(|e| ModelError::data_load(format!("Line {line}: CSV parse error: {e}")))?;
        let row = parse_row(&record, &columns).map_err(|message| ModelError::data_load(format!("Line {line}: {message}")))?;

        if row.is_equilibrium() {
            rows_excluded += 1;
        } else {
            rows.push(row);
        }
    }

    if rows_excluded > 0 {
        tracing::debug!(rows_excluded, "dropped equilibrium rows");
    }

    if rows.is_empty() {
        return Err(ModelError::no_rows(format!(
            "No usable rows remain after ingest ({rows_read} read, {rows_excluded} equilibrium)."
        )));
    }

    Ok(IngestedData {
        rows,
        rows_read,
        rows_excluded,
    })
}

/// Column indices for the eight required headers.
struct ColumnIndex {
    features: [usize; 4],
    targets: [usize; 4],
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often put a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<ColumnIndex, ModelError> {
    let lookup = |header: &str| {
        header_map
            .get(&normalize_header_name(header))
            .copied()
            .ok_or_else(|| ModelError::data_load(format!("Missing required column: `{header}`")))
    };

    let mut features = [0usize; 4];
    for column in FeatureColumn::ALL {
        features[column.index()] = lookup(column.header())?;
    }
    let mut targets = [0usize; 4];
    for crop in Crop::ALL {
        targets[crop.index()] = lookup(crop.header())?;
    }
    Ok(ColumnIndex { features, targets })
}

fn parse_row(record: &StringRecord, columns: &ColumnIndex) -> Result<TrainingRow, String> {
    let mut features: [String; 4] = Default::default();
    for column in FeatureColumn::ALL {
        features[column.index()] = get_required(record, columns.features[column.index()], column.header())?.to_string();
    }

    let mut yields = [0.0f64; 4];
    for crop in Crop::ALL {
        let raw = get_required(record, columns.targets[crop.index()], crop.header())?;
        yields[crop.index()] = parse_f64(raw).ok_or_else(|| format!("Invalid `{}` value '{raw}'.", crop.header()))?;
    }

    Ok(TrainingRow { features, yields })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
