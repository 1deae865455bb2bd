//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the dataset schema (feature columns and target crops)
//! - training rows and prediction requests/results
//! - training configuration

pub mod types;

pub use types::*;
