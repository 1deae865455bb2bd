//! Reporting utilities for the CLI: training summaries and single predictions.

pub mod format;

pub use format::*;
