//! Input helpers.
//!
//! - CSV ingest + validation of the training table (`ingest`)

pub mod ingest;

pub use ingest::*;
