//! The yield model.
//!
//! - `pipeline`: encoder + one forest per crop, fit and evaluated as one unit
//! - `yield_model`: the owned holder that serves `train()` / `predict()`

pub mod pipeline;
pub mod yield_model;

pub use pipeline::*;
pub use yield_model::*;
