//! Regression ensemble fitting.
//!
//! Responsibilities:
//!
//! - grow CART regression trees on row subsets of the encoded matrix
//! - bag trees into a seeded random forest (parallel)
//! - report the out-of-bag R² of each forest

pub mod forest;
pub mod tree;

pub use forest::*;
pub use tree::*;
