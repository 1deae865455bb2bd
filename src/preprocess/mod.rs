//! Feature preprocessing.
//!
//! The only stage is a one-hot encoder over the four categorical columns. It is
//! fit once on the training rows and then reused unchanged for every request.

pub mod one_hot;

pub use one_hot::*;
