//! `crop-yield` library crate.
//!
//! The binary (`crop-yield`) is a thin wrapper around this library so that:
//!
//! - the model core is testable without spawning processes or sockets
//! - the HTTP layer and the CLI share one training path
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod models;
pub mod preprocess;
pub mod report;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;
