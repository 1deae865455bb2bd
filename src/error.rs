//! Error types.
//!
//! - `ModelError` is the taxonomy the core returns from `train()` / `predict()`.
//! - `AppError` is the boundary error for the binary: a message plus the process
//!   exit code.

use thiserror::Error;

/// Exit code for bad input (missing file, bad flags, schema problems).
pub const EXIT_INPUT: u8 = 2;
/// Exit code when no usable rows remain after ingest.
pub const EXIT_NO_ROWS: u8 = 3;
/// Exit code for fit or prediction failures.
pub const EXIT_MODEL: u8 = 4;
/// Exit code for HTTP server failures (bind, serve).
pub const EXIT_SERVER: u8 = 5;

/// Errors produced by the yield model core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The dataset could not be read or has no usable rows.
    #[error("failed to load training data: {message}")]
    DataLoad { message: String, no_rows: bool },
    /// Fitting the encoder or the regressors failed.
    #[error("failed to fit model: {0}")]
    Fit(String),
    /// `predict()` was called before a successful `train()`.
    #[error("Model not loaded")]
    NotReady,
    /// A request field was missing or empty.
    #[error("{0}")]
    Validation(String),
    /// Encoding or inference failed on a structurally valid request.
    #[error("{0}")]
    Prediction(String),
}

impl ModelError {
    pub fn data_load(message: impl Into<String>) -> Self {
        ModelError::DataLoad {
            message: message.into(),
            no_rows: false,
        }
    }

    pub fn no_rows(message: impl Into<String>) -> Self {
        ModelError::DataLoad {
            message: message.into(),
            no_rows: true,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let exit_code = match &err {
            ModelError::DataLoad { no_rows: true, .. } => EXIT_NO_ROWS,
            ModelError::DataLoad { .. } | ModelError::Validation(_) => EXIT_INPUT,
            ModelError::Fit(_) | ModelError::NotReady | ModelError::Prediction(_) => EXIT_MODEL,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
