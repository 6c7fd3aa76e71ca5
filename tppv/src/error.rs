//! Error types for the tppv service.

use thiserror::Error;

/// Errors that occur in the service shell around the engine.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration is invalid or missing required variables.
    #[error("config error: {0}")]
    Config(String),

    /// Directory store read/write failed.
    #[error("store error: {0}")]
    Store(String),
}
