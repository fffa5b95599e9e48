//! Error types shared by the store, the persistence layer and the front ends.

use thiserror::Error;

/// Errors surfaced by storage, configuration and command handling.
///
/// The task store itself never fails on validation: invalid input is a silent
/// no-op there. These variants are for I/O and for the front ends, which do
/// report bad input to the user.
#[derive(Error, Debug)]
pub enum TodoError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("invalid config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// No task (or subtask) with the given id.
    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected by a front end.
    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TodoError>;
