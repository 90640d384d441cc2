use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The completion credential is absent. Reported separately from runtime
    /// failures so callers can keep building and indexing without it.
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Failed to read PDF {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Question is empty; please enter a question")]
    EmptyQuestion,

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
