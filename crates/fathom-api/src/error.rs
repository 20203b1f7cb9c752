//! Error types for the predictor lifecycle.

use fathom_core::{CoreError, Status};
use thiserror::Error;

/// Result type for predictor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by predictor creation and prediction.
#[derive(Error, Debug)]
pub enum Error {
    /// A marshaling-layer failure, passed through unchanged.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Predictor creation failed before a model was loaded.
    #[error("creation failed: {0}")]
    Creation(String),

    /// The backend rejected or failed the request.
    #[error("backend error: {0}")]
    Backend(String),

    /// Reading a configured resource from disk failed.
    #[error("resource i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The pinned status code this error maps onto.
    pub fn status(&self) -> Status {
        match self {
            Error::Core(inner) => Status::from(inner),
            Error::Creation(_) => Status::InvalidOperation,
            Error::Backend(_) => Status::Backend,
            Error::Io(_) => Status::Internal,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Backend(format!("{error:#}"))
    }
}
