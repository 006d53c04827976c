use thiserror::Error;
use tokio::task::JoinError;

/// Message stored on a job when no more specific reason is available.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An unexpected error occurred while generating the documentation.";

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("Filter error: {0}")]
    Filter(String),
    #[error("Analysis exhausted: {0}")]
    AnalysisExhausted(String),
    #[error("Packaging error: {0}")]
    Packaging(String),
    #[error("Timeout exceeded after {0} seconds")]
    TimeoutExceeded(u64),
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Human-readable summary suitable for a job's `error_message`.
    ///
    /// Stage failures keep their reason; everything else collapses to a generic
    /// message so internal details never reach the status page.
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(reason) => format!("Failed to fetch the repository: {reason}"),
            Self::Filter(reason) => format!("Failed to scan the repository: {reason}"),
            Self::AnalysisExhausted(reason) => {
                format!("Documentation could not be generated for any file: {reason}")
            }
            Self::Packaging(reason) => format!("Failed to package the documentation: {reason}"),
            Self::TimeoutExceeded(secs) => {
                format!("The job did not finish within {secs} seconds and was stopped.")
            }
            Self::Validation(reason) => format!("Invalid request: {reason}"),
            Self::NotFound(_)
            | Self::Storage(_)
            | Self::Io(_)
            | Self::Join(_)
            | Self::InternalError(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
