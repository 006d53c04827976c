mod openai;

pub use openai::OpenAiSummarizer;

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes of a single summarization call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SummarizeError {
    #[error("rate limited by the AI provider")]
    RateLimited,
    #[error("AI provider unavailable: {0}")]
    Unavailable(String),
    #[error("input rejected by the AI provider: {0}")]
    InvalidInput(String),
}

impl SummarizeError {
    /// Transient failures are worth another attempt after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Unavailable(_))
    }
}

/// The AI capability the analysis stage depends on.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Markdown documentation for one source file.
    async fn summarize(&self, path: &str, content: &str) -> Result<String, SummarizeError>;

    /// Markdown overview of the whole project, built from the documented file
    /// tree and one summary line per file.
    async fn summarize_project(
        &self,
        file_tree: &str,
        summaries: &str,
    ) -> Result<String, SummarizeError>;
}
