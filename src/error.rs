//! Error types for the job hunter application.
//!
//! The taxonomy mirrors how failures propagate through the pipelines:
//! per-item errors (`Fetch`, `Parse`, `ScoreParse`) are logged and skipped,
//! `Config` aborts a run before any request is made, and `Store` is fatal
//! only for the affected write.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Network or HTTP failure at the search or detail-page layer.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Malformed search result or detail page; the entry is dropped.
    #[error("Parse error: {0}")]
    Parse(String),

    /// AI response contained no extractable numeric score.
    #[error("No usable score in AI response: {0}")]
    ScoreParse(String),

    /// Missing credential or invalid search configuration. Fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence failure; fatal for the affected write only.
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Per-item failures that the pipelines isolate and count rather than
    /// escalate to abort a batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Fetch(_) | AppError::Parse(_) | AppError::ScoreParse(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::Store(error.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
