use std::path::PathBuf;

use thiserror::Error;
use types::RangeError;

use crate::summary::RunSummary;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider throttled the request (HTTP {status})")]
    Throttled { status: u16 },

    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Could not decode provider response: {0}")]
    Decode(String),

    #[error("Could not build provider client: {0}")]
    Client(String),
}

impl SourceError {
    /// Network failures, throttling and server errors are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Network(_) | SourceError::Throttled { .. } => true,
            SourceError::Http { status, .. } => *status >= 500,
            SourceError::Decode(_) | SourceError::Client(_) => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else if e.is_builder() {
            SourceError::Client(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum BackfillError {
    #[error("Invalid backfill range: {0}")]
    InvalidRange(#[from] RangeError),

    #[error("Backfill aborted: {reason}")]
    Fatal {
        reason: String,
        summary: Box<RunSummary>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SourceError::Network("reset".into()).is_retryable());
        assert!(SourceError::Throttled { status: 429 }.is_retryable());
        assert!(SourceError::Http { status: 502, body: String::new() }.is_retryable());
        assert!(!SourceError::Http { status: 404, body: String::new() }.is_retryable());
        assert!(!SourceError::Decode("eof".into()).is_retryable());
    }
}
