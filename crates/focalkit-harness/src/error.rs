//! Error types shared by harness tooling.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that happen around a test run rather than inside an assertion.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scratch {what}: {source}")]
    Scratch {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot open log sink {}: {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown suite '{0}'")]
    UnknownSuite(String),
    #[error("invalid value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
