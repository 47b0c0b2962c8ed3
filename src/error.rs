// Error types for the fallible edges of the crate: reading portal exports,
// reading threshold configuration, and writing report files.
//
// The metric engine itself never fails; these only cover I/O boundaries.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The export wrapper object did not contain the expected table key.
    #[error("{path} has no \"{key}\" entry")]
    MissingKey { path: PathBuf, key: String },

    /// The table key was present but its embedded row payload did not parse.
    #[error("embedded rows under \"{key}\" in {path} are not a JSON array: {reason}")]
    InnerJson {
        path: PathBuf,
        key: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid threshold: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
