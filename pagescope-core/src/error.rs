use crate::keywords::KeywordError;
use pagescope_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures that abort an analysis. Link verification problems are never
/// reported through here; they show up in the result instead.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetching {url} timed out after {timeout_secs} seconds")]
    FetchTimeout { url: String, timeout_secs: u64 },

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("{url} is larger than the {limit} byte page limit")]
    PageTooLarge { url: String, limit: usize },

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Keywords(#[from] KeywordError),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
