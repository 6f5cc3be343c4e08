use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP client setup failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
