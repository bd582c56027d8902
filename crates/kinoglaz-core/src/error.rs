use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KinoglazError {
    #[error("Probe failed for {video}: {reason}")]
    ProbeFailed { video: PathBuf, reason: String },

    #[error("Extraction of chunk {index} failed: {reason}")]
    ChunkExtractionFailed { index: usize, reason: String },

    #[error("Still export at {timecode} failed: {reason}")]
    StillExportFailed { timecode: String, reason: String },

    #[error("No analyzable chunks produced for {video}")]
    NoChunksExtracted { video: PathBuf },

    #[error("Analysis request to {backend} failed with HTTP {status}: {message}")]
    AnalysisFailed {
        backend: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected response from {backend}: {body}")]
    UnexpectedResponse { backend: &'static str, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

/// How a backend failure should be treated by the retry layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// The backend asked us to slow down; worth retrying with backoff.
    RateLimited,
    /// A network hiccup that a later attempt might not hit.
    Transient,
    /// Retrying would produce the same failure.
    Fatal,
}

pub type Result<T> = std::result::Result<T, KinoglazError>;
