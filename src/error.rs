use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;

/// Which of the two calls an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateFile,
    UploadFile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::CreateFile => f.write_str("Create File"),
            Stage::UploadFile => f.write_str("Upload File"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Access key is not a valid header value")]
    AccessKey(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Failed to build {stage} request: {source}")]
    Request {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} request failed: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} HTTP Response Status: {status}")]
    Status { stage: Stage, status: StatusCode },

    #[error("Failed to read {stage} response body: {source}")]
    Body {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode create file response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to open {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stat {}: {source}", .path.display())]
    FileMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input file does not exist: {}", .path.display())]
    MissingInput { path: PathBuf },
}

impl UploadError {
    /// Stage of the HTTP call, if the error happened during one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            UploadError::Request { stage, .. }
            | UploadError::Transport { stage, .. }
            | UploadError::Status { stage, .. }
            | UploadError::Body { stage, .. } => Some(*stage),
            UploadError::Decode(_) => Some(Stage::CreateFile),
            _ => None,
        }
    }
}
