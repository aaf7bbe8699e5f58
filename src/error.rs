use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("api error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(#[from] reqwest::Error),
    #[error("local file {} cannot be opened: {source}", path.display())]
    LocalFileMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DriveError>;
