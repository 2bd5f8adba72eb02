use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("API call {method} failed: {reason}")]
    Api { method: &'static str, reason: String },

    #[error("Unexpected response shape from {method}: {reason}")]
    Envelope { method: &'static str, reason: String },

    #[error("{0}")]
    Validation(String),

    #[error("Another change to {subject} is still in flight")]
    MutationInFlight { subject: String },

    #[error("Sync needs at least two active videos, got {active}")]
    SyncUnavailable { active: usize },

    #[error("Unknown comment: {name}")]
    UnknownComment { name: String },

    #[cfg(feature = "dictation")]
    #[error("Dictation failed for {audio_path}: {reason}")]
    DictationFailed {
        audio_path: std::path::PathBuf,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
