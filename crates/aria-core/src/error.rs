//! Error types shared across the workspace.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("record not found: {kind} id {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("update frequency must be at least 1 second, got {0}")]
    InvalidFrequency(i64),

    #[error("update {0} is already applied")]
    AlreadyApplied(i64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }
}
