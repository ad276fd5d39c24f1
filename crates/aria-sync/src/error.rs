//! Sync error types.

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{source_name} returned {status}")]
    SourceRejected { source_name: String, status: u16 },

    #[error("malformed payload from {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] aria_core::Error),
}

impl SyncError {
    pub fn rejected(source_name: impl Into<String>, status: u16) -> Self {
        Self::SourceRejected {
            source_name: source_name.into(),
            status,
        }
    }

    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}
