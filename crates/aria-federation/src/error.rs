//! Federation error types.

pub type FederationResult<T> = Result<T, FederationError>;

#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("peer at {endpoint} returned {status}")]
    PeerRejected { endpoint: String, status: u16 },

    #[error("malformed reply from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("store error: {0}")]
    Store(#[from] aria_core::Error),
}

impl FederationError {
    pub fn rejected(endpoint: impl Into<String>, status: u16) -> Self {
        Self::PeerRejected {
            endpoint: endpoint.into(),
            status,
        }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}
