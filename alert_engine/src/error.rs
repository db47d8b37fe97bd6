use serde::Serialize;
use shared::error::FetchError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("provider request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider response missing {0}")]
    MissingData(&'static str),
    #[error("provider did not answer within {0:?}")]
    TimedOut(Duration),
}

/// Coarse classification kept in provider health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Decode,
    Timeout,
}

impl LookupError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TimedOut(_) => FailureKind::Timeout,
            Self::Fetch(FetchError::Reqwest(e)) if e.is_timeout() => FailureKind::Timeout,
            Self::Fetch(FetchError::Reqwest(e)) if e.is_decode() => FailureKind::Decode,
            Self::Fetch(FetchError::Reqwest(_)) | Self::Unavailable(_) => FailureKind::Transport,
            Self::Fetch(FetchError::Deserialize(_) | FetchError::MissingField(_))
            | Self::MissingData(_) => FailureKind::Decode,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
    #[error(transparent)]
    Webhook(#[from] FetchError),
}
