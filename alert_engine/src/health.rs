//! Last-attempt / last-success / last-error bookkeeping for each provider.
//!
//! Provider failures never reach the presentation layer as errors. This is the
//! pollable record of them, surfaced through the engine snapshot and `/health`.

use crate::error::{FailureKind, LookupError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastError {
    pub at: DateTime<Utc>,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<LastError>,
}

impl HealthSnapshot {
    /// True when the most recent completed request failed.
    pub fn is_failing(&self) -> bool {
        match (&self.last_error, self.last_success) {
            (Some(error), Some(success)) => error.at >= success,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ProviderHealth {
    inner: RwLock<HealthSnapshot>,
}

impl ProviderHealth {
    pub fn record_attempt(&self) {
        self.inner.write().last_attempt = Some(Utc::now());
    }

    pub fn record_success(&self) {
        self.inner.write().last_success = Some(Utc::now());
    }

    pub fn record_failure(&self, error: &LookupError) {
        self.record_failure_kind(error.kind(), error.to_string());
    }

    pub fn record_failure_kind(&self, kind: FailureKind, message: String) {
        self.inner.write().last_error = Some(LastError {
            at: Utc::now(),
            kind,
            message,
        });
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.inner.read().clone()
    }
}
