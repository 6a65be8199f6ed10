//! Error types for coverage transitions.

use thiserror::Error;
use uuid::Uuid;

use crate::models::track::{TrackKind, TrackStatus};

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("Host not found: {host_id}")]
    HostNotFound { host_id: Uuid },

    #[error("Host already exists: {host_id}")]
    HostAlreadyExists { host_id: Uuid },

    #[error("Cannot {operation} {track} coverage in status {status}")]
    InvalidState {
        track: TrackKind,
        status: TrackStatus,
        operation: &'static str,
    },

    #[error("{track} submission is incomplete, missing: {}", missing.join(", "))]
    IncompleteSubmission {
        track: TrackKind,
        missing: Vec<&'static str>,
    },

    #[error("A rejection reason is required")]
    MissingReason,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Concurrent update on host {host_id} (expected version {expected_version})")]
    ConcurrencyConflict { host_id: Uuid, expected_version: u64 },

    #[error("Host store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Audit/notification emitter unavailable: {0}")]
    EmitterUnavailable(String),
}

impl CoverageError {
    /// Whether re-running the whole operation from a fresh read can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoverageError::ConcurrencyConflict { .. })
    }
}

pub type CoverageResult<T> = Result<T, CoverageError>;
