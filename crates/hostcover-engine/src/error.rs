//! Precondition failures raised while planning a transition.

use hostcover_core::error::CoverageError;
use hostcover_core::models::track::{TrackKind, TrackStatus};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("cannot {operation} {track} coverage in status {status}")]
    InvalidState {
        track: TrackKind,
        status: TrackStatus,
        operation: &'static str,
    },

    #[error("{track} submission is missing {missing:?}")]
    IncompleteSubmission {
        track: TrackKind,
        missing: Vec<&'static str>,
    },

    #[error("rejection reason is empty")]
    MissingReason,

    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
}

impl From<PreconditionError> for CoverageError {
    fn from(err: PreconditionError) -> Self {
        match err {
            PreconditionError::InvalidState {
                track,
                status,
                operation,
            } => CoverageError::InvalidState {
                track,
                status,
                operation,
            },
            PreconditionError::IncompleteSubmission { track, missing } => {
                CoverageError::IncompleteSubmission { track, missing }
            }
            PreconditionError::MissingReason => CoverageError::MissingReason,
            PreconditionError::InvalidSubmission(message) => CoverageError::Validation { message },
        }
    }
}
