//! Database-specific error types and conversions.

use hostcover_core::error::CoverageError;
use uuid::Uuid;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid {entity} record: {message}")]
    Decode {
        entity: &'static str,
        message: String,
    },

    #[error("Cannot encode {entity}: {message}")]
    Encode {
        entity: &'static str,
        message: String,
    },

    #[error("Host not found: {0}")]
    HostNotFound(Uuid),

    #[error("Host already exists: {0}")]
    HostExists(Uuid),

    #[error("Version conflict on host {host_id}: expected {expected}")]
    VersionConflict { host_id: Uuid, expected: u64 },
}

impl DbError {
    pub(crate) fn decode(entity: &'static str, message: impl Into<String>) -> Self {
        DbError::Decode {
            entity,
            message: message.into(),
        }
    }
}

impl From<DbError> for CoverageError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::HostNotFound(host_id) => CoverageError::HostNotFound { host_id },
            DbError::HostExists(host_id) => CoverageError::HostAlreadyExists { host_id },
            DbError::VersionConflict { host_id, expected } => CoverageError::ConcurrencyConflict {
                host_id,
                expected_version: expected,
            },
            other => CoverageError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Whether a SurrealDB failure is an optimistic transaction clash with a
/// concurrent writer rather than a broken store.
pub(crate) fn is_transaction_conflict(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("can be retried")
        || message.contains("read or write conflict")
        || message.contains("transaction conflict")
}

/// Classify a failed version-guarded write on `host_id`.
pub(crate) fn guarded_write_error(host_id: Uuid, expected: u64, err: surrealdb::Error) -> DbError {
    let message = err.to_string();
    if is_transaction_conflict(&message) {
        DbError::VersionConflict { host_id, expected }
    } else {
        DbError::Query(message)
    }
}

/// Errors raised while recording audit entries or notifications.
pub(crate) fn emitter_error(err: DbError) -> CoverageError {
    CoverageError::EmitterUnavailable(err.to_string())
}
