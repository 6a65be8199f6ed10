//! Collaborator traits consumed by the transition engine.
//!
//! All operations are async. The store owns host state and its version
//! token; the emitter owns the audit log and the host notification queue.

use uuid::Uuid;

use crate::error::CoverageResult;
use crate::models::{
    audit::{AuditEntry, CreateAuditEntry},
    history::TierChangeRecord,
    host::{HostCommit, HostSnapshot},
    notification::{CreateHostNotification, HostNotification},
};

// ---------------------------------------------------------------------------
// Host record store
// ---------------------------------------------------------------------------

pub trait HostStore: Send + Sync {
    /// Register a host with both tracks empty and the baseline tier.
    fn create_host(
        &self,
        host_id: Uuid,
    ) -> impl Future<Output = CoverageResult<HostSnapshot>> + Send;

    /// Read the current state together with its version token.
    fn get_host_for_update(
        &self,
        host_id: Uuid,
    ) -> impl Future<Output = CoverageResult<HostSnapshot>> + Send;

    /// Write `commit` if the stored version still equals
    /// `expected_version`; the new version is `expected_version + 1`.
    ///
    /// Fails with `ConcurrencyConflict` when another writer got there
    /// first, without writing anything.
    fn commit_host(
        &self,
        host_id: Uuid,
        expected_version: u64,
        commit: HostCommit,
    ) -> impl Future<Output = CoverageResult<HostSnapshot>> + Send;

    /// Undo `committed` by restoring the state of `previous`, including
    /// the history length. Guarded by `committed.version`.
    ///
    /// The undone commit was briefly visible: a reader that bypasses the
    /// service's host lock may have seen its state, history entry and the
    /// audit entry retracted alongside it. The reverted write itself bumps
    /// the version.
    fn revert_host(
        &self,
        committed: &HostSnapshot,
        previous: &HostSnapshot,
    ) -> impl Future<Output = CoverageResult<()>> + Send;

    /// Tier change history, oldest first.
    fn tier_history(
        &self,
        host_id: Uuid,
    ) -> impl Future<Output = CoverageResult<Vec<TierChangeRecord>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit & notification emitter
// ---------------------------------------------------------------------------

pub trait AuditEmitter: Send + Sync {
    fn record_audit(
        &self,
        input: CreateAuditEntry,
    ) -> impl Future<Output = CoverageResult<AuditEntry>> + Send;

    fn notify(
        &self,
        input: CreateHostNotification,
    ) -> impl Future<Output = CoverageResult<HostNotification>> + Send;

    /// Remove an audit entry whose transition was rolled back.
    fn retract_audit(&self, audit_id: Uuid) -> impl Future<Output = CoverageResult<()>> + Send;
}
