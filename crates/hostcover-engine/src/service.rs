//! Coverage service: runs each transition as one unit of work.

use chrono::{DateTime, Utc};
use hostcover_core::error::{CoverageError, CoverageResult};
use hostcover_core::models::audit::Actor;
use hostcover_core::models::history::TierChangeRecord;
use hostcover_core::models::host::{HostCommit, HostSnapshot, HostState};
use hostcover_core::models::track::{CoverageSubmission, TrackKind};
use hostcover_core::repository::{AuditEmitter, HostStore};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::PreconditionError;
use crate::locks::HostLocks;
use crate::payload::{self, TransitionEffects};
use crate::transition::{self, TransitionPlan};

/// Transition engine for host coverage tracks.
///
/// Generic over the store and emitter so that the engine has no
/// dependency on the database crate.
pub struct CoverageService<S: HostStore, E: AuditEmitter> {
    store: S,
    emitter: E,
    config: EngineConfig,
    locks: HostLocks,
}

impl<S: HostStore, E: AuditEmitter> CoverageService<S, E> {
    pub fn new(store: S, emitter: E, config: EngineConfig) -> Self {
        Self {
            store,
            emitter,
            config,
            locks: HostLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Approve a pending submission on `track`.
    ///
    /// If the other track is active it is deactivated, keeping its policy
    /// details so it can be switched back to later.
    pub async fn approve_track(
        &self,
        host_id: Uuid,
        track: TrackKind,
        actor: Actor,
        reason: Option<&str>,
    ) -> CoverageResult<HostState> {
        self.execute(host_id, actor, |state, _| {
            transition::plan_approve(state, track, reason)
        })
        .await
    }

    /// Reject a pending submission on `track`. `reason` must not be blank.
    pub async fn reject_track(
        &self,
        host_id: Uuid,
        track: TrackKind,
        actor: Actor,
        reason: &str,
    ) -> CoverageResult<HostState> {
        self.execute(host_id, actor, |state, _| {
            transition::plan_reject(state, track, reason)
        })
        .await
    }

    /// Remove `track`, resuming the other track when it was suppressed.
    pub async fn delete_track(
        &self,
        host_id: Uuid,
        track: TrackKind,
        actor: Actor,
    ) -> CoverageResult<HostState> {
        let config = &self.config;
        self.execute(host_id, actor, |state, _| {
            transition::plan_delete(state, track, config)
        })
        .await
    }

    /// Record supporting documents for a track, leaving it pending review.
    pub async fn submit_coverage(
        &self,
        host_id: Uuid,
        submission: &CoverageSubmission,
        actor: Actor,
    ) -> CoverageResult<HostState> {
        self.execute(host_id, actor, |state, now| {
            transition::plan_submission(state, submission, now)
        })
        .await
    }

    /// Current state of a host.
    ///
    /// Waits for an in-flight transition on the same host, so a transition
    /// that is later rolled back is never observed.
    pub async fn host_state(&self, host_id: Uuid) -> CoverageResult<HostState> {
        let _guard = self.locks.acquire(host_id).await;
        Ok(self.store.get_host_for_update(host_id).await?.state)
    }

    /// Tier change history of a host, oldest first. Serialized with
    /// transitions like [`Self::host_state`].
    pub async fn tier_history(&self, host_id: Uuid) -> CoverageResult<Vec<TierChangeRecord>> {
        let _guard = self.locks.acquire(host_id).await;
        self.store.tier_history(host_id).await
    }

    /// Read, plan, commit and emit under the host's lock.
    ///
    /// A version conflict restarts from a fresh read, up to
    /// `max_conflict_retries` times. Precondition and infrastructure
    /// failures are returned as-is.
    async fn execute<F>(&self, host_id: Uuid, actor: Actor, plan: F) -> CoverageResult<HostState>
    where
        F: Fn(&HostState, DateTime<Utc>) -> Result<TransitionPlan, PreconditionError> + Sync,
    {
        let _guard = self.locks.acquire(host_id).await;
        let mut retries = 0;

        loop {
            let snapshot = self.store.get_host_for_update(host_id).await?;
            let now = Utc::now();
            let planned = plan(&snapshot.state, now)?;
            let effects = payload::build(&planned, actor, snapshot.version + 1, now);

            let commit = HostCommit {
                state: planned.next.clone(),
                history_entry: effects.history_entry.clone(),
            };
            let committed = match self
                .store
                .commit_host(host_id, snapshot.version, commit)
                .await
            {
                Ok(committed) => committed,
                Err(err @ CoverageError::ConcurrencyConflict { .. }) => {
                    if retries >= self.config.max_conflict_retries {
                        return Err(err);
                    }
                    retries += 1;
                    warn!(
                        host_id = %host_id,
                        expected_version = snapshot.version,
                        attempt = retries,
                        "Concurrent host update, retrying transition"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };

            self.emit(&snapshot, &committed, effects).await?;

            info!(
                host_id = %host_id,
                track = %planned.track,
                action = %planned.action,
                previous_tier = %planned.previous.earnings_tier,
                new_tier = %committed.state.earnings_tier,
                version = committed.version,
                "Coverage transition committed"
            );

            return Ok(committed.state);
        }
    }

    /// Record the audit entry, then the notification. On failure the
    /// commit is undone before the error is returned.
    async fn emit(
        &self,
        previous: &HostSnapshot,
        committed: &HostSnapshot,
        effects: TransitionEffects,
    ) -> CoverageResult<()> {
        let audit = match self.emitter.record_audit(effects.audit).await {
            Ok(audit) => audit,
            Err(err) => {
                self.roll_back(previous, committed, None).await;
                return Err(err);
            }
        };

        if let Err(err) = self.emitter.notify(effects.notification).await {
            self.roll_back(previous, committed, Some(audit.id)).await;
            return Err(err);
        }

        Ok(())
    }

    async fn roll_back(
        &self,
        previous: &HostSnapshot,
        committed: &HostSnapshot,
        audit_id: Option<Uuid>,
    ) {
        let host_id = committed.state.host_id;

        if let Some(audit_id) = audit_id {
            if let Err(e) = self.emitter.retract_audit(audit_id).await {
                error!(
                    host_id = %host_id,
                    audit_id = %audit_id,
                    error = %e,
                    "Failed to retract audit entry of rolled back transition"
                );
            }
        }

        match self.store.revert_host(committed, previous).await {
            Ok(()) => warn!(
                host_id = %host_id,
                reverted_version = committed.version,
                "Coverage transition rolled back"
            ),
            Err(e) => error!(
                host_id = %host_id,
                reverted_version = committed.version,
                error = %e,
                "Failed to roll back coverage transition"
            ),
        }
    }
}
