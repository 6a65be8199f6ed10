//! Pure transition planning.
//!
//! Each planner takes the current host state and returns the state to
//! commit, or the precondition that failed. Nothing here touches the
//! store, so every rule can be exercised without persistence.

use chrono::{DateTime, Utc};
use hostcover_core::models::audit::AuditAction;
use hostcover_core::models::history::AutoEffect;
use hostcover_core::models::host::HostState;
use hostcover_core::models::track::{CoverageSubmission, CoverageTrack, TrackKind, TrackStatus};
use hostcover_core::tier::{TierAssignment, resolve_tracks};

use crate::config::EngineConfig;
use crate::error::PreconditionError;

/// The outcome of a planned transition, before it is committed.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub action: AuditAction,
    pub track: TrackKind,
    pub previous: HostState,
    pub next: HostState,
    pub reason: Option<String>,
    pub auto_effect: Option<AutoEffect>,
}

impl TransitionPlan {
    fn new(
        action: AuditAction,
        track: TrackKind,
        previous: &HostState,
        mut next: HostState,
        reason: Option<String>,
        auto_effect: Option<AutoEffect>,
    ) -> Self {
        let TierAssignment {
            tier,
            commission_rate,
        } = resolve_tracks(&next.tracks);
        next.earnings_tier = tier;
        next.commission_rate = commission_rate;
        debug_assert!(next.tracks.active_count() <= 1);

        Self {
            action,
            track,
            previous: previous.clone(),
            next,
            reason,
            auto_effect,
        }
    }

    pub fn tier_changed(&self) -> bool {
        self.previous.earnings_tier != self.next.earnings_tier
    }

    /// Whether this transition is recorded in the tier change history.
    /// Every admin decision is; a document submission is not.
    pub fn is_decision(&self) -> bool {
        self.action != AuditAction::InsuranceSubmitted
    }
}

fn invalid_state(
    state: &HostState,
    track: TrackKind,
    operation: &'static str,
) -> PreconditionError {
    PreconditionError::InvalidState {
        track,
        status: state.tracks.status(track),
        operation,
    }
}

/// Approve a pending submission. An `Active` other track is demoted to
/// `Inactive` with its fields kept.
pub fn plan_approve(
    state: &HostState,
    track: TrackKind,
    reason: Option<&str>,
) -> Result<TransitionPlan, PreconditionError> {
    let target = state.tracks.get(track);
    if target.status != TrackStatus::Pending {
        return Err(invalid_state(state, track, "approve"));
    }
    let missing = target.missing_fields();
    if !missing.is_empty() {
        return Err(PreconditionError::IncompleteSubmission { track, missing });
    }

    let mut next = state.clone();
    *next.tracks.get_mut(track) = target.with_status(TrackStatus::Active);

    let other = track.other();
    let mut auto_effect = None;
    if next.tracks.get(other).is_active() {
        let demoted = next.tracks.get(other).with_status(TrackStatus::Inactive);
        *next.tracks.get_mut(other) = demoted;
        auto_effect = Some(AutoEffect::Deactivated(other));
    }

    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_owned);

    Ok(TransitionPlan::new(
        AuditAction::InsuranceApproved,
        track,
        state,
        next,
        reason,
        auto_effect,
    ))
}

/// Reject a pending submission and clear its fields.
pub fn plan_reject(
    state: &HostState,
    track: TrackKind,
    reason: &str,
) -> Result<TransitionPlan, PreconditionError> {
    if state.tracks.status(track) != TrackStatus::Pending {
        return Err(invalid_state(state, track, "reject"));
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(PreconditionError::MissingReason);
    }

    let mut next = state.clone();
    *next.tracks.get_mut(track) = CoverageTrack::cleared(TrackStatus::Rejected);

    Ok(TransitionPlan::new(
        AuditAction::InsuranceRejected,
        track,
        state,
        next,
        Some(reason.to_owned()),
        None,
    ))
}

/// Remove a track entirely. An `Inactive` other track resumes; with
/// `reactivate_pending_on_delete` a complete `Pending` one is promoted too.
pub fn plan_delete(
    state: &HostState,
    track: TrackKind,
    config: &EngineConfig,
) -> Result<TransitionPlan, PreconditionError> {
    if state.tracks.status(track) == TrackStatus::None {
        return Err(invalid_state(state, track, "delete"));
    }

    let mut next = state.clone();
    *next.tracks.get_mut(track) = CoverageTrack::empty();

    let other = track.other();
    let other_track = next.tracks.get(other);
    let promote = match other_track.status {
        TrackStatus::Inactive => true,
        TrackStatus::Pending => {
            config.reactivate_pending_on_delete && other_track.missing_fields().is_empty()
        }
        _ => false,
    };

    let mut auto_effect = None;
    if promote {
        let resumed = other_track.with_status(TrackStatus::Active);
        *next.tracks.get_mut(other) = resumed;
        auto_effect = Some(AutoEffect::Reactivated(other));
    }

    Ok(TransitionPlan::new(
        AuditAction::InsuranceDeleted,
        track,
        state,
        next,
        None,
        auto_effect,
    ))
}

/// Record a document submission, moving the track to `Pending`.
pub fn plan_submission(
    state: &HostState,
    submission: &CoverageSubmission,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, PreconditionError> {
    let track = submission.track;
    match state.tracks.status(track) {
        TrackStatus::None | TrackStatus::Rejected | TrackStatus::Pending => {}
        TrackStatus::Active | TrackStatus::Inactive => {
            return Err(invalid_state(state, track, "resubmit"));
        }
    }
    if submission.provider.trim().is_empty() {
        return Err(PreconditionError::InvalidSubmission(
            "provider must not be blank".into(),
        ));
    }
    if submission.policy_number.trim().is_empty() {
        return Err(PreconditionError::InvalidSubmission(
            "policy number must not be blank".into(),
        ));
    }
    if submission.expires_at <= now {
        return Err(PreconditionError::InvalidSubmission(format!(
            "policy expired at {}",
            submission.expires_at
        )));
    }

    let mut next = state.clone();
    *next.tracks.get_mut(track) = CoverageTrack::pending(submission);

    Ok(TransitionPlan::new(
        AuditAction::InsuranceSubmitted,
        track,
        state,
        next,
        None,
        None,
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use hostcover_core::models::host::{EarningsTier, HostTracks};
    use hostcover_core::tier::resolve;
    use uuid::Uuid;

    use super::*;

    fn filed(status: TrackStatus) -> CoverageTrack {
        CoverageTrack {
            status,
            provider: Some("Harbor Mutual".into()),
            policy_number: Some("HM-0042".into()),
            expires_at: Some(Utc::now() + Duration::days(180)),
        }
    }

    fn host(p2p: CoverageTrack, commercial: CoverageTrack) -> HostState {
        let tracks = HostTracks { p2p, commercial };
        let assignment = resolve_tracks(&tracks);
        HostState {
            host_id: Uuid::new_v4(),
            earnings_tier: assignment.tier,
            commission_rate: assignment.commission_rate,
            tracks,
        }
    }

    fn assert_invariants(state: &HostState) {
        assert!(state.tracks.active_count() <= 1);
        let expected = resolve(state.tracks.p2p.status, state.tracks.commercial.status);
        assert_eq!(state.earnings_tier, expected.tier);
        assert_eq!(state.commission_rate, expected.commission_rate);
    }

    #[test]
    fn approve_pending_p2p_reaches_standard() {
        let state = host(filed(TrackStatus::Pending), CoverageTrack::empty());
        let plan = plan_approve(&state, TrackKind::P2p, None).unwrap();

        assert_eq!(plan.next.tracks.p2p.status, TrackStatus::Active);
        assert_eq!(plan.next.earnings_tier, EarningsTier::Standard);
        assert_eq!(plan.auto_effect, None);
        assert!(plan.tier_changed());
        assert_invariants(&plan.next);
    }

    #[test]
    fn approve_commercial_deactivates_active_p2p() {
        let state = host(filed(TrackStatus::Active), filed(TrackStatus::Pending));
        let plan = plan_approve(&state, TrackKind::Commercial, Some("  ")).unwrap();

        assert_eq!(plan.next.tracks.p2p.status, TrackStatus::Inactive);
        assert_eq!(plan.next.tracks.p2p.provider.as_deref(), Some("Harbor Mutual"));
        assert_eq!(plan.next.tracks.commercial.status, TrackStatus::Active);
        assert_eq!(plan.next.earnings_tier, EarningsTier::Premium);
        assert_eq!(plan.next.commission_rate.bps(), 1_000);
        assert_eq!(plan.auto_effect, Some(AutoEffect::Deactivated(TrackKind::P2p)));
        assert_eq!(plan.reason, None);
        assert_invariants(&plan.next);
    }

    #[test]
    fn approve_requires_pending() {
        for status in [
            TrackStatus::None,
            TrackStatus::Active,
            TrackStatus::Inactive,
            TrackStatus::Rejected,
        ] {
            let state = host(CoverageTrack::empty(), filed(status));
            let err = plan_approve(&state, TrackKind::Commercial, None).unwrap_err();
            assert_eq!(
                err,
                PreconditionError::InvalidState {
                    track: TrackKind::Commercial,
                    status,
                    operation: "approve",
                }
            );
        }
    }

    #[test]
    fn approve_requires_complete_submission() {
        let mut pending = filed(TrackStatus::Pending);
        pending.policy_number = None;
        let state = host(pending, CoverageTrack::empty());

        let err = plan_approve(&state, TrackKind::P2p, None).unwrap_err();
        assert_eq!(
            err,
            PreconditionError::IncompleteSubmission {
                track: TrackKind::P2p,
                missing: vec!["policy_number"],
            }
        );
    }

    #[test]
    fn reject_clears_fields_and_keeps_other_tier() {
        let state = host(filed(TrackStatus::Pending), filed(TrackStatus::Active));
        let plan = plan_reject(&state, TrackKind::P2p, " expired policy ").unwrap();

        assert_eq!(plan.next.tracks.p2p, CoverageTrack::cleared(TrackStatus::Rejected));
        assert_eq!(plan.next.earnings_tier, EarningsTier::Premium);
        assert_eq!(plan.reason.as_deref(), Some("expired policy"));
        assert!(!plan.tier_changed());
        assert_invariants(&plan.next);
    }

    #[test]
    fn reject_checks_state_before_reason() {
        let state = host(filed(TrackStatus::Active), CoverageTrack::empty());
        let err = plan_reject(&state, TrackKind::P2p, "").unwrap_err();
        assert!(matches!(err, PreconditionError::InvalidState { .. }));

        let state = host(filed(TrackStatus::Pending), CoverageTrack::empty());
        let err = plan_reject(&state, TrackKind::P2p, "   ").unwrap_err();
        assert_eq!(err, PreconditionError::MissingReason);
    }

    #[test]
    fn delete_reactivates_inactive_other_track() {
        let state = host(filed(TrackStatus::Inactive), filed(TrackStatus::Active));
        let plan = plan_delete(&state, TrackKind::Commercial, &EngineConfig::default()).unwrap();

        assert_eq!(plan.next.tracks.commercial, CoverageTrack::empty());
        assert_eq!(plan.next.tracks.p2p.status, TrackStatus::Active);
        assert_eq!(plan.next.earnings_tier, EarningsTier::Standard);
        assert_eq!(plan.next.commission_rate.bps(), 2_500);
        assert_eq!(plan.auto_effect, Some(AutoEffect::Reactivated(TrackKind::P2p)));
        assert_invariants(&plan.next);
    }

    #[test]
    fn delete_raises_tier_when_reactivating_into_premium() {
        let state = host(filed(TrackStatus::Active), filed(TrackStatus::Inactive));
        let plan = plan_delete(&state, TrackKind::P2p, &EngineConfig::default()).unwrap();

        assert_eq!(state.earnings_tier, EarningsTier::Standard);
        assert_eq!(plan.next.earnings_tier, EarningsTier::Premium);
        assert_invariants(&plan.next);
    }

    #[test]
    fn delete_leaves_pending_other_track_by_default() {
        let state = host(filed(TrackStatus::Pending), filed(TrackStatus::Active));
        let plan = plan_delete(&state, TrackKind::Commercial, &EngineConfig::default()).unwrap();

        assert_eq!(plan.next.tracks.p2p.status, TrackStatus::Pending);
        assert_eq!(plan.next.earnings_tier, EarningsTier::Basic);
        assert_eq!(plan.auto_effect, None);
    }

    #[test]
    fn delete_promotes_pending_when_configured() {
        let config = EngineConfig {
            reactivate_pending_on_delete: true,
            ..EngineConfig::default()
        };
        let state = host(filed(TrackStatus::Pending), filed(TrackStatus::Active));
        let plan = plan_delete(&state, TrackKind::Commercial, &config).unwrap();
        assert_eq!(plan.next.tracks.p2p.status, TrackStatus::Active);
        assert_eq!(plan.next.earnings_tier, EarningsTier::Standard);

        let mut incomplete = filed(TrackStatus::Pending);
        incomplete.expires_at = None;
        let state = host(incomplete, filed(TrackStatus::Active));
        let plan = plan_delete(&state, TrackKind::Commercial, &config).unwrap();
        assert_eq!(plan.next.tracks.p2p.status, TrackStatus::Pending);
    }

    #[test]
    fn delete_of_empty_track_is_rejected() {
        let state = host(CoverageTrack::empty(), CoverageTrack::empty());
        let err = plan_delete(&state, TrackKind::P2p, &EngineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PreconditionError::InvalidState {
                status: TrackStatus::None,
                ..
            }
        ));
    }

    #[test]
    fn submission_moves_rejected_track_to_pending() {
        let now = Utc::now();
        let state = host(CoverageTrack::cleared(TrackStatus::Rejected), CoverageTrack::empty());
        let submission = CoverageSubmission {
            track: TrackKind::P2p,
            provider: "Harbor Mutual".into(),
            policy_number: "HM-0043".into(),
            expires_at: now + Duration::days(365),
        };
        let plan = plan_submission(&state, &submission, now).unwrap();

        assert_eq!(plan.next.tracks.p2p.status, TrackStatus::Pending);
        assert_eq!(plan.next.tracks.p2p.policy_number.as_deref(), Some("HM-0043"));
        assert!(!plan.is_decision());
        assert!(!plan.tier_changed());
    }

    #[test]
    fn submission_refuses_active_track_and_expired_policy() {
        let now = Utc::now();
        let mut submission = CoverageSubmission {
            track: TrackKind::P2p,
            provider: "Harbor Mutual".into(),
            policy_number: "HM-0044".into(),
            expires_at: now + Duration::days(30),
        };

        let state = host(filed(TrackStatus::Active), CoverageTrack::empty());
        assert!(matches!(
            plan_submission(&state, &submission, now),
            Err(PreconditionError::InvalidState { .. })
        ));

        let state = host(CoverageTrack::empty(), CoverageTrack::empty());
        submission.expires_at = now - Duration::days(1);
        assert!(matches!(
            plan_submission(&state, &submission, now),
            Err(PreconditionError::InvalidSubmission(_))
        ));
    }

    #[test]
    fn every_reachable_state_keeps_invariants() {
        // Walk all sequences of up to four decisions from a host with both
        // tracks pending, resubmitting where a decision needs a pending track.
        let config = EngineConfig::default();
        let start = host(filed(TrackStatus::Pending), filed(TrackStatus::Pending));
        let mut frontier = vec![start];

        for _ in 0..4 {
            let mut next_frontier = Vec::new();
            for state in &frontier {
                for track in TrackKind::ALL {
                    let plans = [
                        plan_approve(state, track, None),
                        plan_reject(state, track, "unreadable scan"),
                        plan_delete(state, track, &config),
                    ];
                    for plan in plans.into_iter().flatten() {
                        assert_invariants(&plan.next);
                        let mut resubmitted = plan.next.clone();
                        let status = resubmitted.tracks.status(track);
                        if matches!(status, TrackStatus::None | TrackStatus::Rejected) {
                            *resubmitted.tracks.get_mut(track) = filed(TrackStatus::Pending);
                        }
                        next_frontier.push(resubmitted);
                    }
                }
            }
            frontier = next_frontier;
        }
        assert!(!frontier.is_empty());
    }
}
