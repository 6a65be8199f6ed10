//! Audit, notification and history payloads for a planned transition.
//!
//! All three are built from the same [`TransitionPlan`] and host version,
//! so they always describe the same before/after pair.

use chrono::{DateTime, Utc};
use hostcover_core::models::audit::{Actor, AuditAction, CreateAuditEntry};
use hostcover_core::models::history::{AutoEffect, TierChangeRecord};
use hostcover_core::models::host::HostState;
use hostcover_core::models::notification::{CreateHostNotification, NotificationPriority};
use serde_json::json;
use uuid::Uuid;

use crate::transition::TransitionPlan;

/// Everything a committed transition must emit.
#[derive(Debug, Clone)]
pub struct TransitionEffects {
    /// Appended to the host history in the commit itself.
    pub history_entry: Option<TierChangeRecord>,
    pub audit: CreateAuditEntry,
    pub notification: CreateHostNotification,
}

/// Build the effects of `plan` as committed at `host_version`.
pub fn build(
    plan: &TransitionPlan,
    actor: Actor,
    host_version: u64,
    now: DateTime<Utc>,
) -> TransitionEffects {
    let history_entry = plan.is_decision().then(|| TierChangeRecord {
        id: Uuid::new_v4(),
        host_version,
        actor,
        action: plan.action,
        track: plan.track,
        previous_tier: plan.previous.earnings_tier,
        new_tier: plan.next.earnings_tier,
        previous_commission: plan.previous.commission_rate,
        new_commission: plan.next.commission_rate,
        reason: plan.reason.clone(),
        auto_effects: plan.auto_effect.into_iter().collect(),
        occurred_at: now,
    });

    TransitionEffects {
        history_entry,
        audit: audit_entry(plan, actor, host_version),
        notification: notification(plan, host_version),
    }
}

fn state_json(state: &HostState) -> serde_json::Value {
    json!({
        "earnings_tier": state.earnings_tier,
        "commission_rate": state.commission_rate.as_fraction(),
        "host_share_percent": state.commission_rate.host_share_percent(),
        "p2p_status": state.tracks.p2p.status,
        "commercial_status": state.tracks.commercial.status,
    })
}

fn audit_entry(plan: &TransitionPlan, actor: Actor, host_version: u64) -> CreateAuditEntry {
    let target = plan.next.tracks.get(plan.track);
    let submitted = plan.previous.tracks.get(plan.track);

    let metadata = json!({
        "track": plan.track,
        "previous": state_json(&plan.previous),
        "new": state_json(&plan.next),
        "tier_changed": plan.tier_changed(),
        "reason": plan.reason,
        "auto_effect": plan.auto_effect,
        "provider": target.provider.as_ref().or(submitted.provider.as_ref()),
        "policy_number": target.policy_number.as_ref().or(submitted.policy_number.as_ref()),
    });

    CreateAuditEntry {
        entity_id: plan.next.host_id,
        actor,
        action: plan.action,
        host_version,
        metadata,
    }
}

fn tier_sentence(state: &HostState) -> String {
    format!(
        "You are now in the {} tier and earn {}% of each booking.",
        state.earnings_tier,
        state.commission_rate.host_share_percent()
    )
}

fn notification(plan: &TransitionPlan, host_version: u64) -> CreateHostNotification {
    let label = plan.track.coverage_label();

    let (subject, mut message, priority, response_required) = match plan.action {
        AuditAction::InsuranceApproved => (
            format!("Your {label} has been approved"),
            format!("Your {label} is now active. {}", tier_sentence(&plan.next)),
            NotificationPriority::High,
            false,
        ),
        AuditAction::InsuranceRejected => (
            format!("Action required: your {label} was not approved"),
            format!(
                "We could not approve your {label}: {}. Please upload updated \
                 documents to resubmit. {}",
                plan.reason.as_deref().unwrap_or("no reason given"),
                tier_sentence(&plan.next)
            ),
            NotificationPriority::High,
            true,
        ),
        AuditAction::InsuranceDeleted => (
            format!("Your {label} has been removed"),
            format!(
                "Your {label} was removed from your account. {}",
                tier_sentence(&plan.next)
            ),
            NotificationPriority::Normal,
            false,
        ),
        AuditAction::InsuranceSubmitted => (
            format!("We received your {label} documents"),
            format!(
                "Your {label} documents are under review. We will let you know \
                 once a decision has been made."
            ),
            NotificationPriority::Low,
            false,
        ),
    };

    match plan.auto_effect {
        Some(AutoEffect::Deactivated(other)) => message.push_str(&format!(
            " Your {} has been automatically deactivated. You can switch back to it at any time.",
            other.coverage_label()
        )),
        Some(AutoEffect::Reactivated(other)) => message.push_str(&format!(
            " Your {} has resumed automatically.",
            other.coverage_label()
        )),
        None => {}
    }

    CreateHostNotification {
        host_id: plan.next.host_id,
        subject,
        message,
        priority,
        response_required,
        host_version,
    }
}
