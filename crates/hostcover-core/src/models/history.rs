//! Tier change history.
//!
//! Entries are appended by the transition engine and never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::{Actor, AuditAction};
use super::host::{CommissionRate, EarningsTier};
use super::track::TrackKind;

/// A change applied to the non-targeted track as part of a transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AutoEffect {
    /// The other track was demoted from `Active` to `Inactive`.
    Deactivated(TrackKind),
    /// The other track was promoted back to `Active`.
    Reactivated(TrackKind),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierChangeRecord {
    pub id: Uuid,
    /// Host version this entry was committed at.
    pub host_version: u64,
    pub actor: Actor,
    pub action: AuditAction,
    pub track: TrackKind,
    pub previous_tier: EarningsTier,
    pub new_tier: EarningsTier,
    pub previous_commission: CommissionRate,
    pub new_commission: CommissionRate,
    pub reason: Option<String>,
    pub auto_effects: Vec<AutoEffect>,
    pub occurred_at: DateTime<Utc>,
}
