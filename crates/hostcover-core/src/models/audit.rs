//! Audit log domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActorType {
    FleetAdmin,
    Host,
    System,
}

/// Who requested a transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub actor_type: ActorType,
}

impl Actor {
    pub fn fleet_admin(id: Uuid) -> Self {
        Self {
            id,
            actor_type: ActorType::FleetAdmin,
        }
    }

    pub fn host(id: Uuid) -> Self {
        Self {
            id,
            actor_type: ActorType::Host,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuditAction {
    InsuranceSubmitted,
    InsuranceApproved,
    InsuranceRejected,
    InsuranceDeleted,
}

impl AuditAction {
    /// Stable tag written to the audit log.
    pub fn tag(self) -> &'static str {
        match self {
            AuditAction::InsuranceSubmitted => "INSURANCE_SUBMITTED",
            AuditAction::InsuranceApproved => "INSURANCE_APPROVED",
            AuditAction::InsuranceRejected => "INSURANCE_REJECTED",
            AuditAction::InsuranceDeleted => "INSURANCE_DELETED",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "INSURANCE_SUBMITTED" => Some(AuditAction::InsuranceSubmitted),
            "INSURANCE_APPROVED" => Some(AuditAction::InsuranceApproved),
            "INSURANCE_REJECTED" => Some(AuditAction::InsuranceRejected),
            "INSURANCE_DELETED" => Some(AuditAction::InsuranceDeleted),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// The host the change applies to.
    pub entity_id: Uuid,
    pub actor: Actor,
    pub action: AuditAction,
    /// Host version committed by the audited transition.
    pub host_version: u64,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Fields required to record an audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEntry {
    pub entity_id: Uuid,
    pub actor: Actor,
    pub action: AuditAction,
    pub host_version: u64,
    pub metadata: serde_json::Value,
}
