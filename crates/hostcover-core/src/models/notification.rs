//! Host-facing notification model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostNotification {
    pub id: Uuid,
    pub host_id: Uuid,
    pub subject: String,
    pub message: String,
    pub priority: NotificationPriority,
    /// The host is expected to act, e.g. resubmit documents.
    pub response_required: bool,
    pub host_version: u64,
    pub created_at: DateTime<Utc>,
}

/// Fields required to queue a host notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHostNotification {
    pub host_id: Uuid,
    pub subject: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub response_required: bool,
    pub host_version: u64,
}
