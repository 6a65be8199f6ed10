//! SurrealDB implementation of [`AuditEmitter`].
//!
//! Audit entries and notifications are keyed by host and the host version
//! their transition committed, so listing them by version yields commit
//! order.

use chrono::{DateTime, Utc};
use hostcover_core::error::CoverageResult;
use hostcover_core::models::audit::{Actor, ActorType, AuditAction, AuditEntry, CreateAuditEntry};
use hostcover_core::models::notification::{
    CreateHostNotification, HostNotification, NotificationPriority,
};
use hostcover_core::repository::AuditEmitter;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, emitter_error};

#[derive(Debug, SurrealValue)]
struct AuditRow {
    host_id: String,
    actor_id: String,
    actor_type: String,
    action: String,
    host_version: u64,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    host_id: String,
    actor_id: String,
    actor_type: String,
    action: String,
    host_version: u64,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    host_id: String,
    subject: String,
    message: String,
    priority: String,
    response_required: bool,
    host_version: u64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    host_id: String,
    subject: String,
    message: String,
    priority: String,
    response_required: bool,
    host_version: u64,
    created_at: DateTime<Utc>,
}

fn parse_uuid(entity: &'static str, field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value)
        .map_err(|e| DbError::decode(entity, format!("invalid {field} UUID: {e}")))
}

fn parse_actor_type(s: &str) -> Result<ActorType, DbError> {
    match s {
        "FleetAdmin" => Ok(ActorType::FleetAdmin),
        "Host" => Ok(ActorType::Host),
        "System" => Ok(ActorType::System),
        other => Err(DbError::decode("audit_log", format!("unknown actor type: {other}"))),
    }
}

fn actor_type_to_string(t: ActorType) -> &'static str {
    match t {
        ActorType::FleetAdmin => "FleetAdmin",
        ActorType::Host => "Host",
        ActorType::System => "System",
    }
}

fn parse_priority(s: &str) -> Result<NotificationPriority, DbError> {
    match s {
        "Low" => Ok(NotificationPriority::Low),
        "Normal" => Ok(NotificationPriority::Normal),
        "High" => Ok(NotificationPriority::High),
        other => Err(DbError::decode(
            "host_notification",
            format!("unknown priority: {other}"),
        )),
    }
}

fn priority_to_string(p: NotificationPriority) -> &'static str {
    match p {
        NotificationPriority::Low => "Low",
        NotificationPriority::Normal => "Normal",
        NotificationPriority::High => "High",
    }
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditEntry, DbError> {
        let action = AuditAction::from_tag(&self.action).ok_or_else(|| {
            DbError::decode("audit_log", format!("unknown action: {}", self.action))
        })?;
        Ok(AuditEntry {
            id,
            entity_id: parse_uuid("audit_log", "host", &self.host_id)?,
            actor: Actor {
                id: parse_uuid("audit_log", "actor", &self.actor_id)?,
                actor_type: parse_actor_type(&self.actor_type)?,
            },
            action,
            host_version: self.host_version,
            metadata: self.metadata,
            timestamp: self.timestamp,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditEntry, DbError> {
        let id = parse_uuid("audit_log", "record", &self.record_id)?;
        AuditRow {
            host_id: self.host_id,
            actor_id: self.actor_id,
            actor_type: self.actor_type,
            action: self.action,
            host_version: self.host_version,
            metadata: self.metadata,
            timestamp: self.timestamp,
        }
        .into_entry(id)
    }
}

impl NotificationRow {
    fn into_notification(self, id: Uuid) -> Result<HostNotification, DbError> {
        Ok(HostNotification {
            id,
            host_id: parse_uuid("host_notification", "host", &self.host_id)?,
            subject: self.subject,
            message: self.message,
            priority: parse_priority(&self.priority)?,
            response_required: self.response_required,
            host_version: self.host_version,
            created_at: self.created_at,
        })
    }
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<HostNotification, DbError> {
        let id = parse_uuid("host_notification", "record", &self.record_id)?;
        NotificationRow {
            host_id: self.host_id,
            subject: self.subject,
            message: self.message,
            priority: self.priority,
            response_required: self.response_required,
            host_version: self.host_version,
            created_at: self.created_at,
        }
        .into_notification(id)
    }
}

/// SurrealDB implementation of the audit log and notification queue.
#[derive(Clone)]
pub struct SurrealAuditEmitter<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditEmitter<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Audit entries for a host in commit order.
    pub async fn list_audit_for_host(&self, host_id: Uuid) -> CoverageResult<Vec<AuditEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT record::id(id) AS record_id, * FROM audit_log \
                 WHERE host_id = $host_id \
                 ORDER BY host_version ASC",
            )
            .bind(("host_id", host_id.to_string()))
            .await
            .map_err(|e| emitter_error(e.into()))?;

        let rows: Vec<AuditRowWithId> = result.take(0).map_err(|e| emitter_error(e.into()))?;
        rows.into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(emitter_error)
    }

    /// Notifications queued for a host in commit order.
    pub async fn list_notifications_for_host(
        &self,
        host_id: Uuid,
    ) -> CoverageResult<Vec<HostNotification>> {
        let mut result = self
            .db
            .query(
                "SELECT record::id(id) AS record_id, * FROM host_notification \
                 WHERE host_id = $host_id \
                 ORDER BY host_version ASC",
            )
            .bind(("host_id", host_id.to_string()))
            .await
            .map_err(|e| emitter_error(e.into()))?;

        let rows: Vec<NotificationRowWithId> =
            result.take(0).map_err(|e| emitter_error(e.into()))?;
        rows.into_iter()
            .map(|row| row.try_into_notification())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(emitter_error)
    }

    async fn insert_audit(&self, input: CreateAuditEntry) -> Result<AuditEntry, DbError> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 host_id = $host_id, \
                 actor_id = $actor_id, \
                 actor_type = $actor_type, \
                 action = $action, \
                 host_version = $host_version, \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("host_id", input.entity_id.to_string()))
            .bind(("actor_id", input.actor.id.to_string()))
            .bind(("actor_type", actor_type_to_string(input.actor.actor_type)))
            .bind(("action", input.action.tag()))
            .bind(("host_version", input.host_version))
            .bind(("metadata", input.metadata))
            .await?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AuditRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Query(format!("audit entry {id_str} was not created")))?;

        row.into_entry(id)
    }

    async fn insert_notification(
        &self,
        input: CreateHostNotification,
    ) -> Result<HostNotification, DbError> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('host_notification', $id) SET \
                 host_id = $host_id, \
                 subject = $subject, \
                 message = $message, \
                 priority = $priority, \
                 response_required = $response_required, \
                 host_version = $host_version",
            )
            .bind(("id", id_str.clone()))
            .bind(("host_id", input.host_id.to_string()))
            .bind(("subject", input.subject))
            .bind(("message", input.message))
            .bind(("priority", priority_to_string(input.priority)))
            .bind(("response_required", input.response_required))
            .bind(("host_version", input.host_version))
            .await?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<NotificationRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            DbError::Query(format!("notification {id_str} was not created"))
        })?;

        row.into_notification(id)
    }

    async fn delete_audit(&self, audit_id: Uuid) -> Result<(), DbError> {
        self.db
            .query("DELETE type::record('audit_log', $id)")
            .bind(("id", audit_id.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }
}

impl<C: Connection> AuditEmitter for SurrealAuditEmitter<C> {
    async fn record_audit(&self, input: CreateAuditEntry) -> CoverageResult<AuditEntry> {
        self.insert_audit(input).await.map_err(emitter_error)
    }

    async fn notify(&self, input: CreateHostNotification) -> CoverageResult<HostNotification> {
        self.insert_notification(input).await.map_err(emitter_error)
    }

    async fn retract_audit(&self, audit_id: Uuid) -> CoverageResult<()> {
        self.delete_audit(audit_id).await.map_err(emitter_error)
    }
}
