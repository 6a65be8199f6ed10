//! Integration tests for the SurrealDB audit log and notification queue
//! using in-memory SurrealDB.

use hostcover_core::models::audit::{Actor, ActorType, AuditAction, CreateAuditEntry};
use hostcover_core::models::notification::{CreateHostNotification, NotificationPriority};
use hostcover_core::repository::AuditEmitter;
use hostcover_db::{DbManager, SurrealAuditEmitter};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> SurrealAuditEmitter<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    let manager = DbManager::from_client(db);
    manager.migrate().await.unwrap();
    manager.audit_emitter()
}

fn audit(host_id: Uuid, action: AuditAction, host_version: u64) -> CreateAuditEntry {
    CreateAuditEntry {
        entity_id: host_id,
        actor: Actor::fleet_admin(Uuid::new_v4()),
        action,
        host_version,
        metadata: json!({ "track": "Commercial", "tier_changed": true }),
    }
}

fn notification(host_id: Uuid, host_version: u64) -> CreateHostNotification {
    CreateHostNotification {
        host_id,
        subject: "Your commercial insurance has been approved".into(),
        message: "You are now in the Premium tier and earn 90% of each booking.".into(),
        priority: NotificationPriority::High,
        response_required: false,
        host_version,
    }
}

#[tokio::test]
async fn record_and_list_audit_in_version_order() {
    let emitter = setup().await;
    let host_id = Uuid::new_v4();

    emitter
        .record_audit(audit(host_id, AuditAction::InsuranceDeleted, 4))
        .await
        .unwrap();
    let first = emitter
        .record_audit(audit(host_id, AuditAction::InsuranceApproved, 3))
        .await
        .unwrap();
    emitter
        .record_audit(audit(Uuid::new_v4(), AuditAction::InsuranceRejected, 2))
        .await
        .unwrap();

    assert_eq!(first.entity_id, host_id);
    assert_eq!(first.actor.actor_type, ActorType::FleetAdmin);
    assert_eq!(first.metadata["track"], "Commercial");

    let entries = emitter.list_audit_for_host(host_id).await.unwrap();
    let actions: Vec<_> = entries.iter().map(|e| (e.host_version, e.action)).collect();
    assert_eq!(
        actions,
        vec![
            (3, AuditAction::InsuranceApproved),
            (4, AuditAction::InsuranceDeleted),
        ]
    );
    assert_eq!(entries[0].id, first.id);
}

#[tokio::test]
async fn one_audit_entry_per_host_version() {
    let emitter = setup().await;
    let host_id = Uuid::new_v4();

    emitter
        .record_audit(audit(host_id, AuditAction::InsuranceApproved, 2))
        .await
        .unwrap();
    let err = emitter
        .record_audit(audit(host_id, AuditAction::InsuranceApproved, 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        hostcover_core::CoverageError::EmitterUnavailable(_)
    ));
}

#[tokio::test]
async fn retracted_audit_is_gone() {
    let emitter = setup().await;
    let host_id = Uuid::new_v4();

    let entry = emitter
        .record_audit(audit(host_id, AuditAction::InsuranceApproved, 2))
        .await
        .unwrap();
    emitter.retract_audit(entry.id).await.unwrap();

    assert!(emitter.list_audit_for_host(host_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn notifications_are_listed_per_host() {
    let emitter = setup().await;
    let host_id = Uuid::new_v4();

    let queued = emitter.notify(notification(host_id, 2)).await.unwrap();
    emitter.notify(notification(Uuid::new_v4(), 2)).await.unwrap();

    assert_eq!(queued.host_id, host_id);
    assert_eq!(queued.priority, NotificationPriority::High);
    assert!(!queued.response_required);

    let listed = emitter.list_notifications_for_host(host_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, queued.id);
    assert_eq!(listed[0].subject, queued.subject);
}
