//! Hostcover Database: SurrealDB connection management and the host
//! store / audit emitter implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - [`SurrealHostStore`], a versioned compare-and-swap host record store
//! - [`SurrealAuditEmitter`], the audit log and host notification queue
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{SurrealAuditEmitter, SurrealHostStore};
pub use schema::{run_migrations, schema_v1};
