//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings. Enums are stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "coverage_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Hosts: both coverage tracks, derived tier, history, version token
-- =======================================================================
DEFINE TABLE host SCHEMAFULL;
DEFINE FIELD earnings_tier ON TABLE host TYPE string \
    ASSERT $value IN ['Basic', 'Standard', 'Premium'];
DEFINE FIELD commission_bps ON TABLE host TYPE int \
    ASSERT $value >= 0 AND $value <= 10000;
DEFINE FIELD p2p_status ON TABLE host TYPE string \
    ASSERT $value IN ['None', 'Pending', 'Active', 'Inactive', 'Rejected'];
DEFINE FIELD p2p_provider ON TABLE host TYPE option<string>;
DEFINE FIELD p2p_policy_number ON TABLE host TYPE option<string>;
DEFINE FIELD p2p_expires_at ON TABLE host TYPE option<datetime>;
DEFINE FIELD commercial_status ON TABLE host TYPE string \
    ASSERT $value IN ['None', 'Pending', 'Active', 'Inactive', 'Rejected'];
DEFINE FIELD commercial_provider ON TABLE host TYPE option<string>;
DEFINE FIELD commercial_policy_number ON TABLE host TYPE option<string>;
DEFINE FIELD commercial_expires_at ON TABLE host TYPE option<datetime>;
DEFINE FIELD tier_history ON TABLE host TYPE array DEFAULT [];
DEFINE FIELD tier_history.* ON TABLE host TYPE object FLEXIBLE;
DEFINE FIELD version ON TABLE host TYPE int;
DEFINE FIELD created_at ON TABLE host TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE host TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Audit log (one entry per committed host version)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE;
DEFINE FIELD host_id ON TABLE audit_log TYPE string;
DEFINE FIELD actor_id ON TABLE audit_log TYPE string;
DEFINE FIELD actor_type ON TABLE audit_log TYPE string \
    ASSERT $value IN ['FleetAdmin', 'Host', 'System'];
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['INSURANCE_SUBMITTED', 'INSURANCE_APPROVED', \
                      'INSURANCE_REJECTED', 'INSURANCE_DELETED'];
DEFINE FIELD host_version ON TABLE audit_log TYPE int;
DEFINE FIELD metadata ON TABLE audit_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_host_version ON TABLE audit_log \
    COLUMNS host_id, host_version UNIQUE;

-- =======================================================================
-- Host notifications (one per committed host version)
-- =======================================================================
DEFINE TABLE host_notification SCHEMAFULL;
DEFINE FIELD host_id ON TABLE host_notification TYPE string;
DEFINE FIELD subject ON TABLE host_notification TYPE string;
DEFINE FIELD message ON TABLE host_notification TYPE string;
DEFINE FIELD priority ON TABLE host_notification TYPE string \
    ASSERT $value IN ['Low', 'Normal', 'High'];
DEFINE FIELD response_required ON TABLE host_notification TYPE bool;
DEFINE FIELD host_version ON TABLE host_notification TYPE int;
DEFINE FIELD created_at ON TABLE host_notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_host_version ON TABLE host_notification \
    COLUMNS host_id, host_version UNIQUE;
";

/// Run all pending migrations.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_defines_every_table() {
        for table in ["host", "audit_log", "host_notification"] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
    }
}
