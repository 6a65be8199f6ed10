//! SurrealDB implementation of [`HostStore`].
//!
//! Each host is one record holding both tracks, the derived tier, the
//! tier change history and a `version` counter. Writes are conditional
//! on the version the caller read, so a stale writer matches no record
//! and is reported as a conflict instead of overwriting newer state.

use chrono::{DateTime, Utc};
use hostcover_core::error::CoverageResult;
use hostcover_core::models::history::TierChangeRecord;
use hostcover_core::models::host::{
    CommissionRate, EarningsTier, HostCommit, HostSnapshot, HostState, HostTracks,
};
use hostcover_core::models::track::{CoverageTrack, TrackStatus};
use hostcover_core::repository::HostStore;
use hostcover_core::tier;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, guarded_write_error};

#[derive(Debug, SurrealValue)]
struct HostRow {
    earnings_tier: String,
    commission_bps: u32,
    p2p_status: String,
    p2p_provider: Option<String>,
    p2p_policy_number: Option<String>,
    p2p_expires_at: Option<DateTime<Utc>>,
    commercial_status: String,
    commercial_provider: Option<String>,
    commercial_policy_number: Option<String>,
    commercial_expires_at: Option<DateTime<Utc>>,
    tier_history: serde_json::Value,
    version: u64,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct VersionRow {
    version: u64,
}

#[derive(Debug, SurrealValue)]
struct HistoryRow {
    tier_history: serde_json::Value,
}

fn parse_status(s: &str) -> Result<TrackStatus, DbError> {
    match s {
        "None" => Ok(TrackStatus::None),
        "Pending" => Ok(TrackStatus::Pending),
        "Active" => Ok(TrackStatus::Active),
        "Inactive" => Ok(TrackStatus::Inactive),
        "Rejected" => Ok(TrackStatus::Rejected),
        other => Err(DbError::decode("host", format!("unknown track status: {other}"))),
    }
}

fn status_to_string(s: TrackStatus) -> &'static str {
    match s {
        TrackStatus::None => "None",
        TrackStatus::Pending => "Pending",
        TrackStatus::Active => "Active",
        TrackStatus::Inactive => "Inactive",
        TrackStatus::Rejected => "Rejected",
    }
}

fn parse_tier(s: &str) -> Result<EarningsTier, DbError> {
    match s {
        "Basic" => Ok(EarningsTier::Basic),
        "Standard" => Ok(EarningsTier::Standard),
        "Premium" => Ok(EarningsTier::Premium),
        other => Err(DbError::decode("host", format!("unknown earnings tier: {other}"))),
    }
}

fn tier_to_string(t: EarningsTier) -> &'static str {
    match t {
        EarningsTier::Basic => "Basic",
        EarningsTier::Standard => "Standard",
        EarningsTier::Premium => "Premium",
    }
}

fn history_entries(value: serde_json::Value) -> Result<Vec<TierChangeRecord>, DbError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| DbError::decode("tier_history", e.to_string()))
}

impl HostRow {
    fn into_snapshot(self, host_id: Uuid) -> Result<HostSnapshot, DbError> {
        let tracks = HostTracks {
            p2p: CoverageTrack {
                status: parse_status(&self.p2p_status)?,
                provider: self.p2p_provider,
                policy_number: self.p2p_policy_number,
                expires_at: self.p2p_expires_at,
            },
            commercial: CoverageTrack {
                status: parse_status(&self.commercial_status)?,
                provider: self.commercial_provider,
                policy_number: self.commercial_policy_number,
                expires_at: self.commercial_expires_at,
            },
        };

        let earnings_tier = parse_tier(&self.earnings_tier)?;
        let commission_rate = u16::try_from(self.commission_bps)
            .ok()
            .and_then(CommissionRate::from_bps)
            .ok_or_else(|| {
                DbError::decode(
                    "host",
                    format!("commission out of range: {} bps", self.commission_bps),
                )
            })?;

        let expected = tier::resolve_tracks(&tracks);
        if expected.tier != earnings_tier || expected.commission_rate != commission_rate {
            return Err(DbError::decode(
                "host",
                format!(
                    "stored tier {earnings_tier} at {commission_rate} does not match \
                     tracks ({} at {})",
                    expected.tier, expected.commission_rate
                ),
            ));
        }
        if tracks.active_count() > 1 {
            return Err(DbError::decode("host", "both coverage tracks are active"));
        }

        let history_len = self
            .tier_history
            .as_array()
            .map_or(0, |entries| entries.len() as u64);

        Ok(HostSnapshot {
            state: HostState {
                host_id,
                earnings_tier,
                commission_rate,
                tracks,
            },
            version: self.version,
            history_len,
            updated_at: self.updated_at,
        })
    }
}

/// Assignments writing every coverage field of [`HostState`].
const STATE_SETS: &[&str] = &[
    "earnings_tier = $earnings_tier",
    "commission_bps = $commission_bps",
    "p2p_status = $p2p_status",
    "p2p_provider = $p2p_provider",
    "p2p_policy_number = $p2p_policy_number",
    "p2p_expires_at = $p2p_expires_at",
    "commercial_status = $commercial_status",
    "commercial_provider = $commercial_provider",
    "commercial_policy_number = $commercial_policy_number",
    "commercial_expires_at = $commercial_expires_at",
    "version = version + 1",
    "updated_at = time::now()",
];

/// Bind every parameter used by [`STATE_SETS`] from a [`HostState`].
macro_rules! bind_state {
    ($builder:expr, $state:expr) => {{
        let state: &HostState = $state;
        let p2p = &state.tracks.p2p;
        let commercial = &state.tracks.commercial;
        $builder
            .bind(("earnings_tier", tier_to_string(state.earnings_tier)))
            .bind(("commission_bps", u32::from(state.commission_rate.bps())))
            .bind(("p2p_status", status_to_string(p2p.status)))
            .bind(("p2p_provider", p2p.provider.clone()))
            .bind(("p2p_policy_number", p2p.policy_number.clone()))
            .bind(("p2p_expires_at", p2p.expires_at))
            .bind(("commercial_status", status_to_string(commercial.status)))
            .bind(("commercial_provider", commercial.provider.clone()))
            .bind(("commercial_policy_number", commercial.policy_number.clone()))
            .bind(("commercial_expires_at", commercial.expires_at))
    }};
}

/// SurrealDB implementation of the host record store.
#[derive(Clone)]
pub struct SurrealHostStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealHostStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, host_id: Uuid) -> Result<HostSnapshot, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('host', $id)")
            .bind(("id", host_id.to_string()))
            .await?;

        let rows: Vec<HostRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(DbError::HostNotFound(host_id))?;

        row.into_snapshot(host_id)
    }

    async fn current_version(&self, host_id: Uuid) -> Result<Option<u64>, DbError> {
        let mut result = self
            .db
            .query("SELECT version FROM type::record('host', $id)")
            .bind(("id", host_id.to_string()))
            .await?;

        let rows: Vec<VersionRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.version))
    }

    /// Explain why a version-guarded write matched nothing.
    async fn missed_write(&self, host_id: Uuid, expected: u64) -> DbError {
        match self.current_version(host_id).await {
            Ok(None) => DbError::HostNotFound(host_id),
            Ok(Some(_)) => DbError::VersionConflict { host_id, expected },
            Err(e) => e,
        }
    }

    async fn insert(&self, host_id: Uuid) -> Result<HostSnapshot, DbError> {
        let baseline = tier::resolve(TrackStatus::None, TrackStatus::None);

        let result = self
            .db
            .query(
                "CREATE type::record('host', $id) SET \
                 earnings_tier = $earnings_tier, \
                 commission_bps = $commission_bps, \
                 p2p_status = 'None', \
                 commercial_status = 'None', \
                 tier_history = [], \
                 version = 1",
            )
            .bind(("id", host_id.to_string()))
            .bind(("earnings_tier", tier_to_string(baseline.tier)))
            .bind(("commission_bps", u32::from(baseline.commission_rate.bps())))
            .await?;

        let mut result = match result.check() {
            Ok(result) => result,
            Err(e) => {
                return Err(match self.current_version(host_id).await {
                    Ok(Some(_)) => DbError::HostExists(host_id),
                    _ => DbError::Query(e.to_string()),
                });
            }
        };

        let rows: Vec<HostRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(DbError::HostNotFound(host_id))?;

        row.into_snapshot(host_id)
    }

    async fn write(
        &self,
        host_id: Uuid,
        expected_version: u64,
        commit: HostCommit,
    ) -> Result<HostSnapshot, DbError> {
        let mut sets = STATE_SETS.to_vec();
        let history_entry = match &commit.history_entry {
            Some(entry) => {
                sets.push("tier_history += $history_entry");
                Some(serde_json::to_value(entry).map_err(|e| DbError::Encode {
                    entity: "tier_history",
                    message: e.to_string(),
                })?)
            }
            None => None,
        };

        let query = format!(
            "UPDATE type::record('host', $id) SET {} \
             WHERE version = $expected_version",
            sets.join(", ")
        );

        let mut builder = bind_state!(self.db.query(&query), &commit.state)
            .bind(("id", host_id.to_string()))
            .bind(("expected_version", expected_version));
        if let Some(entry) = history_entry {
            builder = builder.bind(("history_entry", entry));
        }

        let clash = |e: surrealdb::Error| guarded_write_error(host_id, expected_version, e);
        let mut result = builder.await.map_err(clash)?.check().map_err(clash)?;

        let rows: Vec<HostRow> = result.take(0)?;
        match rows.into_iter().next() {
            Some(row) => row.into_snapshot(host_id),
            None => Err(self.missed_write(host_id, expected_version).await),
        }
    }

    async fn restore(
        &self,
        committed: &HostSnapshot,
        previous: &HostSnapshot,
    ) -> Result<(), DbError> {
        let host_id = committed.state.host_id;

        let mut result = self
            .db
            .query("SELECT tier_history FROM type::record('host', $id)")
            .bind(("id", host_id.to_string()))
            .await?;
        let rows: Vec<HistoryRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(DbError::HostNotFound(host_id))?;

        let mut history = match row.tier_history {
            serde_json::Value::Array(entries) => entries,
            _ => Vec::new(),
        };
        history.truncate(previous.history_len as usize);

        let mut sets = STATE_SETS.to_vec();
        sets.push("tier_history = $tier_history");
        let query = format!(
            "UPDATE type::record('host', $id) SET {} \
             WHERE version = $expected_version",
            sets.join(", ")
        );

        let clash = |e: surrealdb::Error| guarded_write_error(host_id, committed.version, e);
        let mut result = bind_state!(self.db.query(&query), &previous.state)
            .bind(("id", host_id.to_string()))
            .bind(("expected_version", committed.version))
            .bind(("tier_history", serde_json::Value::Array(history)))
            .await
            .map_err(clash)?
            .check()
            .map_err(clash)?;

        let rows: Vec<VersionRow> = result.take(0)?;
        if rows.is_empty() {
            return Err(self.missed_write(host_id, committed.version).await);
        }
        Ok(())
    }

    async fn history(&self, host_id: Uuid) -> Result<Vec<TierChangeRecord>, DbError> {
        let mut result = self
            .db
            .query("SELECT tier_history FROM type::record('host', $id)")
            .bind(("id", host_id.to_string()))
            .await?;

        let rows: Vec<HistoryRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(DbError::HostNotFound(host_id))?;

        history_entries(row.tier_history)
    }
}

impl<C: Connection> HostStore for SurrealHostStore<C> {
    async fn create_host(&self, host_id: Uuid) -> CoverageResult<HostSnapshot> {
        Ok(self.insert(host_id).await?)
    }

    async fn get_host_for_update(&self, host_id: Uuid) -> CoverageResult<HostSnapshot> {
        Ok(self.fetch(host_id).await?)
    }

    async fn commit_host(
        &self,
        host_id: Uuid,
        expected_version: u64,
        commit: HostCommit,
    ) -> CoverageResult<HostSnapshot> {
        Ok(self.write(host_id, expected_version, commit).await?)
    }

    async fn revert_host(
        &self,
        committed: &HostSnapshot,
        previous: &HostSnapshot,
    ) -> CoverageResult<()> {
        Ok(self.restore(committed, previous).await?)
    }

    async fn tier_history(&self, host_id: Uuid) -> CoverageResult<Vec<TierChangeRecord>> {
        Ok(self.history(host_id).await?)
    }
}
