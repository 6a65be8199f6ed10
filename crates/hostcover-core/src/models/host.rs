//! Host aggregate as seen by the coverage subsystem.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::history::TierChangeRecord;
use super::track::{CoverageTrack, TrackKind, TrackStatus};

/// Derived earnings classification controlling the host's revenue share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EarningsTier {
    Basic,
    Standard,
    Premium,
}

impl fmt::Display for EarningsTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EarningsTier::Basic => f.write_str("Basic"),
            EarningsTier::Standard => f.write_str("Standard"),
            EarningsTier::Premium => f.write_str("Premium"),
        }
    }
}

/// Platform commission, stored in basis points (10_000 = 100%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommissionRate(u16);

impl CommissionRate {
    pub const MAX_BPS: u16 = 10_000;

    /// Returns `None` when `bps` exceeds 100%.
    pub const fn from_bps(bps: u16) -> Option<Self> {
        if bps > Self::MAX_BPS {
            None
        } else {
            Some(Self(bps))
        }
    }

    pub const fn bps(self) -> u16 {
        self.0
    }

    /// The rate as a fraction in `[0, 1]`.
    pub fn as_fraction(self) -> f64 {
        f64::from(self.0) / f64::from(Self::MAX_BPS)
    }

    /// Host's share of a booking, in whole percent.
    pub fn host_share_percent(self) -> u16 {
        (Self::MAX_BPS - self.0) / 100
    }
}

impl fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_fraction())
    }
}

/// The two coverage tracks of a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostTracks {
    pub p2p: CoverageTrack,
    pub commercial: CoverageTrack,
}

impl HostTracks {
    pub fn get(&self, kind: TrackKind) -> &CoverageTrack {
        match kind {
            TrackKind::P2p => &self.p2p,
            TrackKind::Commercial => &self.commercial,
        }
    }

    pub fn get_mut(&mut self, kind: TrackKind) -> &mut CoverageTrack {
        match kind {
            TrackKind::P2p => &mut self.p2p,
            TrackKind::Commercial => &mut self.commercial,
        }
    }

    pub fn status(&self, kind: TrackKind) -> TrackStatus {
        self.get(kind).status
    }

    /// Number of tracks currently `Active`. Never more than one.
    pub fn active_count(&self) -> usize {
        TrackKind::ALL
            .iter()
            .filter(|kind| self.get(**kind).is_active())
            .count()
    }
}

/// Coverage-related state of one host, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostState {
    pub host_id: Uuid,
    pub earnings_tier: EarningsTier,
    pub commission_rate: CommissionRate,
    pub tracks: HostTracks,
}

/// Host state as read from the store, with its concurrency token.
#[derive(Debug, Clone)]
pub struct HostSnapshot {
    pub state: HostState,
    /// Incremented by one on every commit.
    pub version: u64,
    /// Number of entries in the host's tier change history.
    pub history_len: u64,
    pub updated_at: DateTime<Utc>,
}

/// New state to write back under a compare-and-swap on the version.
#[derive(Debug, Clone)]
pub struct HostCommit {
    pub state: HostState,
    /// Appended to the history in the same write, when present.
    pub history_entry: Option<TierChangeRecord>,
}
