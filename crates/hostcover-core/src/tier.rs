//! Tier resolution.
//!
//! Maps the pair of track statuses to an earnings tier and commission
//! rate. Only `Active` versus not-`Active` matters:
//!
//! | Commercial | P2P        | Tier     | Commission |
//! |------------|------------|----------|------------|
//! | Active     | any        | Premium  | 0.10       |
//! | not Active | Active     | Standard | 0.25       |
//! | not Active | not Active | Basic    | 0.60       |

use serde::{Deserialize, Serialize};

use crate::models::host::{CommissionRate, EarningsTier, HostTracks};
use crate::models::track::TrackStatus;

const PREMIUM_COMMISSION: CommissionRate = bps(1_000);
const STANDARD_COMMISSION: CommissionRate = bps(2_500);
const BASIC_COMMISSION: CommissionRate = bps(6_000);

const fn bps(value: u16) -> CommissionRate {
    match CommissionRate::from_bps(value) {
        Some(rate) => rate,
        None => panic!("commission above 100%"),
    }
}

/// A tier together with the commission it implies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierAssignment {
    pub tier: EarningsTier,
    pub commission_rate: CommissionRate,
}

impl TierAssignment {
    /// The commission charged at a given tier.
    pub fn for_tier(tier: EarningsTier) -> Self {
        let commission_rate = match tier {
            EarningsTier::Premium => PREMIUM_COMMISSION,
            EarningsTier::Standard => STANDARD_COMMISSION,
            EarningsTier::Basic => BASIC_COMMISSION,
        };
        Self {
            tier,
            commission_rate,
        }
    }

    pub fn host_share_percent(&self) -> u16 {
        self.commission_rate.host_share_percent()
    }
}

/// Resolve the tier for a pair of track statuses.
pub fn resolve(p2p: TrackStatus, commercial: TrackStatus) -> TierAssignment {
    let tier = match (commercial, p2p) {
        (TrackStatus::Active, _) => EarningsTier::Premium,
        (_, TrackStatus::Active) => EarningsTier::Standard,
        _ => EarningsTier::Basic,
    };
    TierAssignment::for_tier(tier)
}

/// Resolve the tier for a host's tracks.
pub fn resolve_tracks(tracks: &HostTracks) -> TierAssignment {
    resolve(tracks.p2p.status, tracks.commercial.status)
}
