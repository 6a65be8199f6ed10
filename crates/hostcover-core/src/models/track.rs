//! Coverage track domain model.
//!
//! Every host carries two independent tracks: peer-to-peer coverage and
//! commercial coverage. Each moves through its own lifecycle; the pair of
//! statuses determines the host's earnings tier.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of the two coverage tracks an operation targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TrackKind {
    P2p,
    Commercial,
}

impl TrackKind {
    pub const ALL: [TrackKind; 2] = [TrackKind::P2p, TrackKind::Commercial];

    /// The opposite track.
    pub fn other(self) -> TrackKind {
        match self {
            TrackKind::P2p => TrackKind::Commercial,
            TrackKind::Commercial => TrackKind::P2p,
        }
    }

    /// Host-facing name used in notification copy.
    pub fn coverage_label(self) -> &'static str {
        match self {
            TrackKind::P2p => "peer-to-peer insurance",
            TrackKind::Commercial => "commercial insurance",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::P2p => f.write_str("P2P"),
            TrackKind::Commercial => f.write_str("Commercial"),
        }
    }
}

/// Lifecycle status of a coverage track.
///
/// `None` means no submission exists yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TrackStatus {
    #[default]
    None,
    Pending,
    Active,
    Inactive,
    Rejected,
}

impl TrackStatus {
    /// Statuses under which the submitted fields are retained.
    pub fn retains_submission(self) -> bool {
        matches!(
            self,
            TrackStatus::Pending | TrackStatus::Active | TrackStatus::Inactive
        )
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackStatus::None => "None",
            TrackStatus::Pending => "Pending",
            TrackStatus::Active => "Active",
            TrackStatus::Inactive => "Inactive",
            TrackStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// One coverage track of a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverageTrack {
    pub status: TrackStatus,
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CoverageTrack {
    /// A track with no submission.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A pending track built from a document submission.
    pub fn pending(submission: &CoverageSubmission) -> Self {
        Self {
            status: TrackStatus::Pending,
            provider: Some(submission.provider.clone()),
            policy_number: Some(submission.policy_number.clone()),
            expires_at: Some(submission.expires_at),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TrackStatus::Active
    }

    /// Names of the submission fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());

        let mut missing = Vec::new();
        if blank(&self.provider) {
            missing.push("provider");
        }
        if blank(&self.policy_number) {
            missing.push("policy_number");
        }
        if self.expires_at.is_none() {
            missing.push("expires_at");
        }
        missing
    }

    /// Move to `status`, keeping the submitted fields.
    pub fn with_status(&self, status: TrackStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Move to `status` and drop the submitted fields.
    pub fn cleared(status: TrackStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Supporting documents for one track, as produced by document upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSubmission {
    pub track: TrackKind,
    pub provider: String,
    pub policy_number: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_track_is_symmetric() {
        for kind in TrackKind::ALL {
            assert_ne!(kind, kind.other());
            assert_eq!(kind, kind.other().other());
        }
    }

    #[test]
    fn missing_fields_treats_blank_as_absent() {
        let track = CoverageTrack {
            status: TrackStatus::Pending,
            provider: Some("  ".into()),
            policy_number: Some("POL-1".into()),
            expires_at: None,
        };
        assert_eq!(track.missing_fields(), vec!["provider", "expires_at"]);
    }

    #[test]
    fn with_status_keeps_fields_and_cleared_drops_them() {
        let submission = CoverageSubmission {
            track: TrackKind::P2p,
            provider: "Acme Mutual".into(),
            policy_number: "P-42".into(),
            expires_at: Utc::now(),
        };
        let pending = CoverageTrack::pending(&submission);
        assert!(pending.missing_fields().is_empty());

        let inactive = pending.with_status(TrackStatus::Inactive);
        assert_eq!(inactive.provider.as_deref(), Some("Acme Mutual"));
        assert_eq!(inactive.status, TrackStatus::Inactive);

        let rejected = CoverageTrack::cleared(TrackStatus::Rejected);
        assert_eq!(rejected.provider, None);
        assert_eq!(rejected.policy_number, None);
        assert_eq!(rejected.expires_at, None);
    }
}
