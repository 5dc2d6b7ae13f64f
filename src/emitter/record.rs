//! Values handed to the persistence and notification collaborators.

use serde::{Deserialize, Serialize};

use crate::fine::FineBreakdown;
use crate::impact::{ImpactAssessment, SeverityBand};
use crate::ledger::{EpisodeId, StreamId, TrackId, VehicleClass};
use crate::zone::{Rect, ViolationKind, ZoneId};

/// Pointer to the frame that proves the violation, for the evidence store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub stream: StreamId,
    pub frame_timestamp: f64,
    pub bbox: Rect,
    pub confidence: f32,
}

/// A confirmed violation. Built once per episode and never modified afterwards; fields are
/// read through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    episode: EpisodeId,
    track_id: TrackId,
    vehicle_class: VehicleClass,
    plate: Option<String>,
    zone: ZoneId,
    kind: ViolationKind,
    dwell_seconds: f64,
    impact: ImpactAssessment,
    fine: FineBreakdown,
    evidence: EvidenceRef,
    entered_at: f64,
    warned_at: Option<f64>,
    confirmed_at: f64,
}

impl ViolationRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        episode: EpisodeId,
        track_id: TrackId,
        vehicle_class: VehicleClass,
        plate: Option<String>,
        zone: ZoneId,
        kind: ViolationKind,
        dwell_seconds: f64,
        impact: ImpactAssessment,
        fine: FineBreakdown,
        evidence: EvidenceRef,
        entered_at: f64,
        warned_at: Option<f64>,
        confirmed_at: f64,
    ) -> Self {
        Self {
            episode,
            track_id,
            vehicle_class,
            plate,
            zone,
            kind,
            dwell_seconds,
            impact,
            fine,
            evidence,
            entered_at,
            warned_at,
            confirmed_at,
        }
    }

    /// Natural key for deduplication downstream.
    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    /// Stream the evidence frame came from.
    pub fn stream(&self) -> &StreamId {
        &self.evidence.stream
    }

    /// Upstream track id of the offending vehicle.
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Majority class over the episode.
    pub fn vehicle_class(&self) -> VehicleClass {
        self.vehicle_class
    }

    /// Plate text, if the reader produced one before confirmation.
    pub fn plate(&self) -> Option<&str> {
        self.plate.as_deref()
    }

    /// Get the zone the episode took place in.
    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    /// Offence enforced by the zone.
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Accumulated dwell at confirmation.
    pub fn dwell_seconds(&self) -> f64 {
        self.dwell_seconds
    }

    /// Get a reference to the impact assessment.
    pub fn impact(&self) -> &ImpactAssessment {
        &self.impact
    }

    /// Impact score in [0, 100].
    pub fn impact_score(&self) -> f64 {
        self.impact.score
    }

    /// Severity band of the impact score.
    pub fn severity(&self) -> SeverityBand {
        self.impact.band
    }

    /// Get a reference to the fine breakdown.
    pub fn fine(&self) -> &FineBreakdown {
        &self.fine
    }

    /// Get a reference to the evidence pointer.
    pub fn evidence(&self) -> &EvidenceRef {
        &self.evidence
    }

    /// Timestamp the episode started.
    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    /// Timestamp of the warning, if one preceded the violation.
    pub fn warned_at(&self) -> Option<f64> {
        self.warned_at
    }

    /// Timestamp the violation was confirmed.
    pub fn confirmed_at(&self) -> f64 {
        self.confirmed_at
    }
}

/// Intermediate "warning issued" event, keyed by the same episode id as the eventual record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningEvent {
    pub episode: EpisodeId,
    pub stream: StreamId,
    pub track_id: TrackId,
    pub vehicle_class: VehicleClass,
    pub plate: Option<String>,
    pub zone: ZoneId,
    pub dwell_seconds: f64,
    pub issued_at: f64,
}

/// Minimal payload for the notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub episode: EpisodeId,
    pub vehicle_class: VehicleClass,
    pub plate: Option<String>,
    pub severity: SeverityBand,
    pub fine_total: rust_decimal::Decimal,
    pub zone: ZoneId,
    pub kind: ViolationKind,
    pub timestamp: f64,
}

impl From<&ViolationRecord> for Notification {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            episode: record.episode,
            vehicle_class: record.vehicle_class,
            plate: record.plate.clone(),
            severity: record.impact.band,
            fine_total: record.fine.total,
            zone: record.zone.clone(),
            kind: record.kind,
            timestamp: record.confirmed_at,
        }
    }
}
