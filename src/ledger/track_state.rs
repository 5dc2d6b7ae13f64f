//! Per-track record owned by the ledger.

use std::collections::BTreeMap;

use super::{Detection, EpisodeId, TrackId, VehicleClass};
use crate::escalation::EscalationState;
use crate::zone::{Rect, ZoneId};

/// Plates this short are treated as partial OCR reads and never kept.
const MIN_PLATE_LEN: usize = 4;

/// Temporal state for one tracked object.
#[derive(Debug, Clone)]
pub struct TrackState {
    /// Upstream track identifier
    pub track_id: TrackId,
    /// Current escalation state
    pub state: EscalationState,
    /// Timestamp of the first detection
    pub first_seen: f64,
    /// Timestamp of the most recent detection, contained or not; drives eviction
    pub last_seen: f64,
    /// Set when an episode starts, cleared on confirmed exit
    pub entered_at: Option<f64>,
    /// Most recent contained frame; drives gap tolerance
    pub last_contained: Option<f64>,
    /// Contained seconds since the last confirmed exit
    pub dwell_seconds: f64,
    /// Zone of the current episode
    pub zone: Option<ZoneId>,
    pub warning_issued: bool,
    pub warned_at: Option<f64>,
    pub episode: Option<EpisodeId>,
    /// Last bounding box, kept as evidence
    pub bbox: Rect,
    pub confidence: f32,
    /// Best plate reading so far
    pub plate: Option<String>,
    class_votes: BTreeMap<VehicleClass, u32>,
    last_class: VehicleClass,
}

impl TrackState {
    /// Create a track from its first detection.
    pub fn new(detection: &Detection) -> Self {
        let mut class_votes = BTreeMap::new();
        class_votes.insert(detection.class, 1);
        Self {
            track_id: detection.track_id,
            state: EscalationState::Clear,
            first_seen: detection.timestamp,
            last_seen: detection.timestamp,
            entered_at: None,
            last_contained: None,
            dwell_seconds: 0.0,
            zone: None,
            warning_issued: false,
            warned_at: None,
            episode: None,
            bbox: detection.bbox,
            confidence: detection.confidence,
            plate: None,
            class_votes,
            last_class: detection.class,
        }
    }

    /// Fold a fresh detection into the record. Does not touch escalation fields.
    pub(crate) fn observe(&mut self, detection: &Detection) {
        self.last_seen = detection.timestamp;
        self.bbox = detection.bbox;
        self.confidence = detection.confidence;
        *self.class_votes.entry(detection.class).or_insert(0) += 1;
        self.last_class = detection.class;
    }

    /// Class seen most often over the track's life. Ties go to the latest class, so a single
    /// misclassified frame can't flip the fine table lookup.
    pub fn dominant_class(&self) -> VehicleClass {
        let best = self.class_votes.values().copied().max().unwrap_or(0);
        if self.class_votes.get(&self.last_class) == Some(&best) {
            return self.last_class;
        }
        self.class_votes
            .iter()
            .find(|&(_, &votes)| votes == best)
            .map(|(&class, _)| class)
            .unwrap_or(self.last_class)
    }

    /// Keep the latest reading that looks like a full plate.
    pub(crate) fn record_plate(&mut self, plate: &str) -> bool {
        let plate = plate.trim();
        if plate.chars().count() < MIN_PLATE_LEN {
            return false;
        }
        self.plate = Some(plate.to_string());
        true
    }

    /// Whether the track is in an open episode.
    pub fn in_episode(&self) -> bool {
        self.state != EscalationState::Clear
    }

    /// Drop every episode field and return to `Clear`.
    pub(crate) fn reset_episode(&mut self) {
        self.state = EscalationState::Clear;
        self.entered_at = None;
        self.last_contained = None;
        self.dwell_seconds = 0.0;
        self.zone = None;
        self.warning_issued = false;
        self.warned_at = None;
        self.episode = None;
    }
}
