use crate::emitter::{Notification, ViolationRecord, WarningEvent};
use crate::error::Error;
use crate::escalation::Transition;
use crate::ledger::{Detection, TrackId};

/// Everything the collaborators report for one frame of one stream.
#[derive(Debug, Clone, Default)]
pub struct FrameBatch {
    pub timestamp: f64,
    pub detections: Vec<Detection>,
    /// Plate readings keyed by track, from the plate recognizer
    pub plates: Vec<(TrackId, String)>,
    /// Externally measured delay, replacing the estimate derived from the frame
    pub vehicles_delayed: Option<u32>,
}

impl FrameBatch {
    /// Detections are stamped with the frame timestamp.
    pub fn new(timestamp: f64, detections: impl IntoIterator<Item = Detection>) -> Self {
        let detections = detections
            .into_iter()
            .map(|mut det| {
                det.timestamp = timestamp;
                det
            })
            .collect();
        Self {
            timestamp,
            detections,
            plates: Vec::new(),
            vehicles_delayed: None,
        }
    }

    /// Attach a plate reading for `track_id`.
    pub fn with_plate(mut self, track_id: TrackId, plate: impl Into<String>) -> Self {
        self.plates.push((track_id, plate.into()));
        self
    }

    /// Override the estimated number of delayed vehicles.
    pub fn with_vehicles_delayed(mut self, vehicles_delayed: u32) -> Self {
        self.vehicles_delayed = Some(vehicles_delayed);
        self
    }
}

/// What a processed frame produced.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub timestamp: f64,
    /// Every state change, in processing order
    pub transitions: Vec<(TrackId, Transition)>,
    pub warnings: Vec<WarningEvent>,
    pub violations: Vec<ViolationRecord>,
    pub evicted: Vec<TrackId>,
    /// Per-track failures; the rest of the frame was still processed
    pub rejected: Vec<Error>,
}

impl FrameOutcome {
    pub(crate) fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Operator-facing summaries of this frame's violations.
    pub fn notifications(&self) -> Vec<Notification> {
        self.violations.iter().map(Notification::from).collect()
    }

    /// No events worth forwarding downstream.
    pub fn is_quiet(&self) -> bool {
        self.warnings.is_empty() && self.violations.is_empty() && self.rejected.is_empty()
    }
}
