//! Builder for creating Detection objects from various box formats.

use crate::ledger::{Detection, TrackId, VehicleClass};
use crate::zone::Rect;

#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    track_id: TrackId,
    class: VehicleClass,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f32,
    timestamp: f64,
}

impl Default for DetectionBuilder {
    fn default() -> Self {
        Self {
            track_id: TrackId(0),
            class: VehicleClass::Car,
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            confidence: 1.0,
            timestamp: 0.0,
        }
    }
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new(track_id: u64) -> Self {
        Self {
            track_id: TrackId(track_id),
            ..Self::default()
        }
    }

    /// Set the vehicle class.
    pub fn class(mut self, class: VehicleClass) -> Self {
        self.class = class;
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.x2 = x + w;
        self.y2 = y + h;
        self
    }

    /// Set the detection confidence.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Frame timestamp in seconds.
    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::from_rect(
            self.track_id,
            self.class,
            Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2),
            self.confidence,
            self.timestamp,
        )
    }
}
