use std::fmt;

use serde::{Deserialize, Serialize};

use crate::zone::{AnchorPoint, Point, Rect};

/// Opaque identifier assigned upstream to one physical object across frames.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of the camera or stream a pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Create a stream id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vehicle categories reported by the detector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Tuktuk,
    Bus,
    Van,
    Truck,
    Motorcycle,
    Jeep,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 7] = [
        VehicleClass::Car,
        VehicleClass::Tuktuk,
        VehicleClass::Bus,
        VehicleClass::Van,
        VehicleClass::Truck,
        VehicleClass::Motorcycle,
        VehicleClass::Jeep,
    ];

    /// Stable lowercase name, as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Tuktuk => "tuktuk",
            VehicleClass::Bus => "bus",
            VehicleClass::Van => "van",
            VehicleClass::Truck => "truck",
            VehicleClass::Motorcycle => "motorcycle",
            VehicleClass::Jeep => "jeep",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detection input for the ledger: one object in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub track_id: TrackId,
    pub class: VehicleClass,
    /// Bounding box in frame coordinates
    pub bbox: Rect,
    /// Detection confidence score
    pub confidence: f32,
    /// Frame timestamp in seconds
    pub timestamp: f64,
}

impl Detection {
    /// Create a detection from a TLBR box.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        track_id: TrackId,
        class: VehicleClass,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        confidence: f32,
        timestamp: f64,
    ) -> Self {
        Self {
            track_id,
            class,
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            confidence,
            timestamp,
        }
    }

    /// Create a detection from an existing box.
    pub fn from_rect(
        track_id: TrackId,
        class: VehicleClass,
        bbox: Rect,
        confidence: f32,
        timestamp: f64,
    ) -> Self {
        Self {
            track_id,
            class,
            bbox,
            confidence,
            timestamp,
        }
    }

    /// Point of the box tested against zones.
    pub fn anchor(&self, anchor: AnchorPoint) -> Point {
        self.bbox.anchor(anchor)
    }
}
