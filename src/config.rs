//! Startup configuration.
//!
//! Everything tunable lives here and is read once: zones, dwell thresholds, gap and eviction
//! windows, impact weights, severity bands and the base-fine table. [`EngineConfig`] is the
//! serialized form; [`Engine`] is the validated, read-only result shared by every pipeline.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::escalation::EscalationThresholds;
use crate::fine::{FineCalculator, FineTable};
use crate::impact::{BandTable, ImpactScorer, ImpactWeights};
use crate::ledger::VehicleClass;
use crate::zone::{AnchorPoint, Point, ViolationKind, Zone, ZoneId, ZoneSet};

/// Per-stream timing and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub warning_seconds: f64,
    pub violation_seconds: f64,
    pub gap_tolerance_seconds: f64,
    /// Tracks unseen for longer than this are dropped from the ledger
    pub eviction_seconds: f64,
    /// Detections below this confidence are treated as absent
    pub min_confidence: f32,
    pub anchor: AnchorPoint,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            warning_seconds: 5.0,
            violation_seconds: 15.0,
            gap_tolerance_seconds: 5.0,
            eviction_seconds: 30.0,
            min_confidence: 0.25,
            anchor: AnchorPoint::Center,
        }
    }
}

impl StreamConfig {
    /// Escalation thresholds for the state machine.
    pub fn thresholds(&self) -> EscalationThresholds {
        EscalationThresholds {
            warning_seconds: self.warning_seconds,
            violation_seconds: self.violation_seconds,
            gap_tolerance_seconds: self.gap_tolerance_seconds,
        }
    }

    /// Check that every threshold is finite and consistently ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, reason: String| ConfigError::InvalidThreshold { name, reason };

        let values = [
            ("warning_seconds", self.warning_seconds),
            ("violation_seconds", self.violation_seconds),
            ("gap_tolerance_seconds", self.gap_tolerance_seconds),
            ("eviction_seconds", self.eviction_seconds),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("must be a non-negative number, got {value}")));
            }
        }
        if self.warning_seconds <= 0.0 {
            return Err(invalid("warning_seconds", "must be greater than zero".to_string()));
        }
        if self.violation_seconds <= self.warning_seconds {
            return Err(invalid(
                "violation_seconds",
                format!(
                    "must be greater than warning_seconds ({} <= {})",
                    self.violation_seconds, self.warning_seconds
                ),
            ));
        }
        if self.eviction_seconds < self.gap_tolerance_seconds {
            return Err(invalid(
                "eviction_seconds",
                format!(
                    "must be at least gap_tolerance_seconds ({} < {})",
                    self.eviction_seconds, self.gap_tolerance_seconds
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(invalid(
                "min_confidence",
                format!("must be within [0, 1], got {}", self.min_confidence),
            ));
        }
        Ok(())
    }
}

/// Frame dimensions, used to scale normalized zone coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Vertices as `[x, y]` pairs
    pub polygon: Vec<[f64; 2]>,
    /// Coordinates are fractions of the frame size rather than pixels
    #[serde(default)]
    pub normalized: bool,
    /// Offence recorded on violations in this zone
    #[serde(default)]
    pub kind: ViolationKind,
}

impl ZoneConfig {
    /// Resolve the polygon into frame coordinates and build the zone.
    pub fn build(&self, frame_size: Option<FrameSize>) -> Result<Zone, ConfigError> {
        let (sx, sy) = match (self.normalized, frame_size) {
            (false, _) => (1.0, 1.0),
            (true, Some(size)) => (size.width, size.height),
            (true, None) => return Err(ConfigError::MissingFrameSize(self.id.clone())),
        };
        let vertices = self
            .polygon
            .iter()
            .map(|[x, y]| Point::new(x * sx, y * sy))
            .collect();
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        Ok(Zone::new(ZoneId::new(self.id.clone()), name, vertices)?.with_kind(self.kind))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FineConfig {
    pub base: FineTable,
    /// Classes the engine acts on; defaults to every vehicle class, so each needs a base fine
    /// unless this list narrows the set
    pub enforced_classes: Option<Vec<VehicleClass>>,
    /// Extra factor when the plate already has a violation on this stream
    pub repeat_offender_multiplier: Decimal,
}

impl Default for FineConfig {
    fn default() -> Self {
        Self {
            base: FineTable::default(),
            enforced_classes: None,
            repeat_offender_multiplier: Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stream: StreamConfig,
    pub frame_size: Option<FrameSize>,
    pub zones: Vec<ZoneConfig>,
    pub impact: ImpactWeights,
    pub bands: BandTable,
    pub fines: FineConfig,
}

impl EngineConfig {
    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse a JSON configuration.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Validate everything and produce the shared engine.
    pub fn build(&self) -> Result<Engine, ConfigError> {
        self.stream.validate()?;
        self.impact.validate()?;
        self.bands.validate()?;
        self.fines.base.validate()?;

        if self.fines.repeat_offender_multiplier <= Decimal::ZERO {
            return Err(ConfigError::InvalidThreshold {
                name: "repeat_offender_multiplier",
                reason: "must be positive".to_string(),
            });
        }

        let enforced: BTreeSet<VehicleClass> = match &self.fines.enforced_classes {
            Some(classes) => classes.iter().copied().collect(),
            None => VehicleClass::ALL.into_iter().collect(),
        };
        if let Some(missing) = enforced
            .iter()
            .find(|class| self.fines.base.base(**class).is_none())
        {
            return Err(ConfigError::MissingBaseFine(*missing));
        }

        let zones = self
            .zones
            .iter()
            .map(|zone| zone.build(self.frame_size))
            .collect::<Result<Vec<_>, _>>()?;
        let zones = ZoneSet::new(zones)?;
        if zones.is_empty() {
            warn!("no restricted zones configured; nothing will escalate");
        }

        info!(
            zones = zones.len(),
            enforced_classes = enforced.len(),
            warning_seconds = self.stream.warning_seconds,
            violation_seconds = self.stream.violation_seconds,
            "engine configured"
        );

        Ok(Engine {
            stream: self.stream.clone(),
            zones,
            scorer: ImpactScorer::new(self.impact.clone(), self.bands.clone()),
            fines: FineCalculator::new(
                self.fines.base.clone(),
                self.fines.repeat_offender_multiplier,
            ),
            enforced,
        })
    }
}

/// Validated configuration, read-only after load and safe to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Engine {
    stream: StreamConfig,
    zones: ZoneSet,
    scorer: ImpactScorer,
    fines: FineCalculator,
    enforced: BTreeSet<VehicleClass>,
}

impl Engine {
    /// Read, validate and build the engine from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        EngineConfig::load(path)?.build()
    }

    /// Parse, validate and build the engine from JSON.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        EngineConfig::from_json(contents)?.build()
    }

    /// Get the per-stream settings.
    pub fn stream(&self) -> &StreamConfig {
        &self.stream
    }

    /// Get the configured zones.
    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    /// Get a reference to the impact scorer.
    pub fn scorer(&self) -> &ImpactScorer {
        &self.scorer
    }

    /// Get a reference to the fine calculator.
    pub fn fines(&self) -> &FineCalculator {
        &self.fines
    }

    /// Whether detections of `class` take part in enforcement.
    pub fn is_enforced(&self, class: VehicleClass) -> bool {
        self.enforced.contains(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "stream": { "warning_seconds": 3, "violation_seconds": 9, "anchor": "bottom_center" },
        "frame_size": { "width": 1920, "height": 1080 },
        "zones": [
            { "id": "red-1", "name": "Main St curb", "polygon": [[0, 0], [100, 0], [100, 50], [0, 50]] },
            { "id": "red-2", "polygon": [[0.5, 0.5], [1.0, 0.5], [1.0, 1.0]], "normalized": true }
        ],
        "impact": { "occupancy": 0.5, "term_caps": { "delay": 40 } },
        "bands": { "severe_multiplier": "3.0" },
        "fines": {
            "base": { "car": 2000, "bus": 5000 },
            "enforced_classes": ["car", "bus"],
            "repeat_offender_multiplier": 1.5
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let engine = Engine::from_json(SAMPLE).unwrap();
        assert_eq!(engine.stream().warning_seconds, 3.0);
        assert_eq!(engine.stream().gap_tolerance_seconds, 5.0);
        assert_eq!(engine.stream().anchor, AnchorPoint::BottomCenter);
        assert_eq!(engine.zones().len(), 2);

        let scaled = engine.zones().get(&ZoneId::new("red-2")).unwrap();
        assert_eq!(scaled.vertices()[0], Point::new(960.0, 540.0));
        assert_eq!(scaled.name(), "red-2");

        assert_eq!(engine.scorer().weights().occupancy, 0.5);
        assert_eq!(engine.scorer().weights().delay, 2.0);
        assert_eq!(engine.scorer().weights().term_caps.delay, Some(40.0));
        assert_eq!(engine.scorer().bands().severe_multiplier, Decimal::new(30, 1));
        assert!(engine.is_enforced(VehicleClass::Bus));
        assert!(!engine.is_enforced(VehicleClass::Van));
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_violation_must_exceed_warning() {
        let config = EngineConfig {
            stream: StreamConfig {
                warning_seconds: 10.0,
                violation_seconds: 10.0,
                ..StreamConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::InvalidThreshold { name: "violation_seconds", .. })
        ));
    }

    #[test]
    fn test_eviction_shorter_than_gap_rejected() {
        let config = EngineConfig {
            stream: StreamConfig {
                gap_tolerance_seconds: 10.0,
                eviction_seconds: 5.0,
                ..StreamConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_missing_base_fine_for_enforced_class() {
        let json = r#"{ "fines": { "base": { "car": 2000 }, "enforced_classes": ["car", "truck"] } }"#;
        let err = Engine::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseFine(VehicleClass::Truck)));
    }

    #[test]
    fn test_partial_fine_table_needs_explicit_enforced_classes() {
        let json = r#"{ "fines": { "base": { "car": 2000 } } }"#;
        assert!(matches!(
            Engine::from_json(json),
            Err(ConfigError::MissingBaseFine(class)) if class != VehicleClass::Car
        ));

        let narrowed = r#"{ "fines": { "base": { "car": 2000 }, "enforced_classes": ["car"] } }"#;
        let engine = Engine::from_json(narrowed).unwrap();
        assert!(engine.is_enforced(VehicleClass::Car));
        assert!(!engine.is_enforced(VehicleClass::Bus));
    }

    #[test]
    fn test_default_enforces_every_class() {
        let engine = Engine::from_json("{}").unwrap();
        assert!(VehicleClass::ALL.iter().all(|class| engine.is_enforced(*class)));
    }

    #[test]
    fn test_zone_kind_defaults_and_parses() {
        let json = r#"{ "zones": [
            { "id": "a", "polygon": [[0, 0], [1, 0], [1, 1]] },
            { "id": "b", "polygon": [[5, 5], [6, 5], [6, 6]], "kind": "bus_lane" }
        ] }"#;
        let engine = Engine::from_json(json).unwrap();
        assert_eq!(engine.zones().get(&ZoneId::new("a")).unwrap().kind(), ViolationKind::IllegalParking);
        assert_eq!(engine.zones().get(&ZoneId::new("b")).unwrap().kind(), ViolationKind::BusLane);
    }

    #[test]
    fn test_malformed_zone_rejected_at_load() {
        let json = r#"{ "zones": [ { "id": "bad", "polygon": [[0, 0], [1, 1]] } ] }"#;
        assert!(matches!(
            Engine::from_json(json),
            Err(ConfigError::MalformedZone { .. })
        ));
    }

    #[test]
    fn test_normalized_zone_needs_frame_size() {
        let json = r#"{ "zones": [ { "id": "n", "polygon": [[0, 0], [1, 0], [1, 1]], "normalized": true } ] }"#;
        assert!(matches!(
            Engine::from_json(json),
            Err(ConfigError::MissingFrameSize(id)) if id == "n"
        ));
    }

    #[test]
    fn test_unknown_vehicle_class_is_a_parse_error() {
        let json = r#"{ "fines": { "base": { "spaceship": 1 } } }"#;
        assert!(matches!(Engine::from_json(json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
