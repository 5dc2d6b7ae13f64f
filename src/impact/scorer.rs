use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BandTable, SeverityBand};
use crate::error::ConfigError;

/// Contextual inputs for one violation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactSignals {
    /// Share of the zone blocked by the vehicle, `[0, 1]`
    pub occupancy_fraction: f64,
    /// Estimated number of vehicles held up
    pub vehicles_delayed: u32,
    /// Dwell time so far, in minutes
    pub dwell_minutes: f64,
}

impl ImpactSignals {
    /// Create impact signals from raw measurements.
    pub fn new(occupancy_fraction: f64, vehicles_delayed: u32, dwell_minutes: f64) -> Self {
        Self {
            occupancy_fraction,
            vehicles_delayed,
            dwell_minutes,
        }
    }

    /// Non-finite values become 0, occupancy is clamped to `[0, 1]`, negatives are floored.
    pub fn sanitized(&self) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            occupancy_fraction: finite_or_zero(self.occupancy_fraction).clamp(0.0, 1.0),
            vehicles_delayed: self.vehicles_delayed,
            dwell_minutes: finite_or_zero(self.dwell_minutes).max(0.0),
        }
    }
}

/// Weights of the impact formula, fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactWeights {
    /// Applied to occupancy expressed as a percentage
    pub occupancy: f64,
    /// Points per delayed vehicle
    pub delay: f64,
    /// Points per minute of dwell
    pub duration: f64,
    /// Optional ceilings on the individual terms, applied before the overall clamp
    pub term_caps: TermCaps,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermCaps {
    pub occupancy: Option<f64>,
    pub delay: Option<f64>,
    pub duration: Option<f64>,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            occupancy: 0.4,
            delay: 2.0,
            duration: 2.0,
            term_caps: TermCaps::default(),
        }
    }
}

impl ImpactWeights {
    /// Reject negative or non-finite weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("occupancy", self.occupancy),
            ("delay", self.delay),
            ("duration", self.duration),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidWeights(format!(
                    "{name} weight must be a non-negative number, got {w}"
                )));
            }
        }
        let caps = [
            ("occupancy", self.term_caps.occupancy),
            ("delay", self.term_caps.delay),
            ("duration", self.term_caps.duration),
        ];
        for (name, cap) in caps {
            match cap {
                Some(c) if !c.is_finite() || c < 0.0 => {
                    return Err(ConfigError::InvalidWeights(format!(
                        "{name} cap must be a non-negative number, got {c}"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Scored outcome, kept on the violation record for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub signals: ImpactSignals,
    pub score: f64,
    pub band: SeverityBand,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct ImpactScorer {
    weights: ImpactWeights,
    bands: BandTable,
}

impl ImpactScorer {
    /// Create a scorer from weights and a band table.
    pub fn new(weights: ImpactWeights, bands: BandTable) -> Self {
        Self { weights, bands }
    }

    /// Get a reference to the band table.
    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// Get a reference to the weights.
    pub fn weights(&self) -> &ImpactWeights {
        &self.weights
    }

    /// `clamp(occupancy × 100 × w1 + delayed × w2 + minutes × w3, 0, 100)`
    pub fn score(&self, signals: &ImpactSignals) -> f64 {
        let s = signals.sanitized();
        let w = &self.weights;
        let cap = |value: f64, limit: Option<f64>| limit.map_or(value, |l| value.min(l));

        let occupancy = cap(s.occupancy_fraction * 100.0 * w.occupancy, w.term_caps.occupancy);
        let delay = cap(f64::from(s.vehicles_delayed) * w.delay, w.term_caps.delay);
        let duration = cap(s.dwell_minutes * w.duration, w.term_caps.duration);

        (occupancy + delay + duration).clamp(0.0, 100.0)
    }

    /// Score `signals` and classify the result into a band.
    pub fn assess(&self, signals: ImpactSignals) -> ImpactAssessment {
        let score = self.score(&signals);
        let band = self.bands.classify(score);
        ImpactAssessment {
            signals: signals.sanitized(),
            score,
            band,
            multiplier: self.bands.multiplier(band),
        }
    }
}
