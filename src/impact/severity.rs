use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Categorical severity derived from the impact score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Low,
    Medium,
    High,
    Severe,
}

impl SeverityBand {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Low => "low",
            SeverityBand::Medium => "medium",
            SeverityBand::High => "high",
            SeverityBand::Severe => "severe",
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band lower bounds over the `[0, 100]` impact scale, plus each band's fine multiplier.
///
/// Bands are inclusive-low, exclusive-high; `Severe` also includes 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandTable {
    pub medium_from: f64,
    pub high_from: f64,
    pub severe_from: f64,
    pub low_multiplier: Decimal,
    pub medium_multiplier: Decimal,
    pub high_multiplier: Decimal,
    pub severe_multiplier: Decimal,
}

impl Default for BandTable {
    fn default() -> Self {
        Self {
            medium_from: 25.0,
            high_from: 50.0,
            severe_from: 75.0,
            low_multiplier: Decimal::new(10, 1),
            medium_multiplier: Decimal::new(15, 1),
            high_multiplier: Decimal::new(20, 1),
            severe_multiplier: Decimal::new(25, 1),
        }
    }
}

impl BandTable {
    /// Check that the bounds are finite and strictly increasing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [self.medium_from, self.high_from, self.severe_from];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(ConfigError::InvalidBandTable(
                "band bounds must be finite".to_string(),
            ));
        }
        if !(0.0 < self.medium_from
            && self.medium_from < self.high_from
            && self.high_from < self.severe_from
            && self.severe_from <= 100.0)
        {
            return Err(ConfigError::InvalidBandTable(format!(
                "bounds must satisfy 0 < medium < high < severe <= 100, got {} / {} / {}",
                self.medium_from, self.high_from, self.severe_from
            )));
        }
        for band in [
            SeverityBand::Low,
            SeverityBand::Medium,
            SeverityBand::High,
            SeverityBand::Severe,
        ] {
            if self.multiplier(band) <= Decimal::ZERO {
                return Err(ConfigError::InvalidBandTable(format!(
                    "{band} multiplier must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Map a score to its band. Scores outside `[0, 100]` are clamped first and NaN counts as 0,
    /// so every input lands in exactly one band.
    pub fn classify(&self, score: f64) -> SeverityBand {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 100.0)
        };
        if score >= self.severe_from {
            SeverityBand::Severe
        } else if score >= self.high_from {
            SeverityBand::High
        } else if score >= self.medium_from {
            SeverityBand::Medium
        } else {
            SeverityBand::Low
        }
    }

    /// Fine multiplier for `band`.
    pub fn multiplier(&self, band: SeverityBand) -> Decimal {
        match band {
            SeverityBand::Low => self.low_multiplier,
            SeverityBand::Medium => self.medium_multiplier,
            SeverityBand::High => self.high_multiplier,
            SeverityBand::Severe => self.severe_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive_low() {
        let table = BandTable::default();
        assert_eq!(table.classify(0.0), SeverityBand::Low);
        assert_eq!(table.classify(24.999), SeverityBand::Low);
        assert_eq!(table.classify(25.0), SeverityBand::Medium);
        assert_eq!(table.classify(50.0), SeverityBand::High);
        assert_eq!(table.classify(74.9), SeverityBand::High);
        assert_eq!(table.classify(75.0), SeverityBand::Severe);
        assert_eq!(table.classify(100.0), SeverityBand::Severe);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let table = BandTable::default();
        assert_eq!(table.classify(-5.0), SeverityBand::Low);
        assert_eq!(table.classify(f64::NAN), SeverityBand::Low);
        assert_eq!(table.classify(250.0), SeverityBand::Severe);
    }

    #[test]
    fn test_default_multipliers() {
        let table = BandTable::default();
        assert_eq!(table.multiplier(SeverityBand::Low), Decimal::new(1, 0));
        assert_eq!(table.multiplier(SeverityBand::Medium), Decimal::new(15, 1));
        assert_eq!(table.multiplier(SeverityBand::High), Decimal::new(2, 0));
        assert_eq!(table.multiplier(SeverityBand::Severe), Decimal::new(25, 1));
    }

    #[test]
    fn test_validate_rejects_unordered_bounds() {
        let table = BandTable {
            high_from: 20.0,
            ..BandTable::default()
        };
        assert!(matches!(table.validate(), Err(ConfigError::InvalidBandTable(_))));
    }

    #[test]
    fn test_validate_rejects_zero_multiplier() {
        let table = BandTable {
            medium_multiplier: Decimal::ZERO,
            ..BandTable::default()
        };
        assert!(table.validate().is_err());
        assert!(BandTable::default().validate().is_ok());
    }
}
