use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ledger::VehicleClass;

/// Base fine per vehicle class, in whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FineTable(BTreeMap<VehicleClass, Decimal>);

impl Default for FineTable {
    /// Amounts in LKR.
    fn default() -> Self {
        Self::from_iter([
            (VehicleClass::Car, Decimal::from(2000)),
            (VehicleClass::Tuktuk, Decimal::from(1500)),
            (VehicleClass::Bus, Decimal::from(5000)),
            (VehicleClass::Van, Decimal::from(3000)),
            (VehicleClass::Truck, Decimal::from(4000)),
            (VehicleClass::Motorcycle, Decimal::from(1000)),
            (VehicleClass::Jeep, Decimal::from(2500)),
        ])
    }
}

impl FromIterator<(VehicleClass, Decimal)> for FineTable {
    fn from_iter<I: IntoIterator<Item = (VehicleClass, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FineTable {
    /// Base fine for `class`, if configured.
    pub fn base(&self, class: VehicleClass) -> Option<Decimal> {
        self.0.get(&class).copied()
    }

    /// Classes that have a base fine.
    pub fn classes(&self) -> impl Iterator<Item = VehicleClass> + '_ {
        self.0.keys().copied()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject non-positive amounts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (&class, &amount) in &self.0 {
            if amount <= Decimal::ZERO {
                return Err(ConfigError::InvalidBaseFine {
                    class,
                    amount: amount.to_string(),
                });
            }
        }
        Ok(())
    }
}
