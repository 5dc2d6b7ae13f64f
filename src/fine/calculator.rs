use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::FineTable;
use crate::error::FineError;
use crate::ledger::VehicleClass;

/// Auditable fine: `total == round_half_up(base × multiplier)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineBreakdown {
    pub base: Decimal,
    pub multiplier: Decimal,
    pub total: Decimal,
}

impl FineBreakdown {
    /// Recompute the total from the other two fields.
    pub fn recomputed_total(&self) -> Decimal {
        round_half_up(self.base * self.multiplier)
    }
}

/// Round to whole currency units, halves away from zero (amounts are never negative).
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone)]
pub struct FineCalculator {
    table: FineTable,
    repeat_offender_multiplier: Decimal,
}

impl Default for FineCalculator {
    fn default() -> Self {
        Self::new(FineTable::default(), Decimal::ONE)
    }
}

impl FineCalculator {
    /// Create a calculator from a base-fine table and a repeat-offender multiplier.
    pub fn new(table: FineTable, repeat_offender_multiplier: Decimal) -> Self {
        Self {
            table,
            repeat_offender_multiplier,
        }
    }

    /// Get a reference to the base-fine table.
    pub fn table(&self) -> &FineTable {
        &self.table
    }

    /// Pure lookup-and-multiply. Unknown classes are an error, never a default amount.
    pub fn compute(
        &self,
        class: VehicleClass,
        multiplier: Decimal,
    ) -> Result<FineBreakdown, FineError> {
        let base = self
            .table
            .base(class)
            .ok_or(FineError::ClassNotConfigured(class))?;
        Ok(FineBreakdown {
            base,
            multiplier,
            total: round_half_up(base * multiplier),
        })
    }

    /// Severity multiplier combined with the repeat-offender surcharge, rounded once at the end.
    pub fn compute_for_offender(
        &self,
        class: VehicleClass,
        severity_multiplier: Decimal,
        repeat_offender: bool,
    ) -> Result<FineBreakdown, FineError> {
        let multiplier = if repeat_offender {
            severity_multiplier * self.repeat_offender_multiplier
        } else {
            severity_multiplier
        };
        self.compute(class, multiplier)
    }
}
