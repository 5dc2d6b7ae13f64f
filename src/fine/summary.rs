use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::emitter::ViolationRecord;
use crate::impact::SeverityBand;
use crate::ledger::VehicleClass;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub count: u64,
    pub fines: Decimal,
}

impl Tally {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.fines += amount;
    }
}

/// Fine totals for a set of records, grouped by severity and by vehicle class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FineSummary {
    pub total_violations: u64,
    pub total_fines: Decimal,
    pub by_severity: BTreeMap<SeverityBand, Tally>,
    pub by_vehicle_class: BTreeMap<VehicleClass, Tally>,
}

impl FineSummary {
    /// Summarize a set of records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ViolationRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.add(record);
        }
        summary
    }

    /// Count one record.
    pub fn add(&mut self, record: &ViolationRecord) {
        let amount = record.fine().total;
        self.total_violations += 1;
        self.total_fines += amount;
        self.by_severity
            .entry(record.severity())
            .or_default()
            .add(amount);
        self.by_vehicle_class
            .entry(record.vehicle_class())
            .or_default()
            .add(amount);
    }

    /// Combine summaries from independent pipelines.
    pub fn merge(&mut self, other: &FineSummary) {
        self.total_violations += other.total_violations;
        self.total_fines += other.total_fines;
        for (band, tally) in &other.by_severity {
            let entry = self.by_severity.entry(*band).or_default();
            entry.count += tally.count;
            entry.fines += tally.fines;
        }
        for (class, tally) in &other.by_vehicle_class {
            let entry = self.by_vehicle_class.entry(*class).or_default();
            entry.count += tally.count;
            entry.fines += tally.fines;
        }
    }

    /// Mean fine, or zero when no violations were counted.
    pub fn average_fine(&self) -> Decimal {
        if self.total_violations == 0 {
            return Decimal::ZERO;
        }
        self.total_fines / Decimal::from(self.total_violations)
    }
}
