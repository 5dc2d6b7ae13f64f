//! Running counters for one pipeline.

use rust_decimal::Decimal;
use serde::Serialize;

/// Counts since the pipeline was created. Owned by a single pipeline, so plain integers suffice;
/// aggregate several streams with [`PipelineStats::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub frames: u64,
    pub frames_rejected: u64,
    pub detections: u64,
    /// Below the confidence floor or of a class that is not enforced
    pub detections_filtered: u64,
    pub observations_rejected: u64,
    pub entries: u64,
    pub exits: u64,
    pub warnings: u64,
    pub violations: u64,
    pub emission_conflicts: u64,
    pub fine_errors: u64,
    pub evictions: u64,
    pub fines_total: Decimal,
}

impl PipelineStats {
    /// Fold another pipeline's counters into these.
    pub fn merge(&mut self, other: &PipelineStats) {
        self.frames += other.frames;
        self.frames_rejected += other.frames_rejected;
        self.detections += other.detections;
        self.detections_filtered += other.detections_filtered;
        self.observations_rejected += other.observations_rejected;
        self.entries += other.entries;
        self.exits += other.exits;
        self.warnings += other.warnings;
        self.violations += other.violations;
        self.emission_conflicts += other.emission_conflicts;
        self.fine_errors += other.fine_errors;
        self.evictions += other.evictions;
        self.fines_total += other.fines_total;
    }

    /// Share of processed frames that ended in a violation.
    pub fn violation_rate(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.violations as f64 / self.frames as f64
        }
    }
}
