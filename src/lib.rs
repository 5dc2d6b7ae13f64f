//! Dwell-time enforcement for vehicles stopped in restricted zones.
//!
//! Tracked detections arrive frame by frame. Each track's anchor point is tested against the
//! configured zones, contained time accumulates with a tolerance for detection dropouts, and a
//! track escalates from watching to warned to violating. A confirmed violation is scored for
//! traffic impact, fined from the base-fine table and emitted exactly once per episode.

pub mod config;
pub mod emitter;
pub mod error;
pub mod escalation;
pub mod fine;
pub mod impact;
pub mod integration;
pub mod ledger;
pub mod pipeline;
pub mod stats;
pub mod zone;

pub use config::{Engine, EngineConfig};
pub use emitter::{Notification, ViolationRecord, WarningEvent};
pub use error::{ConfigError, EmitError, Error, FineError, LedgerError, Result};
pub use escalation::{EscalationState, Transition};
pub use fine::{FineBreakdown, FineCalculator, FineSummary};
pub use impact::{ImpactScorer, ImpactSignals, SeverityBand};
pub use integration::{DetectionBuilder, DetectionSource, MemorySink, PlateSource, ViolationSink};
pub use ledger::{Detection, EpisodeId, StreamId, TrackId, VehicleClass};
pub use pipeline::{FrameBatch, FrameOutcome, ViolationPipeline};
pub use stats::PipelineStats;
pub use zone::{Point, Rect, ViolationKind, Zone, ZoneId, ZoneSet};
