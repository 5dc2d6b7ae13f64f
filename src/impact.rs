//! Impact scoring and severity bands.

mod context;
mod scorer;
mod severity;

pub use context::{FixedImpactContext, FrameImpactContext, FrameSnapshot, ImpactContext};
pub use scorer::{ImpactAssessment, ImpactScorer, ImpactSignals, ImpactWeights, TermCaps};
pub use severity::{BandTable, SeverityBand};
