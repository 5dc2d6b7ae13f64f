//! Frame-by-frame orchestration of one video stream.

mod frame;
mod violation_pipeline;

pub use frame::{FrameBatch, FrameOutcome};
pub use violation_pipeline::ViolationPipeline;
