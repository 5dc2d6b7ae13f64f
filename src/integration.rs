//! Integration with the collaborators around the engine.
//!
//! Upstream, a detector/tracker and a plate recognizer feed frames in through
//! [`DetectionSource`] and [`PlateSource`]. Downstream, a [`ViolationSink`] persists records and
//! forwards notifications.

mod builder;
mod detector;
mod sink;
mod stream;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections, NoPlates, PlateSource};
pub use sink::{MemorySink, ViolationSink};
pub use stream::{StreamError, StreamPipeline};
