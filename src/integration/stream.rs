//! StreamPipeline for combining detection and plate reading with the violation pipeline.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use super::{DetectionSource, NoPlates, PlateSource};
use crate::config::Engine;
use crate::error::LedgerError;
use crate::ledger::StreamId;
use crate::pipeline::{FrameBatch, FrameOutcome, ViolationPipeline};

#[derive(Debug, Error)]
pub enum StreamError<E> {
    #[error("detection source failed")]
    Detection(#[source] E),

    #[error(transparent)]
    Frame(#[from] LedgerError),
}

/// Bundles a detector and a plate reader with a [`ViolationPipeline`] for one camera.
pub struct StreamPipeline<D: DetectionSource, P: PlateSource = NoPlates> {
    detector: D,
    plates: P,
    pipeline: ViolationPipeline,
}

impl<D: DetectionSource> StreamPipeline<D, NoPlates> {
    /// Create a stream pipeline without a plate reader.
    pub fn new(detector: D, stream: StreamId, engine: Arc<Engine>) -> Self {
        Self::with_plate_source(detector, NoPlates, stream, engine)
    }
}

impl<D: DetectionSource, P: PlateSource> StreamPipeline<D, P> {
    /// Create a stream pipeline with a plate reader.
    pub fn with_plate_source(detector: D, plates: P, stream: StreamId, engine: Arc<Engine>) -> Self {
        Self {
            detector,
            plates,
            pipeline: ViolationPipeline::new(stream, engine),
        }
    }

    /// Detect, read plates for tracks inside a zone that still lack one, then run the frame.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<FrameOutcome, StreamError<D::Error>> {
        let detections = self
            .detector
            .detect(input, width, height, timestamp)
            .map_err(StreamError::Detection)?;

        let mut frame = FrameBatch::new(timestamp, detections);
        for det in &frame.detections {
            let needs_plate = self
                .pipeline
                .ledger()
                .get(det.track_id)
                .is_some_and(|track| track.in_episode() && track.plate.is_none());
            if !needs_plate {
                continue;
            }
            match self.plates.read_plate(input, width, height, det) {
                Ok(Some(plate)) => frame.plates.push((det.track_id, plate)),
                Ok(None) => {}
                Err(err) => warn!(track_id = %det.track_id, error = %err, "plate read failed"),
            }
        }

        Ok(self.pipeline.process_frame(frame)?)
    }

    /// Get a reference to the detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the violation pipeline.
    pub fn pipeline(&self) -> &ViolationPipeline {
        &self.pipeline
    }

    /// Get a mutable reference to the violation pipeline.
    pub fn pipeline_mut(&mut self) -> &mut ViolationPipeline {
        &mut self.pipeline
    }
}
