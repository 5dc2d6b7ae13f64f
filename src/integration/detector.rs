//! Traits for the upstream inference collaborators.

use std::convert::Infallible;

use crate::ledger::Detection;

/// Object detector plus tracker, producing track-stamped detections for one frame.
///
/// # Example
///
/// ```ignore
/// use dwelltrack_rs::{Detection, DetectionSource};
///
/// struct MyDetector {
///     // model and tracker here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(
///         &mut self,
///         input: &[u8],
///         width: u32,
///         height: u32,
///         timestamp: f64,
///     ) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error;

    /// Run inference on raw image data taken at `timestamp` seconds.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// License-plate recognizer.
///
/// Failures are not fatal to a frame; the pipeline logs them and carries on without a plate.
pub trait PlateSource {
    type Error: std::fmt::Display;

    /// Read the plate inside `detection`'s box, if one is legible.
    fn read_plate(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        detection: &Detection,
    ) -> Result<Option<String>, Self::Error>;
}

/// Plate source for deployments without a recognizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlates;

impl PlateSource for NoPlates {
    type Error = Infallible;

    fn read_plate(
        &mut self,
        _input: &[u8],
        _width: u32,
        _height: u32,
        _detection: &Detection,
    ) -> Result<Option<String>, Self::Error> {
        Ok(None)
    }
}

/// Conversion from model-specific output into detections.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}
