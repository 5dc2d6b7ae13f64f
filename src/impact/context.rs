//! Where impact signals come from.

use super::ImpactSignals;
use crate::ledger::{Detection, TrackState};
use crate::zone::Zone;

/// Read-only view of the frame in which a violation is confirmed.
#[derive(Debug, Clone, Copy)]
pub struct FrameSnapshot<'a> {
    pub timestamp: f64,
    /// Detections that passed the confidence and class filters
    pub detections: &'a [Detection],
    /// Index of the zone containing each detection, parallel to `detections`
    pub zone_of: &'a [Option<usize>],
    /// Delay estimate supplied with the frame, overriding the geometric estimate
    pub vehicles_delayed: Option<u32>,
}

/// Supplies [`ImpactSignals`] for a track at the moment its violation is confirmed.
///
/// Implement this to plug in a traffic-flow model; [`FrameImpactContext`] derives everything
/// from the frame itself.
pub trait ImpactContext {
    fn signals(&self, track: &TrackState, zone: &Zone, frame: &FrameSnapshot<'_>)
    -> ImpactSignals;
}

/// Occupancy from the box/zone overlap, delay from the other vehicles on the road.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameImpactContext;

impl ImpactContext for FrameImpactContext {
    fn signals(
        &self,
        track: &TrackState,
        zone: &Zone,
        frame: &FrameSnapshot<'_>,
    ) -> ImpactSignals {
        let vehicles_delayed = frame.vehicles_delayed.unwrap_or_else(|| {
            // Vehicles outside every restricted zone are the flowing traffic that has to get
            // around this one.
            let flowing = frame
                .detections
                .iter()
                .zip(frame.zone_of)
                .filter(|(det, zone)| det.track_id != track.track_id && zone.is_none())
                .count();
            u32::try_from(flowing).unwrap_or(u32::MAX)
        });

        ImpactSignals {
            occupancy_fraction: zone.overlap_fraction(&track.bbox),
            vehicles_delayed,
            dwell_minutes: track.dwell_seconds / 60.0,
        }
    }
}

/// Fixed signals for every violation; handy when an upstream system already computed them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedImpactContext(pub ImpactSignals);

impl ImpactContext for FixedImpactContext {
    fn signals(&self, _track: &TrackState, _zone: &Zone, _frame: &FrameSnapshot<'_>) -> ImpactSignals {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{TrackId, VehicleClass};
    use crate::zone::{Point, ZoneId};

    fn zone() -> Zone {
        Zone::new(
            ZoneId::new("z"),
            "z",
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(0.0, 100.0),
            ],
        )
        .unwrap()
    }

    fn det(id: u64, x: f64) -> Detection {
        Detection::new(TrackId(id), VehicleClass::Car, x, 0.0, x + 50.0, 100.0, 0.9, 0.0)
    }

    #[test]
    fn test_frame_context_derives_signals() {
        let detections = vec![det(1, 0.0), det(2, 200.0), det(3, 300.0), det(4, 20.0)];
        let zone_of = vec![Some(0), None, None, Some(0)];
        let mut track = TrackState::new(&detections[0]);
        track.dwell_seconds = 90.0;

        let frame = FrameSnapshot {
            timestamp: 0.0,
            detections: &detections,
            zone_of: &zone_of,
            vehicles_delayed: None,
        };
        let signals = FrameImpactContext.signals(&track, &zone(), &frame);

        assert!((signals.occupancy_fraction - 0.5).abs() < 1e-9);
        assert_eq!(signals.vehicles_delayed, 2);
        assert!((signals.dwell_minutes - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_frame_override_wins() {
        let detections = vec![det(1, 0.0)];
        let zone_of = vec![Some(0)];
        let track = TrackState::new(&detections[0]);
        let frame = FrameSnapshot {
            timestamp: 0.0,
            detections: &detections,
            zone_of: &zone_of,
            vehicles_delayed: Some(12),
        };
        assert_eq!(FrameImpactContext.signals(&track, &zone(), &frame).vehicles_delayed, 12);
    }
}
