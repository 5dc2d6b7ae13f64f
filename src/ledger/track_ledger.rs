use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use super::{Detection, TrackId, TrackState};
use crate::error::LedgerError;

/// Map from track id to its state, with silence-based eviction.
///
/// The ledger is owned by exactly one pipeline; nothing in it is shared.
#[derive(Debug, Clone)]
pub struct TrackLedger {
    tracks: HashMap<TrackId, TrackState>,
    silence_window: f64,
}

impl TrackLedger {
    /// Create an empty ledger that evicts tracks silent for longer than `silence_window`.
    pub fn new(silence_window: f64) -> Self {
        Self {
            tracks: HashMap::new(),
            silence_window,
        }
    }

    /// Record a detection, creating the track if it is new.
    ///
    /// A detection with a non-finite timestamp, or one older than the track's last-seen
    /// timestamp, is rejected and the record is left exactly as it was.
    pub fn update(&mut self, detection: &Detection) -> Result<&mut TrackState, LedgerError> {
        if !detection.timestamp.is_finite() {
            warn!(
                track_id = %detection.track_id,
                observed = detection.timestamp,
                "dropping observation with non-finite timestamp"
            );
            return Err(LedgerError::NonFiniteObservation {
                track: detection.track_id,
                observed: detection.timestamp,
            });
        }

        let track = match self.tracks.entry(detection.track_id) {
            Entry::Vacant(slot) => return Ok(slot.insert(TrackState::new(detection))),
            Entry::Occupied(slot) => slot.into_mut(),
        };

        if detection.timestamp < track.last_seen {
            warn!(
                track_id = %detection.track_id,
                last_seen = track.last_seen,
                observed = detection.timestamp,
                "dropping out-of-order observation"
            );
            return Err(LedgerError::OutOfOrderObservation {
                track: detection.track_id,
                last_seen: track.last_seen,
                observed: detection.timestamp,
            });
        }

        track.observe(detection);
        Ok(track)
    }

    /// Attach a plate reading to a known track. Unknown tracks and fragmentary reads are ignored.
    pub fn record_plate(&mut self, track_id: TrackId, plate: &str) -> bool {
        self.tracks
            .get_mut(&track_id)
            .is_some_and(|track| track.record_plate(plate))
    }

    /// Remove every track unseen for longer than the silence window.
    pub fn evict_stale(&mut self, now: f64) -> Vec<TrackId> {
        let mut evicted: Vec<TrackId> = self
            .tracks
            .values()
            .filter(|track| now - track.last_seen > self.silence_window)
            .map(|track| track.track_id)
            .collect();
        evicted.sort_unstable();

        for id in &evicted {
            if let Some(track) = self.tracks.remove(id) {
                debug!(
                    track_id = %id,
                    state = ?track.state,
                    dwell_seconds = track.dwell_seconds,
                    "evicted stale track"
                );
            }
        }
        evicted
    }

    /// Get a reference to a track.
    pub fn get(&self, track_id: TrackId) -> Option<&TrackState> {
        self.tracks.get(&track_id)
    }

    /// Get a mutable reference to a track.
    pub fn get_mut(&mut self, track_id: TrackId) -> Option<&mut TrackState> {
        self.tracks.get_mut(&track_id)
    }

    /// Whether the ledger holds `track_id`.
    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.contains_key(&track_id)
    }

    /// Iterate over the tracks in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackState> {
        self.tracks.values()
    }

    /// Iterate mutably over the tracks in arbitrary order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackState> {
        self.tracks.values_mut()
    }

    /// Number of live tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the ledger holds no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Seconds of silence before a track is evicted.
    pub fn silence_window(&self) -> f64 {
        self.silence_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::VehicleClass;

    fn det(id: u64, ts: f64) -> Detection {
        Detection::new(TrackId(id), VehicleClass::Car, 0.0, 0.0, 10.0, 10.0, 0.9, ts)
    }

    #[test]
    fn test_update_creates_then_mutates() {
        let mut ledger = TrackLedger::new(10.0);
        ledger.update(&det(1, 0.0)).unwrap();
        assert_eq!(ledger.len(), 1);

        let track = ledger.update(&det(1, 2.0)).unwrap();
        assert_eq!(track.first_seen, 0.0);
        assert_eq!(track.last_seen, 2.0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_out_of_order_rejected_without_mutation() {
        let mut ledger = TrackLedger::new(10.0);
        ledger.update(&det(1, 5.0)).unwrap();

        let err = ledger.update(&det(1, 4.0)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::OutOfOrderObservation {
                track: TrackId(1),
                last_seen: 5.0,
                observed: 4.0,
            }
        );
        assert_eq!(ledger.get(TrackId(1)).unwrap().last_seen, 5.0);
    }

    #[test]
    fn test_non_finite_timestamp_rejected() {
        let mut ledger = TrackLedger::new(10.0);
        ledger.update(&det(1, 5.0)).unwrap();

        for ts in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ledger.update(&det(1, ts)),
                Err(LedgerError::NonFiniteObservation { track: TrackId(1), .. })
            ));
        }
        assert!(matches!(
            ledger.update(&det(2, f64::NAN)),
            Err(LedgerError::NonFiniteObservation { track: TrackId(2), .. })
        ));
        assert_eq!(ledger.get(TrackId(1)).unwrap().last_seen, 5.0);
        assert!(!ledger.contains(TrackId(2)));
    }

    #[test]
    fn test_equal_timestamp_accepted() {
        let mut ledger = TrackLedger::new(10.0);
        ledger.update(&det(1, 5.0)).unwrap();
        assert!(ledger.update(&det(1, 5.0)).is_ok());
    }

    #[test]
    fn test_evict_stale() {
        let mut ledger = TrackLedger::new(10.0);
        ledger.update(&det(1, 0.0)).unwrap();
        ledger.update(&det(2, 5.0)).unwrap();
        ledger.update(&det(3, 0.0)).unwrap();

        // Exactly at the window boundary nothing is evicted yet.
        assert!(ledger.evict_stale(10.0).is_empty());

        let evicted = ledger.evict_stale(12.0);
        assert_eq!(evicted, vec![TrackId(1), TrackId(3)]);
        assert!(ledger.contains(TrackId(2)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_record_plate_unknown_track() {
        let mut ledger = TrackLedger::new(10.0);
        assert!(!ledger.record_plate(TrackId(9), "WP-1234"));
        ledger.update(&det(9, 0.0)).unwrap();
        assert!(ledger.record_plate(TrackId(9), "WP-1234"));
        assert_eq!(ledger.get(TrackId(9)).unwrap().plate.as_deref(), Some("WP-1234"));
    }
}
