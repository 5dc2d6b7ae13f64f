//! Clear -> Watching -> Warned -> Violating, with a gap-tolerant return to Clear.

use tracing::debug;

use super::EscalationState;
use crate::ledger::{EpisodeId, StreamId, TrackState};
use crate::zone::ZoneId;

/// Dwell thresholds, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscalationThresholds {
    pub warning_seconds: f64,
    pub violation_seconds: f64,
    /// How long containment may be absent before the exit is confirmed.
    pub gap_tolerance_seconds: f64,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            warning_seconds: 5.0,
            violation_seconds: 15.0,
            gap_tolerance_seconds: 5.0,
        }
    }
}

/// What the pipeline learned about a track in the current frame.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Timestamp of the current frame
    pub timestamp: f64,
    /// Zone containing the track's anchor point, if any
    pub zone: Option<ZoneId>,
    /// Timestamp of the stream's previous processed frame
    pub previous_frame: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Clear -> Watching
    Entered { episode: EpisodeId, zone: ZoneId },
    /// Watching -> Warned
    Warned { episode: EpisodeId, dwell_seconds: f64 },
    /// Warned -> Violating
    Violated { episode: EpisodeId, dwell_seconds: f64 },
    /// any -> Clear, after containment was absent for longer than the gap tolerance
    Exited {
        episode: Option<EpisodeId>,
        from: EscalationState,
        dwell_seconds: f64,
    },
}

/// Stateless transition logic; all state lives in the [`TrackState`] it is handed.
#[derive(Debug, Clone)]
pub struct EscalationMachine {
    stream: StreamId,
    thresholds: EscalationThresholds,
}

impl EscalationMachine {
    /// Create a state machine for one stream.
    pub fn new(stream: StreamId, thresholds: EscalationThresholds) -> Self {
        Self { stream, thresholds }
    }

    /// Get the configured thresholds.
    pub fn thresholds(&self) -> &EscalationThresholds {
        &self.thresholds
    }

    /// Apply one frame's observation to a track that was detected in that frame.
    ///
    /// Several transitions can come out of a single frame: a confirmed exit followed by a fresh
    /// entry, or a warning and a violation together after a long stream stutter.
    pub fn observe(&self, track: &mut TrackState, obs: Observation) -> Vec<Transition> {
        let now = obs.timestamp;
        let mut transitions = Vec::new();

        if let Some(exit) = self.confirm_exit(track, now) {
            transitions.push(exit);
        }

        // Containment only counts for the zone the current episode started in.
        let zone = obs
            .zone
            .filter(|zone| track.zone.as_ref().is_none_or(|current| current == zone));

        let Some(zone) = zone else {
            return transitions;
        };

        if track.state == EscalationState::Clear {
            let episode = EpisodeId::derive(&self.stream, track.track_id, now);
            track.state = EscalationState::Watching;
            track.entered_at = Some(now);
            track.last_contained = Some(now);
            track.dwell_seconds = 0.0;
            track.zone = Some(zone.clone());
            track.episode = Some(episode);
            debug!(track_id = %track.track_id, zone = %zone, episode = %episode, "entered zone");
            transitions.push(Transition::Entered { episode, zone });
        } else {
            // Dwell grows by the real elapsed time, but only across frames where the track was
            // contained back to back. Dropouts and out-of-zone flicker pause the timer.
            let continuous = obs
                .previous_frame
                .is_some_and(|prev| track.last_contained == Some(prev));
            if let (true, Some(last)) = (continuous, track.last_contained) {
                track.dwell_seconds += (now - last).max(0.0);
            }
            track.last_contained = Some(now);
        }

        self.escalate(track, now, &mut transitions);
        transitions
    }

    /// Handle a ledger track that was not detected in the current frame.
    pub fn observe_absent(&self, track: &mut TrackState, now: f64) -> Option<Transition> {
        self.confirm_exit(track, now)
    }

    fn escalate(&self, track: &mut TrackState, now: f64, transitions: &mut Vec<Transition>) {
        let Some(episode) = track.episode else {
            return;
        };

        if track.state == EscalationState::Watching
            && track.dwell_seconds >= self.thresholds.warning_seconds
        {
            track.state = EscalationState::Warned;
            track.warning_issued = true;
            track.warned_at = Some(now);
            debug!(track_id = %track.track_id, dwell = track.dwell_seconds, "warning threshold crossed");
            transitions.push(Transition::Warned {
                episode,
                dwell_seconds: track.dwell_seconds,
            });
        }

        if track.state == EscalationState::Warned
            && track.dwell_seconds >= self.thresholds.violation_seconds
        {
            track.state = EscalationState::Violating;
            debug!(track_id = %track.track_id, dwell = track.dwell_seconds, "violation threshold crossed");
            transitions.push(Transition::Violated {
                episode,
                dwell_seconds: track.dwell_seconds,
            });
        }
    }

    fn confirm_exit(&self, track: &mut TrackState, now: f64) -> Option<Transition> {
        if !track.in_episode() {
            return None;
        }
        let last = track.last_contained?;
        if now - last <= self.thresholds.gap_tolerance_seconds {
            return None;
        }

        let transition = Transition::Exited {
            episode: track.episode,
            from: track.state,
            dwell_seconds: track.dwell_seconds,
        };
        debug!(
            track_id = %track.track_id,
            from = ?track.state,
            absent_for = now - last,
            "exit confirmed"
        );
        track.reset_episode();
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Detection, TrackId, VehicleClass};

    struct Harness {
        machine: EscalationMachine,
        track: TrackState,
        previous: Option<f64>,
    }

    impl Harness {
        fn new() -> Self {
            let det = Detection::new(TrackId(1), VehicleClass::Car, 0.0, 0.0, 1.0, 1.0, 0.9, 0.0);
            Self {
                machine: EscalationMachine::new(
                    StreamId::new("cam"),
                    EscalationThresholds::default(),
                ),
                track: TrackState::new(&det),
                previous: None,
            }
        }

        fn seen(&mut self, ts: f64, zone: Option<&str>) -> Vec<Transition> {
            self.track.last_seen = ts;
            let out = self.machine.observe(
                &mut self.track,
                Observation {
                    timestamp: ts,
                    zone: zone.map(ZoneId::new),
                    previous_frame: self.previous,
                },
            );
            self.previous = Some(ts);
            out
        }

        fn absent(&mut self, ts: f64) -> Option<Transition> {
            let out = self.machine.observe_absent(&mut self.track, ts);
            self.previous = Some(ts);
            out
        }
    }

    fn kinds(transitions: &[Transition]) -> Vec<&'static str> {
        transitions
            .iter()
            .map(|t| match t {
                Transition::Entered { .. } => "entered",
                Transition::Warned { .. } => "warned",
                Transition::Violated { .. } => "violated",
                Transition::Exited { .. } => "exited",
            })
            .collect()
    }

    #[test]
    fn test_full_escalation() {
        let mut h = Harness::new();
        let mut log = Vec::new();
        for t in 0..=20 {
            for tr in h.seen(t as f64, Some("z")) {
                log.push((t, tr));
            }
        }

        let summary: Vec<(i32, &str)> = log
            .iter()
            .map(|(t, tr)| (*t, kinds(std::slice::from_ref(tr))[0]))
            .collect();
        assert_eq!(summary, vec![(0, "entered"), (5, "warned"), (15, "violated")]);
        assert_eq!(h.track.state, EscalationState::Violating);
        assert_eq!(h.track.dwell_seconds, 20.0);
        assert_eq!(h.track.warned_at, Some(5.0));
    }

    #[test]
    fn test_uncontained_track_stays_clear() {
        let mut h = Harness::new();
        assert!(h.seen(0.0, None).is_empty());
        assert!(h.seen(1.0, None).is_empty());
        assert_eq!(h.track.state, EscalationState::Clear);
    }

    #[test]
    fn test_dropout_within_gap_pauses_timer() {
        let mut h = Harness::new();
        for t in 0..=4 {
            h.seen(t as f64, Some("z"));
        }
        assert_eq!(h.track.dwell_seconds, 4.0);

        assert!(h.absent(4.5).is_none());
        h.seen(5.0, Some("z"));
        assert_eq!(h.track.dwell_seconds, 4.0);
        assert_eq!(h.track.state, EscalationState::Watching);

        let out = h.seen(6.0, Some("z"));
        assert_eq!(kinds(&out), vec!["warned"]);
        assert_eq!(h.track.dwell_seconds, 5.0);
    }

    #[test]
    fn test_out_of_zone_flicker_does_not_reset() {
        let mut h = Harness::new();
        h.seen(0.0, Some("z"));
        h.seen(1.0, Some("z"));
        h.seen(2.0, None);
        h.seen(3.0, Some("z"));
        assert_eq!(h.track.state, EscalationState::Watching);
        assert_eq!(h.track.dwell_seconds, 1.0);
    }

    #[test]
    fn test_gap_beyond_tolerance_resets_when_absent() {
        let mut h = Harness::new();
        for t in 0..=6 {
            h.seen(t as f64, Some("z"));
        }
        assert_eq!(h.track.state, EscalationState::Warned);

        assert!(h.absent(11.0).is_none());
        let exit = h.absent(11.5).unwrap();
        assert!(matches!(
            exit,
            Transition::Exited {
                from: EscalationState::Warned,
                dwell_seconds,
                ..
            } if dwell_seconds == 6.0
        ));
        assert_eq!(h.track.state, EscalationState::Clear);
        assert_eq!(h.track.dwell_seconds, 0.0);
        assert!(h.track.episode.is_none());
    }

    #[test]
    fn test_seen_outside_beyond_tolerance_resets() {
        let mut h = Harness::new();
        h.seen(0.0, Some("z"));
        h.seen(1.0, Some("z"));
        assert!(h.seen(4.0, None).is_empty());
        let out = h.seen(7.0, None);
        assert_eq!(kinds(&out), vec!["exited"]);
    }

    #[test]
    fn test_reentry_after_long_absence_starts_new_episode() {
        let mut h = Harness::new();
        h.seen(0.0, Some("z"));
        let first = h.track.episode.unwrap();

        let out = h.seen(20.0, Some("z"));
        assert_eq!(kinds(&out), vec!["exited", "entered"]);
        let second = h.track.episode.unwrap();
        assert_ne!(first, second);
        assert_eq!(h.track.entered_at, Some(20.0));
    }

    #[test]
    fn test_stutter_adds_real_delta_and_can_double_escalate() {
        let mut h = Harness::new();
        h.machine = EscalationMachine::new(
            StreamId::new("cam"),
            EscalationThresholds {
                warning_seconds: 2.0,
                violation_seconds: 4.0,
                gap_tolerance_seconds: 5.0,
            },
        );
        h.seen(0.0, Some("z"));
        h.seen(1.0, Some("z"));
        // No frames at all between 1s and 5.5s: the stream stalled, the track never left.
        let out = h.seen(5.5, Some("z"));
        assert_eq!(kinds(&out), vec!["warned", "violated"]);
        assert_eq!(h.track.dwell_seconds, 5.5);
    }

    #[test]
    fn test_other_zone_does_not_extend_episode() {
        let mut h = Harness::new();
        h.seen(0.0, Some("a"));
        h.seen(1.0, Some("a"));
        h.seen(2.0, Some("b"));
        h.seen(3.0, Some("b"));
        assert_eq!(h.track.zone.as_ref().map(ZoneId::as_str), Some("a"));
        assert_eq!(h.track.dwell_seconds, 1.0);

        // Once the gap is exceeded the track starts over in the new zone.
        let out = h.seen(7.0, Some("b"));
        assert_eq!(kinds(&out), vec!["exited", "entered"]);
        assert_eq!(h.track.zone.as_ref().map(ZoneId::as_str), Some("b"));
    }

    #[test]
    fn test_redelivered_frame_adds_nothing() {
        let mut h = Harness::new();
        h.seen(0.0, Some("z"));
        h.seen(1.0, Some("z"));
        h.seen(1.0, Some("z"));
        assert_eq!(h.track.dwell_seconds, 1.0);
    }
}
