use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::{EvidenceRef, ViolationRecord, WarningEvent};
use crate::error::EmitError;
use crate::fine::FineBreakdown;
use crate::impact::ImpactAssessment;
use crate::ledger::{EpisodeId, StreamId, TrackState};
use crate::zone::ViolationKind;

/// Builds violation records and guarantees at most one per episode.
///
/// Emitted episode ids are kept, keyed to their entry timestamp, only while a new frame could
/// still reproduce them; see [`prune`](Self::prune).
#[derive(Debug, Clone)]
pub struct ViolationEmitter {
    stream: StreamId,
    emitted: HashMap<EpisodeId, f64>,
    conflicts: u64,
}

impl ViolationEmitter {
    /// Create an emitter for one stream with no known episodes.
    pub fn new(stream: StreamId) -> Self {
        Self {
            stream,
            emitted: HashMap::new(),
            conflicts: 0,
        }
    }

    /// Seed with episodes the persistence layer already holds, e.g. after a restart, each with
    /// its entry timestamp.
    pub fn with_known_episodes(
        mut self,
        episodes: impl IntoIterator<Item = (EpisodeId, f64)>,
    ) -> Self {
        self.emitted.extend(episodes);
        self
    }

    /// Forget episode ids no later frame can produce again.
    ///
    /// An id is derived from its entry timestamp, and frames only move forward, so once `now`
    /// has passed the entry time and no open episode in `open` carries the id, it cannot recur.
    pub fn prune(&mut self, now: f64, open: &HashSet<EpisodeId>) {
        let before = self.emitted.len();
        self.emitted
            .retain(|episode, entered_at| *entered_at >= now || open.contains(episode));
        let dropped = before - self.emitted.len();
        if dropped > 0 {
            debug!(stream = %self.stream, dropped, "pruned closed episodes");
        }
    }

    /// Finalize the open episode of `track` into an immutable record.
    ///
    /// The track's last-seen frame is the confirmation frame and its box is the evidence.
    pub fn emit(
        &mut self,
        track: &TrackState,
        kind: ViolationKind,
        impact: ImpactAssessment,
        fine: FineBreakdown,
    ) -> Result<ViolationRecord, EmitError> {
        let (Some(episode), Some(zone), Some(entered_at)) =
            (track.episode, track.zone.clone(), track.entered_at)
        else {
            return Err(EmitError::NoOpenEpisode(track.track_id));
        };

        if self.emitted.contains_key(&episode) {
            self.conflicts += 1;
            warn!(
                stream = %self.stream,
                track_id = %track.track_id,
                episode = %episode,
                "discarding duplicate violation"
            );
            return Err(EmitError::EmissionConflict(episode));
        }
        self.emitted.insert(episode, entered_at);

        let record = ViolationRecord::new(
            episode,
            track.track_id,
            track.dominant_class(),
            track.plate.clone(),
            zone,
            kind,
            track.dwell_seconds,
            impact,
            fine,
            EvidenceRef {
                stream: self.stream.clone(),
                frame_timestamp: track.last_seen,
                bbox: track.bbox,
                confidence: track.confidence,
            },
            entered_at,
            track.warned_at,
            track.last_seen,
        );

        info!(
            stream = %self.stream,
            track_id = %record.track_id(),
            episode = %episode,
            zone = %record.zone(),
            kind = %record.kind(),
            class = %record.vehicle_class(),
            severity = %record.severity(),
            fine = %record.fine().total,
            dwell_seconds = record.dwell_seconds(),
            "violation confirmed"
        );
        Ok(record)
    }

    /// Warning event for the open episode, or `None` unless the track has crossed the warning
    /// threshold in it.
    ///
    /// The machine raises the warned edge once per episode, so callers act on that edge.
    pub fn warning(&self, track: &TrackState) -> Option<WarningEvent> {
        if !track.warning_issued {
            return None;
        }
        let episode = track.episode?;
        let zone = track.zone.clone()?;

        let event = WarningEvent {
            episode,
            stream: self.stream.clone(),
            track_id: track.track_id,
            vehicle_class: track.dominant_class(),
            plate: track.plate.clone(),
            zone,
            dwell_seconds: track.dwell_seconds,
            issued_at: track.warned_at.unwrap_or(track.last_seen),
        };
        info!(
            stream = %self.stream,
            track_id = %event.track_id,
            episode = %episode,
            zone = %event.zone,
            "warning issued"
        );
        Some(event)
    }

    /// Whether `episode` already has a record and is still tracked for deduplication.
    pub fn is_emitted(&self, episode: &EpisodeId) -> bool {
        self.emitted.contains_key(episode)
    }

    /// Episode ids currently held for deduplication.
    pub fn emitted_count(&self) -> usize {
        self.emitted.len()
    }

    /// Duplicate emissions discarded so far.
    pub fn conflicts(&self) -> u64 {
        self.conflicts
    }
}
