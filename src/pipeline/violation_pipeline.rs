use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::{FrameBatch, FrameOutcome};
use crate::config::Engine;
use crate::emitter::{ViolationEmitter, ViolationRecord};
use crate::error::{EmitError, Error, LedgerError};
use crate::escalation::{EscalationMachine, Observation, Transition};
use crate::fine::FineSummary;
use crate::impact::{FrameImpactContext, FrameSnapshot, ImpactContext};
use crate::ledger::{Detection, EpisodeId, StreamId, TrackId, TrackLedger};
use crate::stats::PipelineStats;
use crate::zone::{Point, containment_matrix, first_containing};

/// Per-stream driver: ledger, escalation, scoring, fines and emission for one camera.
///
/// Frames must arrive in timestamp order. Between two calls to
/// [`process_frame`](Self::process_frame) every piece of state reflects the last fully processed
/// frame, so a pipeline can be dropped at any frame boundary.
pub struct ViolationPipeline<C: ImpactContext = FrameImpactContext> {
    stream: StreamId,
    engine: Arc<Engine>,
    context: C,
    ledger: TrackLedger,
    machine: EscalationMachine,
    emitter: ViolationEmitter,
    /// Plates that already have a violation on this stream. Grows by one entry per distinct
    /// plate for the life of the pipeline, since offender history is meant to outlive tracks.
    offenders: HashSet<String>,
    last_frame: Option<f64>,
    stats: PipelineStats,
    summary: FineSummary,
}

impl ViolationPipeline<FrameImpactContext> {
    /// Create a pipeline that derives impact signals from each frame.
    pub fn new(stream: StreamId, engine: Arc<Engine>) -> Self {
        Self::with_context(stream, engine, FrameImpactContext)
    }
}

impl<C: ImpactContext> ViolationPipeline<C> {
    /// Create a pipeline with a custom source of impact signals.
    pub fn with_context(stream: StreamId, engine: Arc<Engine>, context: C) -> Self {
        let config = engine.stream();
        Self {
            ledger: TrackLedger::new(config.eviction_seconds),
            machine: EscalationMachine::new(stream.clone(), config.thresholds()),
            emitter: ViolationEmitter::new(stream.clone()),
            stream,
            engine,
            context,
            offenders: HashSet::new(),
            last_frame: None,
            stats: PipelineStats::default(),
            summary: FineSummary::default(),
        }
    }

    /// Episodes already persisted downstream, with their entry timestamps; replaying them yields
    /// no new records.
    pub fn with_known_episodes(
        mut self,
        episodes: impl IntoIterator<Item = (EpisodeId, f64)>,
    ) -> Self {
        self.emitter = self.emitter.with_known_episodes(episodes);
        self
    }

    /// Plates with prior violations, for the repeat-offender surcharge.
    pub fn with_known_offenders<S: Into<String>>(
        mut self,
        plates: impl IntoIterator<Item = S>,
    ) -> Self {
        self.offenders.extend(plates.into_iter().map(Into::into));
        self
    }

    /// Run one frame through the pipeline.
    ///
    /// Only a frame with a non-finite timestamp, or one older than its predecessor, fails as a
    /// whole and leaves every piece of state untouched. Problems with individual tracks are
    /// reported in [`FrameOutcome::rejected`].
    pub fn process_frame(&mut self, frame: FrameBatch) -> Result<FrameOutcome, LedgerError> {
        let now = frame.timestamp;
        if !now.is_finite() {
            self.stats.frames_rejected += 1;
            warn!(stream = %self.stream, observed = now, "dropping frame with non-finite timestamp");
            return Err(LedgerError::NonFiniteFrame(now));
        }
        if let Some(last_frame) = self.last_frame.filter(|last| now < *last) {
            self.stats.frames_rejected += 1;
            warn!(
                stream = %self.stream,
                last_frame,
                observed = now,
                "dropping out-of-order frame"
            );
            return Err(LedgerError::OutOfOrderFrame {
                last_frame,
                observed: now,
            });
        }

        self.stats.frames += 1;
        self.stats.detections += frame.detections.len() as u64;

        let engine = Arc::clone(&self.engine);
        let detections = self.admit(now, frame.detections);
        let anchors: Vec<Point> = detections
            .iter()
            .map(|det| det.anchor(engine.stream().anchor))
            .collect();
        let zone_of = first_containing(&containment_matrix(&anchors, engine.zones().as_slice()));

        let mut outcome = FrameOutcome::new(now);
        let mut seen = HashSet::with_capacity(detections.len());

        for (det, zone_index) in detections.iter().zip(&zone_of) {
            seen.insert(det.track_id);
            let track = match self.ledger.update(det) {
                Ok(track) => track,
                Err(err) => {
                    self.stats.observations_rejected += 1;
                    outcome.rejected.push(err.into());
                    continue;
                }
            };
            let zone = zone_index
                .and_then(|index| engine.zones().by_index(index))
                .map(|zone| zone.id().clone());
            let observation = Observation {
                timestamp: now,
                zone,
                previous_frame: self.last_frame,
            };
            for transition in self.machine.observe(track, observation) {
                outcome.transitions.push((det.track_id, transition));
            }
        }

        for (track_id, plate) in &frame.plates {
            self.ledger.record_plate(*track_id, plate);
        }

        // Tracks missing from this frame can still have their exit confirmed.
        let mut absent: Vec<(TrackId, Transition)> = self
            .ledger
            .iter_mut()
            .filter(|track| !seen.contains(&track.track_id))
            .filter_map(|track| {
                self.machine
                    .observe_absent(track, now)
                    .map(|transition| (track.track_id, transition))
            })
            .collect();
        absent.sort_unstable_by_key(|(track_id, _)| *track_id);
        outcome.transitions.extend(absent);

        let snapshot = FrameSnapshot {
            timestamp: now,
            detections: &detections,
            zone_of: &zone_of,
            vehicles_delayed: frame.vehicles_delayed,
        };

        for (track_id, transition) in &outcome.transitions {
            match transition {
                Transition::Entered { .. } => self.stats.entries += 1,
                Transition::Exited { .. } => self.stats.exits += 1,
                Transition::Warned { .. } => {
                    let event = self
                        .ledger
                        .get(*track_id)
                        .and_then(|track| self.emitter.warning(track));
                    if let Some(event) = event {
                        self.stats.warnings += 1;
                        outcome.warnings.push(event);
                    }
                }
                Transition::Violated { .. } => match self.confirm(*track_id, &snapshot) {
                    Ok(record) => {
                        self.stats.violations += 1;
                        self.stats.fines_total += record.fine().total;
                        self.summary.add(&record);
                        outcome.violations.push(record);
                    }
                    Err(err) => {
                        match &err {
                            Error::Emit(EmitError::EmissionConflict(_)) => {
                                self.stats.emission_conflicts += 1
                            }
                            Error::Fine(_) => self.stats.fine_errors += 1,
                            _ => {}
                        }
                        outcome.rejected.push(err);
                    }
                },
            }
        }

        outcome.evicted = self.ledger.evict_stale(now);
        self.stats.evictions += outcome.evicted.len() as u64;
        let open: HashSet<EpisodeId> = self
            .ledger
            .iter()
            .filter_map(|track| track.episode)
            .collect();
        self.emitter.prune(now, &open);
        self.last_frame = Some(now);

        trace!(
            stream = %self.stream,
            timestamp = now,
            detections = detections.len(),
            tracks = self.ledger.len(),
            transitions = outcome.transitions.len(),
            "frame processed"
        );
        Ok(outcome)
    }

    /// Drop low-confidence and unenforced detections, keeping one detection per track. Every
    /// admitted detection carries the frame timestamp.
    fn admit(&mut self, now: f64, detections: Vec<Detection>) -> Vec<Detection> {
        let min_confidence = self.engine.stream().min_confidence;
        let mut admitted: Vec<Detection> = Vec::with_capacity(detections.len());
        let mut position: HashMap<TrackId, usize> = HashMap::new();

        for mut det in detections {
            det.timestamp = now;
            if det.confidence < min_confidence || !self.engine.is_enforced(det.class) {
                self.stats.detections_filtered += 1;
                continue;
            }
            match position.get(&det.track_id) {
                Some(&index) => {
                    // Duplicate track id within a frame: the more confident box wins.
                    self.stats.detections_filtered += 1;
                    if det.confidence > admitted[index].confidence {
                        admitted[index] = det;
                    }
                }
                None => {
                    position.insert(det.track_id, admitted.len());
                    admitted.push(det);
                }
            }
        }
        admitted
    }

    /// Score, fine and emit the violation just confirmed for `track_id`.
    fn confirm(
        &mut self,
        track_id: TrackId,
        snapshot: &FrameSnapshot<'_>,
    ) -> Result<ViolationRecord, Error> {
        let track = self
            .ledger
            .get(track_id)
            .ok_or(EmitError::NoOpenEpisode(track_id))?;
        let zone = track
            .zone
            .as_ref()
            .and_then(|id| self.engine.zones().get(id))
            .ok_or(EmitError::NoOpenEpisode(track_id))?;

        let signals = self.context.signals(track, zone, snapshot);
        let impact = self.engine.scorer().assess(signals);
        let repeat_offender = track
            .plate
            .as_ref()
            .is_some_and(|plate| self.offenders.contains(plate));
        let fine = self.engine.fines().compute_for_offender(
            track.dominant_class(),
            impact.multiplier,
            repeat_offender,
        )?;
        if repeat_offender {
            debug!(track_id = %track_id, "repeat offender surcharge applied");
        }

        let record = self.emitter.emit(track, zone.kind(), impact, fine)?;
        if let Some(plate) = record.plate() {
            self.offenders.insert(plate.to_string());
        }
        Ok(record)
    }

    /// Get the stream this pipeline serves.
    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    /// Get a reference to the shared engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Get a reference to the impact context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Track state as of the last fully processed frame.
    pub fn ledger(&self) -> &TrackLedger {
        &self.ledger
    }

    /// Timestamp of the last accepted frame.
    pub fn last_frame(&self) -> Option<f64> {
        self.last_frame
    }

    /// Violation emitter, holding the episode ids still needed for deduplication.
    pub fn emitter(&self) -> &ViolationEmitter {
        &self.emitter
    }

    /// Counters since the pipeline started.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Fine totals over every violation this pipeline emitted.
    pub fn summary(&self) -> &FineSummary {
        &self.summary
    }
}
