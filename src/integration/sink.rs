//! Downstream collaborators: persistence and operator notification.

use std::collections::HashSet;
use std::convert::Infallible;

use serde::Serialize;
use tracing::debug;

use crate::emitter::{Notification, ViolationRecord, WarningEvent};
use crate::ledger::EpisodeId;
use crate::pipeline::FrameOutcome;

/// Receives the events a frame produced.
///
/// Implementations must treat the episode id as an idempotency key: delivering the same record
/// twice must leave a single stored violation.
pub trait ViolationSink {
    type Error;

    fn record_violation(&mut self, record: &ViolationRecord) -> Result<(), Self::Error>;

    fn record_warning(&mut self, warning: &WarningEvent) -> Result<(), Self::Error>;

    fn notify(&mut self, _notification: &Notification) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Forward everything in `outcome`: warnings first, then each violation and its notification.
    fn deliver(&mut self, outcome: &FrameOutcome) -> Result<(), Self::Error> {
        for warning in &outcome.warnings {
            self.record_warning(warning)?;
        }
        for record in &outcome.violations {
            self.record_violation(record)?;
            self.notify(&Notification::from(record))?;
        }
        Ok(())
    }
}

/// In-memory sink that deduplicates on episode id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySink {
    violations: Vec<ViolationRecord>,
    warnings: Vec<WarningEvent>,
    notifications: Vec<Notification>,
    #[serde(skip)]
    episodes: HashSet<EpisodeId>,
    #[serde(skip)]
    duplicates: u64,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stored violations in delivery order.
    pub fn violations(&self) -> &[ViolationRecord] {
        &self.violations
    }

    /// Get the stored warnings.
    pub fn warnings(&self) -> &[WarningEvent] {
        &self.warnings
    }

    /// Get the notifications sent so far.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Deliveries dropped because the episode was already stored.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Stored episode ids with their entry timestamps, for seeding a restarted pipeline.
    pub fn known_episodes(&self) -> impl Iterator<Item = (EpisodeId, f64)> + '_ {
        self.violations
            .iter()
            .map(|record| (record.episode(), record.entered_at()))
    }

    /// Serialize the stored events as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl ViolationSink for MemorySink {
    type Error = Infallible;

    fn record_violation(&mut self, record: &ViolationRecord) -> Result<(), Self::Error> {
        if !self.episodes.insert(record.episode()) {
            self.duplicates += 1;
            debug!(episode = %record.episode(), "violation already stored");
            return Ok(());
        }
        self.violations.push(record.clone());
        Ok(())
    }

    fn record_warning(&mut self, warning: &WarningEvent) -> Result<(), Self::Error> {
        if self.warnings.iter().all(|w| w.episode != warning.episode) {
            self.warnings.push(warning.clone());
        }
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), Self::Error> {
        if self
            .notifications
            .iter()
            .all(|n| n.episode != notification.episode)
        {
            self.notifications.push(notification.clone());
        }
        Ok(())
    }
}
