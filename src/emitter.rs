//! Violation and warning emission, exactly once per episode.

mod record;
mod violation_emitter;

pub use record::{EvidenceRef, Notification, ViolationRecord, WarningEvent};
pub use violation_emitter::ViolationEmitter;
