//! Per-track state, keyed by the upstream tracker's identifier.

mod episode;
mod track;
mod track_ledger;
mod track_state;

pub use episode::EpisodeId;
pub use track::{Detection, StreamId, TrackId, VehicleClass};
pub use track_ledger::TrackLedger;
pub use track_state::TrackState;
