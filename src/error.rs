//! Error taxonomy.
//!
//! Only [`ConfigError`] is fatal. Everything else is scoped to a single track or frame and is
//! reported back through the frame outcome instead of stopping the stream.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::{EpisodeId, TrackId, VehicleClass};

/// Problems found while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("zone `{zone}` is malformed: {reason}")]
    MalformedZone { zone: String, reason: String },

    #[error("zone id `{0}` is declared more than once")]
    DuplicateZone(String),

    #[error("zone `{0}` uses normalized coordinates but no frame size is configured")]
    MissingFrameSize(String),

    #[error("invalid threshold `{name}`: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },

    #[error("invalid severity band table: {0}")]
    InvalidBandTable(String),

    #[error("invalid impact weights: {0}")]
    InvalidWeights(String),

    #[error("no base fine configured for enforced class `{0}`")]
    MissingBaseFine(VehicleClass),

    #[error("base fine for `{class}` must be positive, got {amount}")]
    InvalidBaseFine { class: VehicleClass, amount: String },

    #[error("failed to read configuration from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration")]
    Parse(#[from] serde_json::Error),
}

/// Per-observation ordering violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("out-of-order observation for track {track}: {observed} is older than {last_seen}")]
    OutOfOrderObservation {
        track: TrackId,
        last_seen: f64,
        observed: f64,
    },

    #[error("out-of-order frame: {observed} is older than the last processed frame {last_frame}")]
    OutOfOrderFrame { last_frame: f64, observed: f64 },

    #[error("frame timestamp {0} is not a finite number")]
    NonFiniteFrame(f64),

    #[error("observation for track {track} has a non-finite timestamp {observed}")]
    NonFiniteObservation { track: TrackId, observed: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FineError {
    #[error("no base fine configured for vehicle class `{0}`")]
    ClassNotConfigured(VehicleClass),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("episode {0} already has a violation record")]
    EmissionConflict(EpisodeId),

    #[error("track {0} has no open episode")]
    NoOpenEpisode(TrackId),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Fine(#[from] FineError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
