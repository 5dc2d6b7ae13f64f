use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StreamId, TrackId};

/// Namespace for episode ids, so they never collide with other v5 UUIDs.
const EPISODE_NAMESPACE: Uuid = Uuid::from_u128(0x6d1c_2f0e_94b1_5a3e_8c7d_3e0f_4a2b_91c5);

/// Identifier of one containment episode.
///
/// Derived from the stream, the track and the entry timestamp rather than drawn at random, so
/// replaying the same frames after a restart reproduces the same id and downstream stores can use
/// it as a natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(Uuid);

impl EpisodeId {
    /// Derive the id for the episode a track entered at `entered_at`.
    pub fn derive(stream: &StreamId, track: TrackId, entered_at: f64) -> Self {
        let name = format!("{}/{}/{:016x}", stream, track.0, entered_at.to_bits());
        Self(Uuid::new_v5(&EPISODE_NAMESPACE, name.as_bytes()))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let stream = StreamId::new("cam-1");
        let a = EpisodeId::derive(&stream, TrackId(7), 12.5);
        let b = EpisodeId::derive(&stream, TrackId(7), 12.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_separates_inputs() {
        let stream = StreamId::new("cam-1");
        let base = EpisodeId::derive(&stream, TrackId(7), 12.5);
        assert_ne!(base, EpisodeId::derive(&stream, TrackId(8), 12.5));
        assert_ne!(base, EpisodeId::derive(&stream, TrackId(7), 30.0));
        assert_ne!(base, EpisodeId::derive(&StreamId::new("cam-2"), TrackId(7), 12.5));
    }
}
