use std::fmt;

use serde::{Deserialize, Serialize};

/// Offence a zone enforces, carried onto every violation recorded in it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    #[default]
    IllegalParking,
    NoParkingZone,
    BlockingTraffic,
    BusLane,
    PedestrianCrossing,
    DoubleParking,
}

impl ViolationKind {
    /// Stable snake_case code, as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::IllegalParking => "illegal_parking",
            ViolationKind::NoParkingZone => "no_parking_zone",
            ViolationKind::BlockingTraffic => "blocking_traffic",
            ViolationKind::BusLane => "bus_lane",
            ViolationKind::PedestrianCrossing => "pedestrian_crossing",
            ViolationKind::DoubleParking => "double_parking",
        }
    }

    /// Human-readable label for notices.
    pub fn description(&self) -> &'static str {
        match self {
            ViolationKind::IllegalParking => "Illegal parking in restricted zone",
            ViolationKind::NoParkingZone => "Parking in no-parking zone",
            ViolationKind::BlockingTraffic => "Blocking traffic flow",
            ViolationKind::BusLane => "Parking in bus lane",
            ViolationKind::PedestrianCrossing => "Parking on pedestrian crossing",
            ViolationKind::DoubleParking => "Double parking",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_codes_match_as_str() {
        for kind in [
            ViolationKind::IllegalParking,
            ViolationKind::BusLane,
            ViolationKind::PedestrianCrossing,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_default_kind() {
        assert_eq!(ViolationKind::default(), ViolationKind::IllegalParking);
        assert_eq!(ViolationKind::BusLane.description(), "Parking in bus lane");
    }
}
