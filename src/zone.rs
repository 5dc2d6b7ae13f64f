//! Restricted-zone geometry.
//!
//! Zones are validated once when the configuration is loaded; every query afterwards is a pure
//! function of its inputs.

mod kind;
mod polygon;
mod rect;
mod zone_set;

pub use kind::ViolationKind;
pub use polygon::{EDGE_TOLERANCE, Zone, ZoneId};
pub use rect::{AnchorPoint, Rect};
pub use zone_set::{ZoneSet, containment_matrix};
pub(crate) use zone_set::first_containing;

/// Geometric points in frame coordinates.
pub type Point = nalgebra::Point2<f64>;
