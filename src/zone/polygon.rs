//! Restricted-zone polygons and containment tests.

use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{Point, Rect, ViolationKind};
use crate::error::ConfigError;

/// Distance from an edge, in frame units, inside which a point still counts as contained.
///
/// Detections whose anchor sits exactly on a border would otherwise flip in and out as the box
/// jitters by a rounding error.
pub const EDGE_TOLERANCE: f64 = 1e-6;

/// Identifier of a configured zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Create a zone id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A simple polygon marking a restricted area.
#[derive(Debug, Clone)]
pub struct Zone {
    id: ZoneId,
    name: String,
    kind: ViolationKind,
    vertices: Vec<Point>,
    area: f64,
    bounds: Rect,
}

impl Zone {
    /// Validate and build a zone. Fewer than three vertices, non-finite coordinates or a
    /// degenerate (zero-area) outline are rejected here so queries never have to.
    pub fn new(
        id: ZoneId,
        name: impl Into<String>,
        vertices: Vec<Point>,
    ) -> Result<Self, ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedZone {
            zone: id.to_string(),
            reason,
        };

        if vertices.len() < 3 {
            return Err(malformed(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(bad) = vertices
            .iter()
            .find(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(malformed(format!("non-finite vertex ({}, {})", bad.x, bad.y)));
        }

        let area = shoelace_area(&vertices);
        if area <= EDGE_TOLERANCE {
            return Err(malformed("polygon has zero area".to_string()));
        }

        let bounds = bounding_rect(&vertices);
        Ok(Self {
            id,
            name: name.into(),
            kind: ViolationKind::default(),
            vertices,
            area,
            bounds,
        })
    }

    /// Set the offence this zone enforces.
    pub fn with_kind(mut self, kind: ViolationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get the zone id.
    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    /// Human-readable zone name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offence this zone enforces.
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Polygon vertices in frame coordinates.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Polygon area in frame units.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Axis-aligned bounding box of the polygon.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Winding-number containment. Points on, or within [`EDGE_TOLERANCE`] of, the outline
    /// count as inside.
    pub fn contains(&self, point: &Point) -> bool {
        if !point.x.is_finite() || !point.y.is_finite() {
            return false;
        }
        if !self.bounds.expand(EDGE_TOLERANCE).contains(point) {
            return false;
        }
        if self
            .edges()
            .any(|(a, b)| distance_to_segment(point, a, b) <= EDGE_TOLERANCE)
        {
            return true;
        }
        self.winding_number(point) != 0
    }

    /// Fraction of the zone's area covered by `rect`, in `[0, 1]`.
    pub fn overlap_fraction(&self, rect: &Rect) -> f64 {
        if rect.area() <= 0.0 {
            return 0.0;
        }
        let clipped = clip_to_rect(&self.vertices, rect);
        if clipped.len() < 3 {
            return 0.0;
        }
        (shoelace_area(&clipped) / self.area).clamp(0.0, 1.0)
    }

    fn edges(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    fn winding_number(&self, p: &Point) -> i32 {
        let mut wn = 0;
        for (a, b) in self.edges() {
            if a.y <= p.y {
                if b.y > p.y && is_left(a, b, p) > 0.0 {
                    wn += 1;
                }
            } else if b.y <= p.y && is_left(a, b, p) < 0.0 {
                wn -= 1;
            }
        }
        wn
    }
}

/// > 0 when `p` lies left of the directed line `a -> b`, < 0 when right, 0 when collinear.
#[inline]
fn is_left(a: &Point, b: &Point, p: &Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}

fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let ab: Vector2<f64> = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t - p).norm()
}

fn shoelace_area(vertices: &[Point]) -> f64 {
    let twice: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() / 2.0
}

fn bounding_rect(vertices: &[Point]) -> Rect {
    let (mut x1, mut y1) = (f64::INFINITY, f64::INFINITY);
    let (mut x2, mut y2) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for v in vertices {
        x1 = x1.min(v.x);
        y1 = y1.min(v.y);
        x2 = x2.max(v.x);
        y2 = y2.max(v.y);
    }
    Rect::from_tlbr(x1, y1, x2, y2)
}

#[derive(Clone, Copy)]
enum Boundary {
    Left(f64),
    Right(f64),
    Top(f64),
    Bottom(f64),
}

impl Boundary {
    fn inside(&self, p: &Point) -> bool {
        match *self {
            Boundary::Left(x) => p.x >= x,
            Boundary::Right(x) => p.x <= x,
            Boundary::Top(y) => p.y >= y,
            Boundary::Bottom(y) => p.y <= y,
        }
    }

    /// Only called for segments that cross the boundary, so the denominator is never zero.
    fn intersect(&self, a: &Point, b: &Point) -> Point {
        let t = match *self {
            Boundary::Left(x) | Boundary::Right(x) => (x - a.x) / (b.x - a.x),
            Boundary::Top(y) | Boundary::Bottom(y) => (y - a.y) / (b.y - a.y),
        };
        a + (b - a) * t
    }
}

/// Sutherland-Hodgman clip of an arbitrary polygon against an axis-aligned box.
fn clip_to_rect(vertices: &[Point], rect: &Rect) -> Vec<Point> {
    let [x1, y1, x2, y2] = rect.to_tlbr();
    let boundaries = [
        Boundary::Left(x1),
        Boundary::Right(x2),
        Boundary::Top(y1),
        Boundary::Bottom(y2),
    ];

    let mut output = vertices.to_vec();
    for boundary in boundaries {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        for current in input {
            let current_in = boundary.inside(&current);
            let prev_in = boundary.inside(&prev);
            if current_in {
                if !prev_in {
                    output.push(boundary.intersect(&prev, &current));
                }
                output.push(current);
            } else if prev_in {
                output.push(boundary.intersect(&prev, &current));
            }
            prev = current;
        }
    }
    output
}
