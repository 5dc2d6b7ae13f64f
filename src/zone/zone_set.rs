use std::collections::HashSet;

use ndarray::Array2;

use super::{Point, Zone, ZoneId};
use crate::error::ConfigError;

/// Ordered collection of zones. When zones overlap the first one declared wins.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    /// Create a zone set, rejecting duplicate ids.
    pub fn new(zones: Vec<Zone>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for zone in &zones {
            if !seen.insert(zone.id().clone()) {
                return Err(ConfigError::DuplicateZone(zone.id().to_string()));
            }
        }
        Ok(Self { zones })
    }

    /// First zone containing `point`, if any.
    pub fn locate(&self, point: &Point) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    /// Look up a zone by id.
    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id() == id)
    }

    /// Get the zone at `index` in configuration order.
    pub fn by_index(&self, index: usize) -> Option<&Zone> {
        self.zones.get(index)
    }

    /// Iterate over the zones in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Get the zones as a slice.
    pub fn as_slice(&self) -> &[Zone] {
        &self.zones
    }

    /// Number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether no zones are configured.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Containment matrix between a frame's anchor points and a set of zones.
///
/// Returns a matrix of shape (P, Z) where P is the length of `points` and Z the number of zones.
pub fn containment_matrix(points: &[Point], zones: &[Zone]) -> Array2<bool> {
    let mut inside = Array2::from_elem((points.len(), zones.len()), false);
    for (i, p) in points.iter().enumerate() {
        for (j, z) in zones.iter().enumerate() {
            inside[[i, j]] = z.contains(p);
        }
    }
    inside
}

/// Column index of the first zone containing each row's point.
pub(crate) fn first_containing(matrix: &Array2<bool>) -> Vec<Option<usize>> {
    matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().position(|&inside| inside))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_zone(id: &str, x: f64, y: f64, size: f64) -> Zone {
        Zone::new(
            ZoneId::new(id),
            id,
            vec![
                Point::new(x, y),
                Point::new(x + size, y),
                Point::new(x + size, y + size),
                Point::new(x, y + size),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = ZoneSet::new(vec![rect_zone("a", 0.0, 0.0, 1.0), rect_zone("a", 5.0, 5.0, 1.0)]);
        assert!(matches!(result, Err(ConfigError::DuplicateZone(id)) if id == "a"));
    }

    #[test]
    fn test_locate_prefers_first_declared() {
        let zones = ZoneSet::new(vec![
            rect_zone("outer", 0.0, 0.0, 10.0),
            rect_zone("inner", 2.0, 2.0, 2.0),
        ])
        .unwrap();
        let zone = zones.locate(&Point::new(3.0, 3.0)).unwrap();
        assert_eq!(zone.id().as_str(), "outer");
        assert!(zones.locate(&Point::new(30.0, 3.0)).is_none());
    }

    #[test]
    fn test_containment_matrix_shape_and_first_match() {
        let zones = vec![rect_zone("a", 0.0, 0.0, 10.0), rect_zone("b", 5.0, 5.0, 10.0)];
        let points = vec![
            Point::new(1.0, 1.0),
            Point::new(7.0, 7.0),
            Point::new(12.0, 12.0),
            Point::new(50.0, 50.0),
        ];
        let matrix = containment_matrix(&points, &zones);
        assert_eq!(matrix.dim(), (4, 2));
        assert!(matrix[[1, 0]] && matrix[[1, 1]]);

        let first = first_containing(&matrix);
        assert_eq!(first, vec![Some(0), Some(0), Some(1), None]);
    }

    #[test]
    fn test_containment_matrix_empty_inputs() {
        let matrix = containment_matrix(&[], &[rect_zone("a", 0.0, 0.0, 1.0)]);
        assert_eq!(matrix.dim(), (0, 1));
        assert!(first_containing(&matrix).is_empty());
    }
}
