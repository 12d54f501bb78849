//! Typed GeoJSON geometries accepted by environments.
//!
//! Only `Point`, `LineString` and `Polygon` are modelled. Values are produced
//! by [`parse_geometry`](super::geometry_validation::parse_geometry) after
//! structural validation, so a `Geometry` held by the domain is always
//! well-formed. Serialisation keeps the GeoJSON `{type, coordinates}` shape so
//! rows round-trip through JSON columns unchanged.

use serde::{Deserialize, Serialize};

/// A `[x, y]` coordinate pair (longitude, latitude for WGS84 inputs).
pub type Position = [f64; 2];

/// A linear ring; the first ring of a polygon is its outer boundary.
pub type Ring = Vec<Position>;

/// Geometry attached to a delimiter, zone or POI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// A single position.
    Point(Position),
    /// Two or more positions.
    LineString(Vec<Position>),
    /// One or more rings of at least four positions.
    Polygon(Vec<Ring>),
}

impl Geometry {
    /// GeoJSON type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::Polygon(_) => "Polygon",
        }
    }

    /// Outer ring when this is a polygon.
    pub fn outer_ring(&self) -> Option<&[Position]> {
        match self {
            Self::Polygon(rings) => rings.first().map(Vec::as_slice),
            Self::Point(_) | Self::LineString(_) => None,
        }
    }
}

/// Return a copy of `ring` with its first position appended when the ring is
/// not already closed. Empty rings are returned unchanged.
pub fn close_ring(ring: &[Position]) -> Ring {
    let mut closed = ring.to_vec();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            closed.push(*first);
        }
    }
    closed
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn polygon_serialises_in_geojson_shape() {
        let polygon = Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]]);

        let value = serde_json::to_value(&polygon).expect("serialise polygon");

        assert_eq!(
            value,
            json!({
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]]
            })
        );
    }

    #[rstest]
    fn close_ring_appends_first_position_once() {
        let open = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];

        let closed = close_ring(&open);
        let reclosed = close_ring(&closed);

        assert_eq!(closed.len(), 4);
        assert_eq!(closed.last(), Some(&[0.0, 0.0]));
        assert_eq!(reclosed, closed);
    }

    #[rstest]
    fn outer_ring_is_absent_for_points() {
        assert!(Geometry::Point([1.0, 2.0]).outer_ring().is_none());
    }
}
