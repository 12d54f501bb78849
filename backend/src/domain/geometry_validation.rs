//! Structural validation of client-supplied GeoJSON geometries.
//!
//! Validation runs over the raw JSON value so that absent fields and
//! malformed coordinate arrays are reported precisely instead of surfacing as
//! opaque deserialisation failures. Rules:
//!
//! - `type` and `coordinates` must both be present;
//! - `Point` carries exactly two numbers;
//! - `LineString` carries at least two numeric pairs;
//! - `Polygon` carries at least one ring, every ring at least four numeric
//!   pairs, and the outer ring must be closed. Ring length is checked before
//!   closure.

use serde_json::Value;
use thiserror::Error;

use super::geometry::{Geometry, Position, Ring};

const MIN_LINE_POSITIONS: usize = 2;
const MIN_RING_POSITIONS: usize = 4;

/// Reasons a geometry fails structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// `type` or `coordinates` is absent (or the geometry is not an object).
    #[error("geometry is missing required field `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },
    /// The geometry type is not one of `Point`, `LineString`, `Polygon`.
    #[error("unsupported geometry type `{kind}`")]
    UnsupportedType {
        /// The offending type value as received.
        kind: String,
    },
    /// Coordinates do not match the shape required by the geometry type.
    #[error("invalid {kind} coordinates: expected {expected}")]
    MalformedCoordinates {
        /// Geometry type being validated.
        kind: &'static str,
        /// Human-readable description of the expected shape.
        expected: &'static str,
    },
    /// The outer ring's first and last positions differ.
    #[error("invalid Polygon: first and last points of the outer ring must be equal")]
    UnclosedRing,
}

impl GeometryError {
    const fn malformed(kind: &'static str, expected: &'static str) -> Self {
        Self::MalformedCoordinates { kind, expected }
    }
}

/// Validate a GeoJSON geometry object without converting it.
///
/// # Examples
/// ```
/// use envsync::domain::{GeometryError, validate_geometry};
/// use serde_json::json;
///
/// let open = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1]]]});
/// assert_eq!(validate_geometry(&open), Err(GeometryError::UnclosedRing));
/// ```
pub fn validate_geometry(geometry: &Value) -> Result<(), GeometryError> {
    parse_geometry(geometry).map(|_| ())
}

/// Validate a GeoJSON geometry object and convert it into a [`Geometry`].
pub fn parse_geometry(geometry: &Value) -> Result<Geometry, GeometryError> {
    let kind = required_field(geometry, "type")?;
    let coordinates = required_field(geometry, "coordinates")?;

    match kind.as_str() {
        Some("Point") => parse_point(coordinates),
        Some("LineString") => parse_line_string(coordinates),
        Some("Polygon") => parse_polygon(coordinates),
        Some(other) => Err(GeometryError::UnsupportedType {
            kind: other.to_owned(),
        }),
        None => Err(GeometryError::UnsupportedType {
            kind: kind.to_string(),
        }),
    }
}

fn required_field<'a>(geometry: &'a Value, field: &'static str) -> Result<&'a Value, GeometryError> {
    match geometry.get(field) {
        None | Some(Value::Null) => Err(GeometryError::MissingField { field }),
        Some(value) => Ok(value),
    }
}

fn parse_point(coordinates: &Value) -> Result<Geometry, GeometryError> {
    position(coordinates)
        .map(Geometry::Point)
        .ok_or(GeometryError::malformed("Point", "[number, number]"))
}

fn parse_line_string(coordinates: &Value) -> Result<Geometry, GeometryError> {
    const EXPECTED: &str = "at least two [number, number] pairs";

    let positions = coordinates
        .as_array()
        .filter(|items| items.len() >= MIN_LINE_POSITIONS)
        .and_then(|items| positions(items))
        .ok_or(GeometryError::malformed("LineString", EXPECTED))?;
    Ok(Geometry::LineString(positions))
}

fn parse_polygon(coordinates: &Value) -> Result<Geometry, GeometryError> {
    const EXPECTED: &str = "at least one ring with 4+ [number, number] pairs";

    let rings = coordinates
        .as_array()
        .filter(|items| !items.is_empty())
        .and_then(|items| items.iter().map(ring).collect::<Option<Vec<_>>>())
        .ok_or(GeometryError::malformed("Polygon", EXPECTED))?;

    let closed = rings
        .first()
        .is_some_and(|outer| outer.first() == outer.last());
    if !closed {
        return Err(GeometryError::UnclosedRing);
    }

    Ok(Geometry::Polygon(rings))
}

fn ring(value: &Value) -> Option<Ring> {
    value
        .as_array()
        .filter(|items| items.len() >= MIN_RING_POSITIONS)
        .and_then(|items| positions(items))
}

fn positions(items: &[Value]) -> Option<Vec<Position>> {
    items.iter().map(position).collect()
}

fn position(value: &Value) -> Option<Position> {
    match value.as_array()?.as_slice() {
        [x, y] => Some([x.as_f64()?, y.as_f64()?]),
        _ => None,
    }
}

#[cfg(test)]
#[path = "geometry_validation_tests.rs"]
mod tests;
