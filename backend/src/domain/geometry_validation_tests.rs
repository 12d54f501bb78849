//! Unit coverage for geometry validation rules.

use rstest::rstest;
use serde_json::{Value, json};

use super::*;

fn square_ring() -> Value {
    json!([[0, 0], [0, 1], [1, 1], [1, 0], [0, 0]])
}

#[rstest]
#[case::point(json!({"type": "Point", "coordinates": [0.5, 0.5]}))]
#[case::line(json!({"type": "LineString", "coordinates": [[0, 0], [1, 1]]}))]
#[case::polygon(json!({"type": "Polygon", "coordinates": [square_ring()]}))]
#[case::polygon_with_hole(json!({
    "type": "Polygon",
    "coordinates": [
        square_ring(),
        [[0.2, 0.2], [0.2, 0.4], [0.4, 0.4], [0.2, 0.2]]
    ]
}))]
fn well_formed_geometries_pass(#[case] geometry: Value) {
    assert_eq!(validate_geometry(&geometry), Ok(()));
}

#[rstest]
#[case::missing_type(json!({"coordinates": [0, 0]}), "type")]
#[case::null_type(json!({"type": null, "coordinates": [0, 0]}), "type")]
#[case::missing_coordinates(json!({"type": "Point"}), "coordinates")]
#[case::not_an_object(Value::Null, "type")]
fn absent_fields_are_reported(#[case] geometry: Value, #[case] field: &'static str) {
    let error = validate_geometry(&geometry).expect_err("missing field should fail");
    assert_eq!(error, GeometryError::MissingField { field });
}

#[rstest]
#[case::multi_polygon(json!({"type": "MultiPolygon", "coordinates": []}), "MultiPolygon")]
#[case::numeric_type(json!({"type": 3, "coordinates": []}), "3")]
fn unknown_types_are_unsupported(#[case] geometry: Value, #[case] kind: &str) {
    let error = validate_geometry(&geometry).expect_err("unsupported type should fail");
    assert_eq!(
        error,
        GeometryError::UnsupportedType {
            kind: kind.to_owned()
        }
    );
}

#[rstest]
#[case::point_three_values(json!({"type": "Point", "coordinates": [1, 2, 3]}))]
#[case::point_strings(json!({"type": "Point", "coordinates": ["1", "2"]}))]
#[case::point_scalar(json!({"type": "Point", "coordinates": 4}))]
#[case::line_single_position(json!({"type": "LineString", "coordinates": [[0, 0]]}))]
#[case::line_bad_pair(json!({"type": "LineString", "coordinates": [[0, 0], [1]]}))]
#[case::polygon_no_rings(json!({"type": "Polygon", "coordinates": []}))]
#[case::polygon_short_hole(json!({
    "type": "Polygon",
    "coordinates": [square_ring(), [[0.2, 0.2], [0.3, 0.3], [0.2, 0.2]]]
}))]
fn malformed_coordinates_are_rejected(#[case] geometry: Value) {
    let error = validate_geometry(&geometry).expect_err("malformed coordinates should fail");
    assert!(matches!(error, GeometryError::MalformedCoordinates { .. }));
}

#[rstest]
fn short_unclosed_ring_fails_length_check_before_closure() {
    let geometry = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]]});

    let error = validate_geometry(&geometry).expect_err("three-point ring should fail");

    assert_eq!(
        error,
        GeometryError::MalformedCoordinates {
            kind: "Polygon",
            expected: "at least one ring with 4+ [number, number] pairs",
        }
    );
}

#[rstest]
#[case::four_points(json!([[0, 0], [1, 0], [1, 1], [0, 1]]))]
#[case::five_points(json!([[0, 0], [1, 0], [1, 1], [0, 1], [0.1, 0]]))]
fn open_outer_rings_are_unclosed(#[case] ring: Value) {
    let geometry = json!({"type": "Polygon", "coordinates": [ring]});
    assert_eq!(
        validate_geometry(&geometry),
        Err(GeometryError::UnclosedRing)
    );
}

#[rstest]
fn only_the_outer_ring_must_be_closed() {
    let geometry = json!({
        "type": "Polygon",
        "coordinates": [square_ring(), [[0.2, 0.2], [0.2, 0.4], [0.4, 0.4], [0.4, 0.2]]]
    });
    assert_eq!(validate_geometry(&geometry), Ok(()));
}

#[rstest]
fn parse_geometry_converts_integers_to_floats() {
    let geometry = json!({"type": "Polygon", "coordinates": [square_ring()]});

    let parsed = parse_geometry(&geometry).expect("square should parse");

    assert_eq!(
        parsed,
        Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [1.0, 0.0],
            [0.0, 0.0],
        ]])
    );
}
