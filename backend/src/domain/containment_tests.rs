//! Unit coverage for POI/zone containment.

use geo::Centroid;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{EnvironmentId, PoiContent, PoiId, ZoneContent, ZoneId};

#[fixture]
fn unit_square() -> Geometry {
    Geometry::Polygon(vec![vec![
        [0.0, 0.0],
        [0.0, 1.0],
        [1.0, 1.0],
        [1.0, 0.0],
        [0.0, 0.0],
    ]])
}

fn zone(id: i64, geometry: Geometry) -> Zone {
    Zone {
        id: ZoneId::new(id),
        env_id: EnvironmentId::new(1),
        content: ZoneContent {
            name: Some(format!("zone-{id}")),
            description: None,
            geometry,
            type_id: None,
        },
    }
}

fn poi(id: i64, geometry: Geometry) -> Poi {
    Poi {
        id: PoiId::new(id),
        env_id: EnvironmentId::new(1),
        content: PoiContent {
            name: Some(format!("poi-{id}")),
            description: None,
            geometry,
            image_url: None,
            category_id: None,
        },
    }
}

#[rstest]
fn point_at_centroid_is_contained(unit_square: Geometry) {
    let ring = unit_square.outer_ring().expect("square has a ring").to_vec();
    let centroid = Polygon::new(LineString::from(ring), Vec::new())
        .centroid()
        .expect("square has a centroid");

    let inside = poi_inside_zone(&Geometry::Point([centroid.x(), centroid.y()]), &unit_square);

    assert_eq!(inside, Ok(true));
}

#[rstest]
#[case::far_away([250.0, -80.0], false)]
#[case::just_outside([1.0001, 0.5], false)]
#[case::on_edge([1.0, 0.5], true)]
#[case::on_vertex([0.0, 0.0], true)]
fn points_use_boundary_inclusive_test(
    unit_square: Geometry,
    #[case] position: Position,
    #[case] expected: bool,
) {
    assert_eq!(
        poi_inside_zone(&Geometry::Point(position), &unit_square),
        Ok(expected)
    );
}

#[rstest]
#[case::one_vertex_inside(vec![[0.5, 0.5], [3.0, 3.0]], true)]
#[case::crossing_without_vertices_inside(vec![[-1.0, 0.5], [2.0, 0.5]], false)]
#[case::fully_outside(vec![[2.0, 2.0], [3.0, 3.0]], false)]
fn lines_are_inside_when_any_vertex_is(
    unit_square: Geometry,
    #[case] positions: Vec<Position>,
    #[case] expected: bool,
) {
    assert_eq!(
        poi_inside_zone(&Geometry::LineString(positions), &unit_square),
        Ok(expected)
    );
}

#[rstest]
fn unclosed_poi_polygon_matches_its_closed_form(unit_square: Geometry) {
    let open = Geometry::Polygon(vec![vec![
        [0.2, 0.2],
        [0.2, 0.4],
        [0.4, 0.4],
        [0.4, 0.2],
    ]]);
    let closed = Geometry::Polygon(vec![vec![
        [0.2, 0.2],
        [0.2, 0.4],
        [0.4, 0.4],
        [0.4, 0.2],
        [0.2, 0.2],
    ]]);

    let open_result = poi_inside_zone(&open, &unit_square);
    let closed_result = poi_inside_zone(&closed, &unit_square);

    assert_eq!(open_result, Ok(true));
    assert_eq!(open_result, closed_result);
}

#[rstest]
fn overlapping_polygon_is_not_contained(unit_square: Geometry) {
    let overlapping = Geometry::Polygon(vec![vec![
        [0.5, 0.5],
        [0.5, 1.5],
        [1.5, 1.5],
        [1.5, 0.5],
        [0.5, 0.5],
    ]]);

    assert_eq!(poi_inside_zone(&overlapping, &unit_square), Ok(false));
}

#[rstest]
fn degenerate_poi_polygon_is_an_error(unit_square: Geometry) {
    let triangle_edge = Geometry::Polygon(vec![vec![[0.2, 0.2], [0.4, 0.4]]]);

    assert_eq!(
        poi_inside_zone(&triangle_edge, &unit_square),
        Err(ContainmentError::DegenerateRing { positions: 3 })
    );
}

#[rstest]
#[case::point_zone(Geometry::Point([0.0, 0.0]), ContainmentError::ZoneNotPolygon { kind: "Point" })]
#[case::open_zone(
    Geometry::Polygon(vec![vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]]),
    ContainmentError::UnclosedRing
)]
fn malformed_zones_are_errors(#[case] zone: Geometry, #[case] expected: ContainmentError) {
    assert_eq!(
        poi_inside_zone(&Geometry::Point([0.5, 0.5]), &zone),
        Err(expected)
    );
}

#[rstest]
fn detection_links_point_inside_unit_square(unit_square: Geometry) {
    let zones = vec![zone(1, unit_square)];
    let pois = vec![poi(10, Geometry::Point([0.5, 0.5]))];

    let links = detect_pois_inside_zones(&zones, &pois);

    assert_eq!(
        links,
        vec![PoiZoneLink {
            poi_id: PoiId::new(10),
            zone_id: ZoneId::new(1),
        }]
    );
}

#[rstest]
fn detection_skips_failing_pairs_and_continues(unit_square: Geometry) {
    let zones = vec![
        zone(1, Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]])),
        zone(2, unit_square),
    ];
    let pois = vec![
        poi(10, Geometry::Polygon(vec![vec![[0.1, 0.1], [0.2, 0.2]]])),
        poi(11, Geometry::Point([0.5, 0.5])),
        poi(12, Geometry::Point([9.0, 9.0])),
    ];

    let links = detect_pois_inside_zones(&zones, &pois);

    assert_eq!(
        links,
        vec![PoiZoneLink {
            poi_id: PoiId::new(11),
            zone_id: ZoneId::new(2),
        }]
    );
}
