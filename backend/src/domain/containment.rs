//! POI-in-zone containment.
//!
//! Every (POI, zone) pair is tested independently against the zone's outer
//! ring:
//! - a point is inside when it lies in the polygon or on its boundary;
//! - a line is inside when any of its vertices is (a loose "intersects");
//! - a polygon is inside when the zone contains it, after its outer ring has
//!   been closed.
//!
//! A pair whose geometry cannot form a valid polygon is logged and counted as
//! not contained; it never aborts the batch. The scan is O(zones × POIs),
//! which holds for the tens of zones an environment carries. Larger sites
//! would need an R-tree over zone bounding boxes.

use geo::{Contains, Intersects};
use geo_types::{LineString, Point, Polygon};
use thiserror::Error;
use tracing::warn;

use super::geometry::{Geometry, Position, close_ring};
use super::poi::{Poi, PoiZoneLink};
use super::zone::Zone;

const MIN_RING_POSITIONS: usize = 4;

/// Reasons a containment pair cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainmentError {
    /// Zone geometry has no polygon outline.
    #[error("zone geometry is a {kind}, not a Polygon")]
    ZoneNotPolygon {
        /// Actual geometry type.
        kind: &'static str,
    },
    /// Ring has fewer than four positions.
    #[error("ring has {positions} positions, at least 4 are required")]
    DegenerateRing {
        /// Number of positions found.
        positions: usize,
    },
    /// Zone ring's first and last positions differ.
    #[error("zone ring is not closed")]
    UnclosedRing,
}

/// Find every POI lying inside every zone.
pub fn detect_pois_inside_zones(zones: &[Zone], pois: &[Poi]) -> Vec<PoiZoneLink> {
    let mut links = Vec::new();
    for poi in pois {
        for zone in zones {
            match poi_inside_zone(&poi.content.geometry, &zone.content.geometry) {
                Ok(true) => links.push(PoiZoneLink {
                    poi_id: poi.id,
                    zone_id: zone.id,
                }),
                Ok(false) => {}
                Err(error) => warn!(
                    poi_id = %poi.id,
                    zone_id = %zone.id,
                    %error,
                    "containment check failed; treating POI as outside zone"
                ),
            }
        }
    }
    links
}

/// Test a single POI geometry against a zone geometry.
pub fn poi_inside_zone(poi: &Geometry, zone: &Geometry) -> Result<bool, ContainmentError> {
    let zone_polygon = zone_polygon(zone)?;

    match poi {
        Geometry::Point(position) => Ok(zone_polygon.intersects(&Point::from(*position))),
        Geometry::LineString(positions) => Ok(positions
            .iter()
            .any(|position| zone_polygon.intersects(&Point::from(*position)))),
        Geometry::Polygon(rings) => {
            let outer = rings.first().map(|ring| close_ring(ring)).unwrap_or_default();
            let poi_polygon = polygon(&outer)?;
            Ok(zone_polygon.contains(&poi_polygon))
        }
    }
}

fn zone_polygon(zone: &Geometry) -> Result<Polygon<f64>, ContainmentError> {
    let ring = zone
        .outer_ring()
        .ok_or(ContainmentError::ZoneNotPolygon { kind: zone.kind() })?;
    if ring.first() != ring.last() {
        return Err(ContainmentError::UnclosedRing);
    }
    polygon(ring)
}

fn polygon(ring: &[Position]) -> Result<Polygon<f64>, ContainmentError> {
    if ring.len() < MIN_RING_POSITIONS {
        return Err(ContainmentError::DegenerateRing {
            positions: ring.len(),
        });
    }
    Ok(Polygon::new(LineString::from(ring.to_vec()), Vec::new()))
}

#[cfg(test)]
#[path = "containment_tests.rs"]
mod tests;
