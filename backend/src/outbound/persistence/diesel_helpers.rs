//! Shared helpers for Diesel repository implementations.
//!
//! This module provides:
//! - error message extraction for pool and Diesel failures;
//! - revision casting between database and domain types;
//! - row-to-domain conversions, including the JSONB geometry columns.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::{
    Association, AssociationId, CategoryId, Delimiter, Environment, EnvironmentId, Geometry,
    MapId, Poi, PoiContent, PoiId, PoiZoneLink, Ring, UserId, Zone, ZoneContent, ZoneId,
    ZoneTypeId,
};

use super::models::{AssociationRow, DelimiterRow, EnvironmentRow, PoiRow, PoiZoneRow, ZoneRow};
use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Extract a readable message from a Diesel error and emit debug context.
pub fn map_diesel_error_message(error: &DieselError, operation: &str) -> String {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(%error, %operation, "diesel operation failed"),
    }
    match error {
        DieselError::NotFound => format!("{operation}: record not found"),
        DieselError::QueryBuilderError(_) => format!("{operation}: database query error"),
        other => format!("{operation}: {other}"),
    }
}

/// `true` when the failure means the connection itself is unusable.
pub fn is_connection_error(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
            | DieselError::BrokenTransactionManager
    )
}

/// Cast database revision (i32) to domain revision (u32).
#[expect(
    clippy::cast_sign_loss,
    reason = "revision is always positive; the column carries a CHECK constraint"
)]
pub fn cast_revision(revision: i32) -> u32 {
    revision as u32
}

/// Cast domain revision (u32) to database revision (i32).
#[expect(
    clippy::cast_possible_wrap,
    reason = "revision values are always small positive integers"
)]
pub fn cast_revision_for_db(revision: u32) -> i32 {
    revision as i32
}

/// Serialise a geometry for a JSONB column.
pub fn geometry_to_json(geometry: &Geometry) -> Result<serde_json::Value, String> {
    serde_json::to_value(geometry).map_err(|err| format!("encode geometry: {err}"))
}

/// Serialise delimiter rings for a JSONB column.
pub fn rings_to_json(rings: &[Ring]) -> Result<serde_json::Value, String> {
    serde_json::to_value(rings).map_err(|err| format!("encode delimiter: {err}"))
}

pub(crate) fn row_to_environment(row: EnvironmentRow) -> Environment {
    Environment {
        id: EnvironmentId::new(row.id),
        name: row.name,
        address: row.address,
        description: row.description,
        is_public: row.is_public,
        surface: row.surface,
        map_id: row.map_id.map(MapId::new),
        revision: cast_revision(row.revision),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn row_to_delimiter(row: DelimiterRow) -> Result<Delimiter, String> {
    let coordinates = serde_json::from_value(row.coordinates)
        .map_err(|err| format!("decode delimiter of environment {}: {err}", row.env_id))?;
    Ok(Delimiter {
        env_id: EnvironmentId::new(row.env_id),
        coordinates,
    })
}

pub(crate) fn row_to_association(row: AssociationRow) -> Association {
    Association {
        id: AssociationId::new(row.id),
        env_id: EnvironmentId::new(row.env_id),
        user_id: UserId::new(row.user_id),
    }
}

pub(crate) fn row_to_zone(row: ZoneRow) -> Result<Zone, String> {
    let geometry = serde_json::from_value(row.geometry)
        .map_err(|err| format!("decode geometry of zone {}: {err}", row.id))?;
    Ok(Zone {
        id: ZoneId::new(row.id),
        env_id: EnvironmentId::new(row.env_id),
        content: ZoneContent {
            name: row.name,
            description: row.description,
            geometry,
            type_id: row.type_id.map(ZoneTypeId::new),
        },
    })
}

pub(crate) fn row_to_poi(row: PoiRow) -> Result<Poi, String> {
    let geometry = serde_json::from_value(row.geometry)
        .map_err(|err| format!("decode geometry of poi {}: {err}", row.id))?;
    Ok(Poi {
        id: PoiId::new(row.id),
        env_id: EnvironmentId::new(row.env_id),
        content: PoiContent {
            name: row.name,
            description: row.description,
            geometry,
            image_url: row.image_url,
            category_id: row.category_id.map(CategoryId::new),
        },
    })
}

pub(crate) fn row_to_link(row: PoiZoneRow) -> PoiZoneLink {
    PoiZoneLink {
        poi_id: PoiId::new(row.poi_id),
        zone_id: ZoneId::new(row.zone_id),
    }
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

/// Escape `LIKE` wildcards so a search term matches literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn pool_errors_keep_their_message() {
        assert_eq!(
            map_pool_error_message(PoolError::checkout("timed out")),
            "timed out"
        );
    }

    #[rstest]
    fn not_found_is_not_a_connection_failure() {
        let error = DieselError::NotFound;
        assert!(!is_connection_error(&error));
        assert!(map_diesel_error_message(&error, "load zones").contains("record not found"));
    }

    #[rstest]
    #[case(1)]
    #[case(42)]
    fn revisions_survive_the_column_cast(#[case] revision: u32) {
        assert_eq!(cast_revision(cast_revision_for_db(revision)), revision);
    }

    #[rstest]
    fn zone_rows_decode_geometry_json() {
        let row = ZoneRow {
            id: 3,
            env_id: 1,
            name: Some("Hall".to_owned()),
            description: None,
            geometry: json!({"type": "Point", "coordinates": [1.5, 2.5]}),
            type_id: Some(4),
        };

        let zone = row_to_zone(row).expect("geometry decodes");

        assert_eq!(zone.content.geometry, Geometry::Point([1.5, 2.5]));
        assert_eq!(zone.content.type_id, Some(ZoneTypeId::new(4)));
    }

    #[rstest]
    fn corrupt_poi_geometry_is_reported() {
        let row = PoiRow {
            id: 9,
            env_id: 1,
            name: None,
            description: None,
            geometry: json!({"type": "Circle"}),
            image_url: None,
            category_id: None,
        };

        let error = row_to_poi(row).expect_err("unknown geometry");
        assert!(error.contains("poi 9"));
    }

    #[rstest]
    fn environment_rows_map_revision_and_map() {
        let now = Utc::now();
        let environment = row_to_environment(EnvironmentRow {
            id: 5,
            name: "Depot".to_owned(),
            address: None,
            description: None,
            is_public: false,
            surface: None,
            map_id: Some(8),
            revision: 3,
            created_at: now,
            updated_at: now,
        });

        assert_eq!(environment.revision, 3);
        assert_eq!(environment.map_id, Some(MapId::new(8)));
    }

    #[rstest]
    #[case::plain("hall", "%hall%")]
    #[case::wildcards("50%_off", "%50\\%\\_off%")]
    fn search_terms_are_escaped(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(term), expected);
    }
}
