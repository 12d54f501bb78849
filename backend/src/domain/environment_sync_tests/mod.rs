//! Shared fixtures and module wiring for environment synchronisation tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::{Value, json};

use super::{EnvironmentSyncService, SyncOptions};
use crate::domain::ports::{MockEnvironmentRepository, MockPoiRepository, MockZoneRepository};
use crate::domain::{
    Environment, EnvironmentChanges, EnvironmentId, Geometry, MapId, Poi, PoiContent, PoiId, Zone,
    ZoneContent, ZoneId,
};

mod lifecycle;
mod reconciliation;

pub(super) type TestService =
    EnvironmentSyncService<MockEnvironmentRepository, MockZoneRepository, MockPoiRepository>;

pub(super) const ENV_ID: EnvironmentId = EnvironmentId::new(41);

pub(super) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 8, 15, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(super) fn make_service(
    environments: MockEnvironmentRepository,
    zones: MockZoneRepository,
    pois: MockPoiRepository,
) -> TestService {
    EnvironmentSyncService::new(
        Arc::new(environments),
        Arc::new(zones),
        Arc::new(pois),
        Arc::new(FixtureClock {
            utc_now: fixture_timestamp(),
        }),
    )
}

pub(super) fn make_service_with(
    environments: MockEnvironmentRepository,
    zones: MockZoneRepository,
    pois: MockPoiRepository,
    options: SyncOptions,
) -> TestService {
    make_service(environments, zones, pois).with_options(options)
}

pub(super) fn stored_environment(is_public: bool, map_id: Option<MapId>) -> Environment {
    Environment {
        id: ENV_ID,
        name: "Halle Tony Garnier".to_owned(),
        address: Some("20 Place Docteurs Charles et Christophe Mérieux".to_owned()),
        description: Some("Concert hall".to_owned()),
        is_public,
        surface: Some(17_000.0),
        map_id,
        revision: 3,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

/// Expect one `update_environment` call that applies the changes to
/// `stored`.
pub(super) fn expect_applied_update(repo: &mut MockEnvironmentRepository, stored: Environment) {
    repo.expect_update_environment()
        .times(1)
        .return_once(move |_, changes: &EnvironmentChanges, _| {
            let mut updated = stored;
            changes.apply_to(&mut updated);
            Ok(updated)
        });
}

pub(super) fn square_coordinates(origin: f64, size: f64) -> Vec<Vec<[f64; 2]>> {
    vec![vec![
        [origin, origin],
        [origin, origin + size],
        [origin + size, origin + size],
        [origin + size, origin],
        [origin, origin],
    ]]
}

pub(super) fn square_geometry(origin: f64, size: f64) -> Value {
    json!({"type": "Polygon", "coordinates": square_coordinates(origin, size)})
}

pub(super) fn zone_row(id: i64, name: &str, origin: f64, size: f64) -> Zone {
    Zone {
        id: ZoneId::new(id),
        env_id: ENV_ID,
        content: ZoneContent {
            name: Some(name.to_owned()),
            description: None,
            geometry: Geometry::Polygon(square_coordinates(origin, size)),
            type_id: None,
        },
    }
}

pub(super) fn poi_row(id: i64, name: &str, x: f64, y: f64) -> Poi {
    Poi {
        id: PoiId::new(id),
        env_id: ENV_ID,
        content: PoiContent {
            name: Some(name.to_owned()),
            description: None,
            geometry: Geometry::Point([x, y]),
            image_url: None,
            category_id: None,
        },
    }
}

pub(super) fn collection(environment: Value, features: Value) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
        "properties": {"environment": environment}
    })
}

/// Zone and POI repositories holding no rows and accepting no writes.
pub(super) fn empty_categories() -> (MockZoneRepository, MockPoiRepository) {
    let mut zones = MockZoneRepository::new();
    zones.expect_list_zones().returning(|_| Ok(Vec::new()));
    let mut pois = MockPoiRepository::new();
    pois.expect_list_pois().returning(|_| Ok(Vec::new()));
    (zones, pois)
}
