//! Behavioural coverage for create, update and finalize flows.

use mockall::Sequence;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    EnvironmentRepositoryError, EnvironmentSyncCommand, MockEnvironmentRepository,
    MockPoiRepository, MockZoneRepository, SyncRequest,
};
use crate::domain::{
    Association, AssociationId, Delimiter, Error, ErrorCode, GeometryError, NewEnvironment,
    UserId,
};

#[rstest]
#[case::not_a_collection(json!({"type": "Feature", "features": []}))]
#[case::features_missing(json!({"type": "FeatureCollection"}))]
#[tokio::test]
async fn malformed_payload_touches_no_repository(#[case] payload: Value) {
    let service = make_service(
        MockEnvironmentRepository::new(),
        MockZoneRepository::new(),
        MockPoiRepository::new(),
    );

    let error = service
        .create(SyncRequest::new(payload))
        .await
        .expect_err("payload is malformed");

    assert!(matches!(error, Error::InvalidFormat { .. }));
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn unclosed_polygon_aborts_update_before_any_write() {
    let payload = collection(
        json!({"name": "Hall"}),
        json!([{
            "type": "Feature",
            "properties": {"type": "zone", "name": "Stage"},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [0, 1], [1, 1], [1, 0]]]}
        }]),
    );
    let service = make_service(
        MockEnvironmentRepository::new(),
        MockZoneRepository::new(),
        MockPoiRepository::new(),
    );

    let error = service
        .update(ENV_ID, SyncRequest::new(payload))
        .await
        .expect_err("ring is not closed");

    assert_eq!(error, Error::Geometry(GeometryError::UnclosedRing));
}

#[rstest]
#[tokio::test]
async fn create_builds_map_environment_delimiter_and_owner_link() {
    let payload = collection(
        json!({"name": "Hall", "address": "1 Quai", "userId": 7, "surface": "310"}),
        json!([{
            "type": "Feature",
            "properties": {"type": "environment"},
            "geometry": square_geometry(0.0, 100.0)
        }]),
    );

    let mut environments = MockEnvironmentRepository::new();
    let mut sequence = Sequence::new();
    environments
        .expect_create_map()
        .withf(|format_id| *format_id == 1)
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_| Ok(MapId::new(90)));
    environments
        .expect_create_environment()
        .withf(|new: &NewEnvironment| {
            new.name == "Hall"
                && new.map_id == Some(MapId::new(90))
                && !new.is_public
                && new.surface == Some(310.0)
        })
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|new| {
            Ok(Environment {
                id: ENV_ID,
                name: new.name.clone(),
                address: new.address.clone(),
                description: new.description.clone(),
                is_public: new.is_public,
                surface: new.surface,
                map_id: new.map_id,
                revision: 1,
                created_at: new.created_at,
                updated_at: new.created_at,
            })
        });
    environments
        .expect_upsert_delimiter()
        .withf(|env_id, rings| *env_id == ENV_ID && rings.len() == 1)
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|env_id, rings| {
            Ok(Delimiter {
                env_id,
                coordinates: rings.to_vec(),
            })
        });
    environments
        .expect_find_association()
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_| Ok(None));
    environments
        .expect_create_association()
        .withf(|env_id, user_id| *env_id == ENV_ID && *user_id == UserId::new(7))
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|env_id, user_id| {
            Ok(Association {
                id: AssociationId::new(1),
                env_id,
                user_id,
            })
        });
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    let outcome = service
        .create(SyncRequest::new(payload))
        .await
        .expect("create succeeds");

    assert_eq!(outcome.environment.revision, 1);
    assert_eq!(outcome.environment.created_at, fixture_timestamp());
    assert!(outcome.zones.is_empty());
    assert!(outcome.links.is_empty());
}

#[rstest]
#[tokio::test]
async fn create_without_name_is_rejected_before_writing() {
    let service = make_service(
        MockEnvironmentRepository::new(),
        MockZoneRepository::new(),
        MockPoiRepository::new(),
    );

    let error = service
        .create(SyncRequest::new(collection(json!({"address": "x"}), json!([]))))
        .await
        .expect_err("name is required");

    assert!(matches!(error, Error::InvalidFormat { .. }));
}

#[rstest]
#[tokio::test]
async fn update_of_unknown_environment_is_not_found() {
    let mut environments = MockEnvironmentRepository::new();
    environments
        .expect_get_environment()
        .times(1)
        .return_once(|_| Ok(None));
    environments.expect_update_environment().times(0);

    let service = make_service(
        environments,
        MockZoneRepository::new(),
        MockPoiRepository::new(),
    );
    let error = service
        .update(ENV_ID, SyncRequest::new(collection(json!({}), json!([]))))
        .await
        .expect_err("environment is missing");

    assert_eq!(error, Error::not_found(ENV_ID));
}

#[rstest]
#[tokio::test]
async fn stale_revision_surfaces_as_conflict() {
    let mut environments = MockEnvironmentRepository::new();
    environments
        .expect_get_environment()
        .times(1)
        .return_once(|_| Ok(Some(stored_environment(false, Some(MapId::new(2))))));
    environments
        .expect_update_environment()
        .withf(|_, _, expected| *expected == Some(2))
        .times(1)
        .return_once(|id, _, _| {
            Err(EnvironmentRepositoryError::revision_mismatch(id, 2_u32, 3_u32))
        });

    let service = make_service(
        environments,
        MockZoneRepository::new(),
        MockPoiRepository::new(),
    );
    let request =
        SyncRequest::new(collection(json!({"name": "Late"}), json!([]))).with_expected_revision(2);
    let error = service
        .update(ENV_ID, request)
        .await
        .expect_err("revision is stale");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(
        error,
        Error::Conflict {
            id: ENV_ID,
            expected: 2,
            actual: 3,
        }
    );
}

#[rstest]
#[tokio::test]
async fn update_applies_every_environment_field() {
    let mut environments = MockEnvironmentRepository::new();
    let stored = stored_environment(true, Some(MapId::new(2)));
    environments
        .expect_get_environment()
        .times(1)
        .return_once({
            let stored = stored.clone();
            move |_| Ok(Some(stored))
        });
    environments
        .expect_update_environment()
        .withf(|_, changes, expected| {
            changes.name.as_deref() == Some("Renamed")
                && changes.description.as_deref() == Some("Refit")
                && changes.is_public == Some(true)
                && changes.surface == Some(99.5)
                && changes.map_id.is_none()
                && expected.is_none()
        })
        .times(1)
        .return_once(move |_, changes, _| {
            let mut updated = stored;
            changes.apply_to(&mut updated);
            Ok(updated)
        });
    environments
        .expect_delete_associations()
        .times(1)
        .return_once(|_| Ok(0));
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    let payload = collection(
        json!({"name": "Renamed", "description": "Refit", "isPublic": true, "surface": 99.5}),
        json!([]),
    );
    let outcome = service
        .update(ENV_ID, SyncRequest::new(payload))
        .await
        .expect("update succeeds");

    assert_eq!(outcome.environment.name, "Renamed");
    assert_eq!(outcome.environment.revision, 4);
    assert_eq!(outcome.environment.updated_at, fixture_timestamp());
}

#[rstest]
#[tokio::test]
async fn finalize_takes_only_name_and_address_and_creates_missing_map() {
    let mut environments = MockEnvironmentRepository::new();
    let stored = stored_environment(true, None);
    environments
        .expect_get_environment()
        .times(1)
        .return_once({
            let stored = stored.clone();
            move |_| Ok(Some(stored))
        });
    environments
        .expect_create_map()
        .times(1)
        .return_once(|_| Ok(MapId::new(12)));
    environments
        .expect_update_environment()
        .withf(|_, changes, _| {
            changes.name.as_deref() == Some("Final")
                && changes.address.is_none()
                && changes.description.is_none()
                && changes.is_public.is_none()
                && changes.surface.is_none()
                && changes.map_id == Some(MapId::new(12))
        })
        .times(1)
        .return_once(move |_, changes, _| {
            let mut updated = stored;
            changes.apply_to(&mut updated);
            Ok(updated)
        });
    environments
        .expect_delete_associations()
        .times(1)
        .return_once(|_| Ok(0));
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    let payload = collection(
        json!({"name": "Final", "description": "ignored", "isPublic": false, "surface": 1}),
        json!([]),
    );
    let outcome = service
        .finalize(ENV_ID, SyncRequest::new(payload))
        .await
        .expect("finalize succeeds");

    assert_eq!(outcome.environment.name, "Final");
    assert_eq!(
        outcome.environment.address,
        stored_environment(true, None).address
    );
    assert_eq!(outcome.environment.description.as_deref(), Some("Concert hall"));
    assert_eq!(outcome.environment.map_id, Some(MapId::new(12)));
}

#[rstest]
#[tokio::test]
async fn finalize_keeps_existing_map() {
    let mut environments = MockEnvironmentRepository::new();
    environments
        .expect_get_environment()
        .times(1)
        .return_once(|_| Ok(Some(stored_environment(true, Some(MapId::new(5))))));
    environments.expect_create_map().times(0);
    expect_applied_update(&mut environments, stored_environment(true, Some(MapId::new(5))));
    environments
        .expect_delete_associations()
        .times(1)
        .return_once(|_| Ok(0));
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    let outcome = service
        .finalize(ENV_ID, SyncRequest::new(collection(json!({}), json!([]))))
        .await
        .expect("finalize succeeds");

    assert_eq!(outcome.environment.map_id, Some(MapId::new(5)));
    assert_eq!(outcome.environment.name, "Halle Tony Garnier");
}

#[rstest]
#[tokio::test]
async fn stale_finalize_is_rejected_before_creating_a_map() {
    let mut environments = MockEnvironmentRepository::new();
    environments
        .expect_get_environment()
        .times(1)
        .return_once(|_| Ok(Some(stored_environment(false, None))));
    environments.expect_create_map().times(0);
    environments.expect_update_environment().times(0);

    let service = make_service(
        environments,
        MockZoneRepository::new(),
        MockPoiRepository::new(),
    );
    let request = SyncRequest::new(collection(json!({"name": "Final"}), json!([])))
        .with_expected_revision(7);
    let error = service
        .finalize(ENV_ID, request)
        .await
        .expect_err("revision is stale");

    assert_eq!(
        error,
        Error::Conflict {
            id: ENV_ID,
            expected: 7,
            actual: 3,
        }
    );
}
