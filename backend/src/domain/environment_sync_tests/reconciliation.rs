//! Behavioural coverage for association, zone, POI and containment phases.

use mockall::Sequence;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::ports::{
    EnvironmentSyncCommand, MockEnvironmentRepository, MockPoiRepository, MockZoneRepository,
    SyncRequest, ZoneRepositoryError,
};
use crate::domain::{Association, AssociationId, ErrorCode, PoiZoneLink, UserId};

fn private_environment_repo() -> MockEnvironmentRepository {
    let mut environments = MockEnvironmentRepository::new();
    environments
        .expect_get_environment()
        .times(1)
        .return_once(|_| Ok(Some(stored_environment(false, Some(MapId::new(2))))));
    expect_applied_update(&mut environments, stored_environment(false, Some(MapId::new(2))));
    environments
}

fn existing_association(user: i64) -> Association {
    Association {
        id: AssociationId::new(31),
        env_id: ENV_ID,
        user_id: UserId::new(user),
    }
}

#[rstest]
#[tokio::test]
async fn association_is_left_alone_when_owner_is_unchanged() {
    let mut environments = private_environment_repo();
    environments
        .expect_find_association()
        .times(1)
        .return_once(|_| Ok(Some(existing_association(7))));
    environments.expect_update_association().times(0);
    environments.expect_create_association().times(0);
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    service
        .update(
            ENV_ID,
            SyncRequest::new(collection(json!({"userId": "7"}), json!([]))),
        )
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn association_follows_new_owner() {
    let mut environments = private_environment_repo();
    environments
        .expect_find_association()
        .times(1)
        .return_once(|_| Ok(Some(existing_association(7))));
    environments
        .expect_update_association()
        .withf(|id, user_id| *id == AssociationId::new(31) && *user_id == UserId::new(8))
        .times(1)
        .return_once(|_, _| Ok(()));
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    service
        .update(
            ENV_ID,
            SyncRequest::new(collection(json!({"userId": 8}), json!([]))),
        )
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn private_environment_without_user_keeps_links() {
    let mut environments = private_environment_repo();
    environments.expect_find_association().times(0);
    environments.expect_delete_associations().times(0);
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    service
        .update(ENV_ID, SyncRequest::new(collection(json!({}), json!([]))))
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn going_public_removes_owner_links() {
    let mut environments = private_environment_repo();
    environments
        .expect_delete_associations()
        .withf(|env_id| *env_id == ENV_ID)
        .times(1)
        .return_once(|_| Ok(1));
    environments.expect_find_association().times(0);
    let (zones, pois) = empty_categories();

    let service = make_service(environments, zones, pois);
    service
        .update(
            ENV_ID,
            SyncRequest::new(collection(
                json!({"isPublic": true, "userId": 7}),
                json!([]),
            )),
        )
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn zones_are_created_updated_and_deleted_from_one_snapshot() {
    let mut environments = private_environment_repo();
    environments.expect_find_association().times(0);

    let kept = zone_row(5, "Stage", 0.0, 10.0);
    let renamed = zone_row(6, "Bar", 20.0, 5.0);
    let dropped = zone_row(7, "Cloakroom", 40.0, 5.0);
    let payload = collection(
        json!({}),
        json!([
            {"type": "Feature", "properties": {"type": "zone", "id": 5, "name": "Stage"}, "geometry": square_geometry(0.0, 10.0)},
            {"type": "Feature", "properties": {"type": "zone", "id": "6", "name": "Lounge"}, "geometry": square_geometry(20.0, 5.0)},
            {"type": "Feature", "properties": {"type": "zone", "id": 0, "name": "Foyer"}, "geometry": square_geometry(60.0, 5.0)},
            {"type": "Feature", "properties": {"type": "zone", "id": 404, "name": "Ghost"}, "geometry": square_geometry(80.0, 5.0)}
        ]),
    );

    let mut zones = MockZoneRepository::new();
    let mut sequence = Sequence::new();
    zones
        .expect_list_zones()
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(move |_| Ok(vec![kept, renamed, dropped]));
    zones
        .expect_create_zone()
        .withf(|env_id, content| *env_id == ENV_ID && content.name.as_deref() == Some("Foyer"))
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|env_id, content| {
            Ok(Zone {
                id: ZoneId::new(8),
                env_id,
                content: content.clone(),
            })
        });
    zones
        .expect_update_zone()
        .withf(|id, content| *id == ZoneId::new(6) && content.name.as_deref() == Some("Lounge"))
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_, _| Ok(()));
    zones
        .expect_delete_zones()
        .withf(|ids| ids.to_vec() == vec![ZoneId::new(7)])
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_| Ok(1));
    zones
        .expect_list_zones()
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_| Ok(Vec::new()));
    let mut pois = MockPoiRepository::new();
    pois.expect_list_pois().returning(|_| Ok(Vec::new()));

    let service = make_service(environments, zones, pois);
    service
        .update(ENV_ID, SyncRequest::new(payload))
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn containment_links_are_detected_and_recorded() {
    let mut environments = private_environment_repo();
    environments.expect_find_association().times(0);

    let mut zones = MockZoneRepository::new();
    zones
        .expect_list_zones()
        .returning(|_| Ok(vec![zone_row(1, "Hall", 0.0, 10.0)]));
    let mut pois = MockPoiRepository::new();
    pois.expect_list_pois().returning(|_| {
        Ok(vec![
            poi_row(2, "Inside", 5.0, 5.0),
            poi_row(3, "Outside", 50.0, 50.0),
        ])
    });
    pois.expect_record_poi_zone_links()
        .withf(|links| {
            links.to_vec()
                == vec![PoiZoneLink {
                    poi_id: PoiId::new(2),
                    zone_id: ZoneId::new(1),
                }]
        })
        .times(1)
        .return_once(|links| Ok(links.len() as u64));

    let payload = collection(
        json!({}),
        json!([
            {"type": "Feature", "properties": {"type": "zone", "id": 1, "name": "Hall"}, "geometry": square_geometry(0.0, 10.0)},
            {"type": "Feature", "properties": {"type": "poi", "id": 2, "name": "Inside"}, "geometry": {"type": "Point", "coordinates": [5.0, 5.0]}},
            {"type": "Feature", "properties": {"type": "poi", "id": 3, "name": "Outside"}, "geometry": {"type": "Point", "coordinates": [50.0, 50.0]}}
        ]),
    );
    let service = make_service(environments, zones, pois);
    let outcome = service
        .update(ENV_ID, SyncRequest::new(payload))
        .await
        .expect("update succeeds");

    assert_eq!(outcome.zones.len(), 1);
    assert_eq!(outcome.pois.len(), 2);
    assert_eq!(
        outcome.links,
        vec![PoiZoneLink {
            poi_id: PoiId::new(2),
            zone_id: ZoneId::new(1),
        }]
    );
}

#[rstest]
#[tokio::test]
async fn link_persistence_can_be_disabled() {
    let mut environments = private_environment_repo();
    environments.expect_find_association().times(0);
    let mut zones = MockZoneRepository::new();
    zones
        .expect_list_zones()
        .returning(|_| Ok(vec![zone_row(1, "Hall", 0.0, 10.0)]));
    let mut pois = MockPoiRepository::new();
    pois.expect_list_pois()
        .returning(|_| Ok(vec![poi_row(2, "Inside", 5.0, 5.0)]));
    pois.expect_record_poi_zone_links().times(0);

    let payload = collection(
        json!({}),
        json!([
            {"type": "Feature", "properties": {"type": "zone", "id": 1, "name": "Hall"}, "geometry": square_geometry(0.0, 10.0)},
            {"type": "Feature", "properties": {"type": "poi", "id": 2, "name": "Inside"}, "geometry": {"type": "Point", "coordinates": [5.0, 5.0]}}
        ]),
    );
    let service = make_service_with(
        environments,
        zones,
        pois,
        SyncOptions {
            persist_links: false,
            ..SyncOptions::default()
        },
    );
    let outcome = service
        .update(ENV_ID, SyncRequest::new(payload))
        .await
        .expect("update succeeds");

    assert_eq!(outcome.links.len(), 1);
}

#[rstest]
#[tokio::test]
async fn zone_store_failures_propagate_unchanged() {
    let mut environments = private_environment_repo();
    environments.expect_find_association().times(0);
    let mut zones = MockZoneRepository::new();
    zones
        .expect_list_zones()
        .times(1)
        .return_once(|_| Err(ZoneRepositoryError::connection("pool exhausted")));
    let mut pois = MockPoiRepository::new();
    pois.expect_list_pois().times(0);

    let service = make_service(environments, zones, pois);
    let error = service
        .update(ENV_ID, SyncRequest::new(collection(json!({}), json!([]))))
        .await
        .expect_err("zone store is down");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert!(error.to_string().contains("pool exhausted"));
}
