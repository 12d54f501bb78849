//! Behaviour of the in-memory tables against the port contracts.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{DelimiterStatus, Geometry, Visibility};

fn new_environment(name: &str, is_public: bool) -> NewEnvironment {
    NewEnvironment {
        name: name.to_owned(),
        address: Some("3 Quai Perrache".to_owned()),
        description: None,
        is_public,
        surface: None,
        map_id: None,
        created_at: Utc
            .with_ymd_and_hms(2026, 2, 10, 7, 30, 0)
            .single()
            .expect("valid fixture timestamp"),
    }
}

fn zone_content(name: &str) -> ZoneContent {
    ZoneContent {
        name: Some(name.to_owned()),
        description: None,
        geometry: Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 4.0],
            [0.0, 4.0],
            [0.0, 0.0],
        ]]),
        type_id: None,
    }
}

fn poi_content(name: &str) -> PoiContent {
    PoiContent {
        name: Some(name.to_owned()),
        description: None,
        geometry: Geometry::Point([1.0, 1.0]),
        image_url: None,
        category_id: None,
    }
}

#[fixture]
fn store() -> InMemoryStore {
    InMemoryStore::new()
}

#[rstest]
#[tokio::test]
async fn environments_start_at_revision_one(store: InMemoryStore) {
    let map_id = store.create_map(3).await.expect("map");
    let mut draft = new_environment("Gare", false);
    draft.map_id = Some(map_id);

    let created = store.create_environment(&draft).await.expect("create");

    assert_eq!(created.id, EnvironmentId::new(1));
    assert_eq!(created.revision, 1);
    assert_eq!(created.updated_at, created.created_at);
    assert_eq!(store.map_format(map_id), Some(3));
}

#[rstest]
#[tokio::test]
async fn unknown_map_is_rejected(store: InMemoryStore) {
    let mut draft = new_environment("Gare", false);
    draft.map_id = Some(MapId::new(77));

    let error = store
        .create_environment(&draft)
        .await
        .expect_err("map must exist");

    assert!(matches!(error, EnvironmentRepositoryError::Query { .. }));
}

#[rstest]
#[tokio::test]
async fn updates_check_the_expected_revision(store: InMemoryStore) {
    let created = store
        .create_environment(&new_environment("Gare", false))
        .await
        .expect("create");
    let changes = EnvironmentChanges {
        name: Some("Gare Sud".to_owned()),
        ..EnvironmentChanges::touch(created.created_at)
    };

    let updated = store
        .update_environment(created.id, &changes, Some(1))
        .await
        .expect("fresh revision");
    let stale = store
        .update_environment(created.id, &changes, Some(1))
        .await
        .expect_err("revision moved on");

    assert_eq!(updated.revision, 2);
    assert_eq!(updated.name, "Gare Sud");
    assert_eq!(
        stale,
        EnvironmentRepositoryError::revision_mismatch(created.id, 1_u32, 2_u32)
    );
}

#[rstest]
#[tokio::test]
async fn updating_a_missing_environment_is_not_found(store: InMemoryStore) {
    let id = EnvironmentId::new(12);
    let changes = EnvironmentChanges::touch(Utc::now());

    let error = store
        .update_environment(id, &changes, None)
        .await
        .expect_err("no such row");

    assert_eq!(error, EnvironmentRepositoryError::not_found(id));
}

#[rstest]
#[tokio::test]
async fn listing_applies_the_filter(store: InMemoryStore) {
    let public = store
        .create_environment(&new_environment("Halle publique", true))
        .await
        .expect("public");
    let private = store
        .create_environment(&new_environment("Atelier", false))
        .await
        .expect("private");
    store
        .upsert_delimiter(public.id, &[vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]])
        .await
        .expect("delimiter");

    let delimited = store
        .list_environments(&EnvironmentFilter::default())
        .await
        .expect("list");
    let pending_private = store
        .list_environments(&EnvironmentFilter {
            status: DelimiterStatus::Pending,
            visibility: Some(Visibility::Private),
            ..EnvironmentFilter::default()
        })
        .await
        .expect("list");
    let searched = store
        .list_environments(&EnvironmentFilter {
            status: DelimiterStatus::Any,
            search: Some("ATEL".to_owned()),
            ..EnvironmentFilter::default()
        })
        .await
        .expect("list");

    assert_eq!(delimited, vec![public]);
    assert_eq!(pending_private, vec![private.clone()]);
    assert_eq!(searched, vec![private]);
}

#[rstest]
#[tokio::test]
async fn delimiter_upsert_replaces_in_place(store: InMemoryStore) {
    let env = store
        .create_environment(&new_environment("Gare", true))
        .await
        .expect("create");
    let first = vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]];
    let second = vec![vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]]];

    store.upsert_delimiter(env.id, &first).await.expect("first");
    store.upsert_delimiter(env.id, &second).await.expect("second");

    let stored = store
        .get_delimiter(env.id)
        .await
        .expect("load")
        .expect("delimiter present");
    assert_eq!(stored.coordinates, second);
}

#[rstest]
#[tokio::test]
async fn associations_are_found_updated_and_removed(store: InMemoryStore) {
    let env = store
        .create_environment(&new_environment("Atelier", false))
        .await
        .expect("create");

    let link = store
        .create_association(env.id, UserId::new(5))
        .await
        .expect("link");
    store
        .update_association(link.id, UserId::new(6))
        .await
        .expect("reassign");
    let found = store
        .find_association(env.id)
        .await
        .expect("find")
        .expect("link present");
    let removed = store.delete_associations(env.id).await.expect("delete");

    assert_eq!(found.user_id, UserId::new(6));
    assert_eq!(removed, 1);
    assert_eq!(store.find_association(env.id).await.expect("find"), None);
}

#[rstest]
#[tokio::test]
async fn links_are_idempotent_and_need_existing_rows(store: InMemoryStore) {
    let env = store
        .create_environment(&new_environment("Gare", true))
        .await
        .expect("create");
    let zone = store
        .create_zone(env.id, &zone_content("Hall"))
        .await
        .expect("zone");
    let poi = store
        .create_poi(env.id, &poi_content("Kiosque"))
        .await
        .expect("poi");
    let link = PoiZoneLink {
        poi_id: poi.id,
        zone_id: zone.id,
    };

    let first = store.record_poi_zone_links(&[link]).await.expect("first");
    let again = store.record_poi_zone_links(&[link]).await.expect("again");
    let dangling = store
        .record_poi_zone_links(&[PoiZoneLink {
            poi_id: poi.id,
            zone_id: ZoneId::new(99),
        }])
        .await
        .expect_err("zone 99 does not exist");

    assert_eq!((first, again), (1, 0));
    assert!(matches!(dangling, PoiRepositoryError::Query { .. }));
    assert_eq!(
        store.list_poi_zone_links(env.id).await.expect("links"),
        vec![link]
    );
}

#[rstest]
#[tokio::test]
async fn deleting_a_zone_drops_its_links(store: InMemoryStore) {
    let env = store
        .create_environment(&new_environment("Gare", true))
        .await
        .expect("create");
    let zone = store
        .create_zone(env.id, &zone_content("Hall"))
        .await
        .expect("zone");
    let poi = store
        .create_poi(env.id, &poi_content("Kiosque"))
        .await
        .expect("poi");
    store
        .record_poi_zone_links(&[PoiZoneLink {
            poi_id: poi.id,
            zone_id: zone.id,
        }])
        .await
        .expect("link");

    let removed = store
        .delete_zones(&[zone.id, ZoneId::new(404)])
        .await
        .expect("delete");

    assert_eq!(removed, 1);
    assert!(
        store
            .list_poi_zone_links(env.id)
            .await
            .expect("links")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn updating_a_missing_zone_or_poi_fails(store: InMemoryStore) {
    let zone_error = store
        .update_zone(ZoneId::new(8), &zone_content("Hall"))
        .await
        .expect_err("no zone");
    let poi_error = store
        .update_poi(PoiId::new(8), &poi_content("Kiosque"))
        .await
        .expect_err("no poi");

    assert!(matches!(zone_error, ZoneRepositoryError::Query { .. }));
    assert!(matches!(poi_error, PoiRepositoryError::Query { .. }));
}

#[rstest]
#[tokio::test]
async fn deleting_an_environment_cascades(store: InMemoryStore) {
    let map_id = store.create_map(1).await.expect("map");
    let mut draft = new_environment("Atelier", false);
    draft.map_id = Some(map_id);
    let env = store.create_environment(&draft).await.expect("create");
    let other = store
        .create_environment(&new_environment("Voisin", true))
        .await
        .expect("other");
    store
        .create_association(env.id, UserId::new(2))
        .await
        .expect("owner");
    let zone = store
        .create_zone(env.id, &zone_content("Hall"))
        .await
        .expect("zone");
    let poi = store
        .create_poi(env.id, &poi_content("Kiosque"))
        .await
        .expect("poi");
    let kept = store
        .create_poi(other.id, &poi_content("Banc"))
        .await
        .expect("kept");
    store
        .record_poi_zone_links(&[PoiZoneLink {
            poi_id: poi.id,
            zone_id: zone.id,
        }])
        .await
        .expect("link");

    assert!(store.delete_environment(env.id).await.expect("delete"));
    assert!(!store.delete_environment(env.id).await.expect("second delete"));

    assert_eq!(store.get_environment(env.id).await.expect("get"), None);
    assert_eq!(store.map_format(map_id), None);
    assert_eq!(store.find_association(env.id).await.expect("find"), None);
    assert!(store.list_zones(env.id).await.expect("zones").is_empty());
    assert!(store.list_pois(env.id).await.expect("pois").is_empty());
    assert_eq!(store.list_pois(other.id).await.expect("pois"), vec![kept]);
}
