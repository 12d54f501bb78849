//! Process-local implementation of the persistence ports.
//!
//! [`InMemoryStore`] keeps every table behind one mutex so cascading deletes
//! and referential checks behave like the PostgreSQL schema: removing an
//! environment drops its delimiter, owner links, zones, POIs and containment
//! links, and a containment link must name an existing POI and zone. Ids are
//! drawn from per-table sequences starting at 1.
//!
//! The store backs `--dry-run` executions of the sync binary and the
//! end-to-end tests; clone it to hand the same tables to several services.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    EnvironmentRepository, EnvironmentRepositoryError, PoiRepository, PoiRepositoryError,
    ZoneRepository, ZoneRepositoryError,
};
use crate::domain::{
    Association, AssociationId, Delimiter, Environment, EnvironmentChanges, EnvironmentFilter,
    EnvironmentId, MapId, NewEnvironment, Poi, PoiContent, PoiId, PoiZoneLink, Ring, UserId,
    Zone, ZoneContent, ZoneId,
};

#[derive(Debug, Default)]
struct Sequences {
    maps: i64,
    environments: i64,
    associations: i64,
    zones: i64,
    pois: i64,
}

fn next(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

#[derive(Debug, Default)]
struct Tables {
    sequences: Sequences,
    maps: BTreeMap<MapId, i64>,
    environments: BTreeMap<EnvironmentId, Environment>,
    delimiters: BTreeMap<EnvironmentId, Delimiter>,
    associations: BTreeMap<AssociationId, Association>,
    zones: BTreeMap<ZoneId, Zone>,
    pois: BTreeMap<PoiId, Poi>,
    links: BTreeSet<PoiZoneLink>,
}

impl Tables {
    fn drop_links_where(&mut self, predicate: impl Fn(&PoiZoneLink) -> bool) {
        self.links.retain(|link| !predicate(link));
    }
}

/// Shared in-memory tables implementing every persistence port.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Format id recorded for a map, if the map exists.
    pub fn map_format(&self, id: MapId) -> Option<i64> {
        self.tables().maps.get(&id).copied()
    }
}

#[async_trait]
impl EnvironmentRepository for InMemoryStore {
    async fn create_map(&self, format_id: i64) -> Result<MapId, EnvironmentRepositoryError> {
        let mut tables = self.tables();
        let id = MapId::new(next(&mut tables.sequences.maps));
        tables.maps.insert(id, format_id);
        Ok(id)
    }

    async fn create_environment(
        &self,
        environment: &NewEnvironment,
    ) -> Result<Environment, EnvironmentRepositoryError> {
        let mut tables = self.tables();
        if let Some(map_id) = environment.map_id.filter(|id| !tables.maps.contains_key(id)) {
            return Err(EnvironmentRepositoryError::query(format!(
                "map {map_id} does not exist"
            )));
        }
        let id = EnvironmentId::new(next(&mut tables.sequences.environments));
        let stored = Environment {
            id,
            name: environment.name.clone(),
            address: environment.address.clone(),
            description: environment.description.clone(),
            is_public: environment.is_public,
            surface: environment.surface,
            map_id: environment.map_id,
            revision: 1,
            created_at: environment.created_at,
            updated_at: environment.created_at,
        };
        tables.environments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_environment(
        &self,
        id: EnvironmentId,
        changes: &EnvironmentChanges,
        expected_revision: Option<u32>,
    ) -> Result<Environment, EnvironmentRepositoryError> {
        let mut tables = self.tables();
        let environment = tables
            .environments
            .get_mut(&id)
            .ok_or_else(|| EnvironmentRepositoryError::not_found(id))?;
        let stale = expected_revision.filter(|expected| *expected != environment.revision);
        if let Some(expected) = stale {
            return Err(EnvironmentRepositoryError::revision_mismatch(
                id,
                expected,
                environment.revision,
            ));
        }
        changes.apply_to(environment);
        Ok(environment.clone())
    }

    async fn get_environment(
        &self,
        id: EnvironmentId,
    ) -> Result<Option<Environment>, EnvironmentRepositoryError> {
        Ok(self.tables().environments.get(&id).cloned())
    }

    async fn list_environments(
        &self,
        filter: &EnvironmentFilter,
    ) -> Result<Vec<Environment>, EnvironmentRepositoryError> {
        let tables = self.tables();
        Ok(tables
            .environments
            .values()
            .filter(|environment| {
                filter.matches(environment, tables.delimiters.contains_key(&environment.id))
            })
            .cloned()
            .collect())
    }

    async fn delete_environment(
        &self,
        id: EnvironmentId,
    ) -> Result<bool, EnvironmentRepositoryError> {
        let mut tables = self.tables();
        let Some(removed) = tables.environments.remove(&id) else {
            return Ok(false);
        };
        if let Some(map_id) = removed.map_id {
            tables.maps.remove(&map_id);
        }
        tables.delimiters.remove(&id);
        tables.associations.retain(|_, link| link.env_id != id);
        let pois: BTreeSet<PoiId> = tables
            .pois
            .values()
            .filter(|poi| poi.env_id == id)
            .map(|poi| poi.id)
            .collect();
        tables.drop_links_where(|link| pois.contains(&link.poi_id));
        tables.pois.retain(|_, poi| poi.env_id != id);
        tables.zones.retain(|_, zone| zone.env_id != id);
        Ok(true)
    }

    async fn upsert_delimiter(
        &self,
        env_id: EnvironmentId,
        coordinates: &[Ring],
    ) -> Result<Delimiter, EnvironmentRepositoryError> {
        let mut tables = self.tables();
        if !tables.environments.contains_key(&env_id) {
            return Err(EnvironmentRepositoryError::not_found(env_id));
        }
        let delimiter = Delimiter {
            env_id,
            coordinates: coordinates.to_vec(),
        };
        tables.delimiters.insert(env_id, delimiter.clone());
        Ok(delimiter)
    }

    async fn get_delimiter(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Option<Delimiter>, EnvironmentRepositoryError> {
        Ok(self.tables().delimiters.get(&env_id).cloned())
    }

    async fn create_association(
        &self,
        env_id: EnvironmentId,
        user_id: UserId,
    ) -> Result<Association, EnvironmentRepositoryError> {
        let mut tables = self.tables();
        if !tables.environments.contains_key(&env_id) {
            return Err(EnvironmentRepositoryError::not_found(env_id));
        }
        let association = Association {
            id: AssociationId::new(next(&mut tables.sequences.associations)),
            env_id,
            user_id,
        };
        tables.associations.insert(association.id, association);
        Ok(association)
    }

    async fn find_association(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Option<Association>, EnvironmentRepositoryError> {
        Ok(self
            .tables()
            .associations
            .values()
            .find(|link| link.env_id == env_id)
            .copied())
    }

    async fn update_association(
        &self,
        id: AssociationId,
        user_id: UserId,
    ) -> Result<(), EnvironmentRepositoryError> {
        let mut tables = self.tables();
        let link = tables.associations.get_mut(&id).ok_or_else(|| {
            EnvironmentRepositoryError::query(format!("association {id} does not exist"))
        })?;
        link.user_id = user_id;
        Ok(())
    }

    async fn delete_associations(
        &self,
        env_id: EnvironmentId,
    ) -> Result<u64, EnvironmentRepositoryError> {
        let mut tables = self.tables();
        let before = tables.associations.len();
        tables.associations.retain(|_, link| link.env_id != env_id);
        Ok((before - tables.associations.len()) as u64)
    }
}

#[async_trait]
impl ZoneRepository for InMemoryStore {
    async fn list_zones(&self, env_id: EnvironmentId) -> Result<Vec<Zone>, ZoneRepositoryError> {
        Ok(self
            .tables()
            .zones
            .values()
            .filter(|zone| zone.env_id == env_id)
            .cloned()
            .collect())
    }

    async fn create_zone(
        &self,
        env_id: EnvironmentId,
        content: &ZoneContent,
    ) -> Result<Zone, ZoneRepositoryError> {
        let mut tables = self.tables();
        if !tables.environments.contains_key(&env_id) {
            return Err(ZoneRepositoryError::query(format!(
                "environment {env_id} does not exist"
            )));
        }
        let zone = Zone {
            id: ZoneId::new(next(&mut tables.sequences.zones)),
            env_id,
            content: content.clone(),
        };
        tables.zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn update_zone(
        &self,
        id: ZoneId,
        content: &ZoneContent,
    ) -> Result<(), ZoneRepositoryError> {
        let mut tables = self.tables();
        let zone = tables
            .zones
            .get_mut(&id)
            .ok_or_else(|| ZoneRepositoryError::query(format!("zone {id} does not exist")))?;
        zone.content = content.clone();
        Ok(())
    }

    async fn delete_zones(&self, ids: &[ZoneId]) -> Result<u64, ZoneRepositoryError> {
        let mut tables = self.tables();
        let mut removed = 0;
        for id in ids {
            if tables.zones.remove(id).is_some() {
                removed += 1;
            }
        }
        tables.drop_links_where(|link| ids.contains(&link.zone_id));
        Ok(removed)
    }
}

#[async_trait]
impl PoiRepository for InMemoryStore {
    async fn list_pois(&self, env_id: EnvironmentId) -> Result<Vec<Poi>, PoiRepositoryError> {
        Ok(self
            .tables()
            .pois
            .values()
            .filter(|poi| poi.env_id == env_id)
            .cloned()
            .collect())
    }

    async fn create_poi(
        &self,
        env_id: EnvironmentId,
        content: &PoiContent,
    ) -> Result<Poi, PoiRepositoryError> {
        let mut tables = self.tables();
        if !tables.environments.contains_key(&env_id) {
            return Err(PoiRepositoryError::query(format!(
                "environment {env_id} does not exist"
            )));
        }
        let poi = Poi {
            id: PoiId::new(next(&mut tables.sequences.pois)),
            env_id,
            content: content.clone(),
        };
        tables.pois.insert(poi.id, poi.clone());
        Ok(poi)
    }

    async fn update_poi(&self, id: PoiId, content: &PoiContent) -> Result<(), PoiRepositoryError> {
        let mut tables = self.tables();
        let poi = tables
            .pois
            .get_mut(&id)
            .ok_or_else(|| PoiRepositoryError::query(format!("poi {id} does not exist")))?;
        poi.content = content.clone();
        Ok(())
    }

    async fn delete_pois(&self, ids: &[PoiId]) -> Result<u64, PoiRepositoryError> {
        let mut tables = self.tables();
        let mut removed = 0;
        for id in ids {
            if tables.pois.remove(id).is_some() {
                removed += 1;
            }
        }
        tables.drop_links_where(|link| ids.contains(&link.poi_id));
        Ok(removed)
    }

    async fn record_poi_zone_links(
        &self,
        links: &[PoiZoneLink],
    ) -> Result<u64, PoiRepositoryError> {
        let mut tables = self.tables();
        if let Some(dangling) = links.iter().find(|link| {
            !tables.pois.contains_key(&link.poi_id) || !tables.zones.contains_key(&link.zone_id)
        }) {
            return Err(PoiRepositoryError::query(format!(
                "link between poi {} and zone {} references a missing row",
                dangling.poi_id, dangling.zone_id
            )));
        }
        let mut inserted = 0;
        for link in links {
            if tables.links.insert(*link) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_poi_zone_links(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Vec<PoiZoneLink>, PoiRepositoryError> {
        let tables = self.tables();
        Ok(tables
            .links
            .iter()
            .filter(|link| {
                tables
                    .pois
                    .get(&link.poi_id)
                    .is_some_and(|poi| poi.env_id == env_id)
            })
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests;
