//! Environment synchronisation service.
//!
//! One call takes a submitted `FeatureCollection` through these phases, in
//! order:
//!
//! 1. parse, validate and classify every feature (no writes on failure);
//! 2. resolve the environment (create, or load and apply property changes);
//! 3. upsert the delimiter when an environment feature was submitted;
//! 4. align the owner association with the environment's visibility;
//! 5. reconcile zones, then POIs, against the stored rows;
//! 6. reload both categories and record POI/zone containment.
//!
//! Writes inside one category run concurrently. Categories and phases never
//! overlap.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use mockable::Clock;
use tracing::{debug, info, warn};

use super::containment::detect_pois_inside_zones;
use super::environment::{DEFAULT_MAP_FORMAT_ID, Environment, EnvironmentChanges, NewEnvironment};
use super::error::Error;
use super::feature_collection::{EnvironmentProperties, parse_feature_collection};
use super::feature_diff::diff;
use super::ids::{EnvironmentId, PoiId, ZoneId};
use super::poi::{Poi, PoiDraft, PoiZoneLink};
use super::ports::{
    EnvironmentRepository, EnvironmentSyncCommand, PoiRepository, SyncOutcome, SyncRequest,
    ZoneRepository,
};
use super::zone::{Zone, ZoneDraft};

/// Which lifecycle step a synchronisation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// First submission: creates the map record and the environment.
    Create,
    /// Full edit of an existing environment.
    Update(EnvironmentId),
    /// Completion of drawing; only name and address are taken from the
    /// submission.
    Finalize(EnvironmentId),
}

impl SyncMode {
    const fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update(_) => "update",
            Self::Finalize(_) => "finalize",
        }
    }
}

/// Tunables for [`EnvironmentSyncService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Rendering format assigned to new map records.
    pub map_format_id: i64,
    /// Store detected POI/zone links. Detection always runs.
    pub persist_links: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            map_format_id: DEFAULT_MAP_FORMAT_ID,
            persist_links: true,
        }
    }
}

/// Domain service implementing [`EnvironmentSyncCommand`].
#[derive(Clone)]
pub struct EnvironmentSyncService<E, Z, P> {
    environments: Arc<E>,
    zones: Arc<Z>,
    pois: Arc<P>,
    clock: Arc<dyn Clock>,
    options: SyncOptions,
}

impl<E, Z, P> EnvironmentSyncService<E, Z, P> {
    /// Create a service with default options.
    pub fn new(environments: Arc<E>, zones: Arc<Z>, pois: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            environments,
            zones,
            pois,
            clock,
            options: SyncOptions::default(),
        }
    }

    /// Replace the service options.
    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }
}

impl<E, Z, P> EnvironmentSyncService<E, Z, P>
where
    E: EnvironmentRepository,
    Z: ZoneRepository,
    P: PoiRepository,
{
    /// Run one synchronisation.
    pub async fn synchronise(
        &self,
        mode: SyncMode,
        request: SyncRequest,
    ) -> Result<SyncOutcome, Error> {
        let snapshot = parse_feature_collection(&request.payload)?;
        debug!(
            mode = mode.label(),
            zones = snapshot.zones.len(),
            pois = snapshot.pois.len(),
            ignored = snapshot.ignored,
            delimiter = snapshot.delimiter.is_some(),
            "feature collection parsed"
        );

        let environment = self
            .resolve_environment(mode, &snapshot.environment, request.expected_revision)
            .await?;
        let env_id = environment.id;

        if let Some(rings) = &snapshot.delimiter {
            self.environments.upsert_delimiter(env_id, rings).await?;
            debug!(%env_id, "delimiter stored");
        }

        self.sync_association(&environment, &snapshot.environment)
            .await?;
        self.sync_zones(env_id, snapshot.zones).await?;
        self.sync_pois(env_id, snapshot.pois).await?;

        let zones = self.zones.list_zones(env_id).await?;
        let pois = self.pois.list_pois(env_id).await?;
        let links = self.record_containment(&zones, &pois).await?;

        info!(
            mode = mode.label(),
            %env_id,
            revision = environment.revision,
            zones = zones.len(),
            pois = pois.len(),
            links = links.len(),
            "environment synchronised"
        );
        Ok(SyncOutcome {
            environment,
            zones,
            pois,
            links,
        })
    }

    async fn resolve_environment(
        &self,
        mode: SyncMode,
        properties: &EnvironmentProperties,
        expected_revision: Option<u32>,
    ) -> Result<Environment, Error> {
        match mode {
            SyncMode::Create => self.create_environment(properties).await,
            SyncMode::Update(id) => {
                self.load(id).await?;
                let changes = EnvironmentChanges {
                    name: properties.name.clone(),
                    address: properties.address.clone(),
                    description: properties.description.clone(),
                    is_public: properties.is_public,
                    surface: properties.surface,
                    ..EnvironmentChanges::touch(self.clock.utc())
                };
                Ok(self
                    .environments
                    .update_environment(id, &changes, expected_revision)
                    .await?)
            }
            SyncMode::Finalize(id) => {
                let existing = self.load(id).await?;
                ensure_revision(&existing, expected_revision)?;
                let map_id = match existing.map_id {
                    Some(_) => None,
                    None => {
                        let map_id = self
                            .environments
                            .create_map(self.options.map_format_id)
                            .await?;
                        info!(%id, %map_id, "created missing map record");
                        Some(map_id)
                    }
                };
                let changes = EnvironmentChanges {
                    name: properties.name.clone(),
                    address: properties.address.clone(),
                    map_id,
                    ..EnvironmentChanges::touch(self.clock.utc())
                };
                Ok(self
                    .environments
                    .update_environment(id, &changes, expected_revision)
                    .await?)
            }
        }
    }

    async fn create_environment(
        &self,
        properties: &EnvironmentProperties,
    ) -> Result<Environment, Error> {
        let name = properties
            .name
            .clone()
            .ok_or_else(|| Error::invalid_format("properties.environment.name is required"))?;
        let map_id = self
            .environments
            .create_map(self.options.map_format_id)
            .await?;
        let environment = self
            .environments
            .create_environment(&NewEnvironment {
                name,
                address: properties.address.clone(),
                description: properties.description.clone(),
                is_public: properties.is_public.unwrap_or(false),
                surface: properties.surface,
                map_id: Some(map_id),
                created_at: self.clock.utc(),
            })
            .await?;
        info!(env_id = %environment.id, %map_id, "environment created");
        Ok(environment)
    }

    async fn load(&self, id: EnvironmentId) -> Result<Environment, Error> {
        self.environments
            .get_environment(id)
            .await?
            .ok_or(Error::not_found(id))
    }

    async fn sync_association(
        &self,
        environment: &Environment,
        properties: &EnvironmentProperties,
    ) -> Result<(), Error> {
        let env_id = environment.id;
        if environment.is_public {
            let removed = self.environments.delete_associations(env_id).await?;
            if removed > 0 {
                debug!(%env_id, removed, "public environment; owner links removed");
            }
            return Ok(());
        }

        let Some(user_id) = properties.user_id else {
            return Ok(());
        };
        match self.environments.find_association(env_id).await? {
            Some(existing) if existing.user_id == user_id => {}
            Some(existing) => {
                self.environments
                    .update_association(existing.id, user_id)
                    .await?;
                debug!(%env_id, %user_id, "owner link moved to new user");
            }
            None => {
                self.environments
                    .create_association(env_id, user_id)
                    .await?;
                debug!(%env_id, %user_id, "owner link created");
            }
        }
        Ok(())
    }

    async fn sync_zones(&self, env_id: EnvironmentId, drafts: Vec<ZoneDraft>) -> Result<(), Error> {
        let existing = self.zones.list_zones(env_id).await?;
        let plan = diff(drafts, &existing);
        if plan.is_empty() {
            return Ok(());
        }

        try_join_all(
            plan.added
                .iter()
                .map(|draft| self.zones.create_zone(env_id, &draft.content)),
        )
        .await?;
        try_join_all(plan.updated.iter().filter_map(|draft| {
            let Some(id) = draft.id else {
                warn!(%env_id, "zone update without id skipped");
                return None;
            };
            Some(self.zones.update_zone(id, &draft.content))
        }))
        .await?;
        let doomed: Vec<ZoneId> = plan
            .deleted_ids
            .into_iter()
            .filter(|id| id.is_persisted())
            .collect();
        if !doomed.is_empty() {
            self.zones.delete_zones(&doomed).await?;
        }

        info!(
            %env_id,
            added = plan.added.len(),
            updated = plan.updated.len(),
            deleted = doomed.len(),
            "zones reconciled"
        );
        Ok(())
    }

    async fn sync_pois(&self, env_id: EnvironmentId, drafts: Vec<PoiDraft>) -> Result<(), Error> {
        let existing = self.pois.list_pois(env_id).await?;
        let plan = diff(drafts, &existing);
        if plan.is_empty() {
            return Ok(());
        }

        try_join_all(
            plan.added
                .iter()
                .map(|draft| self.pois.create_poi(env_id, &draft.content)),
        )
        .await?;
        try_join_all(plan.updated.iter().filter_map(|draft| {
            let Some(id) = draft.id else {
                warn!(%env_id, "poi update without id skipped");
                return None;
            };
            Some(self.pois.update_poi(id, &draft.content))
        }))
        .await?;
        let doomed: Vec<PoiId> = plan
            .deleted_ids
            .into_iter()
            .filter(|id| id.is_persisted())
            .collect();
        if !doomed.is_empty() {
            self.pois.delete_pois(&doomed).await?;
        }

        info!(
            %env_id,
            added = plan.added.len(),
            updated = plan.updated.len(),
            deleted = doomed.len(),
            "pois reconciled"
        );
        Ok(())
    }

    async fn record_containment(
        &self,
        zones: &[Zone],
        pois: &[Poi],
    ) -> Result<Vec<PoiZoneLink>, Error> {
        if zones.is_empty() || pois.is_empty() {
            return Ok(Vec::new());
        }
        let links = detect_pois_inside_zones(zones, pois);
        if self.options.persist_links && !links.is_empty() {
            let stored = self.pois.record_poi_zone_links(&links).await?;
            debug!(detected = links.len(), stored, "containment links recorded");
        }
        Ok(links)
    }
}

/// Reject a stale `expected` revision before any write is issued.
fn ensure_revision(existing: &Environment, expected: Option<u32>) -> Result<(), Error> {
    match expected {
        Some(expected) if expected != existing.revision => Err(Error::Conflict {
            id: existing.id,
            expected,
            actual: existing.revision,
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl<E, Z, P> EnvironmentSyncCommand for EnvironmentSyncService<E, Z, P>
where
    E: EnvironmentRepository,
    Z: ZoneRepository,
    P: PoiRepository,
{
    async fn create(&self, request: SyncRequest) -> Result<SyncOutcome, Error> {
        self.synchronise(SyncMode::Create, request).await
    }

    async fn update(
        &self,
        id: EnvironmentId,
        request: SyncRequest,
    ) -> Result<SyncOutcome, Error> {
        self.synchronise(SyncMode::Update(id), request).await
    }

    async fn finalize(
        &self,
        id: EnvironmentId,
        request: SyncRequest,
    ) -> Result<SyncOutcome, Error> {
        self.synchronise(SyncMode::Finalize(id), request).await
    }
}

#[cfg(test)]
#[path = "environment_sync_tests/mod.rs"]
mod tests;
