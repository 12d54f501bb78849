//! Driven port for POI rows and POI/zone containment links.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{EnvironmentId, Poi, PoiContent, PoiId, PoiZoneLink};

define_port_error! {
    /// Errors raised by [`PoiRepository`] adapters.
    pub enum PoiRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "poi repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "poi repository query failed: {message}",
    }
}

/// Port for reading and writing the POIs of an environment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PoiRepository: Send + Sync {
    /// POIs of an environment, ordered by id.
    async fn list_pois(&self, env_id: EnvironmentId) -> Result<Vec<Poi>, PoiRepositoryError>;

    /// Insert a POI under `env_id`.
    async fn create_poi(
        &self,
        env_id: EnvironmentId,
        content: &PoiContent,
    ) -> Result<Poi, PoiRepositoryError>;

    /// Replace the content of an existing POI.
    async fn update_poi(&self, id: PoiId, content: &PoiContent) -> Result<(), PoiRepositoryError>;

    /// Delete POIs by id, returning how many rows went.
    async fn delete_pois(&self, ids: &[PoiId]) -> Result<u64, PoiRepositoryError>;

    /// Store containment links, skipping those already present. Returns the
    /// number of new links.
    async fn record_poi_zone_links(
        &self,
        links: &[PoiZoneLink],
    ) -> Result<u64, PoiRepositoryError>;

    /// Containment links of every POI in an environment.
    async fn list_poi_zone_links(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Vec<PoiZoneLink>, PoiRepositoryError>;
}
