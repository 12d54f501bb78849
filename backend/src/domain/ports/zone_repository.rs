//! Driven port for zone rows.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{EnvironmentId, Zone, ZoneContent, ZoneId};

define_port_error! {
    /// Errors raised by [`ZoneRepository`] adapters.
    pub enum ZoneRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "zone repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "zone repository query failed: {message}",
    }
}

/// Port for reading and writing the zones of an environment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneRepository: Send + Sync {
    /// Zones of an environment, ordered by id.
    async fn list_zones(&self, env_id: EnvironmentId) -> Result<Vec<Zone>, ZoneRepositoryError>;

    /// Insert a zone under `env_id`.
    async fn create_zone(
        &self,
        env_id: EnvironmentId,
        content: &ZoneContent,
    ) -> Result<Zone, ZoneRepositoryError>;

    /// Replace the content of an existing zone. The owning environment is
    /// never changed.
    async fn update_zone(
        &self,
        id: ZoneId,
        content: &ZoneContent,
    ) -> Result<(), ZoneRepositoryError>;

    /// Delete zones by id, returning how many rows went.
    async fn delete_zones(&self, ids: &[ZoneId]) -> Result<u64, ZoneRepositoryError>;
}
