//! Driving port for environment lookups and lifecycle operations that do not
//! carry geometry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Environment, EnvironmentDetail, EnvironmentFilter, EnvironmentId, Error, UserId,
};

/// Fields for creating an environment before any geometry is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicEnvironmentRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub surface: Option<f64>,
    /// Owner linked when the environment is private.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Driving port for environment reads, basic creation and deletion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvironmentQuery: Send + Sync {
    /// Create a pending environment with its map record.
    async fn create_basic(&self, request: BasicEnvironmentRequest) -> Result<Environment, Error>;

    /// Environment with its delimiter, zones and POIs.
    async fn get(&self, id: EnvironmentId) -> Result<EnvironmentDetail, Error>;

    /// Environments matching `filter`.
    async fn list(&self, filter: EnvironmentFilter) -> Result<Vec<Environment>, Error>;

    /// Delete an environment and everything stored under it.
    async fn delete(&self, id: EnvironmentId) -> Result<(), Error>;
}
