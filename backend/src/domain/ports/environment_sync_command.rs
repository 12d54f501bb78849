//! Driving port for GeoJSON environment synchronisation.
//!
//! Inbound adapters (HTTP handlers, the `sync-environment` binary) submit a
//! raw `FeatureCollection` and receive the persisted state after
//! reconciliation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Environment, EnvironmentId, Error, Poi, PoiZoneLink, Zone};

/// Submission for one synchronisation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Raw GeoJSON `FeatureCollection`.
    pub payload: Value,
    /// Revision the caller last read. `None` disables the concurrency check.
    #[serde(default)]
    pub expected_revision: Option<u32>,
}

impl SyncRequest {
    /// Request without a concurrency guard.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            expected_revision: None,
        }
    }

    /// Attach the revision the caller expects to overwrite.
    #[must_use]
    pub fn with_expected_revision(mut self, revision: u32) -> Self {
        self.expected_revision = Some(revision);
        self
    }
}

/// Persisted state after a synchronisation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// Environment after the call.
    pub environment: Environment,
    /// Every zone stored for the environment.
    pub zones: Vec<Zone>,
    /// Every POI stored for the environment.
    pub pois: Vec<Poi>,
    /// Containment links detected in this call.
    pub links: Vec<PoiZoneLink>,
}

/// Driving port for environment synchronisation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvironmentSyncCommand: Send + Sync {
    /// Create a new environment from a submission.
    async fn create(&self, request: SyncRequest) -> Result<SyncOutcome, Error>;

    /// Replace the environment's properties, delimiter, zones and POIs.
    async fn update(&self, id: EnvironmentId, request: SyncRequest)
    -> Result<SyncOutcome, Error>;

    /// Finish drawing an environment: name and address only, creating the
    /// map record when it is missing.
    async fn finalize(
        &self,
        id: EnvironmentId,
        request: SyncRequest,
    ) -> Result<SyncOutcome, Error>;
}
