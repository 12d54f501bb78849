//! Environment aggregate: the mapped site, its delimiter and its owner link.
//!
//! An environment starts *pending* (no delimiter) and becomes *delimited*
//! once a synchronisation supplies an `environment` feature. The `revision`
//! counter increases on every stored change and backs optimistic concurrency
//! for callers that pass an expected revision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geometry::Ring;
use super::ids::{AssociationId, EnvironmentId, MapId, UserId};
use super::poi::Poi;
use super::zone::Zone;

/// Map format assigned to maps created without an explicit format.
pub const DEFAULT_MAP_FORMAT_ID: i64 = 1;

/// Persisted environment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Primary key.
    pub id: EnvironmentId,
    /// Display name.
    pub name: String,
    /// Postal address of the site.
    pub address: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Public environments have no owning user.
    pub is_public: bool,
    /// Surface area in square metres.
    pub surface: Option<f64>,
    /// Map record holding the rendering format.
    pub map_id: Option<MapId>,
    /// Optimistic concurrency counter, starting at 1.
    pub revision: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Values for a new environment row. Adapters assign the id and revision.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEnvironment {
    /// Display name.
    pub name: String,
    /// Postal address of the site.
    pub address: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Public/private flag.
    pub is_public: bool,
    /// Surface area in square metres.
    pub surface: Option<f64>,
    /// Owning map.
    pub map_id: Option<MapId>,
    /// Creation timestamp, also used as the initial `updated_at`.
    pub created_at: DateTime<Utc>,
}

/// Partial update of an environment row; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentChanges {
    /// New display name.
    pub name: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New visibility.
    pub is_public: Option<bool>,
    /// New surface area.
    pub surface: Option<f64>,
    /// Newly attached map.
    pub map_id: Option<MapId>,
    /// Modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl EnvironmentChanges {
    /// Changes that only bump `updated_at`.
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            name: None,
            address: None,
            description: None,
            is_public: None,
            surface: None,
            map_id: None,
            updated_at,
        }
    }

    /// Apply these changes to `environment`, bumping its revision.
    ///
    /// Adapters without native partial updates (the in-memory store) use
    /// this to keep merge semantics identical across backends.
    pub fn apply_to(&self, environment: &mut Environment) {
        if let Some(name) = &self.name {
            environment.name.clone_from(name);
        }
        if let Some(address) = &self.address {
            environment.address = Some(address.clone());
        }
        if let Some(description) = &self.description {
            environment.description = Some(description.clone());
        }
        if let Some(is_public) = self.is_public {
            environment.is_public = is_public;
        }
        if let Some(surface) = self.surface {
            environment.surface = Some(surface);
        }
        if let Some(map_id) = self.map_id {
            environment.map_id = Some(map_id);
        }
        environment.updated_at = self.updated_at;
        environment.revision = environment.revision.saturating_add(1);
    }
}

/// Outer boundary of an environment. At most one exists per environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delimiter {
    /// Owning environment.
    pub env_id: EnvironmentId,
    /// Polygon rings; the first ring is the boundary.
    pub coordinates: Vec<Ring>,
}

/// Link between a private environment and its owning user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    /// Primary key.
    pub id: AssociationId,
    /// Owned environment.
    pub env_id: EnvironmentId,
    /// Owning user.
    pub user_id: UserId,
}

/// Visibility filter for environment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only public environments.
    Public,
    /// Only private environments.
    Private,
}

impl Visibility {
    /// `true` when an environment with the given flag is visible.
    pub const fn admits(self, is_public: bool) -> bool {
        match self {
            Self::Public => is_public,
            Self::Private => !is_public,
        }
    }
}

/// Delimiter state filter for environment listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterStatus {
    /// Environments with a delimiter.
    #[default]
    Delimited,
    /// Environments still waiting for their delimiter.
    Pending,
    /// Both.
    Any,
}

/// Filter applied by environment listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentFilter {
    /// Delimiter state to match.
    pub status: DelimiterStatus,
    /// Case-insensitive substring matched against name or address.
    pub search: Option<String>,
    /// Visibility restriction; `None` shows both.
    pub visibility: Option<Visibility>,
}

impl EnvironmentFilter {
    /// Evaluate the filter against an environment.
    pub fn matches(&self, environment: &Environment, has_delimiter: bool) -> bool {
        let status_ok = match self.status {
            DelimiterStatus::Delimited => has_delimiter,
            DelimiterStatus::Pending => !has_delimiter,
            DelimiterStatus::Any => true,
        };
        let visibility_ok = self
            .visibility
            .is_none_or(|visibility| visibility.admits(environment.is_public));
        status_ok && visibility_ok && self.matches_search(environment)
    }

    /// Trimmed, non-empty search needle.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    fn matches_search(&self, environment: &Environment) -> bool {
        let Some(term) = self.search_term() else {
            return true;
        };
        let needle = term.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        contains(&environment.name) || environment.address.as_deref().is_some_and(contains)
    }
}

/// Environment with everything stored under it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDetail {
    /// The environment row.
    pub environment: Environment,
    /// Its delimiter, when one has been supplied.
    pub delimiter: Option<Delimiter>,
    /// Zones in id order.
    pub zones: Vec<Zone>,
    /// POIs in id order.
    pub pois: Vec<Poi>,
}
