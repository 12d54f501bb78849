//! Zones: typed sub-areas of an environment.

use serde::{Deserialize, Serialize};

use super::feature_diff::Reconcilable;
use super::geometry::Geometry;
use super::ids::{EnvironmentId, ZoneId, ZoneTypeId};

/// Client-editable zone content. Two zones with equal content are
/// considered unchanged by the diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneContent {
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Zone outline.
    pub geometry: Geometry,
    /// Zone type carrying styling, priority and accessibility metadata.
    pub type_id: Option<ZoneTypeId>,
}

/// Persisted zone row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Primary key.
    pub id: ZoneId,
    /// Owning environment; never changes after creation.
    pub env_id: EnvironmentId,
    /// Stored content.
    #[serde(flatten)]
    pub content: ZoneContent,
}

/// Zone derived from a submitted feature, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDraft {
    /// Client-supplied id; absent or `0` for new zones.
    pub id: Option<ZoneId>,
    /// Submitted content.
    pub content: ZoneContent,
}

impl Reconcilable for Zone {
    type Id = ZoneId;
    type Content = ZoneContent;

    fn entity_id(&self) -> Option<ZoneId> {
        Some(self.id)
    }

    fn content(&self) -> &ZoneContent {
        &self.content
    }
}

impl Reconcilable for ZoneDraft {
    type Id = ZoneId;
    type Content = ZoneContent;

    fn entity_id(&self) -> Option<ZoneId> {
        self.id
    }

    fn content(&self) -> &ZoneContent {
        &self.content
    }
}
