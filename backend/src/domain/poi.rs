//! Points of interest and their containment links to zones.

use serde::{Deserialize, Serialize};

use super::feature_diff::Reconcilable;
use super::geometry::Geometry;
use super::ids::{CategoryId, EnvironmentId, PoiId, ZoneId};

/// Client-editable POI content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiContent {
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Point, line or polygon.
    pub geometry: Geometry,
    /// Illustration URL.
    pub image_url: Option<String>,
    /// Category reference.
    pub category_id: Option<CategoryId>,
}

/// Persisted POI row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    /// Primary key.
    pub id: PoiId,
    /// Owning environment; never changes after creation.
    pub env_id: EnvironmentId,
    /// Stored content.
    #[serde(flatten)]
    pub content: PoiContent,
}

/// POI derived from a submitted feature, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiDraft {
    /// Client-supplied id; absent or `0` for new POIs.
    pub id: Option<PoiId>,
    /// Submitted content.
    pub content: PoiContent,
}

/// A POI found inside a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiZoneLink {
    /// Contained POI.
    pub poi_id: PoiId,
    /// Containing zone.
    pub zone_id: ZoneId,
}

impl Reconcilable for Poi {
    type Id = PoiId;
    type Content = PoiContent;

    fn entity_id(&self) -> Option<PoiId> {
        Some(self.id)
    }

    fn content(&self) -> &PoiContent {
        &self.content
    }
}

impl Reconcilable for PoiDraft {
    type Id = PoiId;
    type Content = PoiContent;

    fn entity_id(&self) -> Option<PoiId> {
        self.id
    }

    fn content(&self) -> &PoiContent {
        &self.content
    }
}
