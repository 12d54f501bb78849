//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions to domain types live in
//! [`super::diesel_helpers`].

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{delimiters, env_users, environments, maps, poi_zones, pois, zones};

// ---------------------------------------------------------------------------
// Environment models
// ---------------------------------------------------------------------------

/// Insertable struct for creating map records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = maps)]
pub(crate) struct NewMapRow {
    pub format_id: i64,
}

/// Row struct for reading from the environments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = environments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EnvironmentRow {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
    pub surface: Option<f64>,
    pub map_id: Option<i64>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating environment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = environments)]
pub(crate) struct NewEnvironmentRow<'a> {
    pub name: &'a str,
    pub address: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_public: bool,
    pub surface: Option<f64>,
    pub map_id: Option<i64>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for partial environment updates; `None` leaves the
/// column untouched. The revision bump is applied alongside it.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = environments)]
pub(crate) struct EnvironmentUpdate<'a> {
    pub name: Option<&'a str>,
    pub address: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_public: Option<bool>,
    pub surface: Option<f64>,
    pub map_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for the delimiters table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = delimiters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DelimiterRow {
    pub env_id: i64,
    pub coordinates: serde_json::Value,
}

/// Row struct for reading owner links.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = env_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AssociationRow {
    pub id: i64,
    pub env_id: i64,
    pub user_id: i64,
}

/// Insertable struct for creating owner links.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = env_users)]
pub(crate) struct NewAssociationRow {
    pub env_id: i64,
    pub user_id: i64,
}

// ---------------------------------------------------------------------------
// Zone and POI models
// ---------------------------------------------------------------------------

/// Row struct for reading from the zones table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = zones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ZoneRow {
    pub id: i64,
    pub env_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub geometry: serde_json::Value,
    pub type_id: Option<i64>,
}

/// Insertable struct for creating zones.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = zones)]
pub(crate) struct NewZoneRow<'a> {
    pub env_id: i64,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub geometry: serde_json::Value,
    pub type_id: Option<i64>,
}

/// Changeset replacing every zone content column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = zones, treat_none_as_null = true)]
pub(crate) struct ZoneUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub geometry: serde_json::Value,
    pub type_id: Option<i64>,
}

/// Row struct for reading from the pois table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pois)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PoiRow {
    pub id: i64,
    pub env_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub geometry: serde_json::Value,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

/// Insertable struct for creating POIs.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pois)]
pub(crate) struct NewPoiRow<'a> {
    pub env_id: i64,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub geometry: serde_json::Value,
    pub image_url: Option<&'a str>,
    pub category_id: Option<i64>,
}

/// Changeset replacing every POI content column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = pois, treat_none_as_null = true)]
pub(crate) struct PoiUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub geometry: serde_json::Value,
    pub image_url: Option<&'a str>,
    pub category_id: Option<i64>,
}

/// Row struct for POI/zone containment links.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = poi_zones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PoiZoneRow {
    pub poi_id: i64,
    pub zone_id: i64,
}
