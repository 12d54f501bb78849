//! PostgreSQL-backed `PoiRepository` implementation using Diesel ORM.
//!
//! Containment links are inserted with `ON CONFLICT DO NOTHING` against the
//! `(poi_id, zone_id)` primary key, so recording the same link twice is a
//! no-op.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PoiRepository, PoiRepositoryError};
use crate::domain::{CategoryId, EnvironmentId, Poi, PoiContent, PoiId, PoiZoneLink};

use super::diesel_helpers::{
    collect_rows, geometry_to_json, is_connection_error, map_diesel_error_message,
    map_pool_error_message, row_to_link, row_to_poi,
};
use super::models::{NewPoiRow, PoiRow, PoiUpdate, PoiZoneRow};
use super::pool::{DbPool, PoolError};
use super::schema::{poi_zones, pois};

/// Diesel-backed implementation of the `PoiRepository` port.
#[derive(Clone)]
pub struct DieselPoiRepository {
    pool: DbPool,
}

impl DieselPoiRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PoiRepositoryError {
    PoiRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> PoiRepositoryError {
    move |error| {
        let message = map_diesel_error_message(&error, operation);
        if is_connection_error(&error) {
            PoiRepositoryError::connection(message)
        } else {
            PoiRepositoryError::query(message)
        }
    }
}

fn to_new_row(
    env_id: EnvironmentId,
    content: &PoiContent,
) -> Result<NewPoiRow<'_>, PoiRepositoryError> {
    Ok(NewPoiRow {
        env_id: env_id.get(),
        name: content.name.as_deref(),
        description: content.description.as_deref(),
        geometry: geometry_to_json(&content.geometry).map_err(PoiRepositoryError::query)?,
        image_url: content.image_url.as_deref(),
        category_id: content.category_id.map(CategoryId::get),
    })
}

#[async_trait]
impl PoiRepository for DieselPoiRepository {
    async fn list_pois(&self, env_id: EnvironmentId) -> Result<Vec<Poi>, PoiRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PoiRow> = pois::table
            .filter(pois::env_id.eq(env_id.get()))
            .order(pois::id.asc())
            .select(PoiRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list pois"))?;
        collect_rows(rows.into_iter().map(row_to_poi), PoiRepositoryError::query)
    }

    async fn create_poi(
        &self,
        env_id: EnvironmentId,
        content: &PoiContent,
    ) -> Result<Poi, PoiRepositoryError> {
        let row = to_new_row(env_id, content)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let created: PoiRow = diesel::insert_into(pois::table)
            .values(&row)
            .returning(PoiRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error("create poi"))?;
        row_to_poi(created).map_err(PoiRepositoryError::query)
    }

    async fn update_poi(&self, id: PoiId, content: &PoiContent) -> Result<(), PoiRepositoryError> {
        let update = PoiUpdate {
            name: content.name.as_deref(),
            description: content.description.as_deref(),
            geometry: geometry_to_json(&content.geometry).map_err(PoiRepositoryError::query)?,
            image_url: content.image_url.as_deref(),
            category_id: content.category_id.map(CategoryId::get),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(pois::table.find(id.get()))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("update poi"))?;
        if updated == 0 {
            return Err(PoiRepositoryError::query(format!("poi {id} does not exist")));
        }
        Ok(())
    }

    async fn delete_pois(&self, ids: &[PoiId]) -> Result<u64, PoiRepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let raw: Vec<i64> = ids.iter().copied().map(PoiId::get).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(pois::table.filter(pois::id.eq_any(raw)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("delete pois"))?;
        Ok(removed as u64)
    }

    async fn record_poi_zone_links(
        &self,
        links: &[PoiZoneLink],
    ) -> Result<u64, PoiRepositoryError> {
        if links.is_empty() {
            return Ok(0);
        }
        let rows: Vec<PoiZoneRow> = links
            .iter()
            .map(|link| PoiZoneRow {
                poi_id: link.poi_id.get(),
                zone_id: link.zone_id.get(),
            })
            .collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(poi_zones::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("record poi zone links"))?;
        Ok(inserted as u64)
    }

    async fn list_poi_zone_links(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Vec<PoiZoneLink>, PoiRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PoiZoneRow> = poi_zones::table
            .inner_join(pois::table)
            .filter(pois::env_id.eq(env_id.get()))
            .order((poi_zones::poi_id.asc(), poi_zones::zone_id.asc()))
            .select(PoiZoneRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list poi zone links"))?;
        Ok(rows.into_iter().map(row_to_link).collect())
    }
}
