//! PostgreSQL-backed `ZoneRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ZoneRepository, ZoneRepositoryError};
use crate::domain::{EnvironmentId, Zone, ZoneContent, ZoneId, ZoneTypeId};

use super::diesel_helpers::{
    collect_rows, geometry_to_json, is_connection_error, map_diesel_error_message,
    map_pool_error_message, row_to_zone,
};
use super::models::{NewZoneRow, ZoneRow, ZoneUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::zones;

/// Diesel-backed implementation of the `ZoneRepository` port.
#[derive(Clone)]
pub struct DieselZoneRepository {
    pool: DbPool,
}

impl DieselZoneRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ZoneRepositoryError {
    ZoneRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> ZoneRepositoryError {
    move |error| {
        let message = map_diesel_error_message(&error, operation);
        if is_connection_error(&error) {
            ZoneRepositoryError::connection(message)
        } else {
            ZoneRepositoryError::query(message)
        }
    }
}

#[async_trait]
impl ZoneRepository for DieselZoneRepository {
    async fn list_zones(&self, env_id: EnvironmentId) -> Result<Vec<Zone>, ZoneRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ZoneRow> = zones::table
            .filter(zones::env_id.eq(env_id.get()))
            .order(zones::id.asc())
            .select(ZoneRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list zones"))?;
        collect_rows(rows.into_iter().map(row_to_zone), ZoneRepositoryError::query)
    }

    async fn create_zone(
        &self,
        env_id: EnvironmentId,
        content: &ZoneContent,
    ) -> Result<Zone, ZoneRepositoryError> {
        let row = NewZoneRow {
            env_id: env_id.get(),
            name: content.name.as_deref(),
            description: content.description.as_deref(),
            geometry: geometry_to_json(&content.geometry).map_err(ZoneRepositoryError::query)?,
            type_id: content.type_id.map(ZoneTypeId::get),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let created: ZoneRow = diesel::insert_into(zones::table)
            .values(&row)
            .returning(ZoneRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error("create zone"))?;
        row_to_zone(created).map_err(ZoneRepositoryError::query)
    }

    async fn update_zone(
        &self,
        id: ZoneId,
        content: &ZoneContent,
    ) -> Result<(), ZoneRepositoryError> {
        let update = ZoneUpdate {
            name: content.name.as_deref(),
            description: content.description.as_deref(),
            geometry: geometry_to_json(&content.geometry).map_err(ZoneRepositoryError::query)?,
            type_id: content.type_id.map(ZoneTypeId::get),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(zones::table.find(id.get()))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("update zone"))?;
        if updated == 0 {
            return Err(ZoneRepositoryError::query(format!("zone {id} does not exist")));
        }
        Ok(())
    }

    async fn delete_zones(&self, ids: &[ZoneId]) -> Result<u64, ZoneRepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let raw: Vec<i64> = ids.iter().copied().map(ZoneId::get).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(zones::table.filter(zones::id.eq_any(raw)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("delete zones"))?;
        Ok(removed as u64)
    }
}
