//! PostgreSQL-backed `EnvironmentRepository` implementation using Diesel ORM.
//!
//! Environment updates use optimistic concurrency: the `UPDATE` filters on
//! the expected revision when one is supplied, and a zero-row result is
//! disambiguated into "missing" or "stale" by re-reading the row.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{EnvironmentRepository, EnvironmentRepositoryError};
use crate::domain::{
    Association, AssociationId, Delimiter, DelimiterStatus, Environment, EnvironmentChanges,
    EnvironmentFilter, EnvironmentId, MapId, NewEnvironment, Ring, UserId, Visibility,
};

use super::diesel_helpers::{
    cast_revision, cast_revision_for_db, is_connection_error, like_pattern,
    map_diesel_error_message, map_pool_error_message, rings_to_json, row_to_association,
    row_to_delimiter, row_to_environment,
};
use super::models::{
    AssociationRow, DelimiterRow, EnvironmentRow, EnvironmentUpdate, NewAssociationRow,
    NewEnvironmentRow, NewMapRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{delimiters, env_users, environments, maps};

/// Diesel-backed implementation of the `EnvironmentRepository` port.
#[derive(Clone)]
pub struct DieselEnvironmentRepository {
    pool: DbPool,
}

impl DieselEnvironmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EnvironmentRepositoryError {
    EnvironmentRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> EnvironmentRepositoryError {
    move |error| {
        let message = map_diesel_error_message(&error, operation);
        if is_connection_error(&error) {
            EnvironmentRepositoryError::connection(message)
        } else {
            EnvironmentRepositoryError::query(message)
        }
    }
}

#[async_trait]
impl EnvironmentRepository for DieselEnvironmentRepository {
    async fn create_map(&self, format_id: i64) -> Result<MapId, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id: i64 = diesel::insert_into(maps::table)
            .values(&NewMapRow { format_id })
            .returning(maps::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error("create map"))?;
        Ok(MapId::new(id))
    }

    async fn create_environment(
        &self,
        environment: &NewEnvironment,
    ) -> Result<Environment, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewEnvironmentRow {
            name: &environment.name,
            address: environment.address.as_deref(),
            description: environment.description.as_deref(),
            is_public: environment.is_public,
            surface: environment.surface,
            map_id: environment.map_id.map(MapId::get),
            revision: 1,
            created_at: environment.created_at,
            updated_at: environment.created_at,
        };
        let created: EnvironmentRow = diesel::insert_into(environments::table)
            .values(&row)
            .returning(EnvironmentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error("create environment"))?;
        Ok(row_to_environment(created))
    }

    async fn update_environment(
        &self,
        id: EnvironmentId,
        changes: &EnvironmentChanges,
        expected_revision: Option<u32>,
    ) -> Result<Environment, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = EnvironmentUpdate {
            name: changes.name.as_deref(),
            address: changes.address.as_deref(),
            description: changes.description.as_deref(),
            is_public: changes.is_public,
            surface: changes.surface,
            map_id: changes.map_id.map(MapId::get),
            updated_at: changes.updated_at,
        };

        let target = environments::table.filter(environments::id.eq(id.get()));
        let bump = environments::revision.eq(environments::revision + 1);
        let updated: Option<EnvironmentRow> = match expected_revision {
            Some(expected) => diesel::update(
                target.filter(environments::revision.eq(cast_revision_for_db(expected))),
            )
            .set((&update, bump))
            .returning(EnvironmentRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional(),
            None => diesel::update(target)
                .set((&update, bump))
                .returning(EnvironmentRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional(),
        }
        .map_err(map_diesel_error("update environment"))?;
        if let Some(row) = updated {
            return Ok(row_to_environment(row));
        }

        let current: Option<i32> = environments::table
            .find(id.get())
            .select(environments::revision)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("load environment revision"))?;
        match (current, expected_revision) {
            (Some(actual), Some(expected)) => Err(EnvironmentRepositoryError::revision_mismatch(
                id,
                expected,
                cast_revision(actual),
            )),
            (Some(_), None) => Err(EnvironmentRepositoryError::query(format!(
                "environment {id} update affected no rows"
            ))),
            (None, _) => Err(EnvironmentRepositoryError::not_found(id)),
        }
    }

    async fn get_environment(
        &self,
        id: EnvironmentId,
    ) -> Result<Option<Environment>, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<EnvironmentRow> = environments::table
            .find(id.get())
            .select(EnvironmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("load environment"))?;
        Ok(row.map(row_to_environment))
    }

    async fn list_environments(
        &self,
        filter: &EnvironmentFilter,
    ) -> Result<Vec<Environment>, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let delimited = delimiters::table.select(delimiters::env_id);

        let mut query = environments::table
            .select(EnvironmentRow::as_select())
            .order(environments::id.asc())
            .into_boxed();
        query = match filter.status {
            DelimiterStatus::Delimited => query.filter(environments::id.eq_any(delimited)),
            DelimiterStatus::Pending => query.filter(environments::id.ne_all(delimited)),
            DelimiterStatus::Any => query,
        };
        if let Some(visibility) = filter.visibility {
            query = query.filter(environments::is_public.eq(visibility == Visibility::Public));
        }
        if let Some(term) = filter.search_term() {
            let pattern = like_pattern(term);
            query = query.filter(
                environments::name
                    .ilike(pattern.clone())
                    .or(environments::address.ilike(pattern)),
            );
        }

        let rows: Vec<EnvironmentRow> = query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list environments"))?;
        debug!(count = rows.len(), status = ?filter.status, "environments listed");
        Ok(rows.into_iter().map(row_to_environment).collect())
    }

    async fn delete_environment(
        &self,
        id: EnvironmentId,
    ) -> Result<bool, EnvironmentRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Zones, POIs, links, delimiter and owner links go through ON DELETE
        // CASCADE; the map row is owned one-to-one and removed here.
        conn.transaction(|conn| {
            async move {
                let map_id: Option<Option<i64>> = diesel::delete(environments::table.find(id.get()))
                    .returning(environments::map_id)
                    .get_result(conn)
                    .await
                    .optional()?;
                let Some(map_id) = map_id else {
                    return Ok(false);
                };
                if let Some(map_id) = map_id {
                    diesel::delete(maps::table.find(map_id))
                        .execute(conn)
                        .await?;
                }
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error("delete environment"))
    }

    async fn upsert_delimiter(
        &self,
        env_id: EnvironmentId,
        coordinates: &[Ring],
    ) -> Result<Delimiter, EnvironmentRepositoryError> {
        let row = DelimiterRow {
            env_id: env_id.get(),
            coordinates: rings_to_json(coordinates).map_err(EnvironmentRepositoryError::query)?,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored: DelimiterRow = diesel::insert_into(delimiters::table)
            .values(&row)
            .on_conflict(delimiters::env_id)
            .do_update()
            .set(delimiters::coordinates.eq(excluded(delimiters::coordinates)))
            .returning(DelimiterRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error("upsert delimiter"))?;
        row_to_delimiter(stored).map_err(EnvironmentRepositoryError::query)
    }

    async fn get_delimiter(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Option<Delimiter>, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DelimiterRow> = delimiters::table
            .find(env_id.get())
            .select(DelimiterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("load delimiter"))?;
        row.map(row_to_delimiter)
            .transpose()
            .map_err(EnvironmentRepositoryError::query)
    }

    async fn create_association(
        &self,
        env_id: EnvironmentId,
        user_id: UserId,
    ) -> Result<Association, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: AssociationRow = diesel::insert_into(env_users::table)
            .values(&NewAssociationRow {
                env_id: env_id.get(),
                user_id: user_id.get(),
            })
            .returning(AssociationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error("create association"))?;
        Ok(row_to_association(row))
    }

    async fn find_association(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Option<Association>, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<AssociationRow> = env_users::table
            .filter(env_users::env_id.eq(env_id.get()))
            .order(env_users::id.asc())
            .select(AssociationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("load association"))?;
        Ok(row.map(row_to_association))
    }

    async fn update_association(
        &self,
        id: AssociationId,
        user_id: UserId,
    ) -> Result<(), EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(env_users::table.find(id.get()))
            .set(env_users::user_id.eq(user_id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("update association"))?;
        if updated == 0 {
            return Err(EnvironmentRepositoryError::query(format!(
                "association {id} does not exist"
            )));
        }
        Ok(())
    }

    async fn delete_associations(
        &self,
        env_id: EnvironmentId,
    ) -> Result<u64, EnvironmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(env_users::table.filter(env_users::env_id.eq(env_id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("delete associations"))?;
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(
            repo_err,
            EnvironmentRepositoryError::Connection { .. }
        ));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn diesel_error_maps_to_query_error() {
        let repo_err = map_diesel_error("load environment")(diesel::result::Error::NotFound);

        assert!(matches!(repo_err, EnvironmentRepositoryError::Query { .. }));
        assert!(repo_err.to_string().contains("load environment"));
    }
}
