//! Driven port for environments, their maps, delimiters and owner links.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{
    Association, AssociationId, Delimiter, Environment, EnvironmentChanges, EnvironmentFilter,
    EnvironmentId, MapId, NewEnvironment, Ring, UserId,
};

define_port_error! {
    /// Errors raised by [`EnvironmentRepository`] adapters.
    pub enum EnvironmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "environment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "environment repository query failed: {message}",
        /// The environment row does not exist.
        NotFound { id: EnvironmentId } =>
            "environment {id} does not exist",
        /// The stored revision differs from the caller's expectation.
        RevisionMismatch { id: EnvironmentId, expected: u32, actual: u32 } =>
            "environment {id} revision mismatch: expected {expected}, found {actual}",
    }
}

/// Port for environment-level rows.
///
/// Deleting an environment removes everything stored under it: delimiter,
/// owner associations, zones, POIs and containment links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvironmentRepository: Send + Sync {
    /// Create a map record with the given rendering format.
    async fn create_map(&self, format_id: i64) -> Result<MapId, EnvironmentRepositoryError>;

    /// Insert an environment; the adapter assigns the id and revision 1.
    async fn create_environment(
        &self,
        environment: &NewEnvironment,
    ) -> Result<Environment, EnvironmentRepositoryError>;

    /// Apply `changes`, bumping the revision.
    ///
    /// When `expected_revision` is set and differs from the stored revision
    /// the adapter returns [`EnvironmentRepositoryError::RevisionMismatch`]
    /// without writing.
    async fn update_environment(
        &self,
        id: EnvironmentId,
        changes: &EnvironmentChanges,
        expected_revision: Option<u32>,
    ) -> Result<Environment, EnvironmentRepositoryError>;

    /// Fetch an environment by id.
    async fn get_environment(
        &self,
        id: EnvironmentId,
    ) -> Result<Option<Environment>, EnvironmentRepositoryError>;

    /// List environments matching `filter`, ordered by id.
    async fn list_environments(
        &self,
        filter: &EnvironmentFilter,
    ) -> Result<Vec<Environment>, EnvironmentRepositoryError>;

    /// Delete an environment and everything under it. Returns `false` when
    /// no row existed.
    async fn delete_environment(&self, id: EnvironmentId)
    -> Result<bool, EnvironmentRepositoryError>;

    /// Create the delimiter or replace its coordinates in place.
    async fn upsert_delimiter(
        &self,
        env_id: EnvironmentId,
        coordinates: &[Ring],
    ) -> Result<Delimiter, EnvironmentRepositoryError>;

    /// Fetch the delimiter of an environment.
    async fn get_delimiter(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Option<Delimiter>, EnvironmentRepositoryError>;

    /// Link an environment to its owning user.
    async fn create_association(
        &self,
        env_id: EnvironmentId,
        user_id: UserId,
    ) -> Result<Association, EnvironmentRepositoryError>;

    /// Fetch the owner link of an environment.
    async fn find_association(
        &self,
        env_id: EnvironmentId,
    ) -> Result<Option<Association>, EnvironmentRepositoryError>;

    /// Point an existing link at another user.
    async fn update_association(
        &self,
        id: AssociationId,
        user_id: UserId,
    ) -> Result<(), EnvironmentRepositoryError>;

    /// Remove every owner link of an environment, returning how many went.
    async fn delete_associations(
        &self,
        env_id: EnvironmentId,
    ) -> Result<u64, EnvironmentRepositoryError>;
}
