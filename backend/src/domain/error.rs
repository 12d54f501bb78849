//! Domain-level error types.
//!
//! These errors are transport agnostic. Outer adapters map [`ErrorCode`] to
//! HTTP statuses, process exit codes, or any other protocol-specific envelope.
//! Validation and format errors are raised before any persistence write;
//! persistence errors are propagated unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::geometry_validation::GeometryError;
use super::ids::EnvironmentId;
use super::ports::{EnvironmentRepositoryError, PoiRepositoryError, ZoneRepositoryError};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The submitted payload is malformed or fails validation.
    InvalidRequest,
    /// The referenced environment does not exist.
    NotFound,
    /// The environment changed since the caller read it.
    Conflict,
    /// The persistence layer failed.
    ServiceUnavailable,
}

/// Failures raised by the persistence ports, grouped by aggregate.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PersistenceError {
    /// Environment, map, delimiter or association storage failed.
    #[error(transparent)]
    Environment(#[from] EnvironmentRepositoryError),
    /// Zone storage failed.
    #[error(transparent)]
    Zone(#[from] ZoneRepositoryError),
    /// POI or containment link storage failed.
    #[error(transparent)]
    Poi(#[from] PoiRepositoryError),
}

/// Domain error.
///
/// # Examples
/// ```
/// use envsync::domain::{Error, ErrorCode};
///
/// let err = Error::invalid_format("expected a FeatureCollection");
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Top-level payload is not a well-formed `FeatureCollection`.
    #[error("invalid GeoJSON format: {message}")]
    InvalidFormat {
        /// What was wrong with the payload.
        message: String,
    },
    /// A feature geometry failed validation.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// The environment does not exist.
    #[error("environment {id} not found")]
    NotFound {
        /// Requested environment.
        id: EnvironmentId,
    },
    /// Optimistic concurrency check failed.
    #[error("environment {id} has revision {actual}, expected {expected}")]
    Conflict {
        /// Environment being updated.
        id: EnvironmentId,
        /// Revision supplied by the caller.
        expected: u32,
        /// Revision currently stored.
        actual: u32,
    },
    /// Persistence failure, propagated unchanged.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl Error {
    /// Convenience constructor for [`Error::InvalidFormat`].
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub const fn not_found(id: EnvironmentId) -> Self {
        Self::NotFound { id }
    }

    /// Stable machine-readable error code.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidFormat { .. } | Self::Geometry(_) => ErrorCode::InvalidRequest,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::Persistence(_) => ErrorCode::ServiceUnavailable,
        }
    }
}

impl From<EnvironmentRepositoryError> for Error {
    fn from(error: EnvironmentRepositoryError) -> Self {
        match error {
            EnvironmentRepositoryError::NotFound { id } => Self::NotFound { id },
            EnvironmentRepositoryError::RevisionMismatch {
                id,
                expected,
                actual,
            } => Self::Conflict {
                id,
                expected,
                actual,
            },
            other => Self::Persistence(other.into()),
        }
    }
}

impl From<ZoneRepositoryError> for Error {
    fn from(error: ZoneRepositoryError) -> Self {
        Self::Persistence(error.into())
    }
}

impl From<PoiRepositoryError> for Error {
    fn from(error: PoiRepositoryError) -> Self {
        Self::Persistence(error.into())
    }
}

#[cfg(test)]
mod tests;
