//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`EnvironmentRepository`], [`ZoneRepository`],
//! [`PoiRepository`]) describe what the domain needs from storage. Driving
//! ports ([`EnvironmentSyncCommand`], [`EnvironmentQuery`]) are what inbound
//! adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod environment_query;
mod environment_repository;
mod environment_sync_command;
mod poi_repository;
mod zone_repository;

#[cfg(test)]
pub use environment_query::MockEnvironmentQuery;
pub use environment_query::{BasicEnvironmentRequest, EnvironmentQuery};
#[cfg(test)]
pub use environment_repository::MockEnvironmentRepository;
pub use environment_repository::{EnvironmentRepository, EnvironmentRepositoryError};
#[cfg(test)]
pub use environment_sync_command::MockEnvironmentSyncCommand;
pub use environment_sync_command::{EnvironmentSyncCommand, SyncOutcome, SyncRequest};
#[cfg(test)]
pub use poi_repository::MockPoiRepository;
pub use poi_repository::{PoiRepository, PoiRepositoryError};
#[cfg(test)]
pub use zone_repository::MockZoneRepository;
pub use zone_repository::{ZoneRepository, ZoneRepositoryError};
