//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the environment, zone and POI repository
//! ports backed by PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay private
//! to this module; repositories translate rows into domain types and map
//! every Diesel failure onto the port's error enum.
//!
//! ```ignore
//! use envsync::outbound::persistence::{DbPool, DieselZoneRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/envsync")).await?;
//! let zones = DieselZoneRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_environment_repository;
mod diesel_poi_repository;
mod diesel_zone_repository;
mod models;
mod pool;
mod schema;

pub use diesel_environment_repository::DieselEnvironmentRepository;
pub use diesel_poi_repository::DieselPoiRepository;
pub use diesel_zone_repository::DieselZoneRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
