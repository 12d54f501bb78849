//! Outbound adapters implementing the domain persistence ports.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local repositories for dry runs and tests
//!
//! Adapters translate between domain types and storage representations and
//! contain no synchronisation logic.

pub mod memory;
pub mod persistence;
