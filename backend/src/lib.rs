//! GeoJSON environment synchronisation engine.
//!
//! - [`domain`]: validation, reconciliation, containment and the services
//!   behind the driving ports.
//! - [`outbound`]: Diesel and in-memory implementations of the persistence
//!   ports.
//! - [`settings`]: OrthoConfig-backed runtime settings.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod domain;
pub mod outbound;
pub mod settings;
