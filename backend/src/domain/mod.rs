//! Domain primitives, services and ports.
//!
//! Purpose: validate submitted GeoJSON, reconcile it against stored zones and
//! POIs, and work out which POIs sit inside which zones. Nothing here knows
//! about PostgreSQL, HTTP or the command line; those live behind the traits
//! in [`ports`].
//!
//! Public surface:
//! - [`validate_geometry`] / [`parse_geometry`]: structural geometry checks.
//! - [`diff`]: added / updated / deleted classification.
//! - [`detect_pois_inside_zones`]: POI-in-zone containment.
//! - [`EnvironmentSyncService`]: the synchronisation orchestrator.
//! - [`EnvironmentQueryService`]: lookups, listing and deletion.
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failures.

pub mod containment;
pub mod environment;
pub mod environment_query;
pub mod environment_sync;
pub mod error;
pub mod feature_collection;
pub mod feature_diff;
pub mod geometry;
pub mod geometry_validation;
pub mod ids;
pub mod poi;
pub mod ports;
pub mod zone;

pub use self::containment::{ContainmentError, detect_pois_inside_zones, poi_inside_zone};
pub use self::environment::{
    Association, DEFAULT_MAP_FORMAT_ID, Delimiter, DelimiterStatus, Environment,
    EnvironmentChanges, EnvironmentDetail, EnvironmentFilter, NewEnvironment, Visibility,
};
pub use self::environment_query::EnvironmentQueryService;
pub use self::environment_sync::{EnvironmentSyncService, SyncMode, SyncOptions};
pub use self::error::{Error, ErrorCode, PersistenceError};
pub use self::feature_collection::{
    EnvironmentProperties, FeatureRole, FeatureSnapshot, classify_feature, extract_type_id,
    parse_feature_collection,
};
pub use self::feature_diff::{FeatureDiff, Reconcilable, diff};
pub use self::geometry::{Geometry, Position, Ring, close_ring};
pub use self::geometry_validation::{GeometryError, parse_geometry, validate_geometry};
pub use self::ids::{
    AssociationId, CategoryId, EnvironmentId, MapId, PoiId, UserId, ZoneId, ZoneTypeId,
};
pub use self::poi::{Poi, PoiContent, PoiDraft, PoiZoneLink};
pub use self::zone::{Zone, ZoneContent, ZoneDraft};
