//! Parsing and classification of submitted GeoJSON `FeatureCollection`s.
//!
//! A submission is turned into a [`FeatureSnapshot`] in one pass: the
//! envelope shape is checked, every feature geometry is validated, and each
//! feature is classified into a [`FeatureRole`]. Nothing downstream inspects
//! raw property bags again.
//!
//! Classification uses one rule for every synchronisation mode:
//!
//! 1. `properties.type` of `environment`, `zone` or `poi` wins.
//! 2. Otherwise a resolvable `typeId` makes the feature a zone.
//! 3. Otherwise a resolvable `categoryId` makes it a POI.
//! 4. Otherwise the feature is ignored.

use serde_json::{Map, Value};
use tracing::debug;

use super::error::Error;
use super::geometry::{Geometry, Ring};
use super::geometry_validation::parse_geometry;
use super::ids::{CategoryId, PoiId, UserId, ZoneId, ZoneTypeId};
use super::poi::{PoiContent, PoiDraft};
use super::zone::{ZoneContent, ZoneDraft};

const FEATURE_COLLECTION: &str = "FeatureCollection";

/// Environment-level fields carried in `properties.environment`.
///
/// Every field is optional. Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentProperties {
    /// Display name.
    pub name: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Requested visibility.
    pub is_public: Option<bool>,
    /// Owner of a private environment.
    pub user_id: Option<UserId>,
    /// Floor area in square metres.
    pub surface: Option<f64>,
}

impl EnvironmentProperties {
    /// Read the `properties.environment` object of a submission.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            name: text(object, "name"),
            address: text(object, "address"),
            description: text(object, "description"),
            is_public: object.get("isPublic").and_then(lenient_bool),
            user_id: object.get("userId").and_then(exact_integer).map(UserId::new),
            surface: object.get("surface").and_then(lenient_float),
        }
    }

    /// `true` when the environment should be stored as private.
    pub fn is_private(&self) -> bool {
        !self.is_public.unwrap_or(false)
    }
}

/// Role of a single feature, decided once at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureRole {
    /// Outer boundary of the environment.
    Environment {
        /// Validated polygon rings.
        rings: Vec<Ring>,
    },
    /// Zone polygon.
    Zone(ZoneDraft),
    /// Point of interest.
    Poi(PoiDraft),
    /// Feature with no recognised role (walls, windows, annotations).
    Ignored,
}

/// Validated and classified content of a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSnapshot {
    /// Values from `properties.environment`.
    pub environment: EnvironmentProperties,
    /// Environment boundary, when an environment feature was submitted.
    pub delimiter: Option<Vec<Ring>>,
    /// Submitted zones, in payload order.
    pub zones: Vec<ZoneDraft>,
    /// Submitted POIs, in payload order.
    pub pois: Vec<PoiDraft>,
    /// Count of features with no recognised role.
    pub ignored: usize,
}

/// Parse a submitted `FeatureCollection` into a [`FeatureSnapshot`].
///
/// Fails without side effects on the first malformed envelope, feature or
/// geometry. Geometry failures surface as [`Error::Geometry`] carrying the
/// validator's message unchanged.
pub fn parse_feature_collection(payload: &Value) -> Result<FeatureSnapshot, Error> {
    let object = payload
        .as_object()
        .ok_or_else(|| Error::invalid_format("payload must be a JSON object"))?;

    match object.get("type").and_then(Value::as_str) {
        Some(FEATURE_COLLECTION) => {}
        Some(other) => {
            return Err(Error::invalid_format(format!(
                "expected type {FEATURE_COLLECTION}, found {other}"
            )));
        }
        None => {
            return Err(Error::invalid_format(format!(
                "expected type {FEATURE_COLLECTION}"
            )));
        }
    }

    let features = object
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::invalid_format("features must be an array"))?;

    let mut snapshot = FeatureSnapshot {
        environment: environment_properties(object)?,
        ..FeatureSnapshot::default()
    };

    for (index, feature) in features.iter().enumerate() {
        match classify_feature(index, feature)? {
            FeatureRole::Environment { rings } => {
                if snapshot.delimiter.is_some() {
                    return Err(Error::invalid_format(format!(
                        "feature {index} is a second environment feature"
                    )));
                }
                snapshot.delimiter = Some(rings);
            }
            FeatureRole::Zone(zone) => snapshot.zones.push(zone),
            FeatureRole::Poi(poi) => snapshot.pois.push(poi),
            FeatureRole::Ignored => {
                debug!(index, "ignoring feature without a recognised role");
                snapshot.ignored += 1;
            }
        }
    }

    Ok(snapshot)
}

fn environment_properties(object: &Map<String, Value>) -> Result<EnvironmentProperties, Error> {
    let Some(properties) = object.get("properties").filter(|value| !value.is_null()) else {
        return Ok(EnvironmentProperties::default());
    };
    let properties = properties
        .as_object()
        .ok_or_else(|| Error::invalid_format("properties must be an object"))?;
    match properties.get("environment") {
        None | Some(Value::Null) => Ok(EnvironmentProperties::default()),
        Some(Value::Object(environment)) => Ok(EnvironmentProperties::from_object(environment)),
        Some(_) => Err(Error::invalid_format(
            "properties.environment must be an object",
        )),
    }
}

/// Validate and classify one feature of a collection.
pub fn classify_feature(index: usize, feature: &Value) -> Result<FeatureRole, Error> {
    let feature = feature
        .as_object()
        .ok_or_else(|| Error::invalid_format(format!("feature {index} must be an object")))?;

    let empty = Map::new();
    let properties = match feature.get("properties") {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(properties)) => properties,
        Some(_) => {
            return Err(Error::invalid_format(format!(
                "feature {index} properties must be an object"
            )));
        }
    };

    let geometry = parse_geometry(feature.get("geometry").unwrap_or(&Value::Null))?;

    let role = properties.get("type").and_then(Value::as_str);
    let type_id = properties.get("typeId").and_then(extract_type_id);
    let category_id = properties
        .get("categoryId")
        .and_then(lenient_integer)
        .map(CategoryId::new);

    match role {
        Some("environment") => environment_role(index, geometry),
        Some("zone") => Ok(FeatureRole::Zone(zone_draft(properties, geometry, type_id))),
        Some("poi") => Ok(FeatureRole::Poi(poi_draft(properties, geometry, category_id))),
        _ if type_id.is_some() => Ok(FeatureRole::Zone(zone_draft(properties, geometry, type_id))),
        _ if category_id.is_some() => {
            Ok(FeatureRole::Poi(poi_draft(properties, geometry, category_id)))
        }
        _ => Ok(FeatureRole::Ignored),
    }
}

fn environment_role(index: usize, geometry: Geometry) -> Result<FeatureRole, Error> {
    match geometry {
        Geometry::Polygon(rings) => Ok(FeatureRole::Environment { rings }),
        other => Err(Error::invalid_format(format!(
            "environment feature {index} must be a Polygon, found {}",
            other.kind()
        ))),
    }
}

fn zone_draft(
    properties: &Map<String, Value>,
    geometry: Geometry,
    type_id: Option<ZoneTypeId>,
) -> ZoneDraft {
    ZoneDraft {
        id: properties.get("id").and_then(exact_integer).map(ZoneId::new),
        content: ZoneContent {
            name: text(properties, "name"),
            description: text(properties, "description"),
            geometry,
            type_id,
        },
    }
}

fn poi_draft(
    properties: &Map<String, Value>,
    geometry: Geometry,
    category_id: Option<CategoryId>,
) -> PoiDraft {
    PoiDraft {
        id: properties.get("id").and_then(exact_integer).map(PoiId::new),
        content: PoiContent {
            name: text(properties, "name"),
            description: text(properties, "description"),
            geometry,
            image_url: text(properties, "image"),
            category_id,
        },
    }
}

/// Resolve a zone type reference.
///
/// Accepts a number, a numeric string, or an object whose `id` is either.
///
/// # Examples
/// ```
/// use envsync::domain::extract_type_id;
/// use serde_json::json;
///
/// assert_eq!(extract_type_id(&json!({"id": "7"})).map(|id| id.get()), Some(7));
/// assert_eq!(extract_type_id(&json!("kitchen")), None);
/// ```
pub fn extract_type_id(value: &Value) -> Option<ZoneTypeId> {
    match value {
        Value::Object(object) => object.get("id").and_then(lenient_integer),
        other => lenient_integer(other),
    }
    .map(ZoneTypeId::new)
}

fn lenient_integer(value: &Value) -> Option<i64> {
    integer_with(value, |f| Some(f.trunc()))
}

/// Row identifiers: fractional values are not ids.
fn exact_integer(value: &Value) -> Option<i64> {
    integer_with(value, |f| (f.fract() == 0.0).then_some(f))
}

fn integer_with(value: &Value, from_float: impl Fn(f64) -> Option<f64>) -> Option<i64> {
    let (integer, float) = match value {
        Value::Number(number) => (number.as_i64(), number.as_f64()),
        Value::String(raw) => {
            let raw = raw.trim();
            (raw.parse::<i64>().ok(), raw.parse::<f64>().ok())
        }
        _ => return None,
    };
    integer.or_else(|| {
        float
            .filter(|f| f.is_finite())
            .and_then(from_float)
            .map(|f| f as i64)
    })
}

fn lenient_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => match raw.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "feature_collection_tests.rs"]
mod tests;
