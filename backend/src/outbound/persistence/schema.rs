//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes a table, update the matching block here (or regenerate
//! with `diesel print-schema`).

diesel::table! {
    /// Rendering records owned by environments.
    maps (id) {
        id -> Int8,
        format_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Mapped sites.
    ///
    /// `revision` starts at 1 and increases on every stored change.
    environments (id) {
        id -> Int8,
        name -> Text,
        address -> Nullable<Text>,
        description -> Nullable<Text>,
        is_public -> Bool,
        surface -> Nullable<Float8>,
        map_id -> Nullable<Int8>,
        revision -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Outer boundary of an environment, one row at most per environment.
    delimiters (env_id) {
        env_id -> Int8,
        /// Polygon rings as `[[[x, y], ...], ...]`.
        coordinates -> Jsonb,
    }
}

diesel::table! {
    /// Owner links of private environments.
    env_users (id) {
        id -> Int8,
        env_id -> Int8,
        user_id -> Int8,
    }
}

diesel::table! {
    zones (id) {
        id -> Int8,
        env_id -> Int8,
        name -> Nullable<Text>,
        description -> Nullable<Text>,
        /// GeoJSON geometry object.
        geometry -> Jsonb,
        type_id -> Nullable<Int8>,
    }
}

diesel::table! {
    pois (id) {
        id -> Int8,
        env_id -> Int8,
        name -> Nullable<Text>,
        description -> Nullable<Text>,
        /// GeoJSON geometry object.
        geometry -> Jsonb,
        image_url -> Nullable<Text>,
        category_id -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Detected POI-in-zone containment.
    poi_zones (poi_id, zone_id) {
        poi_id -> Int8,
        zone_id -> Int8,
    }
}

diesel::joinable!(environments -> maps (map_id));
diesel::joinable!(delimiters -> environments (env_id));
diesel::joinable!(env_users -> environments (env_id));
diesel::joinable!(zones -> environments (env_id));
diesel::joinable!(pois -> environments (env_id));
diesel::joinable!(poi_zones -> pois (poi_id));
diesel::joinable!(poi_zones -> zones (zone_id));

diesel::allow_tables_to_appear_in_same_query!(
    maps,
    environments,
    delimiters,
    env_users,
    zones,
    pois,
    poi_zones,
);
