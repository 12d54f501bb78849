//! Numeric identifiers for persisted rows.
//!
//! Identifiers mirror the relational store's integer primary keys. The value
//! `0` never names a persisted row: clients use it (or omit the id) to mark a
//! feature that has not been stored yet.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw integer key.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Raw integer key.
            pub const fn get(self) -> i64 {
                self.0
            }

            /// `true` when the id can name a persisted row.
            pub const fn is_persisted(self) -> bool {
                self.0 > 0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// Identifier of an environment row.
    EnvironmentId
}

define_id! {
    /// Identifier of a map row owned by an environment.
    MapId
}

define_id! {
    /// Identifier of a zone row.
    ZoneId
}

define_id! {
    /// Identifier of a POI row.
    PoiId
}

define_id! {
    /// Identifier of a user owning private environments.
    UserId
}

define_id! {
    /// Identifier of an environment/user association row.
    AssociationId
}

define_id! {
    /// Identifier of a zone type (styling, priority, accessibility).
    ZoneTypeId
}

define_id! {
    /// Identifier of a POI category.
    CategoryId
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, false)]
    #[case(-4, false)]
    #[case(7, true)]
    fn persisted_ids_are_strictly_positive(#[case] raw: i64, #[case] expected: bool) {
        assert_eq!(ZoneId::new(raw).is_persisted(), expected);
    }

    #[rstest]
    fn ids_serialise_as_bare_integers() {
        let json = serde_json::to_string(&PoiId::new(42)).expect("serialise id");
        assert_eq!(json, "42");
    }
}
