//! Helper macro generating port error enums with snake_case constructors.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for generated constructors and messages.
    define_port_error! {
        pub enum SamplePortError {
            Connection { message: String } => "store unreachable: {message}",
            Missing { id: i64 } => "row {id} missing",
            Stale { table: String, revision: u32 } => "{table} is stale at revision {revision}",
            Closed => "store closed",
        }
    }

    #[test]
    fn string_fields_accept_str_slices() {
        let err = SamplePortError::connection("timeout after 30s");
        assert_eq!(err.to_string(), "store unreachable: timeout after 30s");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = SamplePortError::missing(42_i64);
        assert_eq!(err, SamplePortError::Missing { id: 42 });
    }

    #[test]
    fn mixed_fields_are_forwarded_in_order() {
        let err = SamplePortError::stale("zone", 3_u32);
        assert_eq!(err.to_string(), "zone is stale at revision 3");
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SamplePortError::closed().to_string(), "store closed");
    }
}
