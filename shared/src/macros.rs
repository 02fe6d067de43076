/// Implements `as_str`, `Display` and `FromStr` for a wire-level enum.
///
/// The literal for each variant must match the enum's serde representation.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::error::DomainError::validation(
                        stringify!($name),
                        format!("unknown value '{}'", other),
                    )),
                }
            }
        }
    };
}

/// Implements [`crate::types::Versioned`] for entities keyed by a `Uuid` `id`
/// with a `version` counter.
macro_rules! versioned_by_id {
    ($($name:ty),+ $(,)?) => {
        $(
            impl $crate::types::Versioned for $name {
                type Key = ::uuid::Uuid;

                fn key(&self) -> Self::Key {
                    self.id
                }

                fn version(&self) -> i64 {
                    self.version
                }
            }
        )+
    };
}

/// Implements [`crate::types::Versioned`] for append-only records that are
/// never rewritten after creation.
macro_rules! append_only_by_id {
    ($($name:ty),+ $(,)?) => {
        $(
            impl $crate::types::Versioned for $name {
                type Key = ::uuid::Uuid;

                fn key(&self) -> Self::Key {
                    self.id
                }
            }
        )+
    };
}
