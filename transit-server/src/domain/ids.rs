//! Schedule entity identifiers.

use std::fmt;

use serde::Serialize;

/// Error returned when parsing an invalid entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

macro_rules! schedule_id {
    ($(#[$doc:meta])* $name:ident, $kind:literal) => {
        $(#[$doc])*
        ///
        /// Guaranteed non-empty with no leading or trailing whitespace and no
        /// interior NUL byte. Schedule feeds use free-form identifier strings,
        /// so no further structure is assumed.
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier from a raw schedule-table string.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(InvalidId {
                        kind: $kind,
                        reason: "must not be empty",
                    });
                }
                if trimmed.contains('\0') {
                    return Err(InvalidId {
                        kind: $kind,
                        reason: "must not contain NUL",
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

schedule_id!(
    /// A stop identifier from the schedule tables.
    StopId,
    "stop"
);
schedule_id!(
    /// A route identifier from the schedule tables.
    RouteId,
    "route"
);
schedule_id!(
    /// A trip identifier from the schedule tables.
    TripId,
    "trip"
);
schedule_id!(
    /// A fare product identifier linking fare rules to fare attributes.
    FareProductId,
    "fare product"
);


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any non-blank NUL-free string parses, and round-trips trimmed.
        #[test]
        fn roundtrip_trimmed(s in "[ ]{0,2}[a-zA-Z0-9_:-]{1,20}[ ]{0,2}") {
            let id = StopId::parse(&s).unwrap();
            prop_assert_eq!(id.as_str(), s.trim());
        }

        /// Blank strings are always rejected.
        #[test]
        fn blank_rejected(s in "[ \t\n]{0,10}") {
            prop_assert!(StopId::parse(&s).is_err());
        }
    }
}
