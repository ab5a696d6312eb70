//! Type-safe identifiers using the TypeID specification
//!
//! Every identifier is a prefixed TypeID backed by a UUIDv7, so ids sort by
//! creation time and carry their kind in the text form:
//!
//! - `RequestId`: `req_01h455vb4pex5vsknk084sn02q`
//! - `FeedbackId`: `fb_01h455vb4pex5vsknk084sn02q`
//! - `AdminId`: `adm_01h455vb4pex5vsknk084sn02q`
//!
//! ```rust
//! use feedback_service::ids::FeedbackId;
//! use std::str::FromStr;
//!
//! let id = FeedbackId::new();
//! let parsed = FeedbackId::from_str(id.as_str()).unwrap();
//! assert_eq!(id, parsed);
//! ```

use http::Request;
use mti::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The ID could not be parsed as a valid TypeID.
    #[error("failed to parse ID: {0}")]
    Parse(#[from] MagicTypeIdError),

    /// The prefix was not the expected value.
    #[error("invalid prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        /// The expected prefix.
        expected: String,
        /// The actual prefix found.
        actual: String,
    },
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(MagicTypeId);

        impl $name {
            /// The prefix used for this identifier kind
            pub const PREFIX: &'static str = $prefix;

            /// Creates a new time-sortable identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Self::PREFIX.create_type_id::<V7>())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Returns the prefix portion of the ID.
            #[must_use]
            pub fn prefix(&self) -> &str {
                self.0.prefix().as_str()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mti = MagicTypeId::from_str(s)?;

                if mti.prefix().as_str() != Self::PREFIX {
                    return Err(IdError::InvalidPrefix {
                        expected: Self::PREFIX.to_string(),
                        actual: mti.prefix().as_str().to_string(),
                    });
                }

                Ok(Self(mti))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::from_str(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

typed_id!(
    /// Request identifier for log correlation, generated per HTTP request.
    RequestId,
    "req"
);

typed_id!(
    /// Identifier of a stored feedback record.
    FeedbackId,
    "fb"
);

typed_id!(
    /// Identifier of an admin account.
    AdminId,
    "adm"
);

/// A `MakeRequestId` implementation that generates `RequestId`s for tower-http.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_carry_their_prefix() {
        assert!(RequestId::new().as_str().starts_with("req_"));
        assert!(FeedbackId::new().as_str().starts_with("fb_"));

        let admin = AdminId::new();
        assert_eq!(admin.prefix(), "adm");
        // TypeID format: prefix (3) + underscore (1) + suffix (26) = 30
        assert_eq!(admin.as_str().len(), 30);
    }

    #[test]
    fn test_parse_round_trips() {
        let id_str = "fb_01h455vb4pex5vsknk084sn02q";
        let id = FeedbackId::from_str(id_str).unwrap();
        assert_eq!(id.as_str(), id_str);
        assert_eq!(id.to_string(), id_str);
    }

    #[test]
    fn test_wrong_prefix_is_rejected() {
        let result = FeedbackId::from_str("adm_01h455vb4pex5vsknk084sn02q");
        match result.unwrap_err() {
            IdError::InvalidPrefix { expected, actual } => {
                assert_eq!(expected, "fb");
                assert_eq!(actual, "adm");
            }
            other => panic!("Expected InvalidPrefix error, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(FeedbackId::from_str("64f1c0ffee").is_err());
        assert!(AdminId::from_str("adm_invalid").is_err());
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = FeedbackId::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = FeedbackId::new();
        assert!(first < second);
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let id = AdminId::from_str("adm_01h455vb4pex5vsknk084sn02q").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"adm_01h455vb4pex5vsknk084sn02q\"");

        let back: AdminId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let wrong: Result<AdminId, _> = serde_json::from_str("\"fb_01h455vb4pex5vsknk084sn02q\"");
        assert!(wrong.is_err());
    }

    #[test]
    fn test_make_typed_request_id() {
        let mut maker = MakeTypedRequestId;
        let request = http::Request::builder().body(()).unwrap();

        let header_value = maker.make_request_id(&request).unwrap().into_header_value();
        assert!(header_value.to_str().unwrap().starts_with("req_"));
    }
}
