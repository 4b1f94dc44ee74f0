//! Opaque 128-bit entity identifiers rendered as lowercase hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::VouchError;

/// Fill a fresh 16-byte identifier from the OS random source.
pub fn random_bytes16() -> Result<[u8; 16], VouchError> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| VouchError::Internal(format!("random source unavailable: {e}")))?;
    Ok(bytes)
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 16]);

        impl $name {
            pub const fn new(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Generate a new random identifier.
            pub fn generate() -> Result<Self, VouchError> {
                random_bytes16().map(Self)
            }

            pub fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// Parse the 32-char hex form. Hyphenated UUID text is accepted too.
            pub fn parse(raw: &str) -> Result<Self, VouchError> {
                let compact: String = raw.chars().filter(|c| *c != '-').collect();
                let mut bytes = [0u8; 16];
                hex::decode_to_slice(&compact, &mut bytes).map_err(|_| {
                    VouchError::InvalidInput(format!("malformed {} id: {raw:?}", $label))
                })?;
                Ok(Self(bytes))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        // Always the hex string form, so JSON and bincode agree on a single representation.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// Identifier of a point of interest.
    PlaceId,
    "place"
);
hex_id!(
    /// Identifier of a review.
    ReviewId,
    "review"
);
hex_id!(
    /// Identifier of a helpfulness vote.
    VoteId,
    "vote"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_uuid_text() {
        let id = PlaceId::parse("6f1c2d3e-4a5b-4c6d-8e7f-901234567890").unwrap();
        assert_eq!(id.to_hex(), "6f1c2d3e4a5b4c6d8e7f901234567890");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ReviewId::parse("not-an-id").is_err());
        assert!(ReviewId::parse("abcd").is_err());
    }

    #[test]
    fn generated_ids_differ() {
        let a = VoteId::generate().unwrap();
        let b = VoteId::generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn json_form_is_hex_string() {
        let id = ReviewId::new([0xab; 16]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(16)));
        let back: ReviewId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
