//! Domain types for the bug tracker with strong typing.
//!
//! This module provides type-safe wrappers and domain primitives shared by the
//! services and the HTTP layer. It follows the Newtype pattern so external
//! string identifiers are validated once and never mixed with free-form text.

pub mod bug;
pub mod events;
pub mod query;
pub mod role;
pub mod time;

pub use bug::{BugClassification, BugStatus, TransitionError};
pub use role::{Actor, Permission, UserRole};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// Length of an identifier in raw bytes.
const OBJECT_ID_BYTES: usize = 12;

/// Length of an identifier in its external hex form.
pub const OBJECT_ID_HEX_LEN: usize = OBJECT_ID_BYTES * 2;

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid identifier: {0:?}")]
    Invalid(String),
}

/// Unique identifier for every stored document.
///
/// Externally represented as a 24-character hex string. New identifiers are
/// time-prefixed (4 bytes of seconds since the epoch, 5 random bytes and a
/// 3-byte counter) so they sort roughly by creation time.
///
/// # Examples
///
/// ```rust
/// use bugtracker::domain::ObjectId;
///
/// let id: ObjectId = "507F1F77BCF86CD799439011".parse().unwrap();
/// assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
/// assert!("not-an-id".parse::<ObjectId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_BYTES]);

impl ObjectId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        use rand::Rng;

        let seconds = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX);
        let random: [u8; 5] = rand::rng().random();
        let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes();

        let mut bytes = [0u8; OBJECT_ID_BYTES];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&random);
        bytes[9..].copy_from_slice(&counter[1..]);
        Self(bytes)
    }

    /// Parses an external identifier.
    ///
    /// Fails when the input is empty, has the wrong length or contains
    /// anything other than hex digits. Either hex case is accepted.
    pub fn parse_str(input: &str) -> Result<Self, IdError> {
        if input.len() != OBJECT_ID_HEX_LEN {
            return Err(IdError::Invalid(input.to_string()));
        }

        let mut bytes = [0u8; OBJECT_ID_BYTES];
        hex::decode_to_slice(input, &mut bytes).map_err(|_| IdError::Invalid(input.to_string()))?;
        Ok(Self(bytes))
    }

    /// Returns the canonical lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[must_use]
    pub const fn bytes(&self) -> [u8; OBJECT_ID_BYTES] {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Sort order enumeration to replace boolean blindness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Returns true if this is ascending order.
    #[must_use]
    pub const fn is_ascending(&self) -> bool {
        matches!(self, Self::Ascending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_accepts_any_24_hex_chars() {
        for raw in [
            "507f1f77bcf86cd799439011",
            "000000000000000000000000",
            "FFFFFFFFFFFFFFFFFFFFFFFF",
            "aBcDeF0123456789AbCdEf01",
        ] {
            let id = ObjectId::parse_str(raw).unwrap();
            assert_eq!(id.to_hex(), raw.to_ascii_lowercase());
        }
    }

    #[test]
    fn object_id_rejects_malformed_input() {
        for raw in [
            "",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "507f1f77bcf86cd79943901g",
            "zzzzzzzzzzzzzzzzzzzzzzzz",
            " 507f1f77bcf86cd79943901",
            "507f1f77-cf86-d799-4390-1",
            "ééééééééééé",
        ] {
            assert_eq!(
                ObjectId::parse_str(raw),
                Err(IdError::Invalid(raw.to_string())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn generated_ids_are_unique_and_round_trip() {
        let first = ObjectId::new();
        let second = ObjectId::new();
        assert_ne!(first, second);
        assert_eq!(first.to_string().len(), OBJECT_ID_HEX_LEN);
        assert_eq!(ObjectId::parse_str(&first.to_string()).unwrap(), first);
    }

    #[test]
    fn object_id_serializes_as_hex_string() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"507f1f77bcf86cd799439011\""
        );
        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
        assert!(serde_json::from_str::<ObjectId>("42").is_err());
    }

    #[test]
    fn sort_order_boolean_blindness_fix() {
        assert!(SortOrder::Ascending.is_ascending());
        assert!(!SortOrder::Descending.is_ascending());
    }
}
