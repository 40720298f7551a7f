//! Resource keys and data versions.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// A Strata resource key.
///
/// The API addresses streams, services and sources by a key that is either
/// numeric or an opaque string; both arrive as `_key` in metadata payloads.
/// Keys are kept as strings internally since they only ever appear in URL
/// paths and request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Creates a key from anything string-like.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<u64> for Key {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer resource key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
                Ok(Key(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
                Ok(Key(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
                Ok(Key(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// A dataset version identifier.
///
/// Versions are UUIDs assigned by the platform on every data update. Delta
/// requests are validated locally before any HTTP call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataVersion(Uuid);

impl DataVersion {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for DataVersion {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_string_json() {
        let key: Key = serde_json::from_str(r#""28654971""#).unwrap();
        assert_eq!(key.as_str(), "28654971");
    }

    #[test]
    fn test_key_from_integer_json() {
        let key: Key = serde_json::from_str("28654971").unwrap();
        assert_eq!(key, Key::from(28654971u64));
    }

    #[test]
    fn test_key_serializes_as_string() {
        let json = serde_json::to_string(&Key::from("abc")).unwrap();
        assert_eq!(json, r#""abc""#);
    }

    #[test]
    fn test_data_version_parse() {
        let version: DataVersion = "76d17547-cac6-4aaf-be16-bda597d3496f".parse().unwrap();
        assert_eq!(version.to_string(), "76d17547-cac6-4aaf-be16-bda597d3496f");
    }

    #[test]
    fn test_data_version_rejects_garbage() {
        assert!("not-a-version".parse::<DataVersion>().is_err());
    }
}
