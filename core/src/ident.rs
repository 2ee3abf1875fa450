//! Identifier validation.
//!
//! Table and column names are interpolated into SQL text, so they are only
//! ever accepted through [`Ident::new`]. Values are always bound.

use crate::error::{QueryError, Result};
use compact_str::CompactString;
use core::{borrow::Borrow, fmt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Exclusive upper bound on identifier length.
pub const MAX_IDENT_LEN: usize = 100;

/// Returns `true` if `name` is a non-empty ASCII letter/digit/underscore
/// string shorter than [`MAX_IDENT_LEN`].
#[inline]
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() < MAX_IDENT_LEN
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

const fn is_valid_static(bytes: &[u8]) -> bool {
    if bytes.is_empty() || bytes.len() >= MAX_IDENT_LEN {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return false;
        }
        i += 1;
    }
    true
}

/// A validated table or column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(CompactString);

impl Ident {
    pub fn new(name: &str) -> Result<Self> {
        if is_valid_identifier(name) {
            Ok(Self(CompactString::new(name)))
        } else {
            Err(QueryError::InvalidIdentifier(name.to_string()))
        }
    }

    /// Builds an identifier from a name fixed at compile time.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid identifier.
    pub const fn from_static(name: &'static str) -> Self {
        assert!(is_valid_static(name.as_bytes()), "invalid static identifier");
        Self(CompactString::const_new(name))
    }

    /// The conventional primary-key column.
    pub const fn id() -> Self {
        Self::from_static("id")
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Ident {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Ident {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl TryFrom<&str> for Ident {
    type Error = QueryError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Ident {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ident::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_and_underscore() {
        for name in ["users", "help_requests", "_x", "Col9", "a"] {
            assert!(is_valid_identifier(name), "{name}");
        }
        assert!(is_valid_identifier(&"a".repeat(99)));
    }

    #[test]
    fn rejects_injection_characters() {
        for name in [
            "",
            "users;",
            "users; DROP TABLE users",
            "first name",
            "tab\tname",
            "o'brien",
            "\"users\"",
            "`users`",
            "users--",
            "books.id",
            "naïve",
        ] {
            assert!(!is_valid_identifier(name), "{name:?}");
        }
    }

    #[test]
    fn rejects_length_of_one_hundred() {
        assert!(!is_valid_identifier(&"a".repeat(MAX_IDENT_LEN)));
        assert!(matches!(
            Ident::new(&"b".repeat(150)),
            Err(QueryError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn deserialize_validates() {
        let ok: Ident = serde_json::from_str("\"books\"").unwrap();
        assert_eq!(ok, "books");
        assert!(serde_json::from_str::<Ident>("\"bad name\"").is_err());
    }
}
