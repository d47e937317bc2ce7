//! Textual encoding of counted tags.
//!
//! A tag travels through storage as a single string token `"{name}, {count}"`.
//! Older records may carry a bare `"{name}"`, which decodes with a count of 1.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TagError;

/// Separator between the name and the count inside a token.
pub const TOKEN_DELIMITER: char = ',';

/// Normalize a tag name: surrounding whitespace trimmed, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Encode a `(name, count)` pair into its canonical token.
///
/// ```
/// assert_eq!(tags::encode("  Cat ", 2), "cat, 2");
/// ```
pub fn encode(name: &str, count: u32) -> String {
    format!("{}{TOKEN_DELIMITER} {count}", normalize_name(name))
}

/// Decode a token into `(name, count)`.
///
/// Splits on the first comma and trims both halves. A token without a comma
/// decodes with a count of 1.
pub fn decode(token: &str) -> Result<(String, u32), TagError> {
    let (raw_name, raw_count) = match token.split_once(TOKEN_DELIMITER) {
        Some((name, count)) => (name, Some(count.trim())),
        None => (token, None),
    };

    let name = normalize_name(raw_name);
    if name.is_empty() {
        return Err(TagError::malformed(token, "tag name is empty"));
    }

    let count = match raw_count {
        None => 1,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| TagError::malformed(token, format!("count {raw:?} is not a number")))?,
    };
    if count == 0 {
        return Err(TagError::malformed(token, "count must be at least 1"));
    }

    Ok((name, count))
}

/// One counted tag: a lowercase, non-empty name with a count of at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagToken {
    name: String,
    count: u32,
}

impl TagToken {
    /// Build a token, normalizing the name and enforcing the invariants.
    pub fn new(name: &str, count: u32) -> Result<Self, TagError> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return Err(TagError::malformed(name, "tag name is empty"));
        }
        if normalized.contains(TOKEN_DELIMITER) {
            return Err(TagError::malformed(name, "tag name contains a comma"));
        }
        if count == 0 {
            return Err(TagError::malformed(name, "count must be at least 1"));
        }
        Ok(Self {
            name: normalized,
            count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Canonical textual form, identical to [`encode`].
    pub fn encode(&self) -> String {
        encode(&self.name, self.count)
    }
}

impl fmt::Display for TagToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{TOKEN_DELIMITER} {}", self.name, self.count)
    }
}

impl FromStr for TagToken {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, count) = decode(s)?;
        Ok(Self { name, count })
    }
}

impl TryFrom<String> for TagToken {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TagToken> for String {
    fn from(token: TagToken) -> Self {
        token.to_string()
    }
}
