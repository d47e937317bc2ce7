//! Add/remove operations over a record's [`TagSet`].
//!
//! Every operation is computed against an immutable snapshot and returns a new
//! set, so a rejected request never leaves a half-applied record behind.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{normalize_name, TOKEN_DELIMITER};
use crate::{TagError, TagSet};

/// Operation kind. Encoded on the wire as `1` (add) and `0` (remove).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TagOp {
    Remove,
    Add,
}

impl TryFrom<u8> for TagOp {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TagOp::Remove),
            1 => Ok(TagOp::Add),
            other => Err(format!("unknown tag operation type {other}, expected 0 or 1")),
        }
    }
}

impl From<TagOp> for u8 {
    fn from(op: TagOp) -> Self {
        match op {
            TagOp::Remove => 0,
            TagOp::Add => 1,
        }
    }
}

impl fmt::Display for TagOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagOp::Remove => f.write_str("remove"),
            TagOp::Add => f.write_str("add"),
        }
    }
}

/// A tag edit request: bare names applied to each listed thumbnail in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagQuery {
    #[serde(rename = "type")]
    pub op: TagOp,
    pub tags: Vec<String>,
    #[serde(rename = "url", default)]
    pub thumbnails: Vec<String>,
}

impl TagQuery {
    pub fn new<I, S>(op: TagOp, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op,
            tags: tags.into_iter().map(Into::into).collect(),
            thumbnails: Vec::new(),
        }
    }

    pub fn with_thumbnails<I, S>(mut self, thumbnails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.thumbnails = thumbnails.into_iter().map(Into::into).collect();
        self
    }

    /// Apply this query's operation to one record's tags.
    pub fn apply(&self, current: &TagSet, thumbnail: &str) -> Result<TagSet, TagError> {
        merge(current, self.op, &self.tags, thumbnail)
    }
}

/// Compute the tag set that results from applying `op` with `names`.
///
/// `Add` bumps the count of each requested name by one, inserting missing names
/// at 1. `Remove` drops requested names entirely regardless of count; it fails
/// with [`TagError::TagNotFound`] when a name is absent and with
/// [`TagError::EmptyTagSet`] when it would remove every tag. `thumbnail` only
/// labels errors.
pub fn merge<S: AsRef<str>>(
    current: &TagSet,
    op: TagOp,
    names: &[S],
    thumbnail: &str,
) -> Result<TagSet, TagError> {
    let requested = normalize_request(names)?;
    let mut next = current.clone();

    match op {
        TagOp::Add => {
            for name in &requested {
                next.increment(name);
            }
        }
        TagOp::Remove => {
            if let Some(missing) = requested.iter().find(|name| !current.contains(name)) {
                return Err(TagError::TagNotFound {
                    tag: missing.clone(),
                    thumbnail: thumbnail.to_string(),
                });
            }

            let distinct: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
            if !current.is_empty() && distinct.len() == current.len() {
                return Err(TagError::EmptyTagSet {
                    thumbnail: thumbnail.to_string(),
                    count: distinct.len(),
                });
            }

            for name in distinct {
                next.remove(name);
            }
        }
    }

    debug!(
        op = %op,
        thumbnail,
        requested = requested.len(),
        before = current.len(),
        after = next.len(),
        "tag merge applied"
    );
    Ok(next)
}

fn normalize_request<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, TagError> {
    names
        .iter()
        .map(|raw| {
            let raw = raw.as_ref();
            let name = normalize_name(raw);
            if name.is_empty() {
                Err(TagError::malformed(raw, "tag name is empty"))
            } else if name.contains(TOKEN_DELIMITER) {
                Err(TagError::malformed(raw, "tag name contains a comma"))
            } else {
                Ok(name)
            }
        })
        .collect()
}
