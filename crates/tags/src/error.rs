use thiserror::Error;

/// Errors raised while decoding tag tokens or applying tag operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A token could not be decoded into `(name, count)`.
    #[error("malformed tag token {token:?}: {reason}")]
    MalformedTag { token: String, reason: String },
    /// A removal named a tag that the record does not carry.
    #[error("no records found for tag {tag:?} on {thumbnail}")]
    TagNotFound { tag: String, thumbnail: String },
    /// A removal would have stripped every tag from the record.
    #[error("removing {count} tag(s) would leave {thumbnail} without tags")]
    EmptyTagSet { thumbnail: String, count: usize },
}

impl TagError {
    pub(crate) fn malformed(token: impl Into<String>, reason: impl Into<String>) -> Self {
        TagError::MalformedTag {
            token: token.into(),
            reason: reason.into(),
        }
    }
}
