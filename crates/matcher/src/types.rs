use detect::DetectError;
use index::IndexError;
use serde::{Deserialize, Serialize};
use tags::TagError;
use thiserror::Error;

/// One search predicate: a tag name and the lowest count that satisfies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagPredicate {
    /// Normalized (trimmed, lowercase) tag name.
    pub name: String,
    pub min_count: u32,
}

impl TagPredicate {
    pub fn new(name: &str, min_count: u32) -> Self {
        Self {
            name: tags::normalize_name(name),
            min_count: min_count.max(1),
        }
    }

    /// Parse `"cat"` or `"cat, 3"`. Blank input yields `None`.
    ///
    /// ```
    /// use matcher::TagPredicate;
    ///
    /// let p = TagPredicate::parse(" Cat, 3 ").unwrap().unwrap();
    /// assert_eq!((p.name.as_str(), p.min_count), ("cat", 3));
    /// assert!(TagPredicate::parse("   ").unwrap().is_none());
    /// ```
    pub fn parse(raw: &str) -> Result<Option<Self>, MatchError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let (name, min_count) = tags::decode(raw)?;
        Ok(Some(Self { name, min_count }))
    }
}

/// Parse a query list, skipping blank entries.
pub fn parse_predicates<S: AsRef<str>>(raw: &[S]) -> Result<Vec<TagPredicate>, MatchError> {
    let mut predicates = Vec::with_capacity(raw.len());
    for entry in raw {
        if let Some(predicate) = TagPredicate::parse(entry.as_ref())? {
            predicates.push(predicate);
        }
    }
    Ok(predicates)
}

/// Which search path produced a result; used for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Tags,
    Image,
    Thumbnail,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Tags => "tags",
            SearchKind::Image => "image",
            SearchKind::Thumbnail => "thumbnail",
        }
    }
}

/// Search configuration.
///
/// `MatchConfig` is cheap to clone and serde-friendly so it can be embedded in
/// higher-level configs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Configuration schema version.
    #[serde(default = "MatchConfig::default_version")]
    pub version: String,
    /// Cap on returned hits; `None` returns every match.
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl MatchConfig {
    pub(crate) fn default_version() -> String {
        "v1".to_string()
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.version.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "config.version must not be empty".into(),
            ));
        }
        if self.max_results == Some(0) {
            return Err(MatchError::InvalidConfig(
                "max_results must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            max_results: None,
        }
    }
}

/// A record that satisfied at least one predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchHit {
    pub thumbnail_url: String,
    pub image_url: String,
    /// Names of the predicates this record satisfied, sorted.
    pub matched_tags: Vec<String>,
}

/// Errors produced by the search layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// The request itself is unusable (blank user id or reference).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// No record for `(user_id, thumbnail)`.
    #[error("no record found for user {user_id} and thumbnail {thumbnail}")]
    RecordNotFound { user_id: String, thumbnail: String },
    /// A query tag could not be parsed.
    #[error(transparent)]
    Tag(#[from] TagError),
    /// The query image could not be decoded.
    #[error("detect error: {0}")]
    Detect(#[from] DetectError),
    /// Index read failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}
