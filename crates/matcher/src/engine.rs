use std::sync::Arc;
use std::time::Instant;

use detect::Detector;
use image::DynamicImage;
use index::{ImageRecord, RecordIndex};
use tags::TagSet;
use tracing::{debug, Level};

use crate::metrics::metrics_recorder;
use crate::types::{parse_predicates, MatchConfig, MatchError, MatchHit, SearchKind, TagPredicate};


/// Names of the predicates `tags` satisfies, in predicate order without repeats.
///
/// A predicate holds when the set carries its name with a count of at least
/// `min_count`. Names compare case-insensitively.
pub fn satisfied_predicates(tags: &TagSet, predicates: &[TagPredicate]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for predicate in predicates {
        let holds = tags
            .get(&predicate.name)
            .is_some_and(|count| count >= predicate.min_count);
        if holds && !matched.contains(&predicate.name) {
            matched.push(predicate.name.clone());
        }
    }
    matched
}

/// OR-match `predicates` against `records`, keeping the records' order.
///
/// An empty predicate list matches nothing and does not touch the corpus.
pub fn match_records<'a, I>(predicates: &[TagPredicate], records: I) -> Vec<MatchHit>
where
    I: IntoIterator<Item = &'a ImageRecord>,
{
    if predicates.is_empty() {
        return Vec::new();
    }
    records
        .into_iter()
        .filter_map(|record| to_hit(record, predicates))
        .collect()
}

fn to_hit(record: &ImageRecord, predicates: &[TagPredicate]) -> Option<MatchHit> {
    let mut matched_tags = satisfied_predicates(&record.tags, predicates);
    if matched_tags.is_empty() {
        return None;
    }
    matched_tags.sort();
    Some(MatchHit {
        thumbnail_url: record.thumbnail_url.clone(),
        image_url: record.image_url.clone(),
        matched_tags,
    })
}

/// Searches one user's records in the index.
///
/// Results come back ordered by thumbnail reference, which is the index's
/// scan order.
pub struct Matcher {
    index: Arc<RecordIndex>,
    detector: Arc<Detector>,
    cfg: MatchConfig,
}

impl Matcher {
    pub fn new(index: Arc<RecordIndex>, detector: Arc<Detector>) -> Self {
        Self::with_config(index, detector, MatchConfig::default())
    }

    pub fn with_config(index: Arc<RecordIndex>, detector: Arc<Detector>, cfg: MatchConfig) -> Self {
        Self {
            index,
            detector,
            cfg,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Records whose tags satisfy any of `query`.
    ///
    /// Entries are `"name"` or `"name, count"`; blank entries are ignored and
    /// an all-blank query returns nothing.
    pub fn search_by_tags<S: AsRef<str>>(
        &self,
        user_id: &str,
        query: &[S],
    ) -> Result<Vec<MatchHit>, MatchError> {
        let start = Instant::now();
        let predicates = parse_predicates(query)?;
        let hits = self.search_predicates(user_id, &predicates)?;
        record_metric(user_id, SearchKind::Tags, start, hits.len());
        Ok(hits)
    }

    /// Detect objects in `image` and search for records carrying any of them.
    ///
    /// Detection failures are treated as zero labels, so an image with nothing
    /// recognizable matches nothing.
    pub fn search_by_image(
        &self,
        user_id: &str,
        image: &DynamicImage,
    ) -> Result<Vec<MatchHit>, MatchError> {
        let start = Instant::now();
        let labels = self.detector.detect(image);
        let predicates: Vec<TagPredicate> = labels
            .iter()
            .map(|label| TagPredicate::new(label, 1))
            .collect();
        let hits = self.search_predicates(user_id, &predicates)?;
        debug!(
            user_id,
            labels = ?labels,
            hits = hits.len(),
            "search_by_image"
        );
        record_metric(user_id, SearchKind::Image, start, hits.len());
        Ok(hits)
    }

    /// Decode `bytes` then [`search_by_image`](Self::search_by_image).
    ///
    /// Undecodable bytes are an error; a decodable image the network chokes
    /// on is not.
    pub fn search_by_image_bytes(
        &self,
        user_id: &str,
        bytes: &[u8],
    ) -> Result<Vec<MatchHit>, MatchError> {
        let image = detect::decode_image(bytes)?;
        self.search_by_image(user_id, &image)
    }

    /// Original image reference for a thumbnail reference.
    pub fn lookup_thumbnail(
        &self,
        user_id: &str,
        thumbnail_url: &str,
    ) -> Result<String, MatchError> {
        let start = Instant::now();
        let record = self.find_record(user_id, thumbnail_url)?;
        record_metric(user_id, SearchKind::Thumbnail, start, 1);
        Ok(record.image_url)
    }

    /// The stored record for `(user_id, thumbnail_url)`.
    pub fn find_record(
        &self,
        user_id: &str,
        thumbnail_url: &str,
    ) -> Result<ImageRecord, MatchError> {
        let user_id = require(user_id, "user_id")?;
        let thumbnail_url = require(thumbnail_url, "thumbnail_url")?;
        self.index
            .get_image(user_id, thumbnail_url)?
            .ok_or_else(|| MatchError::RecordNotFound {
                user_id: user_id.to_string(),
                thumbnail: thumbnail_url.to_string(),
            })
    }

    fn search_predicates(
        &self,
        user_id: &str,
        predicates: &[TagPredicate],
    ) -> Result<Vec<MatchHit>, MatchError> {
        let user_id = require(user_id, "user_id")?;
        self.cfg.validate()?;
        if predicates.is_empty() {
            return Ok(Vec::new());
        }

        let span = tracing::span!(
            Level::DEBUG,
            "matcher.search",
            user_id,
            predicates = predicates.len()
        );
        let _guard = span.enter();

        let mut hits = Vec::new();
        self.index.scan_user_images(user_id, &mut |record| {
            if let Some(hit) = to_hit(record, predicates) {
                hits.push(hit);
            }
            Ok(())
        })?;
        if let Some(limit) = self.cfg.max_results {
            hits.truncate(limit);
        }
        debug!(hits = hits.len(), "search complete");
        Ok(hits)
    }
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, MatchError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MatchError::InvalidQuery(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

fn record_metric(user_id: &str, kind: SearchKind, start: Instant, hit_count: usize) {
    if let Some(recorder) = metrics_recorder() {
        recorder.record_match(user_id, kind, start.elapsed(), hit_count);
    }
}
