//! # Snaptag Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` answers read-side queries over a user's image records stored in
//! `index`:
//!
//! - **by tags**: a list of `"name"` or `"name, count"` predicates; a record
//!   is returned when it satisfies *any* of them (count at least the
//!   predicate's minimum).
//! - **by image**: objects detected in a query image become count-1
//!   predicates.
//! - **by thumbnail**: resolve a thumbnail reference to its original.
//!
//! Tag names compare case-insensitively. Results are ordered by thumbnail
//! reference.
//!
//! ## Core Types
//!
//! - [`TagPredicate`]: a name and minimum count.
//! - [`MatchConfig`]: result cap and config version.
//! - [`MatchHit`]: thumbnail and original references plus the predicates hit.
//! - [`Matcher`]: wires `index` and `detect` together.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use detect::{Detector, DetectorConfig};
//! use index::{ImageRecord, IndexConfig, RecordIndex};
//! use matcher::Matcher;
//! use tags::TagSet;
//!
//! let index = RecordIndex::new(IndexConfig::new()).expect("index init");
//! index
//!     .put_image(&ImageRecord::new(
//!         "alice",
//!         "s3://snaptag/thumbnails/alice/cat.jpg",
//!         "s3://snaptag/images/alice/cat.jpg",
//!         TagSet::from_tokens(["cat, 2", "dog, 1"]).unwrap(),
//!     ))
//!     .unwrap();
//!
//! let detector = Detector::new(DetectorConfig::fixed()).expect("detector");
//! let matcher = Matcher::new(Arc::new(index), Arc::new(detector));
//!
//! let hits = matcher.search_by_tags("alice", &["cat, 3", "dog"]).unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].matched_tags, vec!["dog".to_string()]);
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to
//! record per-search latency and hit counts.

pub mod engine;
pub mod metrics;
pub mod types;

pub use crate::engine::{match_records, satisfied_predicates, Matcher};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::types::{
    parse_predicates, MatchConfig, MatchError, MatchHit, SearchKind, TagPredicate,
};
