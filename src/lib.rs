//! Workspace umbrella crate for Snaptag.
//!
//! This crate stitches the stage crates into one [`TagPipeline`]: uploads are
//! ingested, thumbnailed and stored, run through object detection, and saved
//! as records carrying counted tags. Tag edits, searches, deletes, and tag
//! subscriptions all go through the same handle.

pub mod config;
pub mod notify;
mod pipeline;

pub use detect::{DetectError, Detector, DetectorConfig};
pub use index::{BackendConfig, ImageRecord, IndexConfig, IndexError, RecordIndex};
pub use ingest::{
    parse_blob_url, BlobRef, BlobStore, ImagePayload, InMemoryBlobStore, IngestConfig,
    IngestError, UploadRequest,
};
pub use matcher::{MatchConfig, MatchError, MatchHit, SearchKind};
pub use tags::{SubscriptionSet, TagError, TagOp, TagQuery, TagSet};

pub use crate::config::{ConfigLoadError, SnaptagConfig};
pub use crate::notify::{
    ChangeKind, LogSink, MemorySink, NotificationSink, NotifyError, TagNotification,
};
pub use crate::pipeline::TagPipeline;

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors that can occur while running a pipeline operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("ingest failure: {0}")]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error("index failure: {0}")]
    Index(#[from] IndexError),

    #[error("detection failure: {0}")]
    Detect(#[from] DetectError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no record found for user {user_id} and thumbnail {thumbnail}")]
    RecordNotFound { user_id: String, thumbnail: String },

    /// A multi-thumbnail request stopped at `position`. Entries in `applied`
    /// were committed before the failure and stay committed.
    #[error("stopped at entry {position} ({thumbnail}) after {} applied: {source}", .applied.len())]
    Batch {
        position: usize,
        thumbnail: String,
        applied: Vec<String>,
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// The underlying failure, looking through [`Batch`](PipelineError::Batch).
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Batch { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the request, not the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        match self.root_cause() {
            PipelineError::Ingest(err) => err.is_client_error(),
            PipelineError::Tag(_)
            | PipelineError::InvalidRequest(_)
            | PipelineError::RecordNotFound { .. } => true,
            PipelineError::Detect(err) => matches!(err, DetectError::Image(_)),
            _ => false,
        }
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        match value {
            MatchError::RecordNotFound { user_id, thumbnail } => {
                PipelineError::RecordNotFound { user_id, thumbnail }
            }
            MatchError::InvalidQuery(msg) | MatchError::InvalidConfig(msg) => {
                PipelineError::InvalidRequest(msg)
            }
            MatchError::Tag(err) => PipelineError::Tag(err),
            MatchError::Detect(err) => PipelineError::Detect(err),
            MatchError::Index(err) => PipelineError::Index(err),
        }
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_ingest(&self, latency: Duration, result: Result<(), IngestError>);
    fn record_detect(&self, latency: Duration, label_count: usize);
    fn record_merge(&self, latency: Duration, op: TagOp, result: Result<(), TagError>);
    fn record_search(&self, latency: Duration, kind: SearchKind, hit_count: usize);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_ingest(self, result: Result<(), IngestError>) {
        self.recorder.record_ingest(self.start.elapsed(), result);
    }

    pub(crate) fn record_detect(self, label_count: usize) {
        self.recorder.record_detect(self.start.elapsed(), label_count);
    }

    pub(crate) fn record_merge(self, op: TagOp, result: Result<(), TagError>) {
        self.recorder.record_merge(self.start.elapsed(), op, result);
    }

    pub(crate) fn record_search(self, kind: SearchKind, hit_count: usize) {
        self.recorder
            .record_search(self.start.elapsed(), kind, hit_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_error_reports_position_and_cause() {
        let err = PipelineError::Batch {
            position: 1,
            thumbnail: "s3://b/thumbnails/u/b.jpg".into(),
            applied: vec!["s3://b/thumbnails/u/a.jpg".into()],
            source: Box::new(PipelineError::Tag(TagError::TagNotFound {
                tag: "dog".into(),
                thumbnail: "s3://b/thumbnails/u/b.jpg".into(),
            })),
        };
        let msg = err.to_string();
        assert!(msg.contains("entry 1"));
        assert!(msg.contains("after 1 applied"));
        assert!(matches!(
            err.root_cause(),
            PipelineError::Tag(TagError::TagNotFound { .. })
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn match_errors_map_to_pipeline_kinds() {
        let err: PipelineError = MatchError::RecordNotFound {
            user_id: "u".into(),
            thumbnail: "t".into(),
        }
        .into();
        assert!(matches!(err, PipelineError::RecordNotFound { .. }));

        let err: PipelineError = MatchError::InvalidQuery("blank".into()).into();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[test]
    fn blob_failures_are_server_errors() {
        let err = PipelineError::Ingest(IngestError::Blob("unreachable".into()));
        assert!(!err.is_client_error());
    }
}
