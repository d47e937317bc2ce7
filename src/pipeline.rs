use std::collections::BTreeSet;
use std::sync::Arc;

use detect::Detector;
use image::DynamicImage;
use index::{ImageRecord, RecordIndex};
use ingest::{
    decode_base64, ingest, parse_blob_url, BlobStore, IngestConfig, IngestedImage, UploadRequest,
};
use matcher::{MatchConfig, MatchHit, Matcher, SearchKind};
use tags::{changed_subscribed, SubscriptionSet, TagOp, TagQuery, TagSet, TagToken};
use tracing::{debug, info, warn, Level};

use crate::config::SnaptagConfig;
use crate::notify::{ChangeKind, LogSink, NotificationSink, TagNotification};
use crate::{MetricsSpan, PipelineError};

/// Every user-facing operation over one record index, detector and blob store.
///
/// Operations are synchronous. Each record is read, changed and written back
/// whole; two concurrent edits of the same record race and the later write
/// wins.
pub struct TagPipeline {
    index: Arc<RecordIndex>,
    detector: Arc<Detector>,
    matcher: Matcher,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn NotificationSink>,
    ingest_cfg: IngestConfig,
}

impl TagPipeline {
    /// Assemble a pipeline with default ingest and search settings and a
    /// logging notification sink.
    pub fn new(index: RecordIndex, detector: Detector, blobs: Arc<dyn BlobStore>) -> Self {
        let index = Arc::new(index);
        let detector = Arc::new(detector);
        Self {
            matcher: Matcher::new(index.clone(), detector.clone()),
            index,
            detector,
            blobs,
            notifier: Arc::new(LogSink),
            ingest_cfg: IngestConfig::default(),
        }
    }

    /// Open the index and load the detector named by `cfg`.
    pub fn from_config(
        cfg: &SnaptagConfig,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self, PipelineError> {
        cfg.validate()
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;
        let index = RecordIndex::new(cfg.index.to_index_config())?;
        let detector = Detector::new(cfg.detector.clone())?;
        Ok(Self::new(index, detector, blobs)
            .with_ingest_config(cfg.ingest.clone())
            .with_match_config(cfg.matcher.clone()))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_ingest_config(mut self, cfg: IngestConfig) -> Self {
        self.ingest_cfg = cfg;
        self
    }

    pub fn with_match_config(mut self, cfg: MatchConfig) -> Self {
        self.matcher = Matcher::with_config(self.index.clone(), self.detector.clone(), cfg);
        self
    }

    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn ingest_config(&self) -> &IngestConfig {
        &self.ingest_cfg
    }

    /// Store an upload and tag it with whatever the detector finds.
    ///
    /// Detection runs before anything is written. A detector failure, or a
    /// label that cannot be stored as a tag, leaves the record with fewer
    /// tags instead of failing the upload. Blobs written for a new upload
    /// are removed again if the record cannot be stored. Uploading over an
    /// existing file name replaces that record.
    pub fn ingest_upload(&self, request: UploadRequest) -> Result<ImageRecord, PipelineError> {
        let ingest_metrics = MetricsSpan::start();
        let upload = match ingest(request, &self.ingest_cfg) {
            Ok(upload) => {
                if let Some(span) = ingest_metrics {
                    span.record_ingest(Ok(()));
                }
                upload
            }
            Err(err) => {
                if let Some(span) = ingest_metrics {
                    span.record_ingest(Err(err.clone()));
                }
                return Err(err.into());
            }
        };

        let span = tracing::span!(
            Level::INFO,
            "pipeline.ingest_upload",
            user_id = %upload.user_id,
            thumbnail = %upload.thumbnail_ref
        );
        let _guard = span.enter();

        let detect_metrics = MetricsSpan::start();
        let labels = self.detector.detect(&upload.image);
        if let Some(span) = detect_metrics {
            span.record_detect(labels.len());
        }
        let tags = tags_for_labels(&labels);

        let record = ImageRecord::new(
            upload.user_id.as_str(),
            upload.thumbnail_url(),
            upload.image_url(),
            tags,
        );
        let previous = self.index.get_image(&record.user_id, &record.thumbnail_url)?;
        self.store_upload(&upload, &record, previous.is_none())?;
        info!(
            labels = ?labels,
            replaced = previous.is_some(),
            "upload_tagged"
        );

        let kind = if previous.is_some() {
            ChangeKind::Updated
        } else {
            ChangeKind::Inserted
        };
        self.notify(kind, previous.as_ref().map(|r| &r.tags), &record);
        Ok(record)
    }

    /// Write both blobs, then the record.
    ///
    /// When `fresh` is set and any write fails, the blobs are deleted again.
    /// A replaced upload keeps its blobs since the old record still points
    /// at them.
    fn store_upload(
        &self,
        upload: &IngestedImage,
        record: &ImageRecord,
        fresh: bool,
    ) -> Result<(), PipelineError> {
        let stored = self
            .blobs
            .put(&upload.image_ref, &upload.original)
            .and_then(|()| self.blobs.put(&upload.thumbnail_ref, &upload.thumbnail))
            .map_err(PipelineError::from)
            .and_then(|()| self.index.put_image(record).map_err(PipelineError::from));

        if let Err(err) = stored {
            if fresh {
                for blob in [&upload.image_ref, &upload.thumbnail_ref] {
                    if let Err(cleanup) = self.blobs.delete(blob) {
                        warn!(blob = %blob, error = %cleanup, "orphaned upload blob");
                    }
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Apply an add/remove request to each listed thumbnail, in order.
    ///
    /// Stops at the first failing thumbnail with [`PipelineError::Batch`];
    /// thumbnails before it keep their new tags.
    pub fn update_tags(
        &self,
        user_id: &str,
        query: &TagQuery,
    ) -> Result<Vec<ImageRecord>, PipelineError> {
        let user_id = require(user_id, "user_id")?;
        let span = tracing::span!(
            Level::INFO,
            "pipeline.update_tags",
            user_id,
            op = %query.op,
            thumbnails = query.thumbnails.len()
        );
        let _guard = span.enter();

        let mut updated = Vec::with_capacity(query.thumbnails.len());
        let mut applied = Vec::with_capacity(query.thumbnails.len());
        for (position, thumbnail) in query.thumbnails.iter().enumerate() {
            match self.update_one(user_id, query, thumbnail) {
                Ok(record) => {
                    applied.push(thumbnail.clone());
                    updated.push(record);
                }
                Err(err) => {
                    warn!(position, thumbnail = %thumbnail, error = %err, "tag update stopped");
                    return Err(PipelineError::Batch {
                        position,
                        thumbnail: thumbnail.clone(),
                        applied,
                        source: Box::new(err),
                    });
                }
            }
        }
        Ok(updated)
    }

    fn update_one(
        &self,
        user_id: &str,
        query: &TagQuery,
        thumbnail: &str,
    ) -> Result<ImageRecord, PipelineError> {
        let current = self.fetch(user_id, thumbnail)?;

        let merge_metrics = MetricsSpan::start();
        let merged = query.apply(&current.tags, thumbnail);
        if let Some(span) = merge_metrics {
            span.record_merge(query.op, merged.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        let tags = merged?;

        let record = current.with_tags(tags);
        self.index.put_image(&record)?;
        debug!(
            thumbnail,
            op = %query.op,
            tags = ?record.tags.to_tokens(),
            "tags updated"
        );
        self.notify(ChangeKind::Updated, Some(&current.tags), &record);
        Ok(record)
    }

    /// Add `names` to every listed thumbnail.
    pub fn add_tags<S: AsRef<str>>(
        &self,
        user_id: &str,
        thumbnails: &[S],
        names: &[S],
    ) -> Result<Vec<ImageRecord>, PipelineError> {
        self.update_tags(user_id, &build_query(TagOp::Add, thumbnails, names))
    }

    /// Remove `names` from every listed thumbnail.
    pub fn remove_tags<S: AsRef<str>>(
        &self,
        user_id: &str,
        thumbnails: &[S],
        names: &[S],
    ) -> Result<Vec<ImageRecord>, PipelineError> {
        self.update_tags(user_id, &build_query(TagOp::Remove, thumbnails, names))
    }

    /// Delete records and both of their blobs, in order.
    ///
    /// Stops at the first thumbnail without a record; earlier deletions stay
    /// committed. Returns the thumbnails deleted.
    pub fn delete_images<S: AsRef<str>>(
        &self,
        user_id: &str,
        thumbnails: &[S],
    ) -> Result<Vec<String>, PipelineError> {
        let user_id = require(user_id, "user_id")?;
        let mut deleted = Vec::with_capacity(thumbnails.len());
        for (position, thumbnail) in thumbnails.iter().enumerate() {
            let thumbnail = thumbnail.as_ref();
            if let Err(err) = self.delete_one(user_id, thumbnail) {
                warn!(position, thumbnail, error = %err, "delete stopped");
                return Err(PipelineError::Batch {
                    position,
                    thumbnail: thumbnail.to_string(),
                    applied: deleted,
                    source: Box::new(err),
                });
            }
            deleted.push(thumbnail.to_string());
        }
        info!(user_id, deleted = deleted.len(), "images deleted");
        Ok(deleted)
    }

    fn delete_one(&self, user_id: &str, thumbnail: &str) -> Result<(), PipelineError> {
        let record = self.fetch(user_id, thumbnail)?;
        self.blobs.delete(&parse_blob_url(&record.thumbnail_url)?)?;
        self.blobs.delete(&parse_blob_url(&record.image_url)?)?;
        self.index.delete_image(&record.user_id, &record.thumbnail_url)?;
        Ok(())
    }

    /// Records carrying any of `query` (`"name"` or `"name, count"`).
    pub fn search_by_tags<S: AsRef<str>>(
        &self,
        user_id: &str,
        query: &[S],
    ) -> Result<Vec<MatchHit>, PipelineError> {
        let search_metrics = MetricsSpan::start();
        let hits = self.matcher.search_by_tags(user_id, query)?;
        if let Some(span) = search_metrics {
            span.record_search(SearchKind::Tags, hits.len());
        }
        Ok(hits)
    }

    /// Records carrying any object detected in `image`.
    pub fn search_by_image(
        &self,
        user_id: &str,
        image: &DynamicImage,
    ) -> Result<Vec<MatchHit>, PipelineError> {
        let search_metrics = MetricsSpan::start();
        let hits = self.matcher.search_by_image(user_id, image)?;
        if let Some(span) = search_metrics {
            span.record_search(SearchKind::Image, hits.len());
        }
        Ok(hits)
    }

    /// [`search_by_image`](Self::search_by_image) for a base64-encoded image.
    pub fn search_by_image_base64(
        &self,
        user_id: &str,
        encoded: &str,
    ) -> Result<Vec<MatchHit>, PipelineError> {
        let bytes = decode_base64(encoded)?;
        if bytes.is_empty() {
            return Err(ingest::IngestError::MissingPayload.into());
        }
        let image = detect::decode_image(&bytes)?;
        self.search_by_image(user_id, &image)
    }

    /// The record behind a thumbnail reference.
    pub fn lookup_thumbnail(
        &self,
        user_id: &str,
        thumbnail: &str,
    ) -> Result<ImageRecord, PipelineError> {
        let search_metrics = MetricsSpan::start();
        let record = self.matcher.find_record(user_id, thumbnail)?;
        if let Some(span) = search_metrics {
            span.record_search(SearchKind::Thumbnail, 1);
        }
        Ok(record)
    }

    /// Add tag names to a user's subscriptions and return the full set.
    ///
    /// Names are trimmed and lowercased; blanks are dropped. Subscriptions
    /// only ever grow.
    pub fn subscribe<S: AsRef<str>>(
        &self,
        user_id: &str,
        names: &[S],
    ) -> Result<SubscriptionSet, PipelineError> {
        let user_id = require(user_id, "user_id")?;
        let mut subscriptions = self.index.get_subscriptions(user_id)?;
        let added = subscriptions.extend(names.iter().map(AsRef::as_ref));
        if added > 0 {
            self.index.put_subscriptions(user_id, &subscriptions)?;
        }
        info!(user_id, added, total = subscriptions.len(), "subscribed");
        Ok(subscriptions)
    }

    pub fn subscriptions(&self, user_id: &str) -> Result<SubscriptionSet, PipelineError> {
        let user_id = require(user_id, "user_id")?;
        Ok(self.index.get_subscriptions(user_id)?)
    }

    fn fetch(&self, user_id: &str, thumbnail: &str) -> Result<ImageRecord, PipelineError> {
        let thumbnail = require(thumbnail, "thumbnail")?;
        self.index
            .get_image(user_id, thumbnail)?
            .ok_or_else(|| PipelineError::RecordNotFound {
                user_id: user_id.to_string(),
                thumbnail: thumbnail.to_string(),
            })
    }

    /// Publish a notification when subscribed tags changed. Never fails the
    /// caller.
    fn notify(&self, kind: ChangeKind, old: Option<&TagSet>, record: &ImageRecord) {
        let subscriptions = match self.index.get_subscriptions(&record.user_id) {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                warn!(
                    user_id = %record.user_id,
                    error = %err,
                    "subscriptions unavailable; notification skipped"
                );
                return;
            }
        };
        let changed_tags = changed_subscribed(old, &record.tags, &subscriptions);
        if changed_tags.is_empty() {
            return;
        }
        let notification = TagNotification {
            user_id: record.user_id.clone(),
            kind,
            changed_tags,
            thumbnail_url: record.thumbnail_url.clone(),
            image_url: record.image_url.clone(),
        };
        if let Err(err) = self.notifier.publish(&notification) {
            warn!(
                user_id = %notification.user_id,
                thumbnail = %notification.thumbnail_url,
                error = %err,
                "notification failed"
            );
        }
    }
}

/// Initial tags for detected labels, each at count 1.
///
/// A label with a comma keeps only the text before it ("tench, Tinca tinca"
/// becomes "tench"). Labels still unusable after that are dropped.
fn tags_for_labels(labels: &BTreeSet<String>) -> TagSet {
    let usable: BTreeSet<&str> = labels
        .iter()
        .filter_map(|label| {
            let head = label.split(',').next().unwrap_or_default().trim();
            match TagToken::new(head, 1) {
                Ok(_) => Some(head),
                Err(err) => {
                    warn!(label = %label, error = %err, "detected label dropped");
                    None
                }
            }
        })
        .collect();
    TagSet::from_labels(usable).unwrap_or_default()
}

fn build_query<S: AsRef<str>>(op: TagOp, thumbnails: &[S], names: &[S]) -> TagQuery {
    TagQuery::new(op, names.iter().map(|n| n.as_ref().to_string()))
        .with_thumbnails(thumbnails.iter().map(|t| t.as_ref().to_string()))
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, PipelineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidRequest(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemorySink;
    use detect::{DetectorConfig, FixedNetwork, LabelMap};
    use image::{ImageFormat, Rgb, RgbImage};
    use index::IndexConfig;
    use ingest::{ImagePayload, InMemoryBlobStore};
    use ingest::{BlobRef, IngestError};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tags::TagError;

    /// Blob store that can be told to refuse thumbnail writes.
    #[derive(Default)]
    struct FlakyBlobStore {
        inner: InMemoryBlobStore,
        reject_thumbnails: AtomicBool,
    }

    impl BlobStore for FlakyBlobStore {
        fn put(&self, blob: &BlobRef, bytes: &[u8]) -> Result<(), IngestError> {
            if self.reject_thumbnails.load(Ordering::SeqCst)
                && blob.to_string().contains("/thumbnails/")
            {
                return Err(IngestError::Blob("thumbnail bucket unavailable".into()));
            }
            self.inner.put(blob, bytes)
        }

        fn get(&self, blob: &BlobRef) -> Result<Option<Vec<u8>>, IngestError> {
            self.inner.get(blob)
        }

        fn delete(&self, blob: &BlobRef) -> Result<(), IngestError> {
            self.inner.delete(blob)
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 60, 90])))
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn pipeline_with(
        labels: LabelMap,
        network: FixedNetwork,
        blobs: Arc<dyn BlobStore>,
    ) -> TagPipeline {
        let detector = Detector::with_network(DetectorConfig::fixed(), labels, Arc::new(network))
            .unwrap();
        let index = RecordIndex::new(IndexConfig::new()).unwrap();
        TagPipeline::new(index, detector, blobs)
    }

    fn pipeline(
        network: FixedNetwork,
    ) -> (TagPipeline, Arc<InMemoryBlobStore>, Arc<MemorySink>) {
        let labels: LabelMap = ["person", "dog", "cat"].into_iter().collect();
        let blobs = Arc::new(InMemoryBlobStore::new());
        let sink = Arc::new(MemorySink::new());
        let pipeline =
            pipeline_with(labels, network, blobs.clone()).with_notifier(sink.clone());
        (pipeline, blobs, sink)
    }

    fn dog_and_cat() -> FixedNetwork {
        FixedNetwork::new(3)
            .with_box(1, 0.9, (0.25, 0.25, 0.2, 0.2))
            .with_box(2, 0.8, (0.75, 0.75, 0.2, 0.2))
    }

    fn upload_request(name: &str) -> UploadRequest {
        UploadRequest::new("u1", ImagePayload::Bytes(png(64, 48))).with_file_name(name)
    }

    fn upload(p: &TagPipeline, name: &str) -> ImageRecord {
        p.ingest_upload(upload_request(name)).unwrap()
    }

    #[test]
    fn upload_writes_blobs_and_tags_record() {
        let (p, blobs, _) = pipeline(dog_and_cat());
        let record = upload(&p, "a.png");
        assert_eq!(record.tags.to_tokens(), vec!["cat, 1", "dog, 1"]);
        assert_eq!(record.thumbnail_url, "s3://snaptag/thumbnails/u1/a.png");
        assert!(blobs.contains(&parse_blob_url(&record.image_url).unwrap()));
        assert!(blobs.contains(&parse_blob_url(&record.thumbnail_url).unwrap()));
        assert_eq!(
            p.index().get_image("u1", &record.thumbnail_url).unwrap(),
            Some(record)
        );
    }

    #[test]
    fn upload_without_detections_is_stored_untagged() {
        let (p, _, _) = pipeline(FixedNetwork::empty());
        let record = upload(&p, "a.png");
        assert!(record.tags.is_empty());
    }

    #[test]
    fn comma_labels_are_cut_to_their_first_name() {
        let labels: LabelMap = ["salt, pepper", ", "].into_iter().collect();
        let network = FixedNetwork::new(2)
            .with_box(0, 0.9, (0.25, 0.25, 0.2, 0.2))
            .with_box(1, 0.9, (0.75, 0.75, 0.2, 0.2));
        let blobs = Arc::new(InMemoryBlobStore::new());
        let p = pipeline_with(labels, network, blobs.clone());

        let record = upload(&p, "a.png");
        assert_eq!(record.tags.to_tokens(), vec!["salt, 1"]);
        assert_eq!(blobs.len(), 2);
        assert_eq!(p.index().get_image("u1", &record.thumbnail_url).unwrap(), Some(record));
    }

    #[test]
    fn failed_new_upload_leaves_no_blobs() {
        let blobs = Arc::new(FlakyBlobStore::default());
        blobs.reject_thumbnails.store(true, Ordering::SeqCst);
        let p = pipeline_with(
            ["person", "dog", "cat"].into_iter().collect(),
            dog_and_cat(),
            blobs.clone(),
        );

        let err = p.ingest_upload(upload_request("a.png")).unwrap_err();
        assert!(matches!(err, PipelineError::Ingest(IngestError::Blob(_))));
        assert!(blobs.inner.is_empty());
        assert!(p
            .index()
            .get_image("u1", "s3://snaptag/thumbnails/u1/a.png")
            .unwrap()
            .is_none());
    }

    #[test]
    fn failed_replacement_keeps_the_previous_upload() {
        let blobs = Arc::new(FlakyBlobStore::default());
        let p = pipeline_with(
            ["person", "dog", "cat"].into_iter().collect(),
            dog_and_cat(),
            blobs.clone(),
        );
        let original = upload(&p, "a.png");

        blobs.reject_thumbnails.store(true, Ordering::SeqCst);
        assert!(p.ingest_upload(upload_request("a.png")).is_err());
        assert_eq!(blobs.inner.len(), 2);
        assert!(blobs.inner.contains(&parse_blob_url(&original.thumbnail_url).unwrap()));
        assert_eq!(
            p.index().get_image("u1", &original.thumbnail_url).unwrap(),
            Some(original)
        );
    }

    #[test]
    fn failed_add_in_batch_keeps_earlier_entries() {
        let (p, _, _) = pipeline(dog_and_cat());
        let a = upload(&p, "a.png");
        let query = TagQuery::new(TagOp::Add, ["dog"]).with_thumbnails([
            a.thumbnail_url.clone(),
            "s3://snaptag/thumbnails/u1/missing.png".to_string(),
        ]);
        match p.update_tags("u1", &query) {
            Err(PipelineError::Batch {
                position,
                applied,
                source,
                ..
            }) => {
                assert_eq!(position, 1);
                assert_eq!(applied, vec![a.thumbnail_url.clone()]);
                assert!(matches!(*source, PipelineError::RecordNotFound { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let stored = p.index().get_image("u1", &a.thumbnail_url).unwrap().unwrap();
        assert_eq!(stored.tags.get("dog"), Some(2));
    }

    #[test]
    fn remove_rejections_leave_record_untouched() {
        let (p, _, _) = pipeline(FixedNetwork::new(3).with_box(2, 0.9, (0.5, 0.5, 0.2, 0.2)));
        let a = upload(&p, "a.png");
        let err = p
            .remove_tags("u1", &[a.thumbnail_url.as_str()], &["cat"])
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            PipelineError::Tag(TagError::EmptyTagSet { .. })
        ));
        let err = p
            .remove_tags("u1", &[a.thumbnail_url.as_str()], &["dog"])
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            PipelineError::Tag(TagError::TagNotFound { .. })
        ));
        assert_eq!(p.lookup_thumbnail("u1", &a.thumbnail_url).unwrap().tags, a.tags);
    }

    #[test]
    fn subscriptions_drive_notifications() {
        let (p, _, sink) = pipeline(dog_and_cat());
        let subs = p.subscribe("u1", &["Dog", " ", "frisbee"]).unwrap();
        assert_eq!(subs.iter().collect::<Vec<_>>(), vec!["dog", "frisbee"]);

        let a = upload(&p, "a.png");
        p.add_tags("u1", &[a.thumbnail_url.as_str()], &["cat"]).unwrap();
        p.add_tags("u1", &[a.thumbnail_url.as_str()], &["frisbee"]).unwrap();

        let sent = sink.notifications();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, ChangeKind::Inserted);
        assert_eq!(sent[0].changed_tags, vec!["dog"]);
        assert_eq!(sent[1].kind, ChangeKind::Updated);
        assert_eq!(sent[1].changed_tags, vec!["frisbee"]);
    }

    #[test]
    fn delete_cascades_to_blobs() {
        let (p, blobs, _) = pipeline(dog_and_cat());
        let a = upload(&p, "a.png");
        let b = upload(&p, "b.png");
        assert_eq!(blobs.len(), 4);

        let missing = "s3://snaptag/thumbnails/u1/zzz.png";
        let err = p
            .delete_images(
                "u1",
                &[a.thumbnail_url.as_str(), missing, b.thumbnail_url.as_str()],
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Batch { position: 1, .. }));
        assert_eq!(blobs.len(), 2);
        assert!(p.index().get_image("u1", &a.thumbnail_url).unwrap().is_none());
        assert!(p.index().get_image("u1", &b.thumbnail_url).unwrap().is_some());
    }

    #[test]
    fn blank_user_rejected() {
        let (p, _, _) = pipeline(FixedNetwork::empty());
        assert!(matches!(
            p.subscribe("  ", &["cat"]),
            Err(PipelineError::InvalidRequest(_))
        ));
    }
}
