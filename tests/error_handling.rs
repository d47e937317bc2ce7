mod common;

use common::{harness, upload};
use snaptag::{
    ImagePayload, IngestError, PipelineError, SnaptagConfig, TagError, TagOp, TagQuery,
    UploadRequest,
};

#[test]
fn missing_payload_is_ingest_error() {
    let h = harness(&["dog"]);
    let request = UploadRequest {
        user_id: "alice".into(),
        file_name: Some("a.png".into()),
        payload: None,
        received_at: None,
    };
    let err = h.pipeline.ingest_upload(request).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::MissingPayload)));
    assert!(err.is_client_error());
    assert_eq!(h.blobs.len(), 0);
}

#[test]
fn garbage_base64_rejected_before_storage() {
    let h = harness(&["dog"]);
    let request = UploadRequest::new("alice", ImagePayload::Base64("%%% not base64".into()));
    let err = h.pipeline.ingest_upload(request).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::InvalidBase64(_))));
    assert_eq!(h.pipeline.index().image_count().unwrap(), 0);
}

#[test]
fn non_image_bytes_rejected() {
    let h = harness(&["dog"]);
    let request = UploadRequest::new("alice", ImagePayload::Bytes(b"GIF? no".to_vec()));
    let err = h.pipeline.ingest_upload(request).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::InvalidImage(_))));
}

#[test]
fn removing_absent_tag_names_the_tag() {
    let h = harness(&["dog", "cat"]);
    let rec = h.pipeline.ingest_upload(upload("alice", "a.png")).unwrap();
    let query =
        TagQuery::new(TagOp::Remove, ["frisbee"]).with_thumbnails([rec.thumbnail_url.clone()]);

    let err = h.pipeline.update_tags("alice", &query).unwrap_err();
    match err.root_cause() {
        PipelineError::Tag(TagError::TagNotFound { tag, thumbnail }) => {
            assert_eq!(tag, "frisbee");
            assert_eq!(thumbnail, &rec.thumbnail_url);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn removing_every_tag_is_refused() {
    let h = harness(&["dog", "cat"]);
    let rec = h.pipeline.ingest_upload(upload("alice", "a.png")).unwrap();

    let err = h
        .pipeline
        .remove_tags("alice", &[rec.thumbnail_url.as_str()], &["dog", "CAT"])
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        PipelineError::Tag(TagError::EmptyTagSet { .. })
    ));
    let stored = h.pipeline.lookup_thumbnail("alice", &rec.thumbnail_url).unwrap();
    assert_eq!(stored.tags, rec.tags);
}

#[test]
fn malformed_search_token_rejected() {
    let h = harness(&["dog"]);
    let err = h.pipeline.search_by_tags("alice", &["dog, many"]).unwrap_err();
    assert!(matches!(err, PipelineError::Tag(TagError::MalformedTag { .. })));
}

#[test]
fn unknown_thumbnail_lookup_is_not_found() {
    let h = harness(&["dog"]);
    let err = h
        .pipeline
        .lookup_thumbnail("alice", "s3://snaptag/thumbnails/alice/none.png")
        .unwrap_err();
    assert!(matches!(err, PipelineError::RecordNotFound { .. }));
}

#[test]
fn other_users_records_are_invisible_to_edits() {
    let h = harness(&["dog"]);
    let rec = h.pipeline.ingest_upload(upload("alice", "a.png")).unwrap();
    let err = h
        .pipeline
        .add_tags("mallory", &[rec.thumbnail_url.as_str()], &["cat"])
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        PipelineError::RecordNotFound { .. }
    ));
}

#[test]
fn undecodable_search_image_rejected() {
    let h = harness(&["dog"]);
    let err = h
        .pipeline
        .search_by_image_base64("alice", "aGVsbG8gd29ybGQ=")
        .unwrap_err();
    assert!(matches!(err, PipelineError::Detect(_)));
    assert!(err.is_client_error());
}

#[test]
fn bad_config_version_rejected() {
    let err = SnaptagConfig::from_yaml("version: \"9\"\n").unwrap_err();
    assert!(err.to_string().contains('9'));
}
