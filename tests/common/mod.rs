#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use detect::{DetectorConfig, FixedNetwork, LabelMap};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use snaptag::{
    Detector, ImagePayload, InMemoryBlobStore, IndexConfig, MemorySink, RecordIndex,
    TagPipeline, UploadRequest,
};

pub const LABELS: [&str; 4] = ["person", "bicycle", "dog", "cat"];

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 80, 40])))
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

/// A network reporting one confident box per named label.
pub fn network_for(labels: &[&str]) -> FixedNetwork {
    labels.iter().enumerate().fold(
        FixedNetwork::new(LABELS.len()),
        |net, (i, label)| {
            let class_id = LABELS.iter().position(|l| l == label).unwrap();
            let offset = 0.1 + 0.2 * i as f32;
            net.with_box(class_id, 0.9, (offset, offset, 0.1, 0.1))
        },
    )
}

pub struct Harness {
    pub pipeline: TagPipeline,
    pub blobs: Arc<InMemoryBlobStore>,
    pub sink: Arc<MemorySink>,
}

pub fn harness(detected: &[&str]) -> Harness {
    harness_with_index(detected, RecordIndex::new(IndexConfig::new()).unwrap())
}

pub fn harness_with_index(detected: &[&str], index: RecordIndex) -> Harness {
    let detector = Detector::with_network(
        DetectorConfig::fixed(),
        LABELS.into_iter().collect::<LabelMap>(),
        Arc::new(network_for(detected)),
    )
    .unwrap();
    let blobs = Arc::new(InMemoryBlobStore::new());
    let sink = Arc::new(MemorySink::new());
    let pipeline =
        TagPipeline::new(index, detector, blobs.clone()).with_notifier(sink.clone());
    Harness {
        pipeline,
        blobs,
        sink,
    }
}

pub fn upload(user: &str, file_name: &str) -> UploadRequest {
    UploadRequest::new(user, ImagePayload::Bytes(png(96, 64))).with_file_name(file_name)
}
