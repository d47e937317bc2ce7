//! Prometheus wiring.
//!
//! [`PrometheusPipelineMetrics`] forwards the pipeline's stage observations
//! to the `metrics` facade; the exporter installed by [`install_prometheus`]
//! renders them at `/metrics`.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use snaptag::{IngestError, PipelineMetrics, SearchKind, TagError, TagOp};

use crate::error::{ServerError, ServerResult};

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder and the pipeline metrics bridge.
///
/// Safe to call more than once; later calls return the first handle.
pub fn install_prometheus() -> ServerResult<PrometheusHandle> {
    let handle = PROMETHEUS.get_or_try_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|err| ServerError::Config(format!("metrics recorder: {err}")))?;
        snaptag::set_pipeline_metrics(Some(Arc::new(PrometheusPipelineMetrics)));
        Ok::<_, ServerError>(handle)
    })?;
    Ok(handle.clone())
}

/// Count an HTTP response by method and status.
pub fn record_request(method: &str, status: u16, latency: Duration) {
    counter!(
        "snaptag_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("snaptag_http_request_duration_seconds").record(latency.as_secs_f64());
}

pub struct PrometheusPipelineMetrics;

impl PipelineMetrics for PrometheusPipelineMetrics {
    fn record_ingest(&self, latency: Duration, result: Result<(), IngestError>) {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        counter!("snaptag_ingest_total", "outcome" => outcome).increment(1);
        histogram!("snaptag_ingest_duration_seconds").record(latency.as_secs_f64());
    }

    fn record_detect(&self, latency: Duration, label_count: usize) {
        histogram!("snaptag_detect_duration_seconds").record(latency.as_secs_f64());
        histogram!("snaptag_detect_labels").record(label_count as f64);
    }

    fn record_merge(&self, latency: Duration, op: TagOp, result: Result<(), TagError>) {
        let outcome = match result {
            Ok(()) => "ok",
            Err(TagError::TagNotFound { .. }) => "tag_not_found",
            Err(TagError::EmptyTagSet { .. }) => "empty_tag_set",
            Err(_) => "malformed",
        };
        counter!(
            "snaptag_merge_total",
            "op" => op.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        histogram!("snaptag_merge_duration_seconds").record(latency.as_secs_f64());
    }

    fn record_search(&self, latency: Duration, kind: SearchKind, hit_count: usize) {
        counter!("snaptag_search_total", "kind" => kind.as_str()).increment(1);
        histogram!("snaptag_search_duration_seconds", "kind" => kind.as_str())
            .record(latency.as_secs_f64());
        histogram!("snaptag_search_hits", "kind" => kind.as_str()).record(hit_count as f64);
    }
}
