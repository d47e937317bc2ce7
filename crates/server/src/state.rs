use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use snaptag::{InMemoryBlobStore, PipelineError, SnaptagConfig, TagPipeline};
use std::sync::Arc;
use std::time::{Duration, Instant};

const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Requests seen for one API key in the current fixed window.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    pub opened_at: Instant,
    pub requests: u32,
}

/// Handles shared by every request.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub rate_limiter: Arc<DashMap<String, RateWindow>>,
    pub pipeline: Arc<TagPipeline>,
    /// Renders `/metrics`; `None` when metrics are disabled.
    pub prometheus: Option<PrometheusHandle>,
}

impl ServerState {
    /// The pipeline is built from `config.pipeline_config` when set. Blobs
    /// are kept in process memory.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline_cfg = match &config.pipeline_config {
            Some(path) => SnaptagConfig::from_file(path)?,
            None => SnaptagConfig::default(),
        };
        let blobs = Arc::new(InMemoryBlobStore::new());
        let pipeline = TagPipeline::from_config(&pipeline_cfg, blobs)?;

        let prometheus = if config.prometheus {
            Some(crate::telemetry::install_prometheus()?)
        } else {
            None
        };

        Ok(Self::with_pipeline(config, pipeline).with_prometheus(prometheus))
    }

    /// State around an already assembled pipeline, with metrics disabled.
    pub fn with_pipeline(config: ServerConfig, pipeline: TagPipeline) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            pipeline: Arc::new(pipeline),
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.prometheus = handle;
        self
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Count one request against `key`; false once the key has used up its
    /// allowance for the current minute.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut window = self
            .rate_limiter
            .entry(key.to_string())
            .or_insert(RateWindow {
                opened_at: now,
                requests: 0,
            });
        if now.duration_since(window.opened_at) > RATE_WINDOW {
            *window = RateWindow {
                opened_at: now,
                requests: 0,
            };
        }
        if window.requests >= self.config.rate_limit_per_minute {
            return false;
        }
        window.requests += 1;
        true
    }

    /// Run a pipeline operation on the blocking pool.
    ///
    /// Image decoding, detection and redb access all block.
    pub async fn run<T, F>(&self, op: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&TagPipeline) -> Result<T, PipelineError> + Send + 'static,
    {
        let pipeline = Arc::clone(&self.pipeline);
        let result = tokio::task::spawn_blocking(move || op(&pipeline)).await?;
        result.map_err(ServerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaptag::{Detector, DetectorConfig, IndexConfig, RecordIndex};

    fn state(limit: u32) -> ServerState {
        let pipeline = TagPipeline::new(
            RecordIndex::new(IndexConfig::new()).unwrap(),
            Detector::new(DetectorConfig::fixed()).unwrap(),
            Arc::new(InMemoryBlobStore::new()),
        );
        let config = ServerConfig {
            rate_limit_per_minute: limit,
            api_keys: ["k1".to_string()].into_iter().collect(),
            ..Default::default()
        };
        ServerState::with_pipeline(config, pipeline)
    }

    #[test]
    fn rate_limit_is_per_key() {
        let state = state(2);
        assert!(state.check_rate_limit("k1"));
        assert!(state.check_rate_limit("k1"));
        assert!(!state.check_rate_limit("k1"));
        assert!(state.check_rate_limit("k2"));
    }

    #[test]
    fn expired_window_starts_over() {
        let state = state(1);
        let Some(stale) = Instant::now().checked_sub(RATE_WINDOW + Duration::from_secs(1)) else {
            return;
        };
        state.rate_limiter.insert(
            "k1".to_string(),
            RateWindow {
                opened_at: stale,
                requests: 1,
            },
        );
        assert!(state.check_rate_limit("k1"));
        assert!(!state.check_rate_limit("k1"));
    }

    #[test]
    fn api_keys_checked_exactly() {
        let state = state(10);
        assert!(state.is_valid_api_key("k1"));
        assert!(!state.is_valid_api_key("K1"));
    }

    #[tokio::test]
    async fn run_maps_pipeline_errors() {
        let state = state(10);
        let err = state
            .run(|p| p.lookup_thumbnail("u", "s3://snaptag/thumbnails/u/none.jpg"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "RECORD_NOT_FOUND");
    }
}
