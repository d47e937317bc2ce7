use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Key accepted when no keys are configured, so a local run works out of the box.
pub const DEMO_API_KEY: &str = "demo-key-12345";

/// HTTP settings for the tagging API. Every field has a default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub listen: String,
    pub request_timeout_secs: u64,
    /// Largest accepted upload or search body, in MiB. Base64 inflates images
    /// by a third, so this bounds the decoded image at roughly 3/4 of it.
    pub max_upload_mb: usize,
    /// Requests per minute for each API key.
    pub rate_limit_per_minute: u32,
    pub api_keys: HashSet<String>,
    /// Answer browser preflights from any origin.
    pub allow_any_origin: bool,
    /// `tracing_subscriber` filter directive, e.g. `info,detect=debug`.
    pub log_filter: String,
    /// Install the Prometheus recorder and serve `/metrics`.
    pub prometheus: bool,
    /// Pipeline YAML (detector, ingest, index, matcher). Defaults when unset.
    pub pipeline_config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_upload_mb: 10,
            rate_limit_per_minute: 100,
            api_keys: HashSet::new(),
            allow_any_origin: true,
            log_filter: "info".to_string(),
            prometheus: true,
            pipeline_config: None,
        }
    }
}

impl ServerConfig {
    /// Read `.env`, then an optional `snaptag-server.{toml,yaml,json}`, then
    /// `SNAPTAG_SERVER__*` variables. Later sources win.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err.into());
            }
        }

        let mut cfg: ServerConfig = config::Config::builder()
            .add_source(config::File::with_name("snaptag-server").required(false))
            .add_source(config::Environment::with_prefix("SNAPTAG_SERVER").separator("__"))
            .build()?
            .try_deserialize()?;

        if cfg.api_keys.is_empty() {
            tracing::warn!(key = DEMO_API_KEY, "no api keys configured; accepting the demo key");
            cfg.api_keys.insert(DEMO_API_KEY.to_string());
        }
        Ok(cfg)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listen.parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.socket_addr().unwrap().port(), 8080);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(cfg.rate_limit_per_minute, 100);
        assert!(cfg.allow_any_origin);
        assert!(cfg.prometheus);
        assert!(cfg.pipeline_config.is_none());
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let cfg: ServerConfig = config::Config::builder()
            .set_override("listen", "127.0.0.1:9090")
            .unwrap()
            .set_override("max_upload_mb", 2)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let addr = cfg.socket_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 9090);
        assert_eq!(cfg.max_upload_bytes(), 2 * 1024 * 1024);
        assert_eq!(cfg.request_timeout_secs, 30);
    }

    #[test]
    fn unparseable_listen_address() {
        let cfg = ServerConfig {
            listen: "not an address".into(),
            ..Default::default()
        };
        assert!(cfg.socket_addr().is_err());
    }
}
