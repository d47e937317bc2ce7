//! YAML configuration for the Snaptag pipeline.
//!
//! One file holds every stage's settings. Stage sections reuse the stage
//! crates' own config types, so anything they accept is accepted here, and
//! omitted keys keep their defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # Snaptag Pipeline Configuration
//! version: "1.0"
//!
//! detector:
//!   mode: "onnx"
//!   model_path: "./models/yolov3/yolov3.onnx"
//!   labels_path: "./models/yolov3/coco.names"
//!   input_size: 416
//!   confidence_threshold: 0.3
//!   nms_threshold: 0.1
//!   label_threshold: 0.6
//!
//! ingest:
//!   bucket: "snaptag"
//!   images_prefix: "images"
//!   thumbnails_prefix: "thumbnails"
//!   thumbnail_max_side: 150
//!   jpeg_quality: 90
//!   max_payload_bytes: 10485760
//!
//! index:
//!   backend: "redb"
//!   path: "./data/snaptag.redb"
//!   compression: "zstd"
//!   compression_level: 3
//!
//! matcher:
//!   max_results: 100
//! ```

use std::fs;
use std::path::Path;

use detect::DetectorConfig;
use index::{BackendConfig, CompressionCodec, CompressionConfig, IndexConfig};
use ingest::IngestConfig;
use matcher::MatchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SnaptagConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub matcher: MatchConfig,
}

impl SnaptagConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: SnaptagConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.detector
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("detector: {e}")))?;
        self.ingest
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("ingest: {e}")))?;
        self.index.validate()?;
        self.matcher
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("matcher: {e}")))?;
        Ok(())
    }
}

impl Default for SnaptagConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            detector: DetectorConfig::default(),
            ingest: IngestConfig::default(),
            index: IndexYamlConfig::default(),
            matcher: MatchConfig::default(),
        }
    }
}

/// Index YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    /// `"in_memory"` or `"redb"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database file; required for `redb`.
    #[serde(default)]
    pub path: Option<String>,

    /// `"zstd"` or `"none"`.
    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "redb"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.backend must be one of: {valid_backends:?}"
            )));
        }

        if self.backend == "redb" && self.path.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Err(ConfigLoadError::Validation(
                "index.path is required when backend is 'redb'".to_string(),
            ));
        }

        let valid_codecs = ["zstd", "none"];
        if !valid_codecs.contains(&self.compression.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.compression must be one of: {valid_codecs:?}"
            )));
        }

        if !(1..=22).contains(&self.compression_level) {
            return Err(ConfigLoadError::Validation(
                "index.compression_level must be within 1..=22".to_string(),
            ));
        }

        Ok(())
    }

    /// Runtime index configuration for this section.
    pub fn to_index_config(&self) -> IndexConfig {
        let backend = match (self.backend.as_str(), self.path.as_deref()) {
            ("redb", Some(path)) => BackendConfig::redb(path),
            _ => BackendConfig::in_memory(),
        };
        let codec = match self.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        IndexConfig::new()
            .with_backend(backend)
            .with_compression(CompressionConfig::new(codec, self.compression_level))
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            compression: default_compression(),
            compression_level: default_compression_level(),
        }
    }
}

fn default_backend() -> String {
    "in_memory".to_string()
}
fn default_compression() -> String {
    "zstd".to_string()
}
fn default_compression_level() -> i32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
detector:
  mode: "fixed"
ingest:
  bucket: "photos"
"#;

        let config = SnaptagConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, Some("test config".to_string()));
        assert_eq!(config.detector.mode, "fixed");
        assert_eq!(config.detector.label_threshold, 0.6);
        assert_eq!(config.ingest.bucket, "photos");
        assert_eq!(config.ingest.thumbnail_max_side, 150);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
index:
  backend: "in_memory"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = SnaptagConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.version, "1");
        assert_eq!(config.index, IndexYamlConfig::default());
    }

    #[test]
    fn test_default_config() {
        let config = SnaptagConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.input_size, 416);
    }

    #[test]
    fn test_unsupported_version() {
        let result = SnaptagConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_detector_validation() {
        let yaml = r#"
version: "1.0"
detector:
  input_size: 100
"#;
        let err = SnaptagConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("detector"));
    }

    #[test]
    fn test_redb_requires_path() {
        let yaml = r#"
version: "1.0"
index:
  backend: "redb"
"#;
        let err = SnaptagConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("index.path"));
    }

    #[test]
    fn test_index_config_conversion() {
        let section = IndexYamlConfig {
            backend: "redb".into(),
            path: Some("/tmp/snaptag.redb".into()),
            compression: "none".into(),
            compression_level: 5,
        };
        let cfg = section.to_index_config();
        assert_eq!(cfg.backend, BackendConfig::redb("/tmp/snaptag.redb"));
        assert_eq!(cfg.compression.codec, CompressionCodec::None);
        assert_eq!(cfg.compression.level, 5);
    }
}
