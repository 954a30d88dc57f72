//! Configuration module
//!
//! Env-driven configuration for the ingestion pipeline: transform strategy,
//! fetch limits, and storage backend settings. All variables carry a
//! `VITRINE_` prefix; storage credentials follow the usual AWS variables read
//! by the object store itself.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Common constants
const FETCH_TIMEOUT_SECS: u64 = 15;
const MAX_VIDEO_SIZE_BYTES: usize = 50 * 1024 * 1024;
const WEBP_QUALITY: f32 = 80.0;

/// Which Transform & Store configuration a deployment runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransformStrategy {
    /// Store fetched bytes verbatim, one artifact per asset.
    #[default]
    StoreOriginal,
    /// Re-encode images into the fixed large/medium/thumb WebP renditions.
    MultiResolution,
}

impl FromStr for TransformStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" | "store_original" => Ok(TransformStrategy::StoreOriginal),
            "renditions" | "multi_resolution" => Ok(TransformStrategy::MultiResolution),
            _ => Err(anyhow::anyhow!("Invalid transform strategy: {}", s)),
        }
    }
}

impl Display for TransformStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransformStrategy::StoreOriginal => write!(f, "original"),
            TransformStrategy::MultiResolution => write!(f, "renditions"),
        }
    }
}

/// Ingest pipeline configuration.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub strategy: TransformStrategy,
    /// Upper bound on any single media fetch.
    pub fetch_timeout_secs: u64,
    /// Hard ceiling on downloaded video payloads; larger bodies are discarded
    /// without being stored.
    pub max_video_size_bytes: usize,
    pub webp_quality: f32,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean
    /// Spaces, GCS interop, etc.)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            strategy: TransformStrategy::default(),
            fetch_timeout_secs: FETCH_TIMEOUT_SECS,
            max_video_size_bytes: MAX_VIDEO_SIZE_BYTES,
            webp_quality: WEBP_QUALITY,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            local_storage_base_url: None,
        }
    }
}

impl IngestConfig {
    /// Load configuration from the environment, applying defaults for
    /// anything unset. Reads a `.env` file when present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let strategy = match env::var("VITRINE_TRANSFORM_STRATEGY") {
            Ok(value) => value.parse()?,
            Err(_) => TransformStrategy::default(),
        };

        let storage_backend = match env::var("VITRINE_STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Local,
        };

        Ok(IngestConfig {
            strategy,
            fetch_timeout_secs: parse_var("VITRINE_FETCH_TIMEOUT_SECS", FETCH_TIMEOUT_SECS)?,
            max_video_size_bytes: parse_var("VITRINE_MAX_VIDEO_SIZE_BYTES", MAX_VIDEO_SIZE_BYTES)?,
            webp_quality: parse_var("VITRINE_WEBP_QUALITY", WEBP_QUALITY)?,
            storage_backend,
            s3_bucket: env::var("VITRINE_S3_BUCKET").ok(),
            s3_region: env::var("VITRINE_S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("VITRINE_S3_ENDPOINT").ok(),
            local_storage_path: env::var("VITRINE_LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("VITRINE_LOCAL_STORAGE_BASE_URL").ok(),
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "original".parse::<TransformStrategy>().unwrap(),
            TransformStrategy::StoreOriginal
        );
        assert_eq!(
            "RENDITIONS".parse::<TransformStrategy>().unwrap(),
            TransformStrategy::MultiResolution
        );
        assert_eq!(
            "multi_resolution".parse::<TransformStrategy>().unwrap(),
            TransformStrategy::MultiResolution
        );
        assert!("mp4".parse::<TransformStrategy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.fetch_timeout_secs, 15);
        assert_eq!(config.max_video_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.strategy, TransformStrategy::StoreOriginal);
    }
}
