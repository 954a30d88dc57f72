//! Transform & Store: turn a resolved, downloadable URL into stored artifacts.
//!
//! Two strategies share this module: store-original keeps the fetched bytes
//! verbatim under the asset's key; multi-resolution downloads once, derives
//! the fixed rendition set, and uploads the derivatives concurrently. Errors
//! returned here fail one asset only; the dispatcher folds them into that
//! asset's result.

use anyhow::{anyhow, Context, Result};
use futures::future::try_join_all;
use std::sync::Arc;

use vitrine_core::models::{AssetRole, Rendition, RenditionUrls};
use vitrine_storage::{keys, Storage};

use crate::compression;
use crate::fetch::Fetcher;

const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";
const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";
const WEBP_CONTENT_TYPE: &str = "image/webp";

/// Artifact(s) stored for one asset.
#[derive(Debug, Clone)]
pub enum StoredArtifacts {
    /// One object, store-original strategy.
    Single { key: String, url: String },
    /// The fixed rendition set, multi-resolution strategy.
    Renditions {
        base_key: String,
        urls: RenditionUrls,
    },
}

/// Fetch an asset and store its bytes verbatim under the deterministic key.
///
/// Video payloads above `max_video_size_bytes` are discarded without any
/// object being written. The upstream content type is preserved when
/// declared, defaulting to `image/jpeg` / `video/mp4` otherwise.
pub async fn store_original(
    fetcher: &dyn Fetcher,
    storage: &dyn Storage,
    product_id: &str,
    role: &AssetRole,
    source_url: &str,
    max_video_size_bytes: usize,
) -> Result<StoredArtifacts> {
    let label = if role.is_video() { "Video" } else { "Image" };
    let media = fetcher
        .fetch(source_url)
        .await
        .map_err(|e| anyhow!("{} download failed: {}", label, e))?;

    if role.is_video() && media.bytes.len() > max_video_size_bytes {
        anyhow::bail!(
            "Video payload too large: {} bytes (limit {})",
            media.bytes.len(),
            max_video_size_bytes
        );
    }

    let content_type = media.content_type.clone().unwrap_or_else(|| {
        let default = if role.is_video() {
            DEFAULT_VIDEO_CONTENT_TYPE
        } else {
            DEFAULT_IMAGE_CONTENT_TYPE
        };
        default.to_string()
    });

    let key = keys::original_key(product_id, role);
    let url = storage
        .put(&key, media.bytes.to_vec(), &content_type)
        .await
        .context("Storage upload failed")?;

    tracing::info!(
        product_id = %product_id,
        role = %role,
        key = %key,
        size_bytes = media.bytes.len(),
        "Stored original asset"
    );

    Ok(StoredArtifacts::Single { key, url })
}

/// Download once, derive the large/medium/thumb renditions, upload them
/// concurrently, and return all three URLs under their size tags.
pub async fn store_renditions(
    fetcher: &dyn Fetcher,
    storage: Arc<dyn Storage>,
    product_id: &str,
    role: &AssetRole,
    source_url: &str,
    quality: f32,
) -> Result<StoredArtifacts> {
    let media = fetcher
        .fetch(source_url)
        .await
        .map_err(|e| anyhow!("Image download failed: {}", e))?;

    // Decode is CPU-bound; run off the async pool to avoid blocking other tasks.
    let data = media.bytes.clone();
    let img = tokio::task::spawn_blocking(move || compression::decode(&data))
        .await
        .context("Image decode task panicked")?
        .map_err(|e| anyhow!("Image decode failed: {}", e))?;
    let img = Arc::new(img);

    let base_key = keys::rendition_base_key(product_id, role);

    let uploads = Rendition::ALL.map(|rendition| {
        let img = Arc::clone(&img);
        let storage = Arc::clone(&storage);
        let key = keys::rendition_key(product_id, role, rendition);
        async move {
            let encoded = tokio::task::spawn_blocking(move || {
                compression::encode_rendition(&img, rendition, quality)
            })
            .await
            .context("Image encode task panicked")??;

            let url = storage
                .put(&key, encoded.to_vec(), WEBP_CONTENT_TYPE)
                .await
                .with_context(|| format!("Rendition upload failed: {}", key))?;
            Ok::<(Rendition, String), anyhow::Error>((rendition, url))
        }
    });

    let results = try_join_all(uploads).await?;

    let mut large = None;
    let mut medium = None;
    let mut thumb = None;
    for (rendition, url) in results {
        match rendition {
            Rendition::Large => large = Some(url),
            Rendition::Medium => medium = Some(url),
            Rendition::Thumb => thumb = Some(url),
        }
    }
    let urls = RenditionUrls {
        large: large.context("missing large rendition")?,
        medium: medium.context("missing medium rendition")?,
        thumb: thumb.context("missing thumb rendition")?,
    };

    tracing::info!(
        product_id = %product_id,
        role = %role,
        base_key = %base_key,
        "Stored rendition set"
    );

    Ok(StoredArtifacts::Renditions { base_key, urls })
}
