//! Dispatcher: entry point invoked once per product-creation event.
//!
//! Orchestrates the per-asset resolve/fetch/transform/store work and commits
//! exactly one aggregate write at the end of the run (or zero on a
//! precondition skip, or one failure marker on a top-level error). Asset
//! tasks run concurrently and are joined with collect-all semantics; a
//! failing asset never aborts its siblings.

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;

use vitrine_core::models::{
    AssetDescriptor, AssetKind, AssetResult, AssetRole, AssetStatus, MediaUpdate,
    ProcessingStatus, ProductMediaRecord, VideoType,
};
use vitrine_core::{IngestConfig, TransformStrategy};
use vitrine_processing::{resolver, store, Fetcher, StoredArtifacts};
use vitrine_storage::{keys, Storage};

use crate::repository::ProductRepository;

/// How a dispatcher invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Preconditions not met; zero writes performed.
    Skipped(SkipReason),
    /// Aggregate committed with the given record status.
    Committed(ProcessingStatus),
    /// A concurrent invocation committed first; this run wrote nothing.
    LostRace,
    /// The run itself failed; the record was marked failed with this reason.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessed,
    NoSourceMedia,
}

/// One settled asset task, tagged with enough context to aggregate.
struct ProcessedAsset {
    role: AssetRole,
    result: AssetResult,
    video_type: Option<VideoType>,
}

/// The media ingestion dispatcher. All collaborators are injected so tests
/// can substitute in-memory doubles.
pub struct MediaIngestor {
    products: Arc<dyn ProductRepository>,
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn Fetcher>,
    config: IngestConfig,
}

impl MediaIngestor {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn Fetcher>,
        config: IngestConfig,
    ) -> Self {
        MediaIngestor {
            products,
            storage,
            fetcher,
            config,
        }
    }

    /// Handle one product-creation event.
    ///
    /// Only repository failures while recording a top-level error escape as
    /// `Err`; every per-asset failure is folded into the aggregate.
    pub async fn handle_product_created(&self, product: &ProductMediaRecord) -> Result<Outcome> {
        if let Some(reason) = self.skip_reason(product) {
            tracing::info!(
                product_id = %product.id,
                status = %product.image_status,
                reason = ?reason,
                "Skipping media processing"
            );
            return Ok(Outcome::Skipped(reason));
        }

        match self.run(product).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::error!(product_id = %product.id, error = %reason, "Media processing failed");
                self.products
                    .mark_failed(&product.id, &reason)
                    .await
                    .context("Failed to record processing failure")?;
                Ok(Outcome::Failed(reason))
            }
        }
    }

    /// Precondition gates. Both skip paths write nothing.
    fn skip_reason(&self, product: &ProductMediaRecord) -> Option<SkipReason> {
        let triggered = match self.config.strategy {
            TransformStrategy::StoreOriginal => !product.image_status.is_terminal(),
            // Transcoding deployments mark records pending explicitly;
            // anything else is a no-op.
            TransformStrategy::MultiResolution => {
                product.image_status == ProcessingStatus::Pending
            }
        };
        if !triggered {
            return Some(SkipReason::AlreadyProcessed);
        }

        let has_video = product
            .video_url
            .as_deref()
            .is_some_and(|url| !url.is_empty());
        if product.source_images.is_empty() && !has_video {
            return Some(SkipReason::NoSourceMedia);
        }
        None
    }

    async fn run(&self, product: &ProductMediaRecord) -> Result<Outcome> {
        let assets = self.collect_assets(product);
        tracing::info!(
            product_id = %product.id,
            asset_count = assets.len(),
            strategy = %self.config.strategy,
            "Dispatching asset tasks"
        );

        // Fan out one task per asset and wait for all of them to settle.
        let processed = join_all(
            assets
                .into_iter()
                .map(|asset| self.process_asset(&product.id, asset)),
        )
        .await;

        let update = self.aggregate(processed);
        let status = update.image_status;

        let committed = self
            .products
            .complete_processing(&product.id, product.image_status, update)
            .await
            .context("Aggregate write-back failed")?;

        if !committed {
            tracing::warn!(
                product_id = %product.id,
                "Concurrent invocation won the write-back race; discarding this run's aggregate"
            );
            return Ok(Outcome::LostRace);
        }

        tracing::info!(product_id = %product.id, status = %status, "Media processing committed");
        Ok(Outcome::Committed(status))
    }

    /// Build descriptors for every non-null source reference, in a stable
    /// order: main, gallery entries, video.
    fn collect_assets(&self, product: &ProductMediaRecord) -> Vec<AssetDescriptor> {
        let mut assets = Vec::new();

        if let Some(main) = product.source_images.main.as_deref() {
            if !main.is_empty() {
                assets.push(AssetDescriptor::new(main, AssetRole::Main, self.classify(main)));
            }
        }

        for (index, entry) in product.source_images.gallery.iter().enumerate() {
            if let Some(url) = entry.as_deref() {
                if !url.is_empty() {
                    assets.push(AssetDescriptor::new(
                        url,
                        AssetRole::Gallery(index),
                        self.classify(url),
                    ));
                }
            }
        }

        if let Some(video) = product.video_url.as_deref() {
            if !video.is_empty() {
                assets.push(AssetDescriptor::new(
                    video,
                    AssetRole::Video,
                    self.classify(video),
                ));
            }
        }

        assets
    }

    /// An asset whose URL already lies under our storage base needs no fetch.
    fn classify(&self, url: &str) -> AssetKind {
        let base = self.storage.public_url("");
        if !base.is_empty() && url.starts_with(&base) {
            AssetKind::Storage
        } else {
            AssetKind::External
        }
    }

    /// Process one asset to a settled result. Never returns an error: every
    /// failure is captured in the asset's result.
    async fn process_asset(&self, product_id: &str, asset: AssetDescriptor) -> ProcessedAsset {
        let path = match self.config.strategy {
            TransformStrategy::MultiResolution if !asset.role.is_video() => {
                keys::rendition_base_key(product_id, &asset.role)
            }
            _ => keys::original_key(product_id, &asset.role),
        };

        // Link-through video: tagged as a reference, never fetched.
        if asset.role.is_video() && resolver::is_youtube_url(&asset.source_url) {
            return ProcessedAsset {
                role: asset.role,
                video_type: Some(VideoType::Youtube),
                result: AssetResult {
                    source_url: asset.source_url.clone(),
                    path,
                    is_main: asset.is_main,
                    status: AssetStatus::Completed,
                    url: Some(asset.source_url),
                    renditions: None,
                    error: None,
                },
            };
        }

        // Per-asset idempotency guard: only pending external assets are
        // transformed; everything else passes through unchanged.
        if asset.kind != AssetKind::External || asset.status != AssetStatus::Pending {
            return ProcessedAsset {
                video_type: asset.role.is_video().then_some(VideoType::Upload),
                role: asset.role,
                result: AssetResult {
                    source_url: asset.source_url.clone(),
                    path,
                    is_main: asset.is_main,
                    status: AssetStatus::Completed,
                    url: Some(asset.source_url),
                    renditions: None,
                    error: None,
                },
            };
        }

        let source = resolver::normalize_drive_url(&asset.source_url);

        let stored = match self.config.strategy {
            TransformStrategy::MultiResolution if !asset.role.is_video() => {
                store::store_renditions(
                    self.fetcher.as_ref(),
                    Arc::clone(&self.storage),
                    product_id,
                    &asset.role,
                    &source,
                    self.config.webp_quality,
                )
                .await
            }
            // Videos are stored verbatim under both strategies.
            _ => {
                store::store_original(
                    self.fetcher.as_ref(),
                    self.storage.as_ref(),
                    product_id,
                    &asset.role,
                    &source,
                    self.config.max_video_size_bytes,
                )
                .await
            }
        };

        match stored {
            Ok(StoredArtifacts::Single { url, .. }) => ProcessedAsset {
                video_type: asset.role.is_video().then_some(VideoType::Upload),
                role: asset.role,
                result: AssetResult {
                    source_url: asset.source_url,
                    path,
                    is_main: asset.is_main,
                    status: AssetStatus::Completed,
                    url: Some(url),
                    renditions: None,
                    error: None,
                },
            },
            Ok(StoredArtifacts::Renditions { urls, .. }) => ProcessedAsset {
                video_type: None,
                role: asset.role,
                result: AssetResult {
                    source_url: asset.source_url,
                    path,
                    is_main: asset.is_main,
                    status: AssetStatus::Completed,
                    url: None,
                    renditions: Some(urls),
                    error: None,
                },
            },
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(
                    product_id = %product_id,
                    role = %asset.role,
                    error = %message,
                    "Asset processing failed"
                );
                ProcessedAsset {
                    video_type: None,
                    role: asset.role,
                    result: AssetResult {
                        source_url: asset.source_url,
                        path,
                        is_main: asset.is_main,
                        status: AssetStatus::Failed,
                        url: None,
                        renditions: None,
                        error: Some(message),
                    },
                }
            }
        }
    }

    /// Fold settled asset results into the single write-back aggregate.
    fn aggregate(&self, processed: Vec<ProcessedAsset>) -> MediaUpdate {
        let mut image_results = Vec::new();
        let mut main_image_url = None;
        let mut video_url = None;
        let mut video_type = None;
        let mut failed = 0usize;

        for asset in processed {
            if asset.result.status == AssetStatus::Failed {
                failed += 1;
            }
            match asset.role {
                AssetRole::Video => {
                    if asset.result.status == AssetStatus::Completed {
                        video_url = asset.result.url.clone();
                        video_type = asset.video_type;
                    }
                    // A failed video leaves video_url/video_type unset; the
                    // failure is visible through the aggregate status.
                }
                _ => {
                    if asset.result.is_main && asset.result.status == AssetStatus::Completed {
                        main_image_url = asset.result.display_url().map(str::to_string);
                    }
                    image_results.push(asset.result);
                }
            }
        }

        let image_status = if failed == 0 {
            ProcessingStatus::Completed
        } else {
            ProcessingStatus::CompletedWithErrors
        };

        MediaUpdate {
            image_status,
            main_image_url,
            image_urls: image_results,
            video_url,
            video_type,
            failure_reason: None,
            processed_at: Utc::now(),
        }
    }
}
