//! One-shot backfill: run a single ingest over a product snapshot file.
//!
//! Reads a product JSON snapshot, runs the configured pipeline against the
//! configured storage backend, and prints the resulting aggregate as JSON.
//! Configuration comes from the environment (see `IngestConfig`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vitrine_core::models::{MediaUpdate, ProcessingStatus, ProductMediaRecord};
use vitrine_core::IngestConfig;
use vitrine_ingest::repository::{ProductRepository, RepositoryResult};
use vitrine_ingest::telemetry::init_telemetry;
use vitrine_ingest::MediaIngestor;
use vitrine_processing::HttpFetcher;
use vitrine_storage::create_storage;

#[derive(Parser)]
#[command(
    name = "vitrine-backfill",
    about = "Run the media ingestion pipeline over a product snapshot"
)]
struct Cli {
    /// Path to a product snapshot JSON file
    snapshot: PathBuf,

    /// Reset the snapshot's status to `pending` before dispatching, so
    /// already-processed records can be re-ingested
    #[arg(long)]
    force: bool,
}

/// Captures the pipeline's single write so it can be printed instead of
/// being persisted to a product database.
struct CapturedWrite {
    status: Mutex<ProcessingStatus>,
    update: Mutex<Option<MediaUpdate>>,
}

impl CapturedWrite {
    fn new(snapshot: &ProductMediaRecord) -> Self {
        CapturedWrite {
            status: Mutex::new(snapshot.image_status),
            update: Mutex::new(None),
        }
    }

    fn take_update(&self) -> Option<MediaUpdate> {
        self.update.lock().unwrap().take()
    }
}

#[async_trait]
impl ProductRepository for CapturedWrite {
    async fn complete_processing(
        &self,
        _product_id: &str,
        expected: ProcessingStatus,
        update: MediaUpdate,
    ) -> RepositoryResult<bool> {
        let mut status = self.status.lock().unwrap();
        if *status != expected {
            return Ok(false);
        }
        *status = update.image_status;
        *self.update.lock().unwrap() = Some(update);
        Ok(true)
    }

    async fn mark_failed(&self, _product_id: &str, reason: &str) -> RepositoryResult<()> {
        *self.status.lock().unwrap() = ProcessingStatus::Failed;
        *self.update.lock().unwrap() = Some(MediaUpdate {
            image_status: ProcessingStatus::Failed,
            main_image_url: None,
            image_urls: Vec::new(),
            video_url: None,
            video_type: None,
            failure_reason: Some(reason.to_string()),
            processed_at: chrono::Utc::now(),
        });
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry();
    let cli = Cli::parse();

    let config = IngestConfig::from_env()?;

    let raw = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("Failed to read {}", cli.snapshot.display()))?;
    let mut product: ProductMediaRecord =
        serde_json::from_str(&raw).context("Invalid product snapshot")?;
    if cli.force {
        product.image_status = ProcessingStatus::Pending;
    }

    let storage = create_storage(&config)
        .await
        .context("Failed to build storage backend")?;
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
        config.fetch_timeout_secs,
    ))?);
    let repository = Arc::new(CapturedWrite::new(&product));

    let ingestor = MediaIngestor::new(
        Arc::clone(&repository) as Arc<dyn ProductRepository>,
        storage,
        fetcher,
        config,
    );
    let outcome = ingestor.handle_product_created(&product).await?;

    let report = serde_json::json!({
        "product_id": product.id,
        "outcome": format!("{:?}", outcome),
        "update": repository.take_update(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
