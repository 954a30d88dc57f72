//! Product repository seam: the pipeline's only write surface.
//!
//! The pipeline owns the media-result fields on a product record; the back
//! office owns the source fields. Reads happen through the trigger snapshot,
//! so this trait only carries writes: one aggregate commit per run, or one
//! failure marker.

use async_trait::async_trait;
use thiserror::Error;
use vitrine_core::models::{MediaUpdate, ProcessingStatus};

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Write surface for media-result fields on a product record.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Conditionally commit the aggregate.
    ///
    /// The update is applied only while the record's processing status still
    /// equals `expected`, the status observed in the trigger snapshot.
    /// Returns `false` when a concurrent invocation won the race, in which
    /// case the caller performs no further writes.
    async fn complete_processing(
        &self,
        product_id: &str,
        expected: ProcessingStatus,
        update: MediaUpdate,
    ) -> RepositoryResult<bool>;

    /// Mark the whole record failed after a top-level dispatcher error.
    ///
    /// Unconditional: the failure marker must always land, even if a racing
    /// writer touched the record in the meantime.
    async fn mark_failed(&self, product_id: &str, reason: &str) -> RepositoryResult<()>;
}
