//! Vitrine Storage Library
//!
//! Storage abstraction and backends for derived product media. Object keys
//! are deterministic per (product, asset role) so retries overwrite the same
//! object and public URLs are reproducible from `(bucket, key)` alone.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use vitrine_core::StorageBackend;
