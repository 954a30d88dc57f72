//! In-memory doubles for exercising the dispatcher without network, object
//! storage, or a product database.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vitrine_core::models::{MediaUpdate, ProcessingStatus, ProductMediaRecord};
use vitrine_core::StorageBackend;
use vitrine_processing::{FetchError, FetchResult, FetchedMedia, Fetcher};
use vitrine_storage::{Storage, StorageResult};

use crate::repository::{ProductRepository, RepositoryError, RepositoryResult};

/// In-memory product store recording every write.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    records: Arc<Mutex<HashMap<String, (ProcessingStatus, Option<MediaUpdate>)>>>,
    write_count: Arc<AtomicUsize>,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record from a trigger snapshot.
    pub fn insert(&self, record: &ProductMediaRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), (record.image_status, None));
    }

    /// Overwrite a record's stored status, e.g. to simulate a concurrent
    /// writer between snapshot and commit.
    pub fn set_status(&self, product_id: &str, status: ProcessingStatus) {
        if let Some(entry) = self.records.lock().unwrap().get_mut(product_id) {
            entry.0 = status;
        }
    }

    /// Make subsequent `complete_processing` calls fail with a backend error.
    pub fn fail_commits(&self) {
        self.fail_commits.store(true, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn status_of(&self, product_id: &str) -> Option<ProcessingStatus> {
        self.records
            .lock()
            .unwrap()
            .get(product_id)
            .map(|entry| entry.0)
    }

    pub fn update_for(&self, product_id: &str) -> Option<MediaUpdate> {
        self.records
            .lock()
            .unwrap()
            .get(product_id)
            .and_then(|entry| entry.1.clone())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn complete_processing(
        &self,
        product_id: &str,
        expected: ProcessingStatus,
        update: MediaUpdate,
    ) -> RepositoryResult<bool> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend("commit rejected".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let entry = records
            .get_mut(product_id)
            .ok_or_else(|| RepositoryError::NotFound(product_id.to_string()))?;
        if entry.0 != expected {
            return Ok(false);
        }
        entry.0 = update.image_status;
        entry.1 = Some(update);
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn mark_failed(&self, product_id: &str, reason: &str) -> RepositoryResult<()> {
        let mut records = self.records.lock().unwrap();
        let entry = records
            .get_mut(product_id)
            .ok_or_else(|| RepositoryError::NotFound(product_id.to_string()))?;
        entry.0 = ProcessingStatus::Failed;
        entry.1 = Some(MediaUpdate {
            image_status: ProcessingStatus::Failed,
            main_image_url: None,
            image_urls: Vec::new(),
            video_url: None,
            video_type: None,
            failure_reason: Some(reason.to_string()),
            processed_at: Utc::now(),
        });
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Storage double recording puts; URLs are `memory://{key}`.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        vitrine_storage::keys::validate_key(key)?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}", key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

enum StubResponse {
    Ok(Bytes, Option<String>),
    Status(u16),
}

/// Scripted fetcher: URLs respond as configured; anything unknown is a 404.
/// Records every fetched URL so tests can assert what was (not) fetched.
#[derive(Clone, Default)]
pub struct StubFetcher {
    responses: Arc<Mutex<HashMap<String, StubResponse>>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a 200 response with the given body and content type.
    pub fn ok(&self, url: &str, body: impl Into<Bytes>, content_type: Option<&str>) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            StubResponse::Ok(body.into(), content_type.map(str::to_string)),
        );
    }

    /// Script a non-2xx status response.
    pub fn status(&self, url: &str, code: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), StubResponse::Status(code));
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedMedia> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().get(url) {
            Some(StubResponse::Ok(bytes, content_type)) => Ok(FetchedMedia {
                bytes: bytes.clone(),
                content_type: content_type.clone(),
            }),
            Some(StubResponse::Status(code)) => Err(FetchError::Status(*code)),
            None => Err(FetchError::Status(404)),
        }
    }
}
