use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, Result as ObjectResult,
};
use vitrine_core::StorageBackend;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }
}

/// Public URL for an object, derived from `(bucket, key)` alone.
///
/// For AWS S3, uses the standard format:
/// `https://{bucket}.s3.{region}.amazonaws.com/{key}`. For S3-compatible
/// providers, uses path-style under the endpoint: `{endpoint}/{bucket}/{key}`.
/// The key is URL-encoded per segment so the result is reproducible across
/// retries without any upload-time state.
pub fn public_object_url(
    endpoint_url: Option<&str>,
    bucket: &str,
    region: &str,
    key: &str,
) -> String {
    let encoded = keys::encode_key(key);
    match endpoint_url {
        Some(endpoint) => {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, encoded)
        }
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, encoded),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        keys::validate_key(key)?;
        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let location = Path::from(key.to_string());

        let opts = PutOptions {
            attributes: Attributes::from_iter([(Attribute::ContentType, content_type.to_string())]),
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(bytes), opts)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(self.endpoint_url.as_deref(), &self.bucket, &self.region, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_url_format() {
        let url = public_object_url(None, "shop-media", "eu-west-1", "product-images/p1/main.jpg");
        assert_eq!(
            url,
            "https://shop-media.s3.eu-west-1.amazonaws.com/product-images/p1/main.jpg"
        );
    }

    #[test]
    fn test_endpoint_url_is_path_style() {
        let url = public_object_url(
            Some("http://localhost:9000/"),
            "shop-media",
            "us-east-1",
            "product-videos/p1/video.mp4",
        );
        assert_eq!(
            url,
            "http://localhost:9000/shop-media/product-videos/p1/video.mp4"
        );
    }

    #[test]
    fn test_url_encodes_key_segments() {
        let url = public_object_url(None, "b", "r", "product-images/p 1/main.jpg");
        assert_eq!(
            url,
            "https://b.s3.r.amazonaws.com/product-images/p%201/main.jpg"
        );
    }
}
