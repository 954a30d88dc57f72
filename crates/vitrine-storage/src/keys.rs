//! Shared key generation for storage backends.
//!
//! A key is the ownership unit for overwrite-safe retries: it is computable
//! purely from product id and asset role, so a re-triggered run writes the
//! same object instead of accumulating duplicates.
//!
//! Layout:
//! - `product-images/{product_id}/main.jpg`
//! - `product-images/{product_id}/gallery_{index}.jpg`
//! - `product-images/{product_id}/{role}/{size_tag}.webp` (renditions)
//! - `product-videos/{product_id}/video.mp4`

use crate::traits::{StorageError, StorageResult};
use vitrine_core::models::{AssetRole, Rendition};

/// Key for a verbatim-stored asset (store-original strategy).
pub fn original_key(product_id: &str, role: &AssetRole) -> String {
    match role {
        AssetRole::Video => format!("product-videos/{}/video.mp4", product_id),
        _ => format!("product-images/{}/{}.jpg", product_id, role.slug()),
    }
}

/// Base key under which one asset's renditions live.
pub fn rendition_base_key(product_id: &str, role: &AssetRole) -> String {
    format!("product-images/{}/{}", product_id, role.slug())
}

/// Key for a single rendition of an asset.
pub fn rendition_key(product_id: &str, role: &AssetRole, rendition: Rendition) -> String {
    format!(
        "{}/{}.webp",
        rendition_base_key(product_id, role),
        rendition.tag()
    )
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// URL-encode a key for embedding in a public URL, keeping `/` separators.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            original_key("p1", &AssetRole::Main),
            "product-images/p1/main.jpg"
        );
        assert_eq!(
            original_key("p1", &AssetRole::Gallery(3)),
            "product-images/p1/gallery_3.jpg"
        );
        assert_eq!(
            original_key("p1", &AssetRole::Video),
            "product-videos/p1/video.mp4"
        );
        assert_eq!(
            rendition_key("p1", &AssetRole::Main, Rendition::Medium),
            "product-images/p1/main/medium.webp"
        );
        assert_eq!(
            rendition_key("p1", &AssetRole::Gallery(0), Rendition::Thumb),
            "product-images/p1/gallery_0/thumb.webp"
        );
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("product-images/p1/main.jpg").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("a/../b").is_err());
    }

    #[test]
    fn test_encode_key_preserves_separators() {
        assert_eq!(encode_key("a/b c/d.jpg"), "a/b%20c/d.jpg");
        assert_eq!(
            encode_key("product-images/p1/main.jpg"),
            "product-images/p1/main.jpg"
        );
    }
}
