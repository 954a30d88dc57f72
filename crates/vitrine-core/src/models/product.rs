//! Product media record, processing status, and the write-back aggregate.
//!
//! `ProductMediaRecord` is the read-only snapshot delivered by the creation
//! trigger; `MediaUpdate` is the single document update the pipeline writes
//! back when a run finishes. The pipeline owns the media-result fields; the
//! back office owns `source_images`/`video_url`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::asset::{AssetStatus, Rendition};

/// Snapshot of the product fields the pipeline reads at trigger time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMediaRecord {
    pub id: String,
    #[serde(default)]
    pub source_images: SourceImages,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub image_status: ProcessingStatus,
}

/// Source media references attached by the back office at creation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceImages {
    #[serde(default)]
    pub main: Option<String>,
    /// Ordered gallery entries; null and empty entries are skipped.
    #[serde(default)]
    pub gallery: Vec<Option<String>>,
}

impl SourceImages {
    /// True when neither a usable main image nor any usable gallery entry is
    /// present.
    pub fn is_empty(&self) -> bool {
        !self.main.as_deref().is_some_and(|u| !u.is_empty())
            && !self
                .gallery
                .iter()
                .any(|u| u.as_deref().is_some_and(|u| !u.is_empty()))
    }
}

/// Record-level processing status. Terminal statuses gate reprocessing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    NotStarted,
    Pending,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessingStatus::Completed
                | ProcessingStatus::CompletedWithErrors
                | ProcessingStatus::Failed
        )
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingStatus::NotStarted => write!(f, "not_started"),
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::CompletedWithErrors => write!(f, "completed_with_errors"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ProcessingStatus::NotStarted),
            "pending" => Ok(ProcessingStatus::Pending),
            "completed" => Ok(ProcessingStatus::Completed),
            "completed_with_errors" => Ok(ProcessingStatus::CompletedWithErrors),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid processing status: {}", s)),
        }
    }
}

/// How the product's video ended up being referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    /// Link-through reference, stored as-is without fetching.
    Youtube,
    /// Downloaded and re-hosted in our storage.
    Upload,
}

impl Display for VideoType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoType::Youtube => write!(f, "youtube"),
            VideoType::Upload => write!(f, "upload"),
        }
    }
}

/// Per-asset outcome persisted in the aggregate write-back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetResult {
    pub source_url: String,
    /// Deterministic storage key this asset owns.
    pub path: String,
    pub is_main: bool,
    pub status: AssetStatus,
    /// Final URL under the store-original strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Size-tagged URLs under the multi-resolution strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renditions: Option<RenditionUrls>,
    /// Present only when `status == failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssetResult {
    /// The URL the aggregate should expose for this asset: the medium
    /// rendition when renditions exist, the stored URL otherwise.
    pub fn display_url(&self) -> Option<&str> {
        match &self.renditions {
            Some(urls) => Some(urls.get(Rendition::Medium)),
            None => self.url.as_deref(),
        }
    }
}

/// URLs of the three fixed renditions produced by the transcoding strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenditionUrls {
    pub large: String,
    pub medium: String,
    pub thumb: String,
}

impl RenditionUrls {
    pub fn get(&self, rendition: Rendition) -> &str {
        match rendition {
            Rendition::Large => &self.large,
            Rendition::Medium => &self.medium,
            Rendition::Thumb => &self.thumb,
        }
    }
}

/// The single document update a finished run writes back onto the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUpdate {
    pub image_status: ProcessingStatus,
    pub main_image_url: Option<String>,
    pub image_urls: Vec<AssetResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_type: Option<VideoType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub processed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_status_round_trip() {
        for status in [
            ProcessingStatus::NotStarted,
            ProcessingStatus::Pending,
            ProcessingStatus::Completed,
            ProcessingStatus::CompletedWithErrors,
            ProcessingStatus::Failed,
        ] {
            let parsed: ProcessingStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<ProcessingStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ProcessingStatus::NotStarted.is_terminal());
        assert!(!ProcessingStatus::Pending.is_terminal());
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::CompletedWithErrors.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
    }

    #[test]
    fn test_source_images_emptiness() {
        assert!(SourceImages::default().is_empty());
        assert!(SourceImages {
            main: Some(String::new()),
            gallery: vec![None, Some(String::new())],
        }
        .is_empty());
        assert!(!SourceImages {
            main: None,
            gallery: vec![None, Some("https://host/a.jpg".to_string())],
        }
        .is_empty());
    }

    #[test]
    fn test_display_url_prefers_medium_rendition() {
        let result = AssetResult {
            source_url: "https://host/a.jpg".to_string(),
            path: "product-images/p1/main".to_string(),
            is_main: true,
            status: AssetStatus::Completed,
            url: None,
            renditions: Some(RenditionUrls {
                large: "l".to_string(),
                medium: "m".to_string(),
                thumb: "t".to_string(),
            }),
            error: None,
        };
        assert_eq!(result.display_url(), Some("m"));
    }

    #[test]
    fn test_record_deserializes_with_missing_fields() {
        let record: ProductMediaRecord = serde_json::from_str(r#"{"id":"p1"}"#).unwrap();
        assert_eq!(record.image_status, ProcessingStatus::NotStarted);
        assert!(record.source_images.is_empty());
        assert!(record.video_url.is_none());
    }
}
