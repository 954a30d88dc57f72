//! Per-asset working state for one ingest run.
//!
//! An `AssetDescriptor` is built fresh from the product snapshot on every
//! trigger and never persisted on its own; only the aggregated
//! [`AssetResult`](super::product::AssetResult) list lands on the product.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Role of an asset on its product. Determines the deterministic storage key,
/// which is the ownership key for overwrite-safe retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    Main,
    Gallery(usize),
    Video,
}

impl AssetRole {
    /// Stable path segment: `main`, `gallery_{index}`, or `video`.
    pub fn slug(&self) -> String {
        match self {
            AssetRole::Main => "main".to_string(),
            AssetRole::Gallery(index) => format!("gallery_{}", index),
            AssetRole::Video => "video".to_string(),
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, AssetRole::Video)
    }
}

impl Display for AssetRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.slug())
    }
}

/// Whether an asset still needs fetching or already lives in our storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    External,
    Storage,
}

/// Per-asset lifecycle within one run: pending, then completed or failed.
/// Terminal states are final for the run; there is no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Completed,
    Failed,
}

/// One image or video reference being processed.
#[derive(Debug, Clone)]
pub struct AssetDescriptor {
    pub source_url: String,
    pub role: AssetRole,
    pub is_main: bool,
    pub kind: AssetKind,
    pub status: AssetStatus,
}

impl AssetDescriptor {
    pub fn new(source_url: impl Into<String>, role: AssetRole, kind: AssetKind) -> Self {
        AssetDescriptor {
            source_url: source_url.into(),
            is_main: matches!(role, AssetRole::Main),
            role,
            kind,
            status: AssetStatus::Pending,
        }
    }
}

/// Target sizes for the multi-resolution strategy. Fixed set; the medium
/// rendition is the one surfaced as the product's main image URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendition {
    Large,
    Medium,
    Thumb,
}

impl Rendition {
    pub const ALL: [Rendition; 3] = [Rendition::Large, Rendition::Medium, Rendition::Thumb];

    /// Maximum edge length in pixels. Sources smaller than this are not
    /// upscaled.
    pub fn max_edge(self) -> u32 {
        match self {
            Rendition::Large => 1200,
            Rendition::Medium => 600,
            Rendition::Thumb => 300,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Rendition::Large => "large",
            Rendition::Medium => "medium",
            Rendition::Thumb => "thumb",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_slugs() {
        assert_eq!(AssetRole::Main.slug(), "main");
        assert_eq!(AssetRole::Gallery(0).slug(), "gallery_0");
        assert_eq!(AssetRole::Gallery(7).slug(), "gallery_7");
        assert_eq!(AssetRole::Video.slug(), "video");
    }

    #[test]
    fn test_descriptor_main_flag_follows_role() {
        let main = AssetDescriptor::new("https://host/a.jpg", AssetRole::Main, AssetKind::External);
        assert!(main.is_main);
        assert_eq!(main.status, AssetStatus::Pending);

        let gallery =
            AssetDescriptor::new("https://host/b.jpg", AssetRole::Gallery(1), AssetKind::External);
        assert!(!gallery.is_main);
    }

    #[test]
    fn test_rendition_edges_and_tags() {
        assert_eq!(Rendition::Large.max_edge(), 1200);
        assert_eq!(Rendition::Medium.max_edge(), 600);
        assert_eq!(Rendition::Thumb.max_edge(), 300);
        let tags: Vec<&str> = Rendition::ALL.iter().map(|r| r.tag()).collect();
        assert_eq!(tags, vec!["large", "medium", "thumb"]);
    }
}
