//! Pure URL classification and rewriting for source media references.
//!
//! No I/O happens here; these functions only decide the fetch strategy.
//! Classification is intentionally permissive substring matching, not a full
//! URL parse; malformed input passes through verbatim instead of erroring.

use regex::Regex;
use std::sync::LazyLock;

static DRIVE_FILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([^/]+)/").expect("drive share-link pattern is valid"));

/// Rewrite a Google Drive share link into its direct-download form.
///
/// A URL containing a `/d/<FILE_ID>/` path segment becomes
/// `https://drive.google.com/uc?export=download&id=<FILE_ID>`; anything else
/// is returned unchanged.
pub fn normalize_drive_url(url: &str) -> String {
    match DRIVE_FILE_ID.captures(url) {
        Some(captures) => format!(
            "https://drive.google.com/uc?export=download&id={}",
            &captures[1]
        ),
        None => url.to_string(),
    }
}

/// True when the URL references YouTube (`youtube.com` or `youtu.be`).
///
/// Such link-through references are never fetched; they are stored as-is with
/// `video_type = youtube`.
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_share_link_is_rewritten() {
        assert_eq!(
            normalize_drive_url("https://drive.google.com/file/d/1AbC-_9xyz/view?usp=sharing"),
            "https://drive.google.com/uc?export=download&id=1AbC-_9xyz"
        );
        assert_eq!(
            normalize_drive_url("https://drive.google.com/d/FILE42/"),
            "https://drive.google.com/uc?export=download&id=FILE42"
        );
    }

    #[test]
    fn test_non_drive_urls_pass_through() {
        for url in [
            "https://host/a.jpg",
            "https://drive.google.com/open?id=123",
            "https://drive.google.com/file/d/unterminated",
            "",
            "not a url at all",
        ] {
            assert_eq!(normalize_drive_url(url), url);
        }
    }

    #[test]
    fn test_youtube_classification() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("https://youtu.be/abc"));
        assert!(is_youtube_url("youtu.be/abc"));
        assert!(!is_youtube_url("https://host/video.mp4"));
        assert!(!is_youtube_url("https://YOUTUBE.com/watch?v=abc")); // case-sensitive by design
        assert!(!is_youtube_url(""));
    }
}
