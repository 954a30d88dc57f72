//! Image transcoding: decode, fit-inside resize, WebP encoding.
//!
//! The multi-resolution strategy decodes a source once and derives each
//! rendition from the same `DynamicImage`. Resizing never upscales past the
//! source dimensions.

use anyhow::Result;
use bytes::Bytes;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use vitrine_core::models::Rendition;

/// Decode an image from raw bytes, sniffing the format from content.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let cursor = Cursor::new(data);
    let img = ImageReader::new(cursor).with_guessed_format()?.decode()?;
    Ok(img)
}

/// Fit-inside resize: preserve aspect ratio and never enlarge. A source
/// already within `max_edge` on both axes is returned unchanged.
pub fn resize_to_fit(img: &DynamicImage, max_edge: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_edge && height <= max_edge {
        return img.clone();
    }
    img.resize(max_edge, max_edge, FilterType::Lanczos3)
}

/// Resize to a rendition's bounds and encode as lossy WebP.
pub fn encode_rendition(img: &DynamicImage, rendition: Rendition, quality: f32) -> Result<Bytes> {
    let resized = resize_to_fit(img, rendition.max_edge());
    encode_webp(&resized, quality)
}

/// Encode as lossy WebP at the given quality (0-100).
pub fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Bytes> {
    let (width, height) = img.dimensions();

    // Convert to RGBA for WebP encoding
    let rgba_img = img.to_rgba8();

    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder.encode(quality);

    Ok(Bytes::copy_from_slice(&webp_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn sample_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([120, 40, 200, 255]),
        ))
    }

    fn sample_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        sample_image(width, height)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_decode_sniffs_format() {
        let img = decode(&sample_png_bytes(8, 6)).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
    }

    #[test]
    fn test_resize_fits_inside_preserving_aspect() {
        let img = sample_image(2400, 1200);
        let resized = resize_to_fit(&img, 1200);
        assert_eq!(resized.dimensions(), (1200, 600));

        let resized = resize_to_fit(&img, 300);
        assert_eq!(resized.dimensions(), (300, 150));
    }

    #[test]
    fn test_resize_never_enlarges() {
        let img = sample_image(400, 200);
        let resized = resize_to_fit(&img, 1200);
        assert_eq!(resized.dimensions(), (400, 200));
    }

    #[test]
    fn test_encode_rendition_produces_webp() {
        let img = sample_image(700, 700);
        let encoded = encode_rendition(&img, Rendition::Medium, 80.0).unwrap();
        // RIFF....WEBP container header
        assert_eq!(&encoded[0..4], b"RIFF");
        assert_eq!(&encoded[8..12], b"WEBP");

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.dimensions(), (600, 600));
    }
}
