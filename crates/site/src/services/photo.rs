//! Photo pipeline: decode, shrink to fit, re-encode as JPEG.
//!
//! Every upload goes through [`prepare`] before it reaches blob storage, so
//! stored photos are always JPEG and never larger than the configured maximum
//! on their longest side.

use std::io::Cursor;

use heartgate_core::imaging::fit_within;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;
use tracing::instrument;

use crate::config::PhotoConfig;

/// Content type of every stored photo.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// File extension of every stored photo.
pub const JPEG_EXTENSION: &str = "jpg";

/// Errors from the photo pipeline.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// The upload was empty.
    #[error("empty upload")]
    Empty,

    /// The bytes are not an image format we can read.
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// JPEG encoding failed.
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// The blocking worker panicked or was cancelled.
    #[error("image worker failed: {0}")]
    Worker(String),
}

/// A photo ready for upload.
#[derive(Debug, Clone)]
pub struct PreparedPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode `raw`, shrink it to fit `config.max_dimension`, and encode it as
/// JPEG at `config.jpeg_quality`.
///
/// Runs on the blocking pool.
///
/// # Errors
///
/// Returns error if the bytes are not a readable image or encoding fails.
#[instrument(skip(raw), fields(size = raw.len()))]
pub async fn prepare(raw: Vec<u8>, config: PhotoConfig) -> Result<PreparedPhoto, PhotoError> {
    tokio::task::spawn_blocking(move || prepare_blocking(&raw, &config))
        .await
        .map_err(|e| PhotoError::Worker(e.to_string()))?
}

/// Synchronous body of [`prepare`].
///
/// # Errors
///
/// Returns error if the bytes are not a readable image or encoding fails.
pub fn prepare_blocking(raw: &[u8], config: &PhotoConfig) -> Result<PreparedPhoto, PhotoError> {
    if raw.is_empty() {
        return Err(PhotoError::Empty);
    }

    let image = image::load_from_memory(raw).map_err(PhotoError::Decode)?;
    let (width, height) = fit_within(image.width(), image.height(), config.max_dimension);

    let image = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut Cursor::new(&mut bytes), config.jpeg_quality)
        .encode_image(&rgb)
        .map_err(PhotoError::Encode)?;

    tracing::debug!(width, height, size = bytes.len(), "Prepared photo");
    Ok(PreparedPhoto {
        bytes,
        width,
        height,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    use image::{ImageFormat, Rgba, RgbaImage};

    /// PNG bytes of a `width` x `height` image.
    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn config(max_dimension: u32) -> PhotoConfig {
        PhotoConfig {
            max_dimension,
            jpeg_quality: 82,
        }
    }

    #[test]
    fn test_large_image_is_shrunk_to_max() {
        let prepared = prepare_blocking(&png(3000, 2000), &config(1200)).unwrap();
        assert_eq!((prepared.width, prepared.height), (1200, 800));

        let stored = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!((stored.width(), stored.height()), (1200, 800));
        assert_eq!(
            image::guess_format(&prepared.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_portrait_keeps_aspect_ratio() {
        let prepared = prepare_blocking(&png(900, 1600), &config(1200)).unwrap();
        assert_eq!(prepared.height, 1200);
        assert_eq!(prepared.width, 675);
    }

    #[test]
    fn test_small_image_keeps_size() {
        let prepared = prepare_blocking(&png(320, 240), &config(1200)).unwrap();
        assert_eq!((prepared.width, prepared.height), (320, 240));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            prepare_blocking(b"not an image", &config(1200)),
            Err(PhotoError::Decode(_))
        ));
        assert!(matches!(
            prepare_blocking(&[], &config(1200)),
            Err(PhotoError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_prepare_runs_off_thread() {
        let prepared = prepare(png(1500, 1500), config(1000)).await.unwrap();
        assert_eq!((prepared.width, prepared.height), (1000, 1000));
    }
}
