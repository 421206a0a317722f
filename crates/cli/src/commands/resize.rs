//! Local resize: runs an image through the upload pipeline without storing
//! it, so the owner can preview what the gallery will serve.

use std::path::Path;

use heartgate_site::config::{PhotoConfig, SiteConfig};
use heartgate_site::services::photo::{PreparedPhoto, prepare_blocking};

use super::CliError;

/// Resize `input` into `output`, overriding the configured bounds.
#[allow(clippy::print_stdout)]
pub fn run(
    input: &Path,
    output: &Path,
    max_dimension: Option<u32>,
    quality: Option<u8>,
) -> Result<(), CliError> {
    let mut config = SiteConfig::from_env()?.photos;
    if let Some(max) = max_dimension {
        config.max_dimension = max.max(1);
    }
    if let Some(quality) = quality {
        config.jpeg_quality = quality.clamp(1, 100);
    }

    let prepared = resize_file(input, output, &config)?;
    println!(
        "{} -> {} ({}x{}, {} bytes)",
        input.display(),
        output.display(),
        prepared.width,
        prepared.height,
        prepared.bytes.len()
    );
    Ok(())
}

fn resize_file(
    input: &Path,
    output: &Path,
    config: &PhotoConfig,
) -> Result<PreparedPhoto, CliError> {
    let raw = std::fs::read(input)?;
    let prepared = prepare_blocking(&raw, config)?;
    std::fs::write(output, &prepared.bytes)?;
    Ok(prepared)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use image::{ImageFormat, Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_resize_file_bounds_longest_side() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.png");
        let output = dir.path().join("wide.jpg");
        write_png(&input, 400, 100);

        let config = PhotoConfig {
            max_dimension: 200,
            jpeg_quality: 80,
        };
        let prepared = resize_file(&input, &output, &config).unwrap();

        assert_eq!((prepared.width, prepared.height), (200, 50));
        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (200, 50));
    }

    #[test]
    fn test_resize_file_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"not an image").unwrap();

        let err = resize_file(&input, &dir.path().join("out.jpg"), &PhotoConfig::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Photo(_)));
    }

    #[test]
    fn test_resize_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = resize_file(
            &dir.path().join("missing.png"),
            &dir.path().join("out.jpg"),
            &PhotoConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
