//! Media loading
//!
//! Turns file paths and in-memory byte blobs into preprocessed tensors.
//! One bad item never aborts the run: failures are logged and skipped.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::ArrayD;
use tracing::error;

use crate::config::MediaConfig;

use super::preprocess::decode_image;

/// A single piece of media handed to the gateway.
pub enum MediaItem {
    /// Path to an image file on disk.
    Path(PathBuf),
    /// Encoded image bytes already in memory.
    Blob(Vec<u8>),
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaItem::Path(path) => write!(f, "{}", path.display()),
            MediaItem::Blob(data) => write!(f, "in-memory image ({} bytes)", data.len()),
        }
    }
}

/// Output of [`extract_from_media`]: three parallel ordered sequences.
pub struct ExtractedMedia {
    /// Preprocessed tensors, one per successfully handled item.
    pub tensors: Vec<ArrayD<f32>>,
    /// Decoded originals, retained only when a result save dir is configured.
    pub originals: Vec<DynamicImage>,
    /// Original decoded dimensions as `[height, width, channels]`.
    pub shapes: Vec<[usize; 3]>,
}

/// Decode and preprocess a list of media items.
///
/// Each item is decoded (EXIF orientation applied) and run through the
/// supplied `preprocess` transform. Items that fail to read, decode or
/// transform are logged with their identity and skipped.
pub fn extract_from_media<F>(
    config: &MediaConfig,
    preprocess: F,
    items: &[MediaItem],
) -> ExtractedMedia
where
    F: Fn(&DynamicImage) -> Result<ArrayD<f32>>,
{
    let mut media = ExtractedMedia {
        tensors: Vec::with_capacity(items.len()),
        originals: Vec::new(),
        shapes: Vec::with_capacity(items.len()),
    };

    for item in items {
        let decoded = match decode_item(item) {
            Ok(image) => image,
            Err(err) => {
                error!("failed to process media item {item}: {err:#}");
                continue;
            }
        };

        let tensor = match preprocess(&decoded) {
            Ok(tensor) => tensor,
            Err(err) => {
                error!("failed to process media item {item}: {err:#}");
                continue;
            }
        };

        media.tensors.push(tensor);
        media.shapes.push([
            decoded.height() as usize,
            decoded.width() as usize,
            decoded.color().channel_count() as usize,
        ]);
        if config.result_save_dir.is_some() {
            media.originals.push(decoded);
        }
    }

    media
}

fn decode_item(item: &MediaItem) -> Result<DynamicImage> {
    match item {
        MediaItem::Path(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("reading media file '{}'", path.display()))?;
            decode_image(&data)
        }
        MediaItem::Blob(data) => decode_image(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::preprocess::image_to_chw;
    use image::RgbImage;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn transform(image: &DynamicImage) -> Result<ArrayD<f32>> {
        Ok(image_to_chw(image, true).into_dyn())
    }

    fn media_config(save_dir: Option<PathBuf>) -> MediaConfig {
        MediaConfig {
            result_save_dir: save_dir,
            resize_width: None,
            resize_height: None,
        }
    }

    #[test]
    fn skips_corrupt_item_and_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();

        let items = vec![
            MediaItem::Path(path),
            MediaItem::Blob(png_bytes(8, 2)),
            MediaItem::Blob(b"definitely not an image".to_vec()),
            MediaItem::Blob(png_bytes(2, 2)),
        ];

        let media = extract_from_media(&media_config(None), transform, &items);
        assert_eq!(media.tensors.len(), 3);
        assert_eq!(media.shapes, vec![[4, 4, 3], [2, 8, 3], [2, 2, 3]]);
        assert!(media.originals.is_empty());
    }

    #[test]
    fn skips_missing_file() {
        let items = vec![
            MediaItem::Path(PathBuf::from("/no/such/file.png")),
            MediaItem::Blob(png_bytes(2, 2)),
        ];

        let media = extract_from_media(&media_config(None), transform, &items);
        assert_eq!(media.tensors.len(), 1);
        assert_eq!(media.shapes, vec![[2, 2, 3]]);
    }

    #[test]
    fn retains_originals_when_save_dir_configured() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![MediaItem::Blob(png_bytes(4, 4)), MediaItem::Blob(png_bytes(2, 2))];

        let media = extract_from_media(
            &media_config(Some(dir.path().to_path_buf())),
            transform,
            &items,
        );
        assert_eq!(media.tensors.len(), 2);
        assert_eq!(media.originals.len(), 2);
    }

    #[test]
    fn skips_item_when_transform_fails() {
        let failing = |image: &DynamicImage| -> Result<ArrayD<f32>> {
            if image.width() == 8 {
                anyhow::bail!("unsupported width");
            }
            Ok(image_to_chw(image, true).into_dyn())
        };

        let items = vec![MediaItem::Blob(png_bytes(8, 8)), MediaItem::Blob(png_bytes(4, 4))];
        let media = extract_from_media(&media_config(None), failing, &items);
        assert_eq!(media.tensors.len(), 1);
        assert_eq!(media.shapes, vec![[4, 4, 3]]);
    }
}
