//! Image decoding and preprocessing utilities

use anyhow::Result;
use image::{DynamicImage, GenericImageView};
use ndarray::{Array3, ArrayD};

/// Decode image from bytes with EXIF orientation handling
/// This ensures images are correctly oriented regardless of how they were captured
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(data)?;
    Ok(apply_exif_orientation(data, image))
}

/// Apply EXIF orientation to correct image rotation
/// Mobile phones often store images with EXIF orientation tags instead of rotating pixels
fn apply_exif_orientation(data: &[u8], image: DynamicImage) -> DynamicImage {
    use std::io::Cursor;

    let orientation = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif_data) => exif_data
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(1),
        Err(_) => 1,
    };

    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Resize to the requested width and/or height.
///
/// With only one dimension given, the other follows the source aspect
/// ratio. With neither, the image is returned unchanged.
pub fn resize_maintaining_aspect(
    image: &DynamicImage,
    width: Option<u32>,
    height: Option<u32>,
) -> DynamicImage {
    let (old_w, old_h) = image.dimensions();

    let (new_w, new_h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (None, Some(h)) => (((old_w as u64 * h as u64) / old_h as u64) as u32, h),
        (Some(w), None) => (w, ((w as u64 * old_h as u64) / old_w as u64) as u32),
        (None, None) => return image.clone(),
    };

    image.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3)
}

/// Convert an image to a CHW f32 tensor.
/// normalize: if true, map pixel values to [-1, 1], otherwise [0, 1]
pub fn image_to_chw(image: &DynamicImage, normalize: bool) -> Array3<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut tensor = Array3::<f32>::zeros((3, height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for channel in 0..3 {
            let value = pixel[channel] as f32;
            tensor[[channel, y as usize, x as usize]] = if normalize {
                (value - 127.5) / 128.0
            } else {
                value / 255.0
            };
        }
    }

    tensor
}

/// Stock preprocessing transform for the media loader: optional
/// aspect-preserving resize followed by CHW conversion.
pub fn chw_transform(
    width: Option<u32>,
    height: Option<u32>,
) -> impl Fn(&DynamicImage) -> Result<ArrayD<f32>> {
    move |image| {
        let resized = resize_maintaining_aspect(image, width, height);
        Ok(image_to_chw(&resized, true).into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn resize_width_only_preserves_aspect() {
        let image = test_image(200, 50);
        let resized = resize_maintaining_aspect(&image, Some(100), None);
        assert_eq!(resized.dimensions(), (100, 25));
    }

    #[test]
    fn resize_height_only_preserves_aspect() {
        let image = test_image(200, 50);
        let resized = resize_maintaining_aspect(&image, None, Some(100));
        assert_eq!(resized.dimensions(), (400, 100));
    }

    #[test]
    fn resize_exact_when_both_given() {
        let image = test_image(200, 50);
        let resized = resize_maintaining_aspect(&image, Some(64), Some(32));
        assert_eq!(resized.dimensions(), (64, 32));
    }

    #[test]
    fn no_resize_without_dimensions() {
        let image = test_image(200, 50);
        let resized = resize_maintaining_aspect(&image, None, None);
        assert_eq!(resized.dimensions(), (200, 50));
    }

    #[test]
    fn chw_layout_and_normalization() {
        let image = test_image(4, 2);

        let normalized = image_to_chw(&image, true);
        assert_eq!(normalized.shape(), &[3, 2, 4]);
        // black pixels map to (0 - 127.5) / 128
        assert!((normalized[[0, 0, 0]] - (-127.5 / 128.0)).abs() < 1e-6);

        let scaled = image_to_chw(&image, false);
        assert!((scaled[[2, 1, 3]]).abs() < 1e-6);
    }

    #[test]
    fn chw_transform_applies_resize() {
        let transform = chw_transform(Some(8), Some(8));
        let tensor = transform(&test_image(200, 50)).unwrap();
        assert_eq!(tensor.shape(), &[3, 8, 8]);
    }
}
