//! Background removal, autocrop and downscaling.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use storybooker_error::{StorageError, StorageErrorKind, StorybookerResult};
use storybooker_interface::{ImagePostProcessor, ThresholdConfig};

/// Post-processor backed by the `image` crate. Always emits PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPostProcessor;

impl StandardPostProcessor {
    /// New processor.
    pub fn new() -> Self {
        Self
    }
}

fn image_error(context: &str, err: impl std::fmt::Display) -> StorageError {
    StorageError::new(StorageErrorKind::Image(format!("{}: {}", context, err)))
}

/// Make pixels whose RGB channels are all at or above `threshold` transparent.
fn clear_background(image: &mut RgbaImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, _]) = *pixel;
        if r >= threshold && g >= threshold && b >= threshold {
            pixel.0[3] = 0;
        }
    }
}

/// Bounding box `(x, y, width, height)` of non-transparent pixels.
fn content_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

fn crop_with_padding(image: &RgbaImage, padding: u32) -> RgbaImage {
    let Some((x, y, width, height)) = content_bounds(image) else {
        return image.clone();
    };
    let content = imageops::crop_imm(image, x, y, width, height).to_image();
    let mut canvas = RgbaImage::from_pixel(
        width + 2 * padding,
        height + 2 * padding,
        Rgba([0, 0, 0, 0]),
    );
    imageops::overlay(&mut canvas, &content, i64::from(padding), i64::from(padding));
    canvas
}

impl ImagePostProcessor for StandardPostProcessor {
    #[tracing::instrument(skip(self, raw), fields(size = raw.len(), remove_background = config.remove_background))]
    fn process(&self, raw: &[u8], config: &ThresholdConfig) -> StorybookerResult<Vec<u8>> {
        let decoded = image::load_from_memory(raw).map_err(|e| image_error("decode", e))?;

        let mut image = if config.remove_background {
            let mut rgba = decoded.to_rgba8();
            clear_background(&mut rgba, config.threshold);
            DynamicImage::ImageRgba8(crop_with_padding(&rgba, config.padding))
        } else {
            decoded
        };

        let longest = image.width().max(image.height());
        if let Some(max) = config.max_dimension.filter(|max| longest > *max) {
            image = image.resize(max, max, FilterType::Lanczos3);
        }

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| image_error("encode", e))?;
        tracing::debug!(width = image.width(), height = image.height(), "Processed image");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_single_pixel() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        image.put_pixel(3, 4, Rgba([1, 2, 3, 255]));
        assert_eq!(content_bounds(&image), Some((3, 4, 1, 1)));
    }

    #[test]
    fn test_fully_transparent_image_is_kept() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        assert_eq!(crop_with_padding(&image, 2).dimensions(), (4, 4));
    }
}
