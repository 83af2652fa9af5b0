use crate::models::{EnhancementVariant, RasterImage, Region};
use image::imageops;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::equalize_histogram;
use imageproc::region_labelling::{connected_components, Connectivity};
use log::debug;

const CONTRAST_GAIN: f32 = 1.2;
const CONTRAST_OFFSET: f32 = 10.0;
const DENOISE_SIGMA: f32 = 0.8;

/// Pixel-level helpers shared by the face search and the page fallback.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Builds one enhancement variant of the source. The original variant is a plain copy.
    pub fn enhance(image: &RasterImage, variant: EnhancementVariant) -> RasterImage {
        match variant {
            EnhancementVariant::Original => image.clone(),
            EnhancementVariant::Equalized => RasterImage::new(Self::equalize(image.as_rgb())),
            EnhancementVariant::ContrastAdjusted => {
                RasterImage::new(Self::scale_levels(image.as_rgb(), CONTRAST_GAIN, CONTRAST_OFFSET))
            }
            EnhancementVariant::Denoised => {
                RasterImage::new(imageops::blur(image.as_rgb(), DENOISE_SIGMA))
            }
        }
    }

    // Histogram equalization per channel, so colour cues survive for detectors that use them.
    fn equalize(pixels: &RgbImage) -> RgbImage {
        let (width, height) = pixels.dimensions();
        let channels: Vec<GrayImage> = (0..3)
            .map(|c| {
                let plane = GrayImage::from_fn(width, height, |x, y| Luma([pixels.get_pixel(x, y)[c]]));
                equalize_histogram(&plane)
            })
            .collect();

        let mut out = pixels.clone();
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            for (c, plane) in channels.iter().enumerate() {
                pixel[c] = plane.get_pixel(x, y)[0];
            }
        }
        out
    }

    /// Linear level stretch `v * gain + offset`, saturating at 0 and 255.
    fn scale_levels(pixels: &RgbImage, gain: f32, offset: f32) -> RgbImage {
        let mut out = pixels.clone();
        for pixel in out.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 * gain + offset).round().clamp(0.0, 255.0) as u8;
            }
        }
        out
    }

    /// Bounding box of the largest blob darker than `threshold`, grown by `margin`
    /// of its own size on each side and clamped to the image. `None` on a blank page.
    pub fn content_bounds(image: &RasterImage, threshold: u8, margin: f32) -> Option<Region> {
        let gray = image.grayscale();
        let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] < threshold {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });

        let largest = Self::component_boxes(&mask)
            .into_iter()
            .max_by_key(|region| region.area())?;

        let margin_x = (largest.width as f32 * margin) as u32;
        let margin_y = (largest.height as f32 * margin) as u32;
        let x = largest.x.saturating_sub(margin_x);
        let y = largest.y.saturating_sub(margin_y);
        let width = (largest.width + 2 * margin_x).min(image.width() - x);
        let height = (largest.height + 2 * margin_y).min(image.height() - y);
        debug!("Content bounds {}x{} at ({}, {})", width, height, x, y);
        Some(Region::new(x, y, width, height))
    }

    /// Bounding boxes of the 8-connected foreground components of a binary mask.
    pub fn component_boxes(mask: &GrayImage) -> Vec<Region> {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

        // label -> (min_x, min_y, max_x, max_y)
        let mut extents: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            if extents.len() < label {
                extents.resize(label, None);
            }
            let entry = &mut extents[label - 1];
            *entry = Some(match *entry {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }

        extents
            .into_iter()
            .flatten()
            .map(|(x0, y0, x1, y1)| Region::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
            .collect()
    }

    /// Crops to the main content block, or keeps the whole page when nothing is found.
    pub fn crop_to_content(image: &RasterImage, threshold: u8, margin: f32) -> RasterImage {
        match Self::content_bounds(image, threshold, margin) {
            Some(bounds) => image.crop(&bounds),
            None => image.clone(),
        }
    }

    /// Resizes to `height` keeping proportions; too-wide results are refit to `max_width`.
    pub fn fit_display(image: &RasterImage, height: u32, max_width: u32) -> RasterImage {
        if image.is_empty() {
            return image.clone();
        }
        let aspect = image.width() as f64 / image.height() as f64;
        let mut target_height = height;
        let mut target_width = (height as f64 * aspect) as u32;
        if target_width > max_width {
            target_width = max_width;
            target_height = (max_width as f64 / aspect) as u32;
        }
        image.resize_exact(target_width, target_height)
    }

    /// Shrinks so that neither side exceeds `max_dimension`. Smaller images pass through.
    pub fn limit_dimension(image: RasterImage, max_dimension: u32) -> RasterImage {
        let longest = image.width().max(image.height());
        if longest <= max_dimension || longest == 0 {
            return image;
        }
        let scale = |side: u32| ((side as u64 * max_dimension as u64 / longest as u64) as u32).max(1);
        let (width, height) = (scale(image.width()), scale(image.height()));
        debug!(
            "Downsizing {}x{} to {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );
        image.resize_exact(width, height)
    }
}
