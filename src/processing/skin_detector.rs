use crate::models::{RasterImage, Region};
use crate::processing::face_detection::{DetectorParams, FaceRegionDetector};
use crate::processing::ImageProcessor;
use crate::utils::DocumentError;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;
use log::debug;

// Chroma box for skin in YCbCr, independent of luminance.
const CB_RANGE: (f32, f32) = (77.0, 127.0);
const CR_RANGE: (f32, f32) = (133.0, 173.0);
const MIN_FILL: f32 = 0.4;

/// Built-in detector: chroma-based skin segmentation followed by blob filtering.
///
/// `min_neighbors` sets the opening radius (half of it, in pixels) used to
/// drop speckle; size and aspect limits come straight from the pass.
/// `scale_factor` has no meaning here and is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinToneDetector;

impl SkinToneDetector {
    pub fn new() -> Self {
        SkinToneDetector
    }

    pub fn skin_mask(image: &RasterImage) -> GrayImage {
        let rgb = image.as_rgb();
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            if is_skin(r, g, b) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    fn accepts(mask: &GrayImage, region: &Region, params: &DetectorParams) -> bool {
        let side_ok = |side: u32| side >= params.min_size && side <= params.max_size;
        if !side_ok(region.width) || !side_ok(region.height) {
            return false;
        }

        let aspect = region.height as f32 / region.width as f32;
        if aspect < params.min_aspect || aspect > params.max_aspect {
            return false;
        }

        let mut filled = 0u64;
        for y in region.y..region.bottom() {
            for x in region.x..region.right() {
                if mask.get_pixel(x, y)[0] > 0 {
                    filled += 1;
                }
            }
        }
        filled as f32 / region.area() as f32 >= MIN_FILL
    }
}

impl FaceRegionDetector for SkinToneDetector {
    fn detect_regions(
        &self,
        image: &RasterImage,
        params: &DetectorParams,
    ) -> Result<Vec<Region>, DocumentError> {
        if image.is_empty() {
            return Ok(Vec::new());
        }

        let mut mask = Self::skin_mask(image);
        let radius = (params.min_neighbors / 2).min(u8::MAX as u32) as u8;
        if radius > 0 {
            mask = open(&mask, Norm::LInf, radius);
        }

        let regions: Vec<Region> = ImageProcessor::component_boxes(&mask)
            .into_iter()
            .filter(|region| Self::accepts(&mask, region, params))
            .collect();
        debug!("Skin segmentation kept {} region(s)", regions.len());
        Ok(regions)
    }
}

fn is_skin(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    (CB_RANGE.0..=CB_RANGE.1).contains(&cb) && (CR_RANGE.0..=CR_RANGE.1).contains(&cr)
}
