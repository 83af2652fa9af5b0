use crate::models::{
    DetectionMethod, EnhancementVariant, FaceCandidate, RasterImage, RawDetection, Region,
};
use crate::processing::ImageProcessor;
use crate::utils::DocumentError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// A pluggable face-region detector. Implementations see one enhanced image at a time
/// and return the rectangles they consider faces.
pub trait FaceRegionDetector {
    fn detect_regions(
        &self,
        image: &RasterImage,
        params: &DetectorParams,
    ) -> Result<Vec<Region>, DocumentError>;
}

/// Tuning knobs for one detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    pub scale_factor: f32,
    pub min_neighbors: u32,
    /// Smallest accepted side, in pixels.
    pub min_size: u32,
    /// Largest accepted side, in pixels.
    pub max_size: u32,
    /// Accepted height/width range for a region.
    pub min_aspect: f32,
    pub max_aspect: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionPass {
    pub method: DetectionMethod,
    pub params: DetectorParams,
}

/// Portrait framing around a detected face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub side_margin: f32,
    pub output_width: u32,
    pub output_height: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        CropConfig {
            top_margin: 0.3,
            bottom_margin: 0.2,
            side_margin: 0.1,
            output_width: 200,
            output_height: 267,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    pub passes: Vec<DetectionPass>,
    pub variants: Vec<EnhancementVariant>,
    pub crop: CropConfig,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        FaceDetectionConfig {
            passes: vec![
                DetectionPass {
                    method: DetectionMethod::FrontalDefault,
                    params: DetectorParams {
                        scale_factor: 1.1,
                        min_neighbors: 4,
                        min_size: 30,
                        max_size: 500,
                        min_aspect: 0.9,
                        max_aspect: 1.8,
                    },
                },
                DetectionPass {
                    method: DetectionMethod::FrontalAlt,
                    params: DetectorParams {
                        scale_factor: 1.05,
                        min_neighbors: 3,
                        min_size: 25,
                        max_size: 400,
                        min_aspect: 0.8,
                        max_aspect: 2.0,
                    },
                },
                DetectionPass {
                    method: DetectionMethod::Profile,
                    params: DetectorParams {
                        scale_factor: 1.1,
                        min_neighbors: 5,
                        min_size: 30,
                        max_size: 300,
                        min_aspect: 1.1,
                        max_aspect: 2.2,
                    },
                },
            ],
            variants: vec![
                EnhancementVariant::Original,
                EnhancementVariant::Equalized,
                EnhancementVariant::ContrastAdjusted,
                EnhancementVariant::Denoised,
            ],
            crop: CropConfig::default(),
        }
    }
}

/// Runs every configured pass over every enhancement variant of an image,
/// merges overlapping hits and ranks the survivors.
pub struct FaceCandidateDetector {
    detector: Box<dyn FaceRegionDetector>,
    config: FaceDetectionConfig,
}

impl FaceCandidateDetector {
    pub fn new(detector: Box<dyn FaceRegionDetector>, config: FaceDetectionConfig) -> Self {
        FaceCandidateDetector { detector, config }
    }

    /// Face candidates for one image, best first. Empty when nothing is found.
    pub fn detect(&self, image: &RasterImage) -> Vec<FaceCandidate> {
        if image.is_empty() {
            return Vec::new();
        }

        let detections = Self::deduplicate(self.collect_detections(image));
        let image_area = image.pixel_count();

        let mut candidates: Vec<FaceCandidate> = detections
            .into_iter()
            .filter_map(|detection| {
                let Some(portrait) = Self::crop_portrait(image, &detection.region, &self.config.crop)
                else {
                    warn!("Skipping face region {:?}: empty crop", detection.region);
                    return None;
                };
                Some(FaceCandidate {
                    region: portrait,
                    bounds: detection.region,
                    detection_method: detection.method,
                    confidence: Self::confidence(&detection, image_area),
                    enhancement_variant: detection.variant.index(),
                })
            })
            .collect();

        Self::rank(&mut candidates);
        info!(
            "Found {} face candidate(s) in {}x{} image",
            candidates.len(),
            image.width(),
            image.height()
        );
        candidates
    }

    // Variant-major: each enhanced copy lives only while its passes run.
    fn collect_detections(&self, image: &RasterImage) -> Vec<RawDetection> {
        let mut detections = Vec::new();
        for &variant in &self.config.variants {
            let enhanced = ImageProcessor::enhance(image, variant);
            for pass in &self.config.passes {
                match self.detector.detect_regions(&enhanced, &pass.params) {
                    Ok(regions) => {
                        debug!(
                            "{} on variant {}: {} region(s)",
                            pass.method.label(),
                            variant.index(),
                            regions.len()
                        );
                        detections.extend(regions.into_iter().map(|region| RawDetection {
                            region,
                            method: pass.method,
                            variant,
                        }));
                    }
                    Err(e) => warn!("Detection pass {} failed: {}", pass.method.label(), e),
                }
            }
            drop(enhanced);
        }
        detections
    }

    /// Keeps the first detection of each physical face, in input order.
    pub fn deduplicate(detections: Vec<RawDetection>) -> Vec<RawDetection> {
        let mut unique: Vec<RawDetection> = Vec::with_capacity(detections.len());
        for detection in detections {
            if !unique
                .iter()
                .any(|kept| kept.region.is_duplicate_of(&detection.region))
            {
                unique.push(detection);
            }
        }
        unique
    }

    /// Relative face area weighted by how much the method and variant are trusted.
    pub fn confidence(detection: &RawDetection, image_area: u64) -> f32 {
        if image_area == 0 {
            return 0.0;
        }
        let relative = detection.region.area() as f64 / image_area as f64;
        relative as f32 * detection.method.bonus() * detection.variant.bonus()
    }

    /// Stable sort, highest confidence first.
    pub fn rank(candidates: &mut [FaceCandidate]) {
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    }

    /// 3:4 portrait around a face: margins added, clamped to the image, the excess
    /// dimension trimmed symmetrically, then resized to the output size.
    pub fn crop_portrait(image: &RasterImage, face: &Region, crop: &CropConfig) -> Option<RasterImage> {
        let bounds = Self::portrait_bounds(image.width(), image.height(), face, crop)?;
        Some(image.crop(&bounds).resize_exact(crop.output_width, crop.output_height))
    }

    pub fn portrait_bounds(
        image_width: u32,
        image_height: u32,
        face: &Region,
        crop: &CropConfig,
    ) -> Option<Region> {
        let aspect = crop.output_width as f64 / crop.output_height.max(1) as f64;
        let (img_w, img_h) = (image_width as i64, image_height as i64);
        let (x, y, w, h) = (
            face.x as i64,
            face.y as i64,
            face.width as i64,
            face.height as i64,
        );

        let top = (h as f32 * crop.top_margin) as i64;
        let bottom = (h as f32 * crop.bottom_margin) as i64;
        let side = (w as f32 * crop.side_margin) as i64;

        let mut left = (x - side).max(0);
        let mut upper = (y - top).max(0);
        let mut width = (img_w - left).min(w + 2 * side);
        let mut height = (img_h - upper).min(h + top + bottom);
        if width <= 0 || height <= 0 {
            return None;
        }

        if width as f64 / height as f64 > aspect {
            let narrowed = (height as f64 * aspect) as i64;
            left += (width - narrowed) / 2;
            width = narrowed;
        } else {
            let shortened = (width as f64 / aspect) as i64;
            upper += (height - shortened) / 2;
            height = shortened;
        }

        left = left.max(0);
        upper = upper.max(0);
        width = width.min(img_w - left);
        height = height.min(img_h - upper);
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Region::new(left as u32, upper as u32, width as u32, height as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Returns canned regions per pass, keyed on the pass's min_size.
    struct ScriptedDetector {
        hits: Vec<(u32, Vec<Region>)>,
    }

    impl FaceRegionDetector for ScriptedDetector {
        fn detect_regions(
            &self,
            _image: &RasterImage,
            params: &DetectorParams,
        ) -> Result<Vec<Region>, DocumentError> {
            Ok(self
                .hits
                .iter()
                .find(|(min_size, _)| *min_size == params.min_size)
                .map(|(_, regions)| regions.clone())
                .unwrap_or_default())
        }
    }

    struct FailingDetector;

    impl FaceRegionDetector for FailingDetector {
        fn detect_regions(
            &self,
            _image: &RasterImage,
            _params: &DetectorParams,
        ) -> Result<Vec<Region>, DocumentError> {
            Err(DocumentError::Detection("model unavailable".to_string()))
        }
    }

    fn blank(width: u32, height: u32) -> RasterImage {
        RasterImage::new(RgbImage::from_pixel(width, height, Rgb([128, 128, 128])))
    }

    fn detection(region: Region, method: DetectionMethod, variant: EnhancementVariant) -> RawDetection {
        RawDetection {
            region,
            method,
            variant,
        }
    }

    fn candidate(confidence: f32) -> FaceCandidate {
        FaceCandidate {
            region: blank(2, 2),
            bounds: Region::new(0, 0, 2, 2),
            detection_method: DetectionMethod::FrontalDefault,
            confidence,
            enhancement_variant: 0,
        }
    }

    #[test]
    fn test_deduplicate_keeps_first_seen() {
        let detections = vec![
            detection(Region::new(10, 10, 100, 100), DetectionMethod::Profile, EnhancementVariant::Original),
            detection(Region::new(20, 20, 100, 100), DetectionMethod::FrontalDefault, EnhancementVariant::Original),
            detection(Region::new(300, 300, 50, 50), DetectionMethod::FrontalAlt, EnhancementVariant::Equalized),
        ];
        let unique = FaceCandidateDetector::deduplicate(detections);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].method, DetectionMethod::Profile);
        assert_eq!(unique[1].region, Region::new(300, 300, 50, 50));
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let mut candidates = vec![candidate(0.8), candidate(0.5), candidate(0.9)];
        FaceCandidateDetector::rank(&mut candidates);
        let order: Vec<f32> = candidates.iter().map(|c| c.confidence).collect();
        assert_eq!(order, vec![0.9, 0.8, 0.5]);

        let mut tied = vec![candidate(0.5), candidate(0.5)];
        tied[0].enhancement_variant = 1;
        tied[1].enhancement_variant = 2;
        FaceCandidateDetector::rank(&mut tied);
        assert_eq!(tied[0].enhancement_variant, 1);
    }

    #[test]
    fn test_confidence_bonuses() {
        let region = Region::new(0, 0, 100, 100);
        let original = detection(region, DetectionMethod::FrontalDefault, EnhancementVariant::Original);
        let score = FaceCandidateDetector::confidence(&original, 100_000);
        assert!((score - 0.1 * 1.2 * 1.1).abs() < 1e-6);

        let profile = detection(region, DetectionMethod::Profile, EnhancementVariant::Denoised);
        let score = FaceCandidateDetector::confidence(&profile, 100_000);
        assert!((score - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_portrait_bounds_three_by_four() {
        let crop = CropConfig::default();
        // face well inside the image: 100x100 at (200, 200)
        let bounds =
            FaceCandidateDetector::portrait_bounds(1000, 1000, &Region::new(200, 200, 100, 100), &crop)
                .unwrap();
        // expanded to 120x150, narrowed to 112 wide and re-centred
        assert_eq!(bounds, Region::new(194, 170, 112, 150));
        let ratio = bounds.width as f64 / bounds.height as f64;
        assert!((ratio - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_portrait_bounds_clamped_at_corner() {
        let crop = CropConfig::default();
        let bounds =
            FaceCandidateDetector::portrait_bounds(80, 80, &Region::new(0, 0, 60, 60), &crop).unwrap();
        assert!(bounds.right() <= 80 && bounds.bottom() <= 80);
        let ratio = bounds.width as f64 / bounds.height as f64;
        assert!((ratio - 0.75).abs() < 0.02);
    }

    #[test]
    fn test_crop_resized_to_output_size() {
        let image = blank(400, 400);
        let portrait = FaceCandidateDetector::crop_portrait(
            &image,
            &Region::new(100, 100, 80, 80),
            &CropConfig::default(),
        )
        .unwrap();
        assert_eq!((portrait.width(), portrait.height()), (200, 267));
    }

    #[test]
    fn test_detect_runs_every_variant_and_merges() {
        let face = Region::new(100, 100, 80, 100);
        let detector = ScriptedDetector {
            // frontal_default and profile both report the same face
            hits: vec![(30, vec![face]), (25, vec![Region::new(300, 20, 40, 50)])],
        };
        let candidate_detector = FaceCandidateDetector::new(Box::new(detector), FaceDetectionConfig::default());
        let candidates = candidate_detector.detect(&blank(400, 400));

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].bounds, face);
        assert_eq!(candidates[0].label(), "frontal_default_enh0");
        assert_eq!(candidates[1].label(), "frontal_alt_enh0");
        assert_eq!((candidates[0].region.width(), candidates[0].region.height()), (200, 267));
    }

    #[test]
    fn test_detector_failure_yields_nothing() {
        let candidate_detector =
            FaceCandidateDetector::new(Box::new(FailingDetector), FaceDetectionConfig::default());
        assert!(candidate_detector.detect(&blank(100, 100)).is_empty());
    }
}
