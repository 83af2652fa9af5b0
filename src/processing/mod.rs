pub mod classifier;
pub mod extractors;
pub mod face_detection;
pub mod field_correction;
pub mod governor;
pub mod image;
pub mod photo_selector;
pub mod skin_detector;

pub use classifier::DocumentClassifier;
pub use extractors::FieldExtractor;
pub use face_detection::{
    CropConfig, DetectionPass, DetectorParams, FaceCandidateDetector, FaceDetectionConfig,
    FaceRegionDetector,
};
pub use field_correction::FieldCorrection;
pub use governor::{ResourceGovernor, ResourceLimits};
pub use self::image::ImageProcessor;
pub use photo_selector::{PhotoSelection, PhotoSelector};
pub use skin_detector::SkinToneDetector;
