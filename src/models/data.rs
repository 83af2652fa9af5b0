use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Rg,
    Cnh,
    Passport,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Rg => "RG",
            DocumentType::Cnh => "CNH",
            DocumentType::Passport => "PASSPORT",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A 3-channel raster owned by whichever stage currently holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbImage,
}

impl RasterImage {
    pub fn new(pixels: RgbImage) -> Self {
        RasterImage { pixels }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        RasterImage {
            pixels: image.to_rgb8(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn into_rgb(self) -> RgbImage {
        self.pixels
    }

    /// Grayscale view, computed on every call. Callers that need it twice keep the result.
    pub fn grayscale(&self) -> GrayImage {
        imageops::grayscale(&self.pixels)
    }

    pub fn crop(&self, region: &Region) -> RasterImage {
        let sub = imageops::crop_imm(
            &self.pixels,
            region.x,
            region.y,
            region.width,
            region.height,
        );
        RasterImage::new(sub.to_image())
    }

    pub fn resize_exact(&self, width: u32, height: u32) -> RasterImage {
        RasterImage::new(imageops::resize(
            &self.pixels,
            width.max(1),
            height.max(1),
            FilterType::Triangle,
        ))
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Region {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn intersection_area(&self, other: &Region) -> u64 {
        let overlap_x = self.right().min(other.right()).saturating_sub(self.x.max(other.x));
        let overlap_y = self
            .bottom()
            .min(other.bottom())
            .saturating_sub(self.y.max(other.y));
        overlap_x as u64 * overlap_y as u64
    }

    /// Same physical face: the overlap covers more than half of the smaller region.
    pub fn is_duplicate_of(&self, other: &Region) -> bool {
        let smaller = self.area().min(other.area());
        smaller > 0 && self.intersection_area(other) * 2 > smaller
    }
}

/// Document as handed over by the OCR/forms collaborator.
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    pub text: String,
    pub structured_fields: BTreeMap<String, String>,
    pub embedded_images: Vec<RasterImage>,
}

impl RawDocument {
    pub fn new<I, K, V>(text: impl Into<String>, structured: I, embedded_images: Vec<RasterImage>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut structured_fields = BTreeMap::new();
        for (key, value) in structured {
            let key = normalize_key(key.as_ref());
            let value = value.as_ref().trim();
            if !key.is_empty() && !value.is_empty() {
                structured_fields.entry(key).or_insert_with(|| value.to_string());
            }
        }
        RawDocument {
            text: text.into(),
            structured_fields,
            embedded_images,
        }
    }
}

/// Lower-cases a forms key and strips the trailing colon the OCR engine tends to keep.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .trim_end_matches(|c: char| c == ':' || c.is_whitespace())
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldName {
    Name,
    TaxId,
    IdNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldSource {
    FreeText,
    Structured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCandidate {
    pub field_name: FieldName,
    pub raw_value: String,
    pub source: FieldSource,
    pub valid: bool,
}

/// Winning value per field. Empty string means the field was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub name: String,
    pub tax_id: String,
    pub id_number: String,
    /// The surviving candidate of each found field, in tax id, name, id number order.
    pub accepted: Vec<FieldCandidate>,
    pub rejected: Vec<FieldCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    FrontalDefault,
    FrontalAlt,
    Profile,
}

impl DetectionMethod {
    pub fn bonus(&self) -> f32 {
        match self {
            DetectionMethod::FrontalDefault => 1.2,
            DetectionMethod::FrontalAlt => 1.1,
            DetectionMethod::Profile => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetectionMethod::FrontalDefault => "frontal_default",
            DetectionMethod::FrontalAlt => "frontal_alt",
            DetectionMethod::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementVariant {
    Original,
    Equalized,
    ContrastAdjusted,
    Denoised,
}

impl EnhancementVariant {
    pub fn index(&self) -> usize {
        match self {
            EnhancementVariant::Original => 0,
            EnhancementVariant::Equalized => 1,
            EnhancementVariant::ContrastAdjusted => 2,
            EnhancementVariant::Denoised => 3,
        }
    }

    pub fn bonus(&self) -> f32 {
        match self {
            EnhancementVariant::Original => 1.1,
            _ => 1.0,
        }
    }
}

/// Raw detector hit before scoring and cropping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub region: Region,
    pub method: DetectionMethod,
    pub variant: EnhancementVariant,
}

#[derive(Debug, Clone)]
pub struct FaceCandidate {
    pub region: RasterImage,
    pub bounds: Region,
    pub detection_method: DetectionMethod,
    pub confidence: f32,
    pub enhancement_variant: usize,
}

impl FaceCandidate {
    pub fn label(&self) -> String {
        format!("{}_enh{}", self.detection_method.label(), self.enhancement_variant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhotoSource {
    EmbeddedFace,
    RenderedFace,
    FullPage,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    FieldNotFound,
    ValidationFailure,
    RenderFailure,
    PhotoUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ExtractionIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        ExtractionIssue {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub document_type: Option<DocumentType>,
    pub name: String,
    pub tax_id: String,
    pub id_number: String,
    pub tax_id_valid: bool,
    #[serde(skip)]
    pub photo: Option<RasterImage>,
    pub photo_source: PhotoSource,
    pub photo_detail: Option<String>,
    pub photo_confidence: Option<f32>,
    pub structured_field_count: usize,
    pub issues: Vec<ExtractionIssue>,
}
