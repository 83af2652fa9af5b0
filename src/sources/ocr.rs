use crate::models::{normalize_key, RasterImage, RawDocument};
use crate::utils::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Output of the OCR/forms engine for one analyzed image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrAnalysis {
    pub text: String,
    pub key_value_pairs: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnalysisFile {
    Single(OcrAnalysis),
    Pages(Vec<OcrAnalysis>),
}

impl OcrAnalysis {
    /// Reads one analysis object, or an array of per-page analyses merged in order.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DocumentError> {
        match serde_json::from_str(raw)? {
            AnalysisFile::Single(analysis) => Ok(Self::merge(vec![analysis])),
            AnalysisFile::Pages(pages) => Ok(Self::merge(pages)),
        }
    }

    /// Page texts joined by newlines. Keys are normalized, and for repeated keys
    /// the earliest page wins.
    pub fn merge(pages: Vec<OcrAnalysis>) -> Self {
        let mut merged = OcrAnalysis::default();
        let mut texts = Vec::with_capacity(pages.len());
        for page in pages {
            texts.push(page.text);
            for (key, value) in page.key_value_pairs {
                merged.key_value_pairs.entry(normalize_key(&key)).or_insert(value);
            }
        }
        merged.text = texts.join("\n");
        merged
    }

    pub fn into_document(self, embedded_images: Vec<RasterImage>) -> RawDocument {
        RawDocument::new(self.text, self.key_value_pairs, embedded_images)
    }
}
