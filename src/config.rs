//! Processor configuration: pattern tables, resource caps and detection passes.

use crate::models::PatternConfig;
use crate::processing::{FaceDetectionConfig, ResourceLimits};
use crate::utils::DocumentError;
use crate::validation::OverflowPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a [`DocumentProcessor`](crate::DocumentProcessor) is built from.
///
/// Every section falls back to its defaults, so a JSON override only needs
/// to name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub patterns: PatternConfig,
    pub limits: ResourceLimits,
    pub detection: FaceDetectionConfig,
    pub tax_id_overflow: OverflowPolicy,
}

impl ProcessorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DocumentError> {
        let config: ProcessorConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.tax_id_overflow = policy;
        self
    }

    /// Rejects settings the pipeline cannot run with. Regexes are checked later,
    /// when the components compile them.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let limits = &self.limits;
        for (name, scale) in [
            ("rendered_face_scale", limits.rendered_face_scale),
            ("full_page_scale", limits.full_page_scale),
            ("reduced_scale", limits.reduced_scale),
        ] {
            if !(scale > 0.0) {
                return Err(DocumentError::Config(format!("{} must be positive, got {}", name, scale)));
            }
        }
        if limits.max_image_dimension == 0 || limits.display_height == 0 || limits.display_max_width == 0 {
            return Err(DocumentError::Config("image dimensions must be non-zero".to_string()));
        }
        if !(0.0..1.0).contains(&limits.content_margin) {
            return Err(DocumentError::Config(format!(
                "content_margin must be in [0, 1), got {}",
                limits.content_margin
            )));
        }

        let crop = &self.detection.crop;
        if crop.output_width == 0 || crop.output_height == 0 {
            return Err(DocumentError::Config("portrait output size must be non-zero".to_string()));
        }
        for pass in &self.detection.passes {
            if pass.params.min_size > pass.params.max_size {
                return Err(DocumentError::Config(format!(
                    "{} pass: min_size {} exceeds max_size {}",
                    pass.method.label(),
                    pass.params.min_size,
                    pass.params.max_size
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config = ProcessorConfig::from_json(
            r#"{"limits": {"max_embedded_images": 3}, "tax_id_overflow": "reject"}"#,
        )
        .unwrap();
        assert_eq!(config.limits.max_embedded_images, 3);
        assert_eq!(config.limits.max_embedded_pixels, 4_000_000);
        assert_eq!(config.tax_id_overflow, OverflowPolicy::Reject);
        assert_eq!(config.detection, FaceDetectionConfig::default());
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(ProcessorConfig::from_json("{}").unwrap(), ProcessorConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ProcessorConfig::from_json(r#"{"limits": {"reduced_scale": 0.0}}"#).unwrap_err();
        assert!(matches!(err, DocumentError::Config(_)));

        let err = ProcessorConfig::from_json(r#"{"detection": {"crop": {"output_width": 0}}}"#).unwrap_err();
        assert!(matches!(err, DocumentError::Config(_)));
    }

    #[test]
    fn test_overflow_policy_override() {
        let config = ProcessorConfig::default().with_overflow_policy(OverflowPolicy::Reject);
        assert_eq!(config.tax_id_overflow, OverflowPolicy::Reject);
        assert_eq!(config.limits, ResourceLimits::default());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"patterns": {"fields": {"context_window": 30}}}"#).unwrap();
        let config = ProcessorConfig::from_file(&path).unwrap();
        assert_eq!(config.patterns.fields.context_window, 30);
    }
}
