use crate::config::ProcessorConfig;
use crate::models::{
    ExtractedFields, ExtractionIssue, ExtractionResult, FieldName, IssueKind, RawDocument,
};
use crate::processing::{
    DocumentClassifier, FaceCandidateDetector, FaceRegionDetector, FieldExtractor, PhotoSelector,
    ResourceGovernor, SkinToneDetector,
};
use crate::sources::{collect_embedded_images, DocumentRenderer, OcrAnalysis};
use crate::utils::DocumentError;
use crate::validation::TaxIdValidator;
use log::{debug, info, warn};

/// Runs classification, field extraction and photo selection over one document.
/// Built once from configuration and reusable across documents.
pub struct DocumentProcessor {
    classifier: DocumentClassifier,
    extractor: FieldExtractor,
    selector: PhotoSelector,
    max_embedded_pages: usize,
}

impl DocumentProcessor {
    pub fn new(
        config: ProcessorConfig,
        detector: Box<dyn FaceRegionDetector>,
    ) -> Result<Self, DocumentError> {
        config.validate()?;

        let classifier = DocumentClassifier::new(&config.patterns.signatures)?;
        let extractor = FieldExtractor::new(
            &config.patterns.fields,
            TaxIdValidator::new(config.tax_id_overflow),
        )?;
        let max_embedded_pages = config.limits.max_embedded_pages;
        let selector = PhotoSelector::new(
            FaceCandidateDetector::new(detector, config.detection),
            ResourceGovernor::new(config.limits),
        );

        Ok(DocumentProcessor {
            classifier,
            extractor,
            selector,
            max_embedded_pages,
        })
    }

    /// Default configuration with the built-in skin-tone detector.
    pub fn with_defaults() -> Result<Self, DocumentError> {
        Self::new(ProcessorConfig::default(), Box::new(SkinToneDetector::new()))
    }

    /// Pairs an OCR analysis with the embedded images the renderer exposes.
    pub fn load_document(&self, analysis: OcrAnalysis, renderer: &dyn DocumentRenderer) -> RawDocument {
        analysis.into_document(collect_embedded_images(renderer, self.max_embedded_pages))
    }

    pub fn process(
        &self,
        document: RawDocument,
        renderer: &dyn DocumentRenderer,
    ) -> Result<ExtractionResult, DocumentError> {
        if document.text.trim().is_empty() {
            return Err(DocumentError::InputUnavailable(
                "OCR returned no text".to_string(),
            ));
        }

        let RawDocument {
            text,
            structured_fields,
            embedded_images,
        } = document;
        info!(
            "Processing document: {} chars of text, {} structured field(s), {} embedded image(s)",
            text.len(),
            structured_fields.len(),
            embedded_images.len()
        );

        let document_type = self.classifier.classify(&text);
        match document_type {
            Some(doc_type) => info!("Document classified as {}", doc_type),
            None => info!("Document type could not be determined"),
        }

        let fields = self.extractor.extract(&text, &structured_fields);
        let mut issues = field_issues(&fields);

        let tax_id_valid = !fields.tax_id.is_empty() && self.extractor.validator().validate(&fields.tax_id);

        let selection = self.selector.select(embedded_images, renderer);
        issues.extend(selection.issues);

        for issue in &issues {
            debug!("{:?}: {}", issue.kind, issue.message);
        }

        Ok(ExtractionResult {
            document_type,
            name: fields.name,
            tax_id: fields.tax_id,
            id_number: fields.id_number,
            tax_id_valid,
            photo: selection.photo,
            photo_source: selection.source,
            photo_detail: selection.detail,
            photo_confidence: selection.confidence,
            structured_field_count: structured_fields.len(),
            issues,
        })
    }
}

fn field_issues(fields: &ExtractedFields) -> Vec<ExtractionIssue> {
    let mut issues = Vec::new();
    for (field, value) in [
        ("name", &fields.name),
        ("tax id", &fields.tax_id),
        ("id number", &fields.id_number),
    ] {
        if value.is_empty() {
            warn!("No {} found", field);
            issues.push(ExtractionIssue::new(IssueKind::FieldNotFound, format!("no {} found", field)));
        }
    }

    for candidate in fields.rejected.iter().filter(|c| c.field_name == FieldName::TaxId) {
        issues.push(ExtractionIssue::new(
            IssueKind::ValidationFailure,
            format!("tax id candidate {:?} ({:?}) rejected", candidate.raw_value, candidate.source),
        ));
    }
    issues
}
