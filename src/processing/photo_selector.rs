use crate::models::{ExtractionIssue, FaceCandidate, IssueKind, PhotoSource, RasterImage};
use crate::processing::{FaceCandidateDetector, ImageProcessor, ResourceGovernor};
use crate::sources::DocumentRenderer;
use log::{info, warn};

/// The chosen portrait and how it was obtained.
#[derive(Debug, Clone)]
pub struct PhotoSelection {
    pub photo: Option<RasterImage>,
    pub source: PhotoSource,
    pub detail: Option<String>,
    pub confidence: Option<f32>,
    pub issues: Vec<ExtractionIssue>,
}

impl PhotoSelection {
    fn face(candidate: FaceCandidate, source: PhotoSource, issues: Vec<ExtractionIssue>) -> Self {
        PhotoSelection {
            detail: Some(candidate.label()),
            confidence: Some(candidate.confidence),
            photo: Some(candidate.region),
            source,
            issues,
        }
    }
}

/// Tiered photo search: embedded images, then rendered pages, then the whole first page.
/// The first tier that yields something wins; later tiers never run.
pub struct PhotoSelector {
    detector: FaceCandidateDetector,
    governor: ResourceGovernor,
}

impl PhotoSelector {
    pub fn new(detector: FaceCandidateDetector, governor: ResourceGovernor) -> Self {
        PhotoSelector { detector, governor }
    }

    pub fn select(&self, embedded: Vec<RasterImage>, renderer: &dyn DocumentRenderer) -> PhotoSelection {
        let mut issues = Vec::new();

        if let Some(face) = self.embedded_face(embedded) {
            info!("Using embedded face ({}, confidence {:.3})", face.label(), face.confidence);
            return PhotoSelection::face(face, PhotoSource::EmbeddedFace, issues);
        }

        if let Some(face) = self.rendered_face(renderer, &mut issues) {
            info!("Using face from rendered page ({}, confidence {:.3})", face.label(), face.confidence);
            return PhotoSelection::face(face, PhotoSource::RenderedFace, issues);
        }

        if let Some(page) = self.full_page(renderer, &mut issues) {
            info!("No face found, using full page {}x{}", page.width(), page.height());
            return PhotoSelection {
                photo: Some(page),
                source: PhotoSource::FullPage,
                detail: Some("full_document".to_string()),
                confidence: None,
                issues,
            };
        }

        warn!("No photo could be extracted");
        issues.push(ExtractionIssue::new(
            IssueKind::PhotoUnavailable,
            "no face and no renderable page",
        ));
        PhotoSelection {
            photo: None,
            source: PhotoSource::None,
            detail: None,
            confidence: None,
            issues,
        }
    }

    fn embedded_face(&self, embedded: Vec<RasterImage>) -> Option<FaceCandidate> {
        let admitted = self.governor.admit_embedded(embedded);
        info!("Searching {} embedded image(s) for faces", admitted.len());
        let mut best: Option<FaceCandidate> = None;
        for image in admitted {
            best = better(best, self.detector.detect(&image).into_iter().next());
        }
        best
    }

    fn rendered_face(
        &self,
        renderer: &dyn DocumentRenderer,
        issues: &mut Vec<ExtractionIssue>,
    ) -> Option<FaceCandidate> {
        let limits = self.governor.limits();
        let pages = renderer.page_count().min(limits.max_rendered_pages);
        let mut best: Option<FaceCandidate> = None;
        for page in 0..pages {
            let rendered = match self.governor.render_bounded(
                renderer,
                page,
                limits.rendered_face_scale,
                limits.max_rendered_pixels,
            ) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping page {} in face search: {}", page, e);
                    issues.push(ExtractionIssue::new(IssueKind::RenderFailure, e.to_string()));
                    continue;
                }
            };
            best = better(best, self.detector.detect(&rendered).into_iter().next());
        }
        best
    }

    fn full_page(
        &self,
        renderer: &dyn DocumentRenderer,
        issues: &mut Vec<ExtractionIssue>,
    ) -> Option<RasterImage> {
        let limits = self.governor.limits();
        let page = match self.governor.render_bounded(
            renderer,
            0,
            limits.full_page_scale,
            limits.max_full_page_pixels,
        ) {
            Ok(page) => page,
            Err(e) => {
                warn!("Full page fallback failed: {}", e);
                issues.push(ExtractionIssue::new(IssueKind::RenderFailure, e.to_string()));
                return None;
            }
        };

        let cropped = ImageProcessor::crop_to_content(&page, limits.content_threshold, limits.content_margin);
        drop(page);
        Some(ImageProcessor::fit_display(
            &cropped,
            limits.display_height,
            limits.display_max_width,
        ))
    }
}

// Ties keep the earlier candidate.
fn better(current: Option<FaceCandidate>, challenger: Option<FaceCandidate>) -> Option<FaceCandidate> {
    match (current, challenger) {
        (Some(current), Some(challenger)) if challenger.confidence > current.confidence => Some(challenger),
        (Some(current), _) => Some(current),
        (None, challenger) => challenger,
    }
}
