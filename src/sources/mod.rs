pub mod image_files;
pub mod ocr;

pub use image_files::ImageFileRenderer;
pub use ocr::OcrAnalysis;

use crate::models::RasterImage;
use crate::utils::DocumentError;
use log::warn;

/// Page rendering and image extraction for one opened document.
pub trait DocumentRenderer {
    fn page_count(&self) -> usize;

    /// Rasterizes a page. `scale` is relative to the page's natural size (1.0 = 72 dpi).
    fn render_page(&self, page_index: usize, scale: f32) -> Result<RasterImage, DocumentError>;

    fn list_embedded_images(&self, page_index: usize) -> Result<Vec<RasterImage>, DocumentError>;
}

/// Embedded images from the first `max_pages` pages, in page order.
/// Pages that fail to list are skipped.
pub fn collect_embedded_images(renderer: &dyn DocumentRenderer, max_pages: usize) -> Vec<RasterImage> {
    let mut images = Vec::new();
    for page in 0..renderer.page_count().min(max_pages) {
        match renderer.list_embedded_images(page) {
            Ok(found) => images.extend(found),
            Err(e) => warn!("Could not list images on page {}: {}", page, e),
        }
    }
    images
}
