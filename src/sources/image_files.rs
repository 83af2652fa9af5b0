use crate::models::RasterImage;
use crate::sources::DocumentRenderer;
use crate::utils::DocumentError;
use log::debug;
use std::path::{Path, PathBuf};

/// Serves pre-rasterized page images as a document.
///
/// Page files are assumed to have been rasterized at `page_scale`; a render request
/// at a lower scale downsizes, a higher one returns the file as is. Embedded images
/// all belong to the first page.
pub struct ImageFileRenderer {
    pages: Vec<PathBuf>,
    embedded: Vec<PathBuf>,
    page_scale: f32,
}

impl ImageFileRenderer {
    pub fn new(pages: Vec<PathBuf>, embedded: Vec<PathBuf>, page_scale: f32) -> Self {
        ImageFileRenderer {
            pages,
            embedded,
            page_scale,
        }
    }

    fn load(path: &Path) -> Result<RasterImage, DocumentError> {
        Ok(RasterImage::from_dynamic(image::open(path)?))
    }
}

impl DocumentRenderer for ImageFileRenderer {
    // Embedded images alone still make a one-page document.
    fn page_count(&self) -> usize {
        self.pages.len().max(usize::from(!self.embedded.is_empty()))
    }

    fn render_page(&self, page_index: usize, scale: f32) -> Result<RasterImage, DocumentError> {
        let path = self
            .pages
            .get(page_index)
            .ok_or_else(|| DocumentError::render(page_index, "no such page"))?;
        let page = Self::load(path).map_err(|e| DocumentError::render(page_index, e.to_string()))?;

        if self.page_scale <= 0.0 || scale <= 0.0 {
            return Err(DocumentError::render(page_index, format!("invalid scale {}", scale)));
        }
        let factor = (scale / self.page_scale).min(1.0);
        if factor >= 1.0 {
            return Ok(page);
        }

        let width = ((page.width() as f32 * factor) as u32).max(1);
        let height = ((page.height() as f32 * factor) as u32).max(1);
        debug!(
            "Rendering page {} at scale {}: {}x{}",
            page_index, scale, width, height
        );
        Ok(page.resize_exact(width, height))
    }

    fn list_embedded_images(&self, page_index: usize) -> Result<Vec<RasterImage>, DocumentError> {
        if page_index != 0 {
            return Ok(Vec::new());
        }
        self.embedded.iter().map(|path| Self::load(path)).collect()
    }
}
