use crate::models::RasterImage;
use crate::processing::ImageProcessor;
use crate::sources::DocumentRenderer;
use crate::utils::DocumentError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Size and count caps for every image the pipeline holds in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Embedded images above this pixel count are skipped.
    pub max_embedded_pixels: u64,
    pub max_embedded_images: usize,
    /// Embedded images must exceed this on both sides.
    pub min_embedded_side: u32,
    pub max_embedded_pages: usize,
    /// Longest side kept after admission or rendering.
    pub max_image_dimension: u32,
    pub max_rendered_pages: usize,
    pub rendered_face_scale: f32,
    pub max_rendered_pixels: u64,
    pub full_page_scale: f32,
    pub max_full_page_pixels: u64,
    /// Fallback scale when a render comes out too large.
    pub reduced_scale: f32,
    /// Gray level below which a pixel counts as page content.
    pub content_threshold: u8,
    pub content_margin: f32,
    pub display_height: u32,
    pub display_max_width: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            max_embedded_pixels: 4_000_000,
            max_embedded_images: 10,
            min_embedded_side: 50,
            max_embedded_pages: 5,
            max_image_dimension: 2048,
            max_rendered_pages: 3,
            rendered_face_scale: 1.5,
            max_rendered_pixels: 6_000_000,
            full_page_scale: 1.2,
            max_full_page_pixels: 8_000_000,
            reduced_scale: 0.8,
            content_threshold: 240,
            content_margin: 0.05,
            display_height: 600,
            display_max_width: 800,
        }
    }
}

pub struct ResourceGovernor {
    limits: ResourceLimits,
}

impl ResourceGovernor {
    pub fn new(limits: ResourceLimits) -> Self {
        ResourceGovernor { limits }
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Filters embedded images down to the ones worth searching, downsized.
    /// Rejected images are dropped as soon as they are judged.
    pub fn admit_embedded(&self, images: Vec<RasterImage>) -> Vec<RasterImage> {
        let total = images.len();
        let mut admitted = Vec::new();
        for image in images {
            if admitted.len() >= self.limits.max_embedded_images {
                debug!("Embedded image cap of {} reached", self.limits.max_embedded_images);
                break;
            }
            if image.pixel_count() > self.limits.max_embedded_pixels {
                warn!(
                    "Skipping oversized embedded image {}x{}",
                    image.width(),
                    image.height()
                );
                continue;
            }
            let min_side = self.limits.min_embedded_side;
            if image.width() <= min_side || image.height() <= min_side {
                debug!("Skipping small embedded image {}x{}", image.width(), image.height());
                continue;
            }
            admitted.push(self.fit(image));
        }
        debug!("Admitted {} of {} embedded image(s)", admitted.len(), total);
        admitted
    }

    /// Renders a page at `scale`; a result above `max_pixels` is dropped and the page
    /// rendered again at the reduced scale. The final image is fitted to the dimension cap.
    pub fn render_bounded(
        &self,
        renderer: &dyn DocumentRenderer,
        page: usize,
        scale: f32,
        max_pixels: u64,
    ) -> Result<RasterImage, DocumentError> {
        let mut rendered = renderer.render_page(page, scale)?;
        if rendered.pixel_count() > max_pixels {
            warn!(
                "Page {} too large at scale {} ({}x{}), rendering at {}",
                page,
                scale,
                rendered.width(),
                rendered.height(),
                self.limits.reduced_scale
            );
            drop(rendered);
            rendered = renderer.render_page(page, self.limits.reduced_scale)?;
        }
        Ok(self.fit(rendered))
    }

    pub fn fit(&self, image: RasterImage) -> RasterImage {
        ImageProcessor::limit_dimension(image, self.limits.max_image_dimension)
    }
}
