/// Size normalisation applied to every screenshot before OCR.
///
/// Recognition quality drops sharply on small captures, so images whose pixel
/// area falls below a lower bound are enlarged by `(bound / area) * damping`
/// with bilinear filtering. The damping factor (0.5 by default) was tuned
/// against real screenshots. Treat both the factor and the filter as policy,
/// not as a general rule for other engines.
use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::{DEFAULT_AREA_LOWER_BOUND, DEFAULT_SCALE_DAMPING};

#[derive(Debug, Clone, Copy)]
pub struct SizeNormalizer {
    area_lower_bound: u64,
    damping: f64,
}

impl Default for SizeNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_AREA_LOWER_BOUND, DEFAULT_SCALE_DAMPING)
    }
}

impl SizeNormalizer {
    pub fn new(area_lower_bound: u64, damping: f64) -> Self {
        Self {
            area_lower_bound,
            damping,
        }
    }

    /// Returns `img` untouched when it is large enough, otherwise an enlarged copy.
    pub fn normalize(&self, img: DynamicImage) -> DynamicImage {
        match self.target_dimensions(img.width(), img.height()) {
            Some((w, h)) => img.resize_exact(w, h, FilterType::Triangle),
            None => img,
        }
    }

    /// Output dimensions for a `width`×`height` input, or `None` when the image
    /// is left as is: area at or above the bound, zero area, or a damped scale
    /// that would not enlarge it.
    ///
    /// Dimensions are truncated toward zero.
    pub fn target_dimensions(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let area = u64::from(width) * u64::from(height);
        if area == 0 || area >= self.area_lower_bound {
            return None;
        }
        let scale = self.scale_for(area);
        if scale <= 1.0 {
            return None;
        }
        let w = (f64::from(width) * scale) as u32;
        let h = (f64::from(height) * scale) as u32;
        Some((w, h))
    }

    fn scale_for(&self, area: u64) -> f64 {
        self.area_lower_bound as f64 / area as f64 * self.damping
    }
}
