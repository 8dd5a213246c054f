//! Extraction settings.

use crate::units::DEFAULT_DPI;

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Emit SmartArt sub-components directly instead of a diagram wrapper.
    pub flatten_diagrams: bool,
    /// Build inline data URLs for images.
    pub embed_media: bool,
    /// Read intrinsic image dimensions from media headers.
    pub sniff_dimensions: bool,
    /// Maximum text placeholders produced by the last-resort scraper.
    pub fallback_text_limit: usize,
    /// Scraped strings shorter than this are ignored.
    pub fallback_min_text_len: usize,
    /// Text at or above this length is never a heuristic title.
    pub title_max_len: usize,
    /// First-run font size (points) above which short text counts as a title.
    pub title_min_font_pt: f64,
    /// Resolution for EMU to pixel conversion.
    pub dpi: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            flatten_diagrams: false,
            embed_media: true,
            sniff_dimensions: true,
            fallback_text_limit: 5,
            fallback_min_text_len: 3,
            title_max_len: 100,
            title_min_font_pt: 18.0,
            dpi: DEFAULT_DPI,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flatten_diagrams(mut self, flatten: bool) -> Self {
        self.flatten_diagrams = flatten;
        self
    }

    pub fn with_embed_media(mut self, embed: bool) -> Self {
        self.embed_media = embed;
        self
    }

    pub fn with_sniff_dimensions(mut self, sniff: bool) -> Self {
        self.sniff_dimensions = sniff;
        self
    }

    pub fn with_fallback_text_limit(mut self, limit: usize) -> Self {
        self.fallback_text_limit = limit;
        self
    }

    pub fn with_fallback_min_text_len(mut self, len: usize) -> Self {
        self.fallback_min_text_len = len;
        self
    }

    pub fn with_title_heuristic(mut self, max_len: usize, min_font_pt: f64) -> Self {
        self.title_max_len = max_len;
        self.title_min_font_pt = min_font_pt;
        self
    }

    /// Set the conversion resolution; non-positive values are ignored.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        if dpi.is_finite() && dpi > 0.0 {
            self.dpi = dpi;
        }
        self
    }
}
