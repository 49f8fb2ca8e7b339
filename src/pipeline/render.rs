//! Annotation rendering for detection output.

use crate::pipeline::RecognitionResult;
use crate::trace::{trace_event, trace_warn};
use crate::util::{BoxScanError, BoxScanResult};
use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect as DrawRect;
use std::path::Path;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const TEXT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Fonts tried by [`Annotator::with_system_font`], in order.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Draws detection rectangles and labels onto a copy of the source image.
///
/// Without a font only rectangles are drawn.
pub struct Annotator {
    font: Option<FontVec>,
    thickness: u32,
    text_scale: f32,
}

impl Default for Annotator {
    fn default() -> Self {
        Self {
            font: None,
            thickness: 2,
            text_scale: 24.0,
        }
    }
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    /// Loads a TrueType/OpenType font for label text.
    pub fn with_font_file<P: AsRef<Path>>(self, path: P) -> BoxScanResult<Self> {
        let path = path.as_ref();
        let font_err = |reason: String| BoxScanError::Font {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|err| font_err(err.to_string()))?;
        let font = FontVec::try_from_vec(bytes).map_err(|err| font_err(err.to_string()))?;
        Ok(self.with_font(font))
    }

    /// Uses the first readable font from [`SYSTEM_FONT_PATHS`].
    ///
    /// Falls back to rectangles only when none loads.
    pub fn with_system_font(self) -> Self {
        for path in SYSTEM_FONT_PATHS {
            if let Ok(annotator) = Self::default().with_font_file(path) {
                trace_event!("system_font_loaded", path = *path);
                return Self {
                    font: annotator.font,
                    ..self
                };
            }
        }
        trace_warn!("no system font found; labels will not be drawn", searched = SYSTEM_FONT_PATHS.len());
        self
    }

    pub fn with_thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness.max(1);
        self
    }

    pub fn with_text_scale(mut self, scale: f32) -> Self {
        self.text_scale = scale;
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Renders every result onto a copy of `source`.
    pub fn render(&self, source: &RgbImage, results: &[RecognitionResult]) -> RgbImage {
        let mut out = source.clone();
        if self.font.is_none() {
            let hidden = results.iter().filter(|r| r.is_labeled()).count();
            if hidden > 0 {
                trace_warn!("no font loaded; recognized labels not drawn", labels = hidden);
            }
        }
        for result in results {
            self.draw_box(&mut out, result);
            self.draw_label(&mut out, result);
        }
        out
    }

    fn draw_box(&self, img: &mut RgbImage, result: &RecognitionResult) {
        let rect = result.rect;
        for inset in 0..self.thickness as i32 {
            let width = rect.width - 2 * inset;
            let height = rect.height - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let ring = DrawRect::at(rect.x + inset, rect.y + inset).of_size(width as u32, height as u32);
            draw_hollow_rect_mut(img, ring, BOX_COLOR);
        }
    }

    fn draw_label(&self, img: &mut RgbImage, result: &RecognitionResult) {
        let Some(font) = &self.font else {
            return;
        };
        if result.label.is_empty() {
            return;
        }
        let lift = self.text_scale.ceil() as i32 + 2;
        let (x, y) = if result.rect.y >= lift {
            (result.rect.x, result.rect.y - lift)
        } else {
            (result.rect.x + 4, result.rect.y + 4)
        };
        draw_text_mut(img, TEXT_COLOR, x.max(0), y.max(0), self.text_scale, font, &result.label);
    }
}
