//! Template matcher: one template at one scale against a source image.
//!
//! [`match_template`] returns a lazy iterator of [`MatchCandidate`]s in
//! raster order (row-major, top-left first). The order matters downstream:
//! the region mask keeps the first claim, so raster order decides which of
//! several overlapping candidates survives.

use crate::kernel::{placement_grid, zncc_score_at, ScoreSurface};
use crate::region::Rect;
use crate::template::{Template, TemplatePlan};
use crate::trace::trace_event;
use crate::util::{BoxScanError, BoxScanResult};
use image::GrayImage;

/// Tuning for a single matcher call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchParams {
    /// Candidates must score strictly above this value.
    pub score_threshold: f32,
    /// Pixels added on every side of the template footprint.
    pub margin: i32,
    /// Minimum window variance; flatter windows are skipped.
    pub min_var_i: f32,
    /// Precompute the score surface on the rayon pool (needs the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.55,
            margin: 5,
            min_var_i: 1e-3,
            parallel: false,
        }
    }
}

/// A placement scoring above the threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchCandidate<'a> {
    /// Padded footprint in source pixel space (may hang past the border).
    pub rect: Rect,
    pub score: f32,
    pub scale: f32,
    pub template: &'a str,
}

enum Scores {
    Lazy(TemplatePlan),
    #[cfg(feature = "rayon")]
    Surface(ScoreSurface),
}

struct Scan {
    scores: Scores,
    cols: u32,
    rows: u32,
    tpl_width: i32,
    tpl_height: i32,
}

/// Lazy raster-order sequence of candidates for one template and scale.
///
/// Finite and not restartable; call [`match_template`] again to rescan.
pub struct Candidates<'a> {
    image: &'a GrayImage,
    template: &'a str,
    scale: f32,
    params: MatchParams,
    scan: Option<Scan>,
    x: u32,
    y: u32,
}

impl<'a> Candidates<'a> {
    fn empty(image: &'a GrayImage, template: &'a str, scale: f32, params: MatchParams) -> Self {
        Self {
            image,
            template,
            scale,
            params,
            scan: None,
            x: 0,
            y: 0,
        }
    }

    /// Size of the scaled template, or `None` when nothing will be scanned.
    pub fn template_size(&self) -> Option<(u32, u32)> {
        self.scan
            .as_ref()
            .map(|scan| (scan.tpl_width as u32, scan.tpl_height as u32))
    }
}

impl<'a> Iterator for Candidates<'a> {
    type Item = MatchCandidate<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let scan = self.scan.as_ref()?;
        while self.y < scan.rows {
            let (x, y) = (self.x, self.y);
            self.x += 1;
            if self.x >= scan.cols {
                self.x = 0;
                self.y += 1;
            }

            let score = match &scan.scores {
                Scores::Lazy(plan) => zncc_score_at(self.image, plan, x, y, self.params.min_var_i),
                #[cfg(feature = "rayon")]
                Scores::Surface(surface) => surface.get(x, y).unwrap_or(f32::NEG_INFINITY),
            };
            if score > self.params.score_threshold {
                let footprint = Rect::new(x as i32, y as i32, scan.tpl_width, scan.tpl_height);
                return Some(MatchCandidate {
                    rect: footprint.padded(self.params.margin),
                    score,
                    scale: self.scale,
                    template: self.template,
                });
            }
        }
        None
    }
}

/// Matches `template` resized by `scale` against `image`.
///
/// A scaled template larger than the image, collapsing to zero size or
/// without variance yields an empty sequence. A non-positive or non-finite
/// `scale` is an error.
pub fn match_template<'a>(
    image: &'a GrayImage,
    template: &'a Template,
    scale: f32,
    params: MatchParams,
) -> BoxScanResult<Candidates<'a>> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(BoxScanError::InvalidInput("scale must be finite and > 0"));
    }
    let name = template.name();
    let plan = match template.plan_at_scale(scale) {
        Ok(Some(plan)) => plan,
        Ok(None) | Err(BoxScanError::DegenerateTemplate { .. }) => {
            return Ok(Candidates::empty(image, name, scale, params));
        }
        Err(err) => return Err(err),
    };
    let Some((cols, rows)) = placement_grid(image, &plan) else {
        return Ok(Candidates::empty(image, name, scale, params));
    };

    let tpl_width = i32::try_from(plan.width())
        .map_err(|_| BoxScanError::InvalidInput("template too wide"))?;
    let tpl_height = i32::try_from(plan.height())
        .map_err(|_| BoxScanError::InvalidInput("template too tall"))?;
    let scores = surface_or_lazy(image, plan, params);
    trace_event!("template_scan", cols = cols, rows = rows, scale = scale);

    Ok(Candidates {
        image,
        template: name,
        scale,
        params,
        scan: Some(Scan {
            scores,
            cols,
            rows,
            tpl_width,
            tpl_height,
        }),
        x: 0,
        y: 0,
    })
}

#[cfg(feature = "rayon")]
fn surface_or_lazy(image: &GrayImage, plan: TemplatePlan, params: MatchParams) -> Scores {
    if params.parallel {
        if let Some(surface) = crate::kernel::rayon::score_surface_par(image, &plan, params.min_var_i) {
            return Scores::Surface(surface);
        }
    }
    Scores::Lazy(plan)
}

#[cfg(not(feature = "rayon"))]
fn surface_or_lazy(_image: &GrayImage, plan: TemplatePlan, _params: MatchParams) -> Scores {
    Scores::Lazy(plan)
}

/// Eagerly scores every placement; convenience for inspection and tests.
pub fn score_surface(
    image: &GrayImage,
    template: &Template,
    scale: f32,
    min_var_i: f32,
) -> BoxScanResult<Option<ScoreSurface>> {
    Ok(template
        .plan_at_scale(scale)?
        .and_then(|plan| ScoreSurface::compute(image, &plan, min_var_i)))
}

#[cfg(test)]
mod tests {
    use super::{match_template, MatchParams};
    use crate::region::Rect;
    use crate::template::Template;
    use image::{imageops, GrayImage, Luma, Rgb, RgbImage};

    fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(2_654_435_761).max(1);
        GrayImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([(state >> 24) as u8])
        })
    }

    fn template_from(gray: &GrayImage, name: &str) -> Template {
        let rgb = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
            let v = gray.get_pixel(x, y)[0];
            Rgb([v, v, v])
        });
        Template::from_rgb(name, rgb).unwrap()
    }

    #[test]
    fn finds_embedded_patch_with_padding() {
        let image = noise(64, 48, 7);
        let patch = imageops::crop_imm(&image, 20, 12, 16, 12).to_image();
        let template = template_from(&patch, "patch");
        let params = MatchParams {
            score_threshold: 0.9,
            ..MatchParams::default()
        };
        let found: Vec<_> = match_template(&image, &template, 1.0, params)
            .unwrap()
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect, Rect::new(15, 7, 26, 22));
        assert_eq!(found[0].template, "patch");
        assert!(found[0].score > 0.99);
    }

    #[test]
    fn candidates_come_in_raster_order() {
        let image = noise(40, 40, 3);
        let template = template_from(&noise(6, 6, 11), "t");
        let params = MatchParams {
            score_threshold: -1.0,
            margin: 0,
            ..MatchParams::default()
        };
        let rects: Vec<_> = match_template(&image, &template, 1.0, params)
            .unwrap()
            .map(|c| (c.rect.y, c.rect.x))
            .collect();
        let mut sorted = rects.clone();
        sorted.sort();
        assert_eq!(rects, sorted);
        assert!(!rects.is_empty());
    }

    #[test]
    fn oversized_template_yields_nothing() {
        let image = noise(20, 20, 5);
        let template = template_from(&noise(12, 12, 9), "big");
        let mut found = match_template(&image, &template, 2.0, MatchParams::default()).unwrap();
        assert!(found.template_size().is_none());
        assert!(found.next().is_none());
    }

    #[test]
    fn rejects_invalid_scale() {
        let image = noise(20, 20, 5);
        let template = template_from(&noise(4, 4, 9), "t");
        assert!(match_template(&image, &template, 0.0, MatchParams::default()).is_err());
        assert!(match_template(&image, &template, f32::NAN, MatchParams::default()).is_err());
    }
}
