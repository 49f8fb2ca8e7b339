//! Zero-mean normalized cross-correlation kernels.
//!
//! The scalar kernel scores one placement at a time so the matcher can stay
//! lazy. With the `rayon` feature a whole score surface can be computed
//! row-parallel up front; consumers still read it in raster order.

use crate::template::TemplatePlan;
use image::GrayImage;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Number of valid top-left placements `(cols, rows)` of `plan` in `image`.
///
/// `None` when the template does not fit.
pub fn placement_grid(image: &GrayImage, plan: &TemplatePlan) -> Option<(u32, u32)> {
    let (img_width, img_height) = image.dimensions();
    if plan.width() > img_width || plan.height() > img_height {
        return None;
    }
    Some((img_width - plan.width() + 1, img_height - plan.height() + 1))
}

/// Scores the template placed with its top-left corner at `(x, y)`.
///
/// Returns `f32::NEG_INFINITY` for placements outside the grid and for
/// windows whose variance is at or below `min_var_i`.
pub fn zncc_score_at(image: &GrayImage, plan: &TemplatePlan, x: u32, y: u32, min_var_i: f32) -> f32 {
    let Some((cols, rows)) = placement_grid(image, plan) else {
        return f32::NEG_INFINITY;
    };
    if x >= cols || y >= rows {
        return f32::NEG_INFINITY;
    }

    let img_width = image.width() as usize;
    let tpl_width = plan.width() as usize;
    let tpl_height = plan.height() as usize;
    let t_prime = plan.t_prime();
    let data = image.as_raw();
    let n = (tpl_width * tpl_height) as u128;

    // Window sums are exact integers; only the dot product carries rounding.
    let mut dot = 0.0f64;
    let mut sum_i = 0u64;
    let mut sum_i2 = 0u64;
    for ty in 0..tpl_height {
        let start = (y as usize + ty) * img_width + x as usize;
        let img_row = &data[start..start + tpl_width];
        let tpl_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];
        for (&value, &t) in img_row.iter().zip(tpl_row) {
            let value = u64::from(value);
            dot += f64::from(t) * value as f64;
            sum_i += value;
            sum_i2 += value * value;
        }
    }

    // n * var_i = n * sum(I^2) - sum(I)^2, evaluated without cancellation.
    let scaled_var = n * u128::from(sum_i2) - u128::from(sum_i) * u128::from(sum_i);
    let var_i = scaled_var as f64 / n as f64;
    if var_i <= f64::from(min_var_i) {
        return f32::NEG_INFINITY;
    }
    let score = (dot / (plan.var_t() * var_i).sqrt()) as f32;
    if score.is_finite() {
        score
    } else {
        f32::NEG_INFINITY
    }
}

/// Dense score surface in raster order (`cols x rows`).
#[derive(Clone, Debug)]
pub struct ScoreSurface {
    cols: u32,
    rows: u32,
    scores: Vec<f32>,
}

impl ScoreSurface {
    /// Computes every placement score sequentially.
    pub fn compute(image: &GrayImage, plan: &TemplatePlan, min_var_i: f32) -> Option<Self> {
        let (cols, rows) = placement_grid(image, plan)?;
        let mut scores = Vec::with_capacity(cols as usize * rows as usize);
        for y in 0..rows {
            for x in 0..cols {
                scores.push(zncc_score_at(image, plan, x, y, min_var_i));
            }
        }
        Some(Self { cols, rows, scores })
    }

    #[cfg(feature = "rayon")]
    pub(crate) fn from_parts(cols: u32, rows: u32, scores: Vec<f32>) -> Self {
        debug_assert_eq!(scores.len(), cols as usize * rows as usize);
        Self { cols, rows, scores }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Score at placement `(x, y)`, if inside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        self.scores
            .get(y as usize * self.cols as usize + x as usize)
            .copied()
    }
}
