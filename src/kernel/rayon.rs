//! Rayon-parallel score surface (feature-gated).
//!
//! Rows of placements are scored on the rayon pool and stitched back in
//! raster order, so the result is identical to [`ScoreSurface::compute`].

use crate::kernel::{placement_grid, zncc_score_at, ScoreSurface};
use crate::template::TemplatePlan;
use image::GrayImage;
use rayon::prelude::*;

/// Row-parallel equivalent of [`ScoreSurface::compute`].
pub fn score_surface_par(
    image: &GrayImage,
    plan: &TemplatePlan,
    min_var_i: f32,
) -> Option<ScoreSurface> {
    let (cols, rows) = placement_grid(image, plan)?;
    let row_scores: Vec<Vec<f32>> = (0..rows)
        .into_par_iter()
        .map(|y| {
            (0..cols)
                .map(|x| zncc_score_at(image, plan, x, y, min_var_i))
                .collect()
        })
        .collect();
    let scores = row_scores.into_iter().flatten().collect();
    Some(ScoreSurface::from_parts(cols, rows, scores))
}
