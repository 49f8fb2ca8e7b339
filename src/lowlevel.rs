//! Low-level building blocks for custom pipelines.
//!
//! These expose the correlation plan, kernels and image primitives used by
//! the high-level `Detector`. Most users should prefer `Detector` and
//! `TextRecovery`.

pub use crate::imaging::{
    binarize_otsu, crop_clipped, dilate, gaussian_blur, resize_bilinear, rotate_bilinear,
    scaled_size, to_luma,
};
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::score_surface_par;
pub use crate::kernel::{placement_grid, zncc_score_at, ScoreSurface};
pub use crate::matcher::score_surface;
pub use crate::template::TemplatePlan;
