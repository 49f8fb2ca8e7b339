//! Template plan precomputation for ZNCC scoring.

use crate::util::{BoxScanError, BoxScanResult};
use image::GrayImage;

/// Precomputed zero-mean template and variance for one scaled template.
///
/// `t_prime[i] = t[i] - mean` and `var_t = sum(t_prime^2)`, so the score at a
/// placement reduces to `dot(t_prime, window) / sqrt(var_t * var_window)`.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: u32,
    height: u32,
    var_t: f64,
    t_prime: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from a grayscale template.
    pub fn from_luma(tpl: &GrayImage) -> BoxScanResult<Self> {
        let (width, height) = tpl.dimensions();
        if width == 0 || height == 0 {
            return Err(BoxScanError::InvalidDimensions { width, height });
        }

        let count = tpl.as_raw().len() as f64;
        let sum: f64 = tpl.as_raw().iter().map(|&v| v as f64).sum();
        let mean = sum / count;

        let mut var_t = 0.0f64;
        let mut t_prime = Vec::with_capacity(tpl.as_raw().len());
        for &value in tpl.as_raw() {
            let centered = value as f64 - mean;
            var_t += centered * centered;
            t_prime.push(centered as f32);
        }
        if var_t / count <= 1e-8 {
            return Err(BoxScanError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            var_t,
            t_prime,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sum of squared deviations from the template mean.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Zero-mean template values in row-major order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::util::BoxScanError;
    use image::GrayImage;

    #[test]
    fn plan_matches_known_stats() {
        let tpl = GrayImage::from_raw(2, 2, vec![0, 1, 2, 3]).unwrap();
        let plan = TemplatePlan::from_luma(&tpl).unwrap();
        assert_eq!((plan.width(), plan.height()), (2, 2));
        assert!((plan.var_t() - 5.0).abs() < 1e-6);
        let expected = [-1.5f32, -0.5, 0.5, 1.5];
        for (value, expected) in plan.t_prime().iter().zip(expected.iter()) {
            assert!((value - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn plan_rejects_flat_templates() {
        let tpl = GrayImage::from_raw(2, 2, vec![7; 4]).unwrap();
        let err = TemplatePlan::from_luma(&tpl).unwrap_err();
        assert_eq!(
            err,
            BoxScanError::DegenerateTemplate {
                reason: "zero variance"
            }
        );
    }
}
