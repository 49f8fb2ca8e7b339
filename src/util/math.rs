//! Angle helpers shared by rotation and schedule code.

/// Wraps an angle in degrees to the range [0, 360).
pub(crate) fn wrap_deg_360(angle_deg: f32) -> f32 {
    let wrapped = angle_deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles, in degrees.
pub(crate) fn angle_distance_deg(a: f32, b: f32) -> f32 {
    let diff = wrap_deg_360(a - b);
    diff.min(360.0 - diff)
}

/// Computes sine and cosine for an angle in degrees.
pub(crate) fn sin_cos_deg(angle_deg: f32) -> (f32, f32) {
    angle_deg.to_radians().sin_cos()
}

#[cfg(test)]
mod tests {
    use super::{angle_distance_deg, sin_cos_deg, wrap_deg_360};

    #[test]
    fn wrap_deg_360_maps_to_expected_range() {
        assert!((wrap_deg_360(370.0) - 10.0).abs() < 1e-4);
        assert!((wrap_deg_360(-30.0) - 330.0).abs() < 1e-4);
        assert_eq!(wrap_deg_360(720.0), 0.0);
    }

    #[test]
    fn angle_distance_is_symmetric_and_short() {
        assert!((angle_distance_deg(350.0, 10.0) - 20.0).abs() < 1e-4);
        assert!((angle_distance_deg(10.0, 350.0) - 20.0).abs() < 1e-4);
        assert!((angle_distance_deg(90.0, 270.0) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn sin_cos_deg_matches_quadrants() {
        let (sin, cos) = sin_cos_deg(90.0);
        assert!(sin > 0.999);
        assert!(cos.abs() < 1e-6);
    }
}
