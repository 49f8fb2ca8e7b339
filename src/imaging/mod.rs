//! Image transform primitives used by matching and text recovery.
//!
//! Every function returns a new buffer; inputs are never mutated. Grayscale
//! work happens on `image::GrayImage`, color on `image::RgbImage`.

pub mod io;

use crate::region::Rect;
use crate::util::math::sin_cos_deg;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;

/// Converts an RGB image to 8-bit luma.
pub fn to_luma(img: &RgbImage) -> GrayImage {
    imageops::grayscale(img)
}

/// Scaled dimensions, rounded to the nearest pixel.
///
/// Returns `None` when either side would collapse to zero.
pub fn scaled_size(width: u32, height: u32, scale: f32) -> Option<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let w = (width as f64 * scale as f64).round();
    let h = (height as f64 * scale as f64).round();
    if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
        return None;
    }
    Some((w as u32, h as u32))
}

/// Resizes a grayscale image by `scale` with bilinear (triangle) filtering.
pub fn resize_bilinear(img: &GrayImage, scale: f32) -> Option<GrayImage> {
    let (width, height) = scaled_size(img.width(), img.height(), scale)?;
    if (width, height) == img.dimensions() {
        return Some(img.clone());
    }
    Some(imageops::resize(img, width, height, FilterType::Triangle))
}

/// Copies the part of `rect` that lies inside the image.
///
/// Returns `None` when the rectangle does not intersect the image.
pub fn crop_clipped(img: &RgbImage, rect: &Rect) -> Option<RgbImage> {
    let bounds = Rect::new(
        0,
        0,
        i32::try_from(img.width()).ok()?,
        i32::try_from(img.height()).ok()?,
    );
    let clip = rect.intersection(&bounds)?;
    let view = imageops::crop_imm(
        img,
        clip.x as u32,
        clip.y as u32,
        clip.width as u32,
        clip.height as u32,
    );
    Some(view.to_image())
}

/// Rotates a grayscale image counter-clockwise about its centre.
///
/// The output keeps the input dimensions. Each destination pixel is mapped
/// back into the source with the inverse rotation about
/// `((w - 1) / 2, (h - 1) / 2)` and sampled bilinearly; samples falling
/// outside the source take `fill`.
pub fn rotate_bilinear(src: &GrayImage, angle_deg: f32, fill: u8) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut out = GrayImage::from_pixel(width, height, Luma([fill]));
    if width == 0 || height == 0 {
        return out;
    }

    let (sin_a, cos_a) = sin_cos_deg(angle_deg);
    let cx = (width as f32 - 1.0) * 0.5;
    let cy = (height as f32 - 1.0) * 0.5;
    let max_x = width as f32 - 1.0;
    let max_y = height as f32 - 1.0;
    let epsilon = 1e-4;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        // y grows downwards, so a visually counter-clockwise turn samples
        // the source at (c*dx - s*dy, s*dx + c*dy).
        let src_x = cos_a * dx - sin_a * dy + cx;
        let src_y = sin_a * dx + cos_a * dy + cy;

        if !src_x.is_finite()
            || !src_y.is_finite()
            || src_x < -epsilon
            || src_y < -epsilon
            || src_x > max_x + epsilon
            || src_y > max_y + epsilon
        {
            continue;
        }

        let src_x = src_x.clamp(0.0, max_x);
        let src_y = src_y.clamp(0.0, max_y);
        let x0 = src_x.floor() as u32;
        let y0 = src_y.floor() as u32;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);
        let fx = src_x - x0 as f32;
        let fy = src_y - y0 as f32;

        let a = src.get_pixel(x0, y0)[0] as f32;
        let b = src.get_pixel(x1, y0)[0] as f32;
        let c = src.get_pixel(x0, y1)[0] as f32;
        let d = src.get_pixel(x1, y1)[0] as f32;
        let value = a * (1.0 - fx) * (1.0 - fy) + b * fx * (1.0 - fy) + c * (1.0 - fx) * fy + d * fx * fy;

        pixel[0] = value.round().clamp(0.0, 255.0) as u8;
    }

    out
}

/// Gaussian smoothing; a non-positive sigma returns a copy.
pub fn gaussian_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 || !sigma.is_finite() {
        return img.clone();
    }
    imageproc::filter::gaussian_blur_f32(img, sigma)
}

/// Global binarization at the Otsu level: pixels above it become 255.
pub fn binarize_otsu(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    threshold(img, level, ThresholdType::Binary)
}

/// Morphological dilation with a square structuring element of `radius`.
pub fn dilate(img: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return img.clone();
    }
    imageproc::morphology::dilate(img, Norm::LInf, radius)
}

#[cfg(test)]
mod tests {
    use super::{binarize_otsu, crop_clipped, resize_bilinear, rotate_bilinear, scaled_size};
    use crate::region::Rect;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn scaled_size_rounds_and_rejects_zero() {
        assert_eq!(scaled_size(10, 7, 1.75), Some((18, 12)));
        assert_eq!(scaled_size(10, 7, 0.0), None);
        assert_eq!(scaled_size(1, 1, 0.2), None);
    }

    #[test]
    fn resize_identity_keeps_pixels() {
        let img = GrayImage::from_fn(5, 4, |x, y| Luma([(x * 10 + y) as u8]));
        assert_eq!(resize_bilinear(&img, 1.0).unwrap(), img);
        let big = resize_bilinear(&img, 2.0).unwrap();
        assert_eq!(big.dimensions(), (10, 8));
    }

    #[test]
    fn crop_clips_to_image() {
        let img = RgbImage::from_pixel(20, 10, Rgb([1, 2, 3]));
        let crop = crop_clipped(&img, &Rect::new(-5, 5, 10, 10)).unwrap();
        assert_eq!(crop.dimensions(), (5, 5));
        assert!(crop_clipped(&img, &Rect::new(30, 0, 5, 5)).is_none());
    }

    #[test]
    fn rotate_quarter_turn_moves_right_to_top() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(4, 2, Luma([200]));
        let rotated = rotate_bilinear(&img, 90.0, 0);
        assert_eq!(rotated.get_pixel(2, 0)[0], 200);
        assert_eq!(rotated.get_pixel(4, 2)[0], 0);
    }

    #[test]
    fn rotate_zero_is_identity() {
        let img = GrayImage::from_fn(6, 3, |x, y| Luma([(x * 31 + y * 7) as u8]));
        assert_eq!(rotate_bilinear(&img, 0.0, 0), img);
    }

    #[test]
    fn otsu_separates_two_levels() {
        let img = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 40 } else { 210 }]));
        let bin = binarize_otsu(&img);
        assert_eq!(bin.get_pixel(0, 0)[0], 0);
        assert_eq!(bin.get_pixel(7, 0)[0], 255);
    }

    #[test]
    fn otsu_output_is_strictly_binary() {
        let img = GrayImage::from_fn(16, 16, |x, y| Luma([(x * 13 + y * 7) as u8]));
        let bin = binarize_otsu(&img);
        assert!(bin.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert!(bin.pixels().any(|p| p[0] == 0));
        assert!(bin.pixels().any(|p| p[0] == 255));
    }
}
