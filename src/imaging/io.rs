//! Loading and saving images via the `image` crate.

use crate::util::{BoxScanError, BoxScanResult};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// File extensions treated as images when enumerating directories.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Loads an image from disk as 8-bit RGB.
pub fn load_color<P: AsRef<Path>>(path: P) -> BoxScanResult<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|err| BoxScanError::ImageIo {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let rgb = img.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(BoxScanError::InvalidDimensions {
            width: rgb.width(),
            height: rgb.height(),
        });
    }
    Ok(rgb)
}

/// Writes an RGB image; the format follows the file extension.
pub fn save_color<P: AsRef<Path>>(path: P, img: &RgbImage) -> BoxScanResult<()> {
    let path = path.as_ref();
    img.save(path).map_err(|err| BoxScanError::ImageIo {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Returns true when `path` has one of [`IMAGE_EXTENSIONS`] (case-insensitive).
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Lists image files in `dir`, sorted by file name.
pub fn list_images<P: AsRef<Path>>(dir: P) -> BoxScanResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read_dir_err = |err: std::io::Error| BoxScanError::ReadDir {
        path: dir.to_path_buf(),
        reason: err.to_string(),
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Output path for an annotated image: `<dir>/<stem>_output.<ext>`.
pub fn output_path_for(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    let ext = source
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_owned());
    output_dir.join(format!("{stem}_output.{ext}"))
}
