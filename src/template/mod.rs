//! Reference templates and the template library.

use crate::imaging::{self, io};
use crate::trace::{trace_event, trace_warn};
use crate::util::{BoxScanError, BoxScanResult};
use image::{GrayImage, RgbImage};
use std::path::Path;

mod plan;

pub use plan::TemplatePlan;

/// A named reference image of a package label.
///
/// Immutable once loaded; scaled variants are derived on demand.
#[derive(Clone, Debug)]
pub struct Template {
    name: String,
    color: RgbImage,
    luma: GrayImage,
}

impl Template {
    /// Creates a template from an RGB image.
    pub fn from_rgb(name: impl Into<String>, color: RgbImage) -> BoxScanResult<Self> {
        let (width, height) = color.dimensions();
        if width == 0 || height == 0 {
            return Err(BoxScanError::InvalidDimensions { width, height });
        }
        let luma = imaging::to_luma(&color);
        Ok(Self {
            name: name.into(),
            color,
            luma,
        })
    }

    /// Loads a template from disk; the name is the file stem.
    pub fn load<P: AsRef<Path>>(path: P) -> BoxScanResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_rgb(name, io::load_color(path)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &RgbImage {
        &self.color
    }

    pub fn luma(&self) -> &GrayImage {
        &self.luma
    }

    /// Intrinsic size `(width, height)` of the reference image.
    pub fn reference_size(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    /// Builds the correlation plan for this template resized by `scale`.
    ///
    /// Returns `Ok(None)` when the scaled template collapses to zero size.
    pub fn plan_at_scale(&self, scale: f32) -> BoxScanResult<Option<TemplatePlan>> {
        match imaging::resize_bilinear(&self.luma, scale) {
            Some(scaled) => TemplatePlan::from_luma(&scaled).map(Some),
            None => Ok(None),
        }
    }
}

/// Ordered set of templates used for one detection run.
#[derive(Clone, Debug, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Loads every image file in `dir`, ordered by file name.
    ///
    /// Templates that fail to load are skipped; a missing or unreadable
    /// directory is an error.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> BoxScanResult<Self> {
        let mut templates = Vec::new();
        for path in io::list_images(dir)? {
            match Template::load(&path) {
                Ok(template) => templates.push(template),
                Err(err) => {
                    let reason = err.to_string();
                    trace_warn!("skipping unreadable template", reason = reason.as_str());
                }
            }
        }
        trace_event!("templates_loaded", count = templates.len());
        Ok(Self { templates })
    }

    pub fn push(&mut self, template: Template) {
        self.templates.push(template);
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
