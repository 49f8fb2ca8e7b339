//! Text recovery: OCR with rotation retries validated against a vocabulary.
//!
//! A region is preprocessed once (luma, Gaussian blur, Otsu binarization,
//! dilation). The engine then reads the upright variant and, failing a
//! vocabulary hit, one rotated variant per schedule step. Variants are
//! produced lazily and the first output containing a vocabulary entry wins.
//! An engine error ends recovery for that region only.

mod settings;
#[cfg(feature = "tesseract")]
mod tesseract;
mod vocabulary;

pub use settings::{OcrSettings, PageSegMode, LATIN_WHITELIST};
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;
pub use vocabulary::{Vocabulary, DEFAULT_LABELS};

use crate::imaging;
use crate::trace::trace_warn;
use crate::util::math::angle_distance_deg;
use crate::util::{BoxScanError, BoxScanResult};
use image::{GrayImage, RgbImage};
use std::borrow::Cow;
use thiserror::Error;

/// Fill value for pixels uncovered by a rotation.
pub const ROTATION_FILL: u8 = 0;

/// Failures reported by an OCR backend.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OcrError {
    #[error("no OCR backend available: {0}")]
    Unavailable(&'static str),
    #[error("OCR engine initialization failed: {0}")]
    EngineInit(String),
    #[error("OCR engine rejected configuration: {0}")]
    Config(String),
    #[error("OCR recognition failed: {0}")]
    Recognition(String),
    #[error("cannot encode region for OCR: {0}")]
    Encode(String),
}

/// Text recognizer seam; implemented by Tesseract and by test doubles.
pub trait OcrEngine {
    /// Reads text from a preprocessed single-channel image.
    fn read_text(&mut self, image: &GrayImage) -> Result<String, OcrError>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &mut E {
    fn read_text(&mut self, image: &GrayImage) -> Result<String, OcrError> {
        (**self).read_text(image)
    }
}

/// Engine used when the crate is built without an OCR backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableEngine;

impl OcrEngine for UnavailableEngine {
    fn read_text(&mut self, _image: &GrayImage) -> Result<String, OcrError> {
        Err(OcrError::Unavailable("built without the `tesseract` feature"))
    }
}

/// Rotation retries: `rotations` variants at `step_deg x (k + 1)`, counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationSchedule {
    pub rotations: usize,
    pub step_deg: f32,
}

impl Default for RotationSchedule {
    fn default() -> Self {
        Self {
            rotations: 11,
            step_deg: 30.0,
        }
    }
}

impl RotationSchedule {
    /// Lazily yields the retry angles in order.
    pub fn angles(&self) -> impl Iterator<Item = f32> {
        let step = self.step_deg;
        (1..=self.rotations).map(move |k| step * k as f32)
    }

    /// True when some retry angle lies within `tolerance_deg` of `correction_deg`.
    ///
    /// `correction_deg` is the counter-clockwise turn that makes the text upright.
    pub fn covers(&self, correction_deg: f32, tolerance_deg: f32) -> bool {
        angle_distance_deg(correction_deg, 0.0) <= tolerance_deg
            || self
                .angles()
                .any(|angle| angle_distance_deg(angle, correction_deg) <= tolerance_deg)
    }

    pub fn validate(&self) -> BoxScanResult<()> {
        if !self.step_deg.is_finite() || (self.rotations > 0 && self.step_deg <= 0.0) {
            return Err(BoxScanError::InvalidConfig {
                field: "rotation.step_deg",
                reason: "must be finite and > 0",
            });
        }
        Ok(())
    }
}

/// Preprocessing applied before every OCR attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreprocessConfig {
    /// Gaussian sigma; 1.1 matches a 5x5 kernel.
    pub blur_sigma: f32,
    /// Dilation radius of the square structuring element; 0 disables it.
    pub dilate_radius: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            dilate_radius: 1,
        }
    }
}

impl PreprocessConfig {
    /// Luma, blur, Otsu binarization and dilation.
    pub fn apply(&self, region: &RgbImage) -> GrayImage {
        let luma = imaging::to_luma(region);
        let blurred = imaging::gaussian_blur(&luma, self.blur_sigma);
        let binary = imaging::binarize_otsu(&blurred);
        imaging::dilate(&binary, self.dilate_radius)
    }
}

/// Which variant produced the accepted text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attempt {
    Direct,
    /// `index` counts from 1 in schedule order.
    Rotated { index: usize, angle_deg: f32 },
}

impl Attempt {
    pub fn angle_deg(&self) -> f32 {
        match self {
            Attempt::Direct => 0.0,
            Attempt::Rotated { angle_deg, .. } => *angle_deg,
        }
    }
}

/// Accepted OCR output for one region.
#[derive(Clone, Debug, PartialEq)]
pub struct Recognition {
    /// Trimmed raw engine output.
    pub text: String,
    /// Vocabulary entry found in `text`.
    pub entry: String,
    pub attempt: Attempt,
}

enum Outcome {
    Matched(Recognition),
    Miss,
    Failed,
}

/// Text recovery engine: vocabulary, rotation schedule and preprocessing.
#[derive(Clone, Debug, Default)]
pub struct TextRecovery {
    vocabulary: Vocabulary,
    schedule: RotationSchedule,
    preprocess: PreprocessConfig,
}

impl TextRecovery {
    pub fn new(vocabulary: Vocabulary, schedule: RotationSchedule, preprocess: PreprocessConfig) -> Self {
        Self {
            vocabulary,
            schedule,
            preprocess,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn schedule(&self) -> RotationSchedule {
        self.schedule
    }

    pub fn preprocess(&self) -> PreprocessConfig {
        self.preprocess
    }

    /// Recovers a vocabulary label from a region, trying rotations in order.
    ///
    /// Returns `None` when no variant matches or the engine fails; failures
    /// are logged and never propagated.
    pub fn recover<E: OcrEngine + ?Sized>(&self, engine: &mut E, region: &RgbImage) -> Option<Recognition> {
        if region.width() == 0 || region.height() == 0 {
            return None;
        }
        let prepared = self.preprocess.apply(region);

        let attempts = std::iter::once(Attempt::Direct).chain(
            self.schedule
                .angles()
                .enumerate()
                .map(|(k, angle_deg)| Attempt::Rotated {
                    index: k + 1,
                    angle_deg,
                }),
        );

        attempts
            .map(|attempt| self.try_variant(engine, &prepared, attempt))
            .find_map(|outcome| match outcome {
                Outcome::Matched(recognition) => Some(Some(recognition)),
                Outcome::Failed => Some(None),
                Outcome::Miss => None,
            })
            .flatten()
    }

    fn try_variant<E: OcrEngine + ?Sized>(&self, engine: &mut E, prepared: &GrayImage, attempt: Attempt) -> Outcome {
        let variant = match attempt {
            Attempt::Direct => Cow::Borrowed(prepared),
            Attempt::Rotated { angle_deg, .. } => {
                Cow::Owned(imaging::rotate_bilinear(prepared, angle_deg, ROTATION_FILL))
            }
        };
        let raw = match engine.read_text(&variant) {
            Ok(raw) => raw,
            Err(err) => {
                let reason = err.to_string();
                trace_warn!(
                    "OCR failed; region left unlabeled",
                    reason = reason.as_str(),
                    angle_deg = attempt.angle_deg()
                );
                return Outcome::Failed;
            }
        };
        let text = raw.trim();
        match self.vocabulary.find_in(text) {
            Some(entry) => Outcome::Matched(Recognition {
                text: text.to_owned(),
                entry: entry.to_owned(),
                attempt,
            }),
            None => Outcome::Miss,
        }
    }
}
