//! Detection orchestrator.
//!
//! For one source image the detector walks templates x scales x raster-order
//! candidates, filters each candidate through a fresh [`RegionMask`], runs
//! text recovery on accepted regions and renders the annotated output. A
//! claim is global across the whole nested loop, so a region matched at one
//! scale or by one template is never revisited by another.

pub mod batch;
pub mod render;

use crate::imaging::{self, io};
use crate::matcher::{match_template, MatchCandidate, MatchParams};
use crate::recognize::{Attempt, OcrEngine, Recognition, TextRecovery};
use crate::region::{Rect, RegionMask};
use crate::template::TemplateLibrary;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{BoxScanError, BoxScanResult};
use image::RgbImage;
use render::Annotator;
use std::path::Path;

/// Detection thresholds and geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Candidates must score strictly above this ZNCC value.
    pub score_threshold: f32,
    /// Template scales, tried in order for every template.
    pub scales: Vec<f32>,
    /// Pixel slack allowed between accepted regions.
    pub overlap_tolerance: i32,
    /// How far a region may hang past the image border; 0 is strict.
    pub bounds_slack: i32,
    /// Padding added around every template footprint.
    pub margin: i32,
    /// Windows flatter than this variance are never candidates.
    pub min_var_i: f32,
    /// Use rayon for score surfaces and batch images (needs the `rayon` feature).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.55,
            scales: vec![1.75, 2.0],
            overlap_tolerance: 30,
            bounds_slack: 30,
            margin: 5,
            min_var_i: 1e-3,
            parallel: false,
        }
    }
}

impl DetectConfig {
    pub fn validate(&self) -> BoxScanResult<()> {
        if !self.score_threshold.is_finite() {
            return Err(BoxScanError::InvalidConfig {
                field: "score_threshold",
                reason: "must be finite",
            });
        }
        if self.scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(BoxScanError::InvalidConfig {
                field: "scales",
                reason: "every scale must be finite and > 0",
            });
        }
        if self.overlap_tolerance < 0 {
            return Err(BoxScanError::InvalidConfig {
                field: "overlap_tolerance",
                reason: "must be >= 0",
            });
        }
        if self.bounds_slack < 0 {
            return Err(BoxScanError::InvalidConfig {
                field: "bounds_slack",
                reason: "must be >= 0",
            });
        }
        if self.margin < 0 {
            return Err(BoxScanError::InvalidConfig {
                field: "margin",
                reason: "must be >= 0",
            });
        }
        Ok(())
    }

    pub fn match_params(&self) -> MatchParams {
        MatchParams {
            score_threshold: self.score_threshold,
            margin: self.margin,
            min_var_i: self.min_var_i,
            parallel: self.parallel,
        }
    }
}

/// One accepted region and what OCR made of it.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionResult {
    pub rect: Rect,
    /// Trimmed OCR text; empty when no vocabulary entry was recognized.
    pub label: String,
    /// Vocabulary entry found in `label`.
    pub entry: Option<String>,
    pub attempt: Option<Attempt>,
    pub template: String,
    pub scale: f32,
    pub score: f32,
}

impl RecognitionResult {
    fn new(candidate: &MatchCandidate<'_>, recognition: Option<Recognition>) -> Self {
        let (label, entry, attempt) = match recognition {
            Some(found) => (found.text, Some(found.entry), Some(found.attempt)),
            None => (String::new(), None, None),
        };
        Self {
            rect: candidate.rect,
            label,
            entry,
            attempt,
            template: candidate.template.to_owned(),
            scale: candidate.scale,
            score: candidate.score,
        }
    }

    pub fn is_labeled(&self) -> bool {
        !self.label.is_empty()
    }
}

/// Output of one detection pass.
#[derive(Clone, Debug)]
pub struct Detection {
    /// Copy of the source with rectangles and labels drawn on it.
    pub annotated: RgbImage,
    /// Accepted regions in claim order.
    pub results: Vec<RecognitionResult>,
}

/// Template detector with OCR label recovery.
pub struct Detector {
    templates: TemplateLibrary,
    config: DetectConfig,
    recovery: TextRecovery,
    annotator: Annotator,
}

impl Detector {
    pub fn new(templates: TemplateLibrary, config: DetectConfig, recovery: TextRecovery) -> BoxScanResult<Self> {
        config.validate()?;
        recovery.schedule().validate()?;
        Ok(Self {
            templates,
            config,
            recovery,
            annotator: Annotator::default(),
        })
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    pub fn recovery(&self) -> &TextRecovery {
        &self.recovery
    }

    /// Loads `path` and runs [`Detector::detect`] on it.
    ///
    /// Load failures are returned to the caller.
    pub fn detect_file<P, E>(&self, path: P, engine: &mut E) -> BoxScanResult<Detection>
    where
        P: AsRef<Path>,
        E: OcrEngine + ?Sized,
    {
        let source = io::load_color(path)?;
        Ok(self.detect(&source, engine))
    }

    /// Runs one detection pass over `source`.
    pub fn detect<E: OcrEngine + ?Sized>(&self, source: &RgbImage, engine: &mut E) -> Detection {
        let (width, height) = source.dimensions();
        let _span = trace_span!("detect", width = width, height = height).entered();

        let luma = imaging::to_luma(source);
        let mut mask = RegionMask::new(
            width,
            height,
            self.config.overlap_tolerance,
            self.config.bounds_slack,
        );
        let params = self.config.match_params();
        let mut results = Vec::new();

        for template in self.templates.iter() {
            for &scale in &self.config.scales {
                let candidates = match match_template(&luma, template, scale, params) {
                    Ok(candidates) => candidates,
                    Err(err) => {
                        let reason = err.to_string();
                        trace_warn!("template skipped", reason = reason.as_str(), scale = scale);
                        continue;
                    }
                };
                for candidate in candidates {
                    if !mask.try_claim(candidate.rect) {
                        continue;
                    }
                    let recognition = imaging::crop_clipped(source, &candidate.rect)
                        .and_then(|region| self.recovery.recover(engine, &region));
                    let result = RecognitionResult::new(&candidate, recognition);
                    trace_event!(
                        "region_accepted",
                        template = candidate.template,
                        score = candidate.score,
                        label = result.label.as_str()
                    );
                    results.push(result);
                }
            }
        }

        trace_event!("detect_done", accepted = results.len());
        let annotated = self.annotator.render(source, &results);
        Detection { annotated, results }
    }
}
