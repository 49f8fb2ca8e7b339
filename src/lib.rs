//! boxscan locates labeled packages in photographs by multi-scale template
//! matching and reads their labels with OCR.
//!
//! The pipeline scores every template at every configured scale with ZNCC,
//! keeps candidates greedily in raster order through a [`RegionMask`], and
//! recovers a label for each accepted region by retrying OCR over rotated
//! variants until the text contains a [`Vocabulary`] entry. Parallel score
//! surfaces and batches are available via the `rayon` feature, Tesseract via
//! the `tesseract` feature and structured logs via the `tracing` feature.

pub mod imaging;
pub mod kernel;
pub mod lowlevel;
pub mod matcher;
pub mod pipeline;
pub mod recognize;
pub mod region;
pub mod template;
mod trace;
pub mod util;

pub use imaging::io;
pub use matcher::{match_template, Candidates, MatchCandidate, MatchParams};
pub use pipeline::batch::{run_batch, run_paths, BatchReport, ImageReport};
pub use pipeline::render::Annotator;
pub use pipeline::{DetectConfig, Detection, Detector, RecognitionResult};
#[cfg(feature = "tesseract")]
pub use recognize::TesseractEngine;
pub use recognize::{
    Attempt, OcrEngine, OcrError, OcrSettings, PageSegMode, PreprocessConfig, Recognition,
    RotationSchedule, TextRecovery, UnavailableEngine, Vocabulary,
};
pub use region::{Rect, RegionMask};
pub use template::{Template, TemplateLibrary};
pub use util::{BoxScanError, BoxScanResult};
