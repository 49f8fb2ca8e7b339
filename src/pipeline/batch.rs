//! Directory batch processing.
//!
//! Each image gets its own detection pass (fresh region mask); a failing
//! image is recorded in the report and the batch moves on.

use crate::imaging::io;
use crate::pipeline::{Detector, RecognitionResult};
use crate::recognize::OcrEngine;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{BoxScanError, BoxScanResult};
use std::path::{Path, PathBuf};

/// Outcome for one source image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageReport {
    pub source: PathBuf,
    /// Where the annotated image was written, on success.
    pub output: Option<PathBuf>,
    pub outcome: Result<Vec<RecognitionResult>, BoxScanError>,
}

/// Per-image outcomes in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub images: Vec<ImageReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.images.iter().filter(|img| img.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.images.len() - self.succeeded()
    }
}

/// Runs the detector over every image in `images_dir`, writing
/// `<stem>_output.<ext>` files into `output_dir`.
///
/// `make_engine` supplies the OCR engine: once for a sequential run, once per
/// worker when running in parallel.
pub fn run_batch<E, F>(
    detector: &Detector,
    images_dir: &Path,
    output_dir: &Path,
    make_engine: F,
) -> BoxScanResult<BatchReport>
where
    E: OcrEngine,
    F: Fn() -> E + Sync + Send,
{
    let paths = io::list_images(images_dir)?;
    run_paths(detector, &paths, output_dir, make_engine)
}

/// Like [`run_batch`] for an explicit list of image paths.
pub fn run_paths<E, F>(
    detector: &Detector,
    paths: &[PathBuf],
    output_dir: &Path,
    make_engine: F,
) -> BoxScanResult<BatchReport>
where
    E: OcrEngine,
    F: Fn() -> E + Sync + Send,
{
    std::fs::create_dir_all(output_dir).map_err(|err| BoxScanError::OutputDir {
        path: output_dir.to_path_buf(),
        reason: err.to_string(),
    })?;
    let _span = trace_span!("batch", images = paths.len()).entered();

    let images = process_all(detector, paths, output_dir, make_engine);
    let report = BatchReport { images };
    trace_event!(
        "batch_done",
        succeeded = report.succeeded(),
        failed = report.failed()
    );
    Ok(report)
}

#[cfg(feature = "rayon")]
fn process_all<E, F>(detector: &Detector, paths: &[PathBuf], output_dir: &Path, make_engine: F) -> Vec<ImageReport>
where
    E: OcrEngine,
    F: Fn() -> E + Sync + Send,
{
    use rayon::prelude::*;

    if detector.config().parallel {
        return paths
            .par_iter()
            .map_init(&make_engine, |engine, path| {
                process_one(detector, path, output_dir, engine)
            })
            .collect();
    }
    let mut engine = make_engine();
    paths
        .iter()
        .map(|path| process_one(detector, path, output_dir, &mut engine))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn process_all<E, F>(detector: &Detector, paths: &[PathBuf], output_dir: &Path, make_engine: F) -> Vec<ImageReport>
where
    E: OcrEngine,
    F: Fn() -> E + Sync + Send,
{
    let mut engine = make_engine();
    paths
        .iter()
        .map(|path| process_one(detector, path, output_dir, &mut engine))
        .collect()
}

fn process_one<E: OcrEngine + ?Sized>(
    detector: &Detector,
    source: &Path,
    output_dir: &Path,
    engine: &mut E,
) -> ImageReport {
    let output_path = io::output_path_for(source, output_dir);
    let outcome = detector.detect_file(source, engine).and_then(|detection| {
        io::save_color(&output_path, &detection.annotated)?;
        Ok(detection.results)
    });
    if let Err(err) = &outcome {
        let reason = err.to_string();
        trace_warn!("image skipped", reason = reason.as_str());
    }
    ImageReport {
        source: source.to_path_buf(),
        output: outcome.as_ref().ok().map(|_| output_path),
        outcome,
    }
}
