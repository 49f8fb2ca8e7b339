use boxscan::{
    run_batch, Annotator, Attempt, BatchReport, BoxScanResult, DetectConfig, Detector,
    ImageReport, OcrEngine, OcrError, OcrSettings, PageSegMode, PreprocessConfig,
    RecognitionResult, RotationSchedule, TemplateLibrary, TextRecovery, UnavailableEngine,
    Vocabulary,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "boxscan: package detection and label OCR (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PageSegModeConfig {
    #[default]
    Auto,
    SingleColumn,
    SingleBlock,
    SingleLine,
    SingleWord,
    SparseText,
}

impl From<PageSegModeConfig> for PageSegMode {
    fn from(value: PageSegModeConfig) -> Self {
        match value {
            PageSegModeConfig::Auto => PageSegMode::Auto,
            PageSegModeConfig::SingleColumn => PageSegMode::SingleColumn,
            PageSegModeConfig::SingleBlock => PageSegMode::SingleBlock,
            PageSegModeConfig::SingleLine => PageSegMode::SingleLine,
            PageSegModeConfig::SingleWord => PageSegMode::SingleWord,
            PageSegModeConfig::SparseText => PageSegMode::SparseText,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    score_threshold: f32,
    scales: Vec<f32>,
    overlap_tolerance: i32,
    bounds_slack: i32,
    margin: i32,
    min_var_i: f32,
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            score_threshold: cfg.score_threshold,
            scales: cfg.scales,
            overlap_tolerance: cfg.overlap_tolerance,
            bounds_slack: cfg.bounds_slack,
            margin: cfg.margin,
            min_var_i: cfg.min_var_i,
            parallel: cfg.parallel,
        }
    }
}

impl From<DetectConfigJson> for DetectConfig {
    fn from(value: DetectConfigJson) -> Self {
        Self {
            score_threshold: value.score_threshold,
            scales: value.scales,
            overlap_tolerance: value.overlap_tolerance,
            bounds_slack: value.bounds_slack,
            margin: value.margin,
            min_var_i: value.min_var_i,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RecoveryConfigJson {
    rotations: usize,
    angle_step_deg: f32,
    blur_sigma: f32,
    dilate_radius: u8,
}

impl Default for RecoveryConfigJson {
    fn default() -> Self {
        let schedule = RotationSchedule::default();
        let preprocess = PreprocessConfig::default();
        Self {
            rotations: schedule.rotations,
            angle_step_deg: schedule.step_deg,
            blur_sigma: preprocess.blur_sigma,
            dilate_radius: preprocess.dilate_radius,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OcrConfigJson {
    data_path: Option<PathBuf>,
    language: String,
    whitelist: String,
    page_seg_mode: PageSegModeConfig,
    disable_learning: bool,
    source_resolution: u32,
}

impl Default for OcrConfigJson {
    fn default() -> Self {
        let cfg = OcrSettings::default();
        Self {
            data_path: cfg.data_path,
            language: cfg.language,
            whitelist: cfg.whitelist,
            page_seg_mode: PageSegModeConfig::Auto,
            disable_learning: cfg.disable_learning,
            source_resolution: cfg.source_resolution,
        }
    }
}

impl From<OcrConfigJson> for OcrSettings {
    fn from(value: OcrConfigJson) -> Self {
        Self {
            data_path: value.data_path,
            language: value.language,
            whitelist: value.whitelist,
            page_seg_mode: value.page_seg_mode.into(),
            disable_learning: value.disable_learning,
            source_resolution: value.source_resolution,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    templates_dir: PathBuf,
    images_dir: PathBuf,
    output_dir: PathBuf,
    report_path: Option<PathBuf>,
    font_path: Option<PathBuf>,
    vocabulary: Vec<String>,
    detect: DetectConfigJson,
    recovery: RecoveryConfigJson,
    ocr: OcrConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::new(),
            images_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            report_path: None,
            font_path: None,
            vocabulary: Vocabulary::default().entries().to_vec(),
            detect: DetectConfigJson::default(),
            recovery: RecoveryConfigJson::default(),
            ocr: OcrConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RegionRecord {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    label: String,
    entry: Option<String>,
    rotation_deg: Option<f32>,
    template: String,
    scale: f32,
    score: f32,
}

impl From<RecognitionResult> for RegionRecord {
    fn from(value: RecognitionResult) -> Self {
        Self {
            x: value.rect.x,
            y: value.rect.y,
            width: value.rect.width,
            height: value.rect.height,
            label: value.label,
            entry: value.entry,
            rotation_deg: value.attempt.as_ref().map(Attempt::angle_deg),
            template: value.template,
            scale: value.scale,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageRecord {
    source: PathBuf,
    output: Option<PathBuf>,
    error: Option<String>,
    regions: Vec<RegionRecord>,
}

impl From<ImageReport> for ImageRecord {
    fn from(value: ImageReport) -> Self {
        let (error, regions) = match value.outcome {
            Ok(results) => (None, results.into_iter().map(RegionRecord::from).collect()),
            Err(err) => (Some(err.to_string()), Vec::new()),
        };
        Self {
            source: value.source,
            output: value.output,
            error,
            regions,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    succeeded: usize,
    failed: usize,
    images: Vec<ImageRecord>,
}

impl From<BatchReport> for Output {
    fn from(value: BatchReport) -> Self {
        Self {
            succeeded: value.succeeded(),
            failed: value.failed(),
            images: value.images.into_iter().map(ImageRecord::from).collect(),
        }
    }
}

/// Runs the batch with `make_engine`, or without OCR when the engine failed to start.
///
/// A broken OCR setup leaves regions unlabeled; rectangles are still written.
fn run_with<E, F>(
    detector: &Detector,
    images_dir: &Path,
    output_dir: &Path,
    startup: Result<(), OcrError>,
    make_engine: F,
) -> BoxScanResult<BatchReport>
where
    E: OcrEngine,
    F: Fn() -> E + Sync + Send,
{
    match startup {
        Ok(()) => run_batch(detector, images_dir, output_dir, make_engine),
        Err(err) => {
            tracing::warn!(reason = %err, "OCR engine unavailable; regions will be left unlabeled");
            run_batch(detector, images_dir, output_dir, || UnavailableEngine)
        }
    }
}

#[cfg(feature = "tesseract")]
fn run(
    detector: &Detector,
    images_dir: &Path,
    output_dir: &Path,
    settings: OcrSettings,
) -> BoxScanResult<BatchReport> {
    let startup = boxscan::TesseractEngine::new(settings.clone()).warm_up();
    run_with(detector, images_dir, output_dir, startup, || {
        boxscan::TesseractEngine::new(settings.clone())
    })
}

#[cfg(not(feature = "tesseract"))]
fn run(
    detector: &Detector,
    images_dir: &Path,
    output_dir: &Path,
    _settings: OcrSettings,
) -> BoxScanResult<BatchReport> {
    let startup = Err(OcrError::Unavailable("built without the `tesseract` feature"));
    run_with(detector, images_dir, output_dir, startup, || UnavailableEngine)
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config_text = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.templates_dir.as_os_str().is_empty()
        || config.images_dir.as_os_str().is_empty()
        || config.output_dir.as_os_str().is_empty()
    {
        return Err("templates_dir, images_dir and output_dir must be set in the config".into());
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("boxscan=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config = load_config(&cli.config)?;

    let templates = TemplateLibrary::load_dir(&config.templates_dir)?;
    if templates.is_empty() {
        return Err(format!("no templates found in {}", config.templates_dir.display()).into());
    }
    let vocabulary = Vocabulary::new(&config.vocabulary);
    if vocabulary.is_empty() {
        return Err("vocabulary must contain at least one label".into());
    }

    let schedule = RotationSchedule {
        rotations: config.recovery.rotations,
        step_deg: config.recovery.angle_step_deg,
    };
    let preprocess = PreprocessConfig {
        blur_sigma: config.recovery.blur_sigma,
        dilate_radius: config.recovery.dilate_radius,
    };
    let recovery = TextRecovery::new(vocabulary, schedule, preprocess);

    let annotator = match &config.font_path {
        Some(font) => Annotator::new().with_font_file(font)?,
        None => Annotator::new().with_system_font(),
    };
    let detector =
        Detector::new(templates, config.detect.into(), recovery)?.with_annotator(annotator);

    let report = run(
        &detector,
        &config.images_dir,
        &config.output_dir,
        config.ocr.into(),
    )?;

    let output = Output::from(report);
    let json = serde_json::to_string_pretty(&output)?;
    match &config.report_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_config, run_with, Config, EXAMPLE_JSON};
    use boxscan::io::save_color;
    use boxscan::{
        DetectConfig, Detector, OcrEngine, OcrError, OcrSettings, PageSegMode, RotationSchedule,
        Template, TemplateLibrary, TextRecovery,
    };
    use image::{GrayImage, Rgb, RgbImage};
    use std::fs;
    use std::path::Path;

    struct Reads(&'static str);

    impl OcrEngine for Reads {
        fn read_text(&mut self, _image: &GrayImage) -> Result<String, OcrError> {
            Ok(self.0.to_owned())
        }
    }

    fn patch() -> RgbImage {
        let mut state = 0x9e37_79b9u32;
        RgbImage::from_fn(24, 16, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let v = (state >> 24) as u8;
            Rgb([v, v, v])
        })
    }

    fn write_scene(images: &Path) -> Detector {
        fs::create_dir_all(images).unwrap();
        let patch = patch();
        let mut scene = RgbImage::from_pixel(90, 70, Rgb([128, 128, 128]));
        image::imageops::replace(&mut scene, &patch, 30, 25);
        save_color(images.join("scene.png"), &scene).unwrap();

        let config = DetectConfig {
            scales: vec![1.0],
            ..DetectConfig::default()
        };
        let templates = TemplateLibrary::new(vec![Template::from_rgb("dolce", patch).unwrap()]);
        Detector::new(templates, config, TextRecovery::default()).unwrap()
    }

    #[test]
    fn failed_engine_startup_still_writes_rectangles() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let output = dir.path().join("output");
        let detector = write_scene(&images);

        let startup = Err(OcrError::EngineInit("missing eng.traineddata".to_owned()));
        let report = run_with(&detector, &images, &output, startup, || Reads("DOLCE")).unwrap();

        assert_eq!(report.succeeded(), 1);
        let image = &report.images[0];
        assert!(image.output.as_ref().unwrap().is_file());
        let results = image.outcome.as_ref().unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_labeled());
    }

    #[test]
    fn healthy_engine_labels_regions() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let detector = write_scene(&images);

        let report =
            run_with(&detector, &images, &dir.path().join("out"), Ok(()), || Reads("DOLCE")).unwrap();
        let results = report.images[0].outcome.as_ref().unwrap();
        assert_eq!(results[0].label, "DOLCE");
    }

    #[test]
    fn missing_fields_take_library_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "templates_dir": "t", "images_dir": "i", "output_dir": "o", "detect": { "score_threshold": 0.7 } }"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let detect = DetectConfig::from(config.detect);
        assert_eq!(detect.score_threshold, 0.7);
        assert_eq!(detect.scales, DetectConfig::default().scales);
        assert_eq!(detect.overlap_tolerance, DetectConfig::default().overlap_tolerance);
        assert_eq!(config.recovery.rotations, RotationSchedule::default().rotations);
        assert_eq!(config.vocabulary.len(), 5);
        assert!(config.font_path.is_none());
        assert_eq!(OcrSettings::from(config.ocr), OcrSettings::default());
    }

    #[test]
    fn missing_directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "templates_dir": "t" }"#).unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        let ocr = OcrSettings::from(config.ocr);
        assert_eq!(ocr.page_seg_mode, PageSegMode::Auto);
        assert_eq!(DetectConfig::from(config.detect), DetectConfig::default());
    }
}
