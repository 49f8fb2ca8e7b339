//! OCR engine settings.

use std::path::PathBuf;

/// Upper- and lower-case Latin letters plus space.
pub const LATIN_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz ";

/// Tesseract page segmentation modes exposed by the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageSegMode {
    /// Fully automatic segmentation; best for small, uncertain text blocks.
    #[default]
    Auto,
    SingleColumn,
    SingleBlock,
    SingleLine,
    SingleWord,
    SparseText,
}

impl PageSegMode {
    /// Value of the `tessedit_pageseg_mode` variable.
    pub fn as_tesseract_value(self) -> &'static str {
        match self {
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
            PageSegMode::SingleWord => "8",
            PageSegMode::SparseText => "11",
        }
    }
}

/// Settings used to initialise and drive the OCR engine.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrSettings {
    /// Directory holding `<language>.traineddata`; `None` uses the engine default.
    pub data_path: Option<PathBuf>,
    pub language: String,
    /// Characters the engine may emit.
    pub whitelist: String,
    pub page_seg_mode: PageSegMode,
    /// Turn off adaptive classifier learning between calls.
    pub disable_learning: bool,
    /// DPI hint passed with every image.
    pub source_resolution: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            data_path: None,
            language: "eng".to_owned(),
            whitelist: LATIN_WHITELIST.to_owned(),
            page_seg_mode: PageSegMode::Auto,
            disable_learning: true,
            source_resolution: 300,
        }
    }
}
