//! Tesseract backend via `leptess` (feature `tesseract`).
//!
//! One API handle is opened lazily per engine and reused across regions.
//! Any failure drops the handle, so the next call starts from a fresh
//! instance and a broken attempt cannot leak into later ones.

use crate::recognize::{OcrEngine, OcrError, OcrSettings};
use image::{GrayImage, ImageFormat};
use leptess::{LepTess, Variable};
use std::io::Cursor;

/// Tesseract-backed [`OcrEngine`].
pub struct TesseractEngine {
    settings: OcrSettings,
    api: Option<LepTess>,
}

impl TesseractEngine {
    /// Creates an engine; Tesseract itself is initialised on first use.
    pub fn new(settings: OcrSettings) -> Self {
        Self {
            settings,
            api: None,
        }
    }

    /// Initialises Tesseract eagerly to surface configuration problems early.
    pub fn warm_up(&mut self) -> Result<(), OcrError> {
        self.session().map(|_| ())
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    fn open(settings: &OcrSettings) -> Result<LepTess, OcrError> {
        let data_path = settings
            .data_path
            .as_ref()
            .map(|path| {
                path.to_str()
                    .ok_or_else(|| OcrError::EngineInit("tessdata path is not UTF-8".to_owned()))
            })
            .transpose()?;
        let mut api = LepTess::new(data_path, &settings.language)
            .map_err(|err| OcrError::EngineInit(format!("{err:?}")))?;

        let set = |api: &mut LepTess, var: Variable, value: &str| {
            api.set_variable(var, value)
                .map_err(|err| OcrError::Config(format!("{err:?}")))
        };
        set(&mut api, Variable::TesseditCharWhitelist, &settings.whitelist)?;
        set(
            &mut api,
            Variable::TesseditPagesegMode,
            settings.page_seg_mode.as_tesseract_value(),
        )?;
        if settings.disable_learning {
            set(&mut api, Variable::ClassifyEnableLearning, "0")?;
        }
        Ok(api)
    }

    fn session(&mut self) -> Result<&mut LepTess, OcrError> {
        if self.api.is_none() {
            self.api = Some(Self::open(&self.settings)?);
        }
        self.api
            .as_mut()
            .ok_or_else(|| OcrError::EngineInit("tesseract handle missing".to_owned()))
    }

    fn run(&mut self, png: &[u8]) -> Result<String, OcrError> {
        let resolution = i32::try_from(self.settings.source_resolution).unwrap_or(300);
        let api = self.session()?;
        api.set_image_from_mem(png)
            .map_err(|err| OcrError::Recognition(format!("{err:?}")))?;
        api.set_source_resolution(resolution);
        api.get_utf8_text()
            .map_err(|err| OcrError::Recognition(err.to_string()))
    }
}

impl OcrEngine for TesseractEngine {
    fn read_text(&mut self, image: &GrayImage) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| OcrError::Encode(err.to_string()))?;

        let result = self.run(&png);
        if result.is_err() {
            self.api = None;
        }
        result
    }
}
