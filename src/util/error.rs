//! Error types for boxscan.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for boxscan operations.
pub type BoxScanResult<T> = std::result::Result<T, BoxScanError>;

/// Errors that can escape the detection pipeline.
///
/// Per-region failures (bad geometry, OCR errors) are absorbed inside the
/// orchestrator and never surface here.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BoxScanError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A configuration field holds an unusable value.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// The template cannot be normalized (e.g. zero variance).
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// An image could not be read, decoded or written.
    #[error("image i/o failed for {}: {reason}", path.display())]
    ImageIo { path: PathBuf, reason: String },
    /// A directory could not be enumerated.
    #[error("cannot read directory {}: {reason}", path.display())]
    ReadDir { path: PathBuf, reason: String },
    /// The output directory could not be created.
    #[error("cannot create output directory {}: {reason}", path.display())]
    OutputDir { path: PathBuf, reason: String },
    /// A font file could not be read or parsed.
    #[error("cannot load font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },
}
