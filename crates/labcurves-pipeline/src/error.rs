//! Pipeline error types.

use crate::SlotId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by the pipeline and the session.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Decode or encode failure.
    #[error(transparent)]
    Io(#[from] labcurves_io::IoError),

    /// Color management failure.
    #[error(transparent)]
    Icc(#[from] labcurves_icc::IccError),

    /// Curve file or anchor failure.
    #[error(transparent)]
    Curve(#[from] labcurves_curve::CurveError),

    /// Curve application failure.
    #[error(transparent)]
    Ops(#[from] labcurves_ops::OpsError),

    /// Buffer failure.
    #[error(transparent)]
    Core(#[from] labcurves_core::Error),

    /// Malformed settings file.
    #[error("settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Settings file could not be read or written.
    #[error("settings file {path}: {source}")]
    SettingsFile {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The decoded image is below the minimum size.
    #[error("image {width}x{height} is too small (minimum {min}x{min})")]
    ImageTooSmall {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
        /// Minimum side length
        min: u32,
    },

    /// A phase needs a cache slot that was never filled.
    #[error("{0:?} is empty; open an image and run the earlier phases first")]
    NotReady(SlotId),

    /// A job-mode run processed the source buffer in place.
    #[error("source image was consumed by a job-mode run; reopen it")]
    SourceConsumed,

    /// Preview crop rectangle outside the image.
    #[error("crop ({x}, {y}, {width}x{height}) is outside the {image_width}x{image_height} image")]
    InvalidCrop {
        /// Crop X origin
        x: u32,
        /// Crop Y origin
        y: u32,
        /// Crop width
        width: u32,
        /// Crop height
        height: u32,
        /// Full-resolution image width
        image_width: u32,
        /// Full-resolution image height
        image_height: u32,
    },
}
