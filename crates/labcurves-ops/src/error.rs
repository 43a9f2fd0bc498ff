//! Error types for curve application.

use labcurves_core::ColorSpace;
use thiserror::Error;

/// Error type for curve application.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Buffer-level failure.
    #[error(transparent)]
    Core(#[from] labcurves_core::Error),

    /// The buffer's color space has no meaning for this operation.
    #[error("{operation} is not supported on {color_space} buffers")]
    Unsupported {
        /// Operation name
        operation: &'static str,
        /// Space of the buffer
        color_space: ColorSpace,
    },
}

/// Result type for curve application.
pub type OpsResult<T> = Result<T, OpsError>;
