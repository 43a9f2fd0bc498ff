//! Error types for labcurves-core operations.
//!
//! Only recoverable conditions are represented here. Caller bugs such as a
//! crop rectangle outside the buffer are contract violations and panic at
//! the point of detection.
//!
//! # Usage
//!
//! ```rust
//! use labcurves_core::{ColorSpace, Error, Result};
//!
//! fn require_lab(space: ColorSpace) -> Result<()> {
//!     if space != ColorSpace::Lab {
//!         return Err(Error::color_space_mismatch(ColorSpace::Lab, space));
//!     }
//!     Ok(())
//! }
//! assert!(require_lab(ColorSpace::SrgbD65).is_err());
//! ```

use crate::ColorSpace;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during pixel buffer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Region extends beyond the buffer.
    ///
    /// Returned by the checked crop used for user-supplied rectangles.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds image bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        rx: u32,
        /// Region Y origin
        ry: u32,
        /// Region width
        rw: u32,
        /// Region height
        rh: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Invalid image dimensions or data length.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// The operation needs a buffer in another color space.
    #[error("color space mismatch: expected {expected}, got {actual}")]
    ColorSpaceMismatch {
        /// Space the operation requires
        expected: ColorSpace,
        /// Space of the buffer
        actual: ColorSpace,
    },
}

impl Error {
    /// Creates an [`Error::InvalidRegion`] error.
    #[inline]
    pub fn invalid_region(rx: u32, ry: u32, rw: u32, rh: u32, width: u32, height: u32) -> Self {
        Self::InvalidRegion {
            rx,
            ry,
            rw,
            rh,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::ColorSpaceMismatch`] error.
    #[inline]
    pub fn color_space_mismatch(expected: ColorSpace, actual: ColorSpace) -> Self {
        Self::ColorSpaceMismatch { expected, actual }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::InvalidRegion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_region() {
        let err = Error::invalid_region(10, 20, 30, 40, 16, 16);
        let msg = err.to_string();
        assert!(msg.contains("30x40"));
        assert!(msg.contains("16x16"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_color_space_mismatch() {
        let err = Error::color_space_mismatch(ColorSpace::Lab, ColorSpace::Xyz);
        assert_eq!(err.to_string(), "color space mismatch: expected Lab, got XYZ");
        assert!(!err.is_bounds_error());
    }
}
