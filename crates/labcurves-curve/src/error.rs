//! Curve error types.

use thiserror::Error;

/// Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors that can occur while building, reading or writing curves.
#[derive(Debug, Error)]
pub enum CurveError {
    /// Anchor list violates ordering or range invariants.
    #[error("invalid anchors: {0}")]
    InvalidAnchors(String),

    /// More anchors than a curve can hold.
    #[error("too many anchors: {count} (maximum {max})")]
    TooManyAnchors {
        /// Anchors found
        count: usize,
        /// Allowed maximum
        max: usize,
    },

    /// Spline system could not be solved.
    #[error("spline error: {0}")]
    Spline(String),

    /// Malformed curve file.
    #[error("parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// The curve is a dense table without anchors and cannot be saved as a
    /// curve file.
    #[error("curve has no anchors to write")]
    NotAnchorCurve,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CurveError {
    /// Creates a [`CurveError::ParseError`].
    #[inline]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }
}
