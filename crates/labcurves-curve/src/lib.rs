//! # labcurves-curve
//!
//! Tone curves for the LabCurves pipeline.
//!
//! A [`Curve`] maps every 16-bit level to a 16-bit level through a dense
//! 65536-entry table. The table is derived from a handful of anchors by
//! natural cubic spline or linear interpolation, or sampled from a
//! [`ToneFunction`].
//!
//! # Modules
//!
//! - [`spline`] - Tridiagonal solver and natural cubic spline
//! - [`tone`] - sRGB, BT.709 and gamma tone functions
//! - curve files (`.dlc`) - [`Curve::from_file`], [`Curve::write_curve`]
//! - [`CurveSet`] - The four channel curves of a session with backups
//!
//! # Usage
//!
//! ```rust
//! use labcurves_curve::{Anchor, Curve, CurveChannel, Interpolation};
//!
//! let curve = Curve::from_anchors(
//!     CurveChannel::Lightness,
//!     vec![Anchor::new(0.0, 0.0), Anchor::new(0.5, 0.6), Anchor::new(1.0, 1.0)],
//!     Interpolation::Spline,
//! )
//! .unwrap();
//! assert!(curve.lookup(0x8000) > 0x8000);
//! ```
//!
//! # Dependencies
//!
//! - [`rayon`] - Parallel table generation
//! - [`serde`] - Settings enums
//! - [`thiserror`] - Error handling

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod curve;
mod error;
mod file;
mod set;
pub mod spline;
pub mod tone;

pub use curve::{
    Anchor, CompositionOrder, Curve, CurveChannel, CurveKind, Interpolation, ANCHOR_MIN_GAP,
    LUT_SIZE, MAX_ANCHORS, SATURATION_NEUTRAL,
};
pub use error::{CurveError, CurveResult};
pub use file::{CURVE_FILE_EXTENSION, DEFAULT_HEADER};
pub use set::CurveSet;
pub use tone::ToneFunction;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::curve::{Anchor, Curve, CurveChannel, Interpolation};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::set::CurveSet;
    pub use crate::tone::ToneFunction;
}
