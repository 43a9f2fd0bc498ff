//! # labcurves-ops
//!
//! Curve application for LabCurves pixel buffers.
//!
//! # Modules
//!
//! - [`apply_curve`] - Table lookup on the channels selected by a [`ChannelMask`]
//! - [`apply_saturation_curve`] - Polar chroma scaling keyed by hue or lightness
//!
//! Both passes are data-parallel over pixels with [`rayon`]; the curve's
//! table is only read while a pass runs.
//!
//! # Example
//!
//! ```rust
//! use labcurves_core::{ColorSpace, Image};
//! use labcurves_curve::{Curve, CurveChannel};
//! use labcurves_ops::{apply_saturation_curve, SaturationKey, SaturationMode};
//!
//! let mut image = Image::filled(8, 8, ColorSpace::Lab, [30000, 0x9000, 0x7000]);
//! let curve = Curve::new(CurveChannel::Saturation);
//! apply_saturation_curve(&mut image, &curve, SaturationMode::Adaptive, SaturationKey::Hue).unwrap();
//! assert_eq!(image.pixel(0, 0), [30000, 0x9000, 0x7000]);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod curve;
mod error;
mod saturation;

pub use curve::{apply_curve, ChannelMask};
pub use error::{OpsError, OpsResult};
pub use saturation::{
    apply_saturation_curve, SaturationKey, SaturationMode, CHROMA_EXPONENT, CHROMA_NORMALIZATION,
};
