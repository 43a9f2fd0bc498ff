//! Saturation curve in polar Lab coordinates.
//!
//! The chroma vector `(a - n, b - n)`, with `n` the neutral level
//! [`LAB_NEUTRAL`], is scaled by a factor read from the saturation curve.
//! The curve is keyed either by hue angle or by lightness; a table value of
//! [`SATURATION_NEUTRAL`] means "unchanged". The factor read from the
//! table is squared before use.
//!
//! ```text
//! hue    = atan2(b - n, a - n)  in [0, 2pi)
//! key    = hue / pi * n         (Hue)   or   L   (Lightness)
//! f      = (lut[key] / 0x7fff)^2
//! a'     = n + (a - n) * m
//! b'     = n + (b - n) * m
//! ```
//!
//! In [`SaturationMode::Absolute`] `m = f`. In
//! [`SaturationMode::Adaptive`] the factor is blended with the pixel's
//! chroma `c = |chroma|^(2 * CHROMA_EXPONENT) / CHROMA_NORMALIZATION`:
//! boosts favor dull pixels (`m = f * (1 - c) + c`), cuts favor vivid ones
//! (`m = f * c + 1 - c`).

use crate::{OpsError, OpsResult};
use labcurves_core::{ColorSpace, Image, LAB_NEUTRAL};
use labcurves_curve::{Curve, SATURATION_NEUTRAL};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Exponent applied to the squared chroma magnitude in adaptive mode.
///
/// Empirically tuned; the derivation is not documented. Changing it alters
/// the look of every adaptive saturation edit.
pub const CHROMA_EXPONENT: f32 = 0.125;

/// Divisor mapping the chroma measure to roughly [0, 1] in adaptive mode.
///
/// Empirically tuned together with [`CHROMA_EXPONENT`].
pub const CHROMA_NORMALIZATION: f32 = 13.0;

/// How the saturation factor is blended with the pixel's own chroma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationMode {
    /// Weight the factor by chroma.
    #[default]
    Adaptive,
    /// Apply the factor uniformly.
    Absolute,
}

/// What the saturation curve is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationKey {
    /// Hue angle, 0 to 2pi along the curve's x axis.
    #[default]
    Hue,
    /// Lightness L.
    Lightness,
}

/// Applies a saturation curve to a Lab buffer.
///
/// Pixels whose factor is exactly 1 are left untouched, so the null
/// saturation curve is an exact identity. Results are clamped to the
/// 16-bit range.
///
/// # Errors
///
/// [`OpsError::Core`] with a color space mismatch unless the buffer is Lab.
pub fn apply_saturation_curve(
    image: &mut Image,
    curve: &Curve,
    mode: SaturationMode,
    key: SaturationKey,
) -> OpsResult<()> {
    if image.color_space() != ColorSpace::Lab {
        return Err(OpsError::Core(labcurves_core::Error::color_space_mismatch(
            ColorSpace::Lab,
            image.color_space(),
        )));
    }
    trace!(?mode, ?key, pixels = image.len(), "apply_saturation_curve");

    let lut = curve.lut();
    let neutral = LAB_NEUTRAL as f32;
    let unit = SATURATION_NEUTRAL as f32;

    image.pixels_mut().par_iter_mut().for_each(|px| {
        let da = px[1] as f32 - neutral;
        let db = px[2] as f32 - neutral;

        let index = match key {
            SaturationKey::Hue => {
                let mut hue = if da == 0.0 && db == 0.0 { 0.0 } else { db.atan2(da) };
                while hue < 0.0 {
                    hue += 2.0 * PI;
                }
                clip(hue / PI * neutral) as usize
            }
            SaturationKey::Lightness => px[0] as usize,
        };

        let factor = lut[index] as f32 / unit;
        if factor == 1.0 {
            return;
        }
        let factor = factor * factor;

        let m = match mode {
            SaturationMode::Absolute => factor,
            SaturationMode::Adaptive => {
                let chroma = (da * da + db * db).powf(CHROMA_EXPONENT) / CHROMA_NORMALIZATION;
                if factor > 1.0 {
                    factor * (1.0 - chroma) + chroma
                } else {
                    factor * chroma + (1.0 - chroma)
                }
            }
        };

        px[1] = blend(px[1], m);
        px[2] = blend(px[2], m);
    });
    Ok(())
}

/// Moves a chroma sample towards or away from neutral by `m`.
///
/// The scaled sample is single precision, the neutral term and the sum are
/// double precision.
#[inline]
fn blend(value: u16, m: f32) -> u16 {
    let scaled = (value as f32 * m) as f64;
    let sum = scaled + LAB_NEUTRAL as f64 * (1.0 - m as f64);
    (sum as i64).clamp(0, u16::MAX as i64) as u16
}

/// Truncates toward zero, then clamps to the 16-bit range.
#[inline]
fn clip(value: f32) -> u16 {
    (value as i32).clamp(0, u16::MAX as i32) as u16
}
