//! Per-channel table lookup.

use crate::{OpsError, OpsResult};
use labcurves_core::{ColorSpace, Image};
use labcurves_curve::Curve;
use rayon::prelude::*;
use std::ops::BitOr;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Set of pixel channels a curve is applied to.
///
/// Bit 0 is the first channel (L or R), bit 1 the second, bit 2 the third.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMask(u8);

impl ChannelMask {
    /// First channel (L in Lab).
    pub const L: Self = Self(1);
    /// Second channel (a in Lab).
    pub const A: Self = Self(2);
    /// Third channel (b in Lab).
    pub const B: Self = Self(4);
    /// All three channels.
    pub const ALL: Self = Self(7);
    /// No channel.
    pub const NONE: Self = Self(0);

    /// Builds a mask from its low three bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 7)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether channel `index` (0..3) is selected.
    pub const fn contains(self, index: usize) -> bool {
        index < 3 && self.0 & (1 << index) != 0
    }

    /// Whether no channel is selected.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ChannelMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Replaces every selected channel value `v` by `curve.lut[v]`.
///
/// Works on any color space where the channels are independent tone
/// values, i.e. everything but XYZ.
///
/// # Errors
///
/// [`OpsError::Unsupported`] for XYZ buffers.
///
/// # Example
///
/// ```rust
/// use labcurves_core::{ColorSpace, Image};
/// use labcurves_curve::{Curve, CurveChannel};
/// use labcurves_ops::{apply_curve, ChannelMask};
///
/// let mut image = Image::filled(4, 4, ColorSpace::Lab, [100, 200, 300]);
/// apply_curve(&mut image, &Curve::new(CurveChannel::Lightness), ChannelMask::L).unwrap();
/// assert_eq!(image.pixel(0, 0), [100, 200, 300]);
/// ```
pub fn apply_curve(image: &mut Image, curve: &Curve, mask: ChannelMask) -> OpsResult<()> {
    if image.color_space() == ColorSpace::Xyz {
        return Err(OpsError::Unsupported {
            operation: "curve application",
            color_space: image.color_space(),
        });
    }
    if mask.is_empty() {
        return Ok(());
    }
    trace!(channel = %curve.channel(), mask = mask.bits(), pixels = image.len(), "apply_curve");

    let lut = curve.lut();
    let channels: Vec<usize> = (0..3).filter(|&c| mask.contains(c)).collect();
    image.pixels_mut().par_iter_mut().for_each(|px| {
        for &c in &channels {
            px[c] = lut[px[c] as usize];
        }
    });
    Ok(())
}
