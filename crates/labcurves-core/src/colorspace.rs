//! Color space tags for pixel buffers.
//!
//! Unlike a compile-time marker, the color space of an [`Image`](crate::Image)
//! is a runtime tag: decode produces Lab, previews produce sRGB, and the
//! same buffer type carries both. Consumers must check the tag before
//! interpreting channel indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored value of a neutral (zero) chroma sample in 16-bit Lab.
///
/// Both the `a` and `b` channels use this midpoint as their origin.
pub const LAB_NEUTRAL: u16 = 0x8080;

/// Color space of the channel triplets in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// sRGB primaries, D65 white.
    #[default]
    SrgbD65,
    /// Adobe RGB (1998), D65 white.
    AdobeRgbD65,
    /// Wide Gamut RGB, D50 white.
    WideGamutRgbD50,
    /// ProPhoto RGB, D50 white.
    ProPhotoRgbD50,
    /// CIE Lab (v4 16-bit encoding, D50).
    Lab,
    /// CIE XYZ.
    Xyz,
    /// Device RGB described by an embedded ICC profile.
    Profiled,
}

impl ColorSpace {
    /// Returns `true` for the RGB variants, including profiled RGB.
    #[inline]
    pub fn is_rgb(self) -> bool {
        !matches!(self, Self::Lab | Self::Xyz)
    }

    /// Short name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::SrgbD65 => "sRGB",
            Self::AdobeRgbD65 => "AdobeRGB",
            Self::WideGamutRgbD50 => "WideGamutRGB",
            Self::ProPhotoRgbD50 => "ProPhotoRGB",
            Self::Lab => "Lab",
            Self::Xyz => "XYZ",
            Self::Profiled => "profiled",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which Lab channel a preview isolates.
///
/// See [`Image::view_lab`](crate::Image::view_lab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabView {
    /// All three channels, unchanged.
    #[default]
    Lab,
    /// Lightness only, chroma neutralized.
    L,
    /// The `a` channel shown as lightness.
    A,
    /// The `b` channel shown as lightness.
    B,
}

impl std::str::FromStr for LabView {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lab" => Ok(Self::Lab),
            "l" => Ok(Self::L),
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            other => Err(format!("unknown Lab view '{other}' (expected lab, l, a or b)")),
        }
    }
}
