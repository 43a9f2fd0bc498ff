//! # labcurves-icc
//!
//! Color management for LabCurves, built on Little CMS 2.
//!
//! Images are decoded to RGB_16 in their embedded profile (or sRGB),
//! converted to 16-bit CIE Lab (v4, D50) for curve work, and converted back
//! to the embedded profile before encoding.
//!
//! # Example
//!
//! ```rust
//! use labcurves_core::{ColorSpace, Image};
//! use labcurves_icc::{image_to_lab, image_to_rgb, Profile};
//!
//! let mut image = Image::filled(16, 16, ColorSpace::SrgbD65, [0x8000, 0x4000, 0x2000]);
//! let profile = Profile::srgb();
//! image_to_lab(&mut image, &profile).unwrap();
//! assert_eq!(image.color_space(), ColorSpace::Lab);
//! image_to_rgb(&mut image, &profile).unwrap();
//! ```
//!
//! # Thread Safety
//!
//! [`Profile`] holds serialized bytes and is `Send + Sync`. Transforms
//! open one lcms2 handle per worker thread.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod profile;
mod transform;

pub use error::{IccError, IccResult};
pub use profile::Profile;
pub use transform::{image_to_lab, image_to_rgb, lab_to_srgb_simple, Direction, LabTransform, CHUNK_PIXELS};

/// Rendering intent for color transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    /// Compresses the source gamut into the destination gamut.
    ///
    /// Used for all image conversions.
    #[default]
    Perceptual,

    /// Clips out-of-gamut colors, keeping in-gamut colors exact relative
    /// to the media white.
    RelativeColorimetric,

    /// Favors vivid colors over accuracy.
    Saturation,

    /// Clips out-of-gamut colors without white point adaptation.
    AbsoluteColorimetric,
}

impl From<Intent> for lcms2::Intent {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Perceptual => lcms2::Intent::Perceptual,
            Intent::RelativeColorimetric => lcms2::Intent::RelativeColorimetric,
            Intent::Saturation => lcms2::Intent::Saturation,
            Intent::AbsoluteColorimetric => lcms2::Intent::AbsoluteColorimetric,
        }
    }
}
