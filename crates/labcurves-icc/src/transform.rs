//! 16-bit Lab <-> RGB transforms.

use crate::profile::lab_profile;
use crate::{IccError, IccResult, Intent, Profile};
use labcurves_core::{ColorSpace, Image, Pixel};
use lcms2::{Flags, PixelFormat, Transform as LcmsTransform};
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Pixels per work item handed to a worker thread.
pub const CHUNK_PIXELS: usize = 100_000;

/// Which way a [`LabTransform`] converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// RGB_16 in the profile's space to Lab_16.
    RgbToLab,
    /// Lab_16 to RGB_16 in the profile's space.
    LabToRgb,
}

/// A conversion between an RGB profile and CIE Lab (v4, D50).
///
/// Pixels are processed in chunks of [`CHUNK_PIXELS`] on the rayon pool;
/// each worker thread owns its own lcms2 transform.
///
/// # Example
///
/// ```rust
/// use labcurves_icc::{Direction, Intent, LabTransform, Profile};
///
/// let t = LabTransform::new(Profile::srgb(), Direction::RgbToLab, Intent::Perceptual).unwrap();
/// let mut pixels = vec![[0xffffu16, 0xffff, 0xffff]; 4];
/// t.apply(&mut pixels).unwrap();
/// assert!(pixels[0][0] > 0xf000);
/// ```
#[derive(Debug, Clone)]
pub struct LabTransform {
    profile: Profile,
    direction: Direction,
    intent: Intent,
    black_point_compensation: bool,
}

impl LabTransform {
    /// Creates a transform without black-point compensation.
    ///
    /// # Errors
    ///
    /// Fails if lcms2 cannot build the transform.
    pub fn new(profile: Profile, direction: Direction, intent: Intent) -> IccResult<Self> {
        let transform = Self {
            profile,
            direction,
            intent,
            black_point_compensation: false,
        };
        transform.build()?;
        Ok(transform)
    }

    /// Enables or disables black-point compensation.
    pub fn with_black_point_compensation(mut self, enabled: bool) -> Self {
        self.black_point_compensation = enabled;
        self
    }

    /// The RGB side of the conversion.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Conversion direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Converts pixels in place.
    pub fn apply(&self, pixels: &mut [Pixel]) -> IccResult<()> {
        trace!(direction = ?self.direction, pixels = pixels.len(), "LabTransform::apply");
        pixels
            .par_chunks_mut(CHUNK_PIXELS)
            .try_for_each_init(
                || self.build(),
                |transform, chunk| {
                    let transform = transform
                        .as_ref()
                        .map_err(|e| IccError::TransformFailed(e.to_string()))?;
                    transform.transform_in_place(chunk);
                    Ok(())
                },
            )
    }

    fn build(&self) -> IccResult<LcmsTransform<Pixel, Pixel>> {
        let rgb = self.profile.open()?;
        let lab = lab_profile()?;
        let (src, src_fmt, dst, dst_fmt) = match self.direction {
            Direction::RgbToLab => (&rgb, PixelFormat::RGB_16, &lab, PixelFormat::Lab_16),
            Direction::LabToRgb => (&lab, PixelFormat::Lab_16, &rgb, PixelFormat::RGB_16),
        };
        let transform = if self.black_point_compensation {
            LcmsTransform::new_flags(
                src,
                src_fmt,
                dst,
                dst_fmt,
                self.intent.into(),
                Flags::BLACKPOINT_COMPENSATION,
            )
        } else {
            LcmsTransform::new(src, src_fmt, dst, dst_fmt, self.intent.into())
        };
        transform.map_err(|e| IccError::TransformFailed(e.to_string()))
    }
}

/// Converts an RGB buffer to Lab (perceptual, black-point compensation).
///
/// # Errors
///
/// A color space mismatch unless the buffer holds RGB.
pub fn image_to_lab(image: &mut Image, profile: &Profile) -> IccResult<()> {
    if !image.color_space().is_rgb() {
        let err = labcurves_core::Error::color_space_mismatch(ColorSpace::Profiled, image.color_space());
        return Err(err.into());
    }
    LabTransform::new(profile.clone(), Direction::RgbToLab, Intent::Perceptual)?
        .with_black_point_compensation(true)
        .apply(image.pixels_mut())?;
    image.set_color_space(ColorSpace::Lab);
    debug!(pixels = image.len(), srgb = profile.is_srgb(), "converted to Lab");
    Ok(())
}

/// Converts a Lab buffer to the profile's RGB (perceptual, black-point
/// compensation), as done before encoding.
///
/// # Errors
///
/// A color space mismatch unless the buffer holds Lab.
pub fn image_to_rgb(image: &mut Image, profile: &Profile) -> IccResult<()> {
    require_lab(image)?;
    LabTransform::new(profile.clone(), Direction::LabToRgb, Intent::Perceptual)?
        .with_black_point_compensation(true)
        .apply(image.pixels_mut())?;
    image.set_color_space(if profile.is_srgb() {
        ColorSpace::SrgbD65
    } else {
        ColorSpace::Profiled
    });
    debug!(pixels = image.len(), srgb = profile.is_srgb(), "converted from Lab");
    Ok(())
}

/// Converts a Lab buffer to sRGB for display (perceptual, black-point
/// compensation), ignoring the image's own profile.
pub fn lab_to_srgb_simple(image: &mut Image) -> IccResult<()> {
    require_lab(image)?;
    LabTransform::new(Profile::srgb(), Direction::LabToRgb, Intent::Perceptual)?
        .with_black_point_compensation(true)
        .apply(image.pixels_mut())?;
    image.set_color_space(ColorSpace::SrgbD65);
    Ok(())
}

fn require_lab(image: &Image) -> IccResult<()> {
    if image.color_space() != ColorSpace::Lab {
        let err = labcurves_core::Error::color_space_mismatch(ColorSpace::Lab, image.color_space());
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcurves_core::LAB_NEUTRAL;

    fn near(a: u16, b: u16, tolerance: i32) -> bool {
        (a as i32 - b as i32).abs() <= tolerance
    }

    #[test]
    fn white_and_black_map_to_lab_extremes() {
        let mut image = Image::from_data(2, 1, ColorSpace::SrgbD65, vec![[0xffff; 3], [0; 3]]).unwrap();
        image_to_lab(&mut image, &Profile::srgb()).unwrap();
        assert_eq!(image.color_space(), ColorSpace::Lab);

        let white = image.pixel(0, 0);
        assert!(white[0] > 0xfe00, "L = {}", white[0]);
        assert!(near(white[1], LAB_NEUTRAL, 0x100));
        assert!(near(white[2], LAB_NEUTRAL, 0x100));

        let black = image.pixel(1, 0);
        assert!(black[0] < 0x200, "L = {}", black[0]);
    }

    #[test]
    fn rgb_lab_roundtrip() {
        let data: Vec<Pixel> = (0..256u32)
            .map(|i| {
                let v = (i * 257) as u16;
                [v, 0xffff - v, (v / 2) + 0x4000]
            })
            .collect();
        let original = Image::from_data(16, 16, ColorSpace::SrgbD65, data).unwrap();
        let mut image = original.clone();
        image_to_lab(&mut image, &Profile::srgb()).unwrap();
        image_to_rgb(&mut image, &Profile::srgb()).unwrap();
        assert_eq!(image.color_space(), ColorSpace::SrgbD65);
        for (a, b) in image.pixels().iter().zip(original.pixels()) {
            for c in 0..3 {
                assert!(near(a[c], b[c], 0x300), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn chunked_matches_single_pass() {
        let pixels: Vec<Pixel> = (0..CHUNK_PIXELS as u32 + 1234)
            .map(|i| [(i % 65536) as u16, ((i * 7) % 65536) as u16, ((i * 13) % 65536) as u16])
            .collect();
        let t = LabTransform::new(Profile::srgb(), Direction::RgbToLab, Intent::Perceptual).unwrap();

        let mut parallel = pixels.clone();
        t.apply(&mut parallel).unwrap();

        let mut serial = pixels;
        t.build().unwrap().transform_in_place(&mut serial);
        assert_eq!(parallel, serial);
    }

    #[test]
    fn wrong_space_is_rejected() {
        let mut rgb = Image::filled(2, 2, ColorSpace::SrgbD65, [1, 2, 3]);
        assert!(matches!(lab_to_srgb_simple(&mut rgb), Err(IccError::Core(_))));

        let mut lab = Image::filled(2, 2, ColorSpace::Lab, [1, 2, 3]);
        assert!(matches!(image_to_lab(&mut lab, &Profile::srgb()), Err(IccError::Core(_))));
    }

    #[test]
    fn simple_preview_conversion() {
        let mut image = Image::filled(4, 4, ColorSpace::Lab, [0x8000, LAB_NEUTRAL, LAB_NEUTRAL]);
        lab_to_srgb_simple(&mut image).unwrap();
        let [r, g, b] = image.pixel(0, 0);
        assert!(near(r, g, 0x100) && near(g, b, 0x100));
        assert_eq!(image.color_space(), ColorSpace::SrgbD65);

        let dark = [0x0400, LAB_NEUTRAL + 0x100, LAB_NEUTRAL - 0x80];
        let mut image = Image::filled(2, 2, ColorSpace::Lab, dark);
        lab_to_srgb_simple(&mut image).unwrap();

        let mut expected = [dark];
        LabTransform::new(Profile::srgb(), Direction::LabToRgb, Intent::Perceptual)
            .unwrap()
            .with_black_point_compensation(true)
            .apply(&mut expected)
            .unwrap();
        assert_eq!(image.pixel(1, 1), expected[0]);
    }
}
