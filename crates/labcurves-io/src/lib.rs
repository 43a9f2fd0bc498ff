//! # labcurves-io
//!
//! Image I/O for LabCurves.
//!
//! Decoding yields a 16-bit RGB [`Image`] plus the embedded ICC profile
//! bytes, if any; encoding takes an RGB image and the profile to embed.
//! Color conversion is not done here.
//!
//! | Format | Read | Write | Bit Depths | Profile |
//! |--------|------|-------|------------|---------|
//! | PNG | Yes | Yes | 8, 16 | iCCP chunk |
//! | TIFF | Yes | Yes | 8, 16 | tag 34675 |
//!
//! 8-bit samples are widened with `v * 257` on read and narrowed with
//! rounding on write, so 8-bit images survive a round trip unchanged.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use labcurves_io::{read, write};
//!
//! let decoded = read("input.tif")?;
//! write("output.png", &decoded.image, decoded.icc.as_deref())?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;

#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "tiff")]
pub mod tiff;

pub use detect::Format;
pub use error::{IoError, IoResult};

use labcurves_core::{ColorSpace, Image, Pixel};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// A decoded image and its embedded ICC profile.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// RGB pixels, tagged [`ColorSpace::Profiled`] when a profile is
    /// embedded and [`ColorSpace::SrgbD65`] otherwise.
    pub image: Image,
    /// Embedded ICC profile bytes.
    pub icc: Option<Vec<u8>>,
}

impl Decoded {
    /// Wraps decoder output.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>, bit_depth: u8, icc: Option<Vec<u8>>) -> IoResult<Self> {
        let color_space = if icc.is_some() {
            ColorSpace::Profiled
        } else {
            ColorSpace::SrgbD65
        };
        let image = Image::from_data(width, height, color_space, pixels)?.with_bit_depth(bit_depth);
        Ok(Self { image, icc })
    }
}

/// Reads an image, detecting the format from its magic bytes.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for anything but PNG and TIFF.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Decoded> {
    let path = path.as_ref();
    let decoded = match Format::detect(path)? {
        #[cfg(feature = "png")]
        Format::Png => png::read(path)?,
        #[cfg(feature = "tiff")]
        Format::Tiff => tiff::read(path)?,
        _ => return Err(unsupported(path)),
    };
    debug!(
        path = %path.display(),
        width = decoded.image.width(),
        height = decoded.image.height(),
        bit_depth = decoded.image.bit_depth(),
        icc_bytes = decoded.icc.as_ref().map_or(0, Vec::len),
        "image decoded"
    );
    Ok(decoded)
}

/// Writes an RGB image, picking the format from the file extension.
///
/// # Errors
///
/// [`IoError::EncodeError`] if the image is not RGB,
/// [`IoError::UnsupportedFormat`] for unknown extensions.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, icc: Option<&[u8]>) -> IoResult<()> {
    let path = path.as_ref();
    if !image.color_space().is_rgb() {
        return Err(IoError::EncodeError(format!(
            "cannot encode {} pixels, convert to RGB first",
            image.color_space()
        )));
    }
    match Format::from_extension(path) {
        #[cfg(feature = "png")]
        Format::Png => png::write(path, image, icc)?,
        #[cfg(feature = "tiff")]
        Format::Tiff => tiff::write(path, image, icc)?,
        _ => return Err(unsupported(path)),
    }
    debug!(path = %path.display(), bit_depth = image.bit_depth(), "image encoded");
    Ok(())
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    )
}

/// Groups interleaved samples into RGB pixels.
///
/// Gray is replicated to all three channels; alpha (channel 2 of gray+alpha,
/// channel 4 of RGBA) is dropped.
pub(crate) fn expand_samples(samples: &[u16], channels: usize) -> Vec<Pixel> {
    samples
        .chunks_exact(channels)
        .map(|s| match channels {
            1 | 2 => [s[0]; 3],
            _ => [s[0], s[1], s[2]],
        })
        .collect()
}

/// 16-bit to 8-bit with rounding; the inverse of `v * 257`.
#[inline]
pub(crate) fn narrow_sample(v: u16) -> u8 {
    ((v as u32 + 128) / 257) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_inverts_widen() {
        for v in 0..=255u8 {
            assert_eq!(narrow_sample(v as u16 * 257), v);
        }
        assert_eq!(narrow_sample(0xffff), 255);
    }

    #[test]
    fn expand_channel_layouts() {
        assert_eq!(expand_samples(&[7, 9], 1), vec![[7; 3], [9; 3]]);
        assert_eq!(expand_samples(&[7, 0, 9, 0], 2), vec![[7; 3], [9; 3]]);
        assert_eq!(expand_samples(&[1, 2, 3, 4], 4), vec![[1, 2, 3]]);
    }

    #[test]
    fn dispatch_by_format() {
        let dir = tempfile::tempdir().unwrap();
        let image = Image::filled(16, 16, ColorSpace::SrgbD65, [1000, 2000, 3000]);

        for name in ["a.png", "b.tif"] {
            let path = dir.path().join(name);
            write(&path, &image, None).unwrap();
            assert_eq!(read(&path).unwrap().image.pixels(), image.pixels());
        }

        let bad = dir.path().join("c.jpg");
        assert!(matches!(write(&bad, &image, None), Err(IoError::UnsupportedFormat(_))));
    }

    #[test]
    fn lab_cannot_be_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let image = Image::filled(16, 16, ColorSpace::Lab, [1000, 2000, 3000]);
        assert!(matches!(
            write(dir.path().join("lab.png"), &image, None),
            Err(IoError::EncodeError(_))
        ));
    }
}
