//! TIFF format support.
//!
//! Reads 8- and 16-bit grayscale and RGB (with or without alpha, which is
//! dropped) together with the ICC profile tag. Writes LZW-compressed RGB at
//! the image's acquisition bit depth.

use crate::{expand_samples, narrow_sample, Decoded, IoError, IoResult};
use labcurves_core::Image;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::tags::Tag;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// TIFF tag holding an embedded ICC profile.
const ICC_PROFILE_TAG: u16 = 34675;

/// Reads a TIFF file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Decoded> {
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::ColorType;

    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(BufReader::new(file)).map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;
    let color_type = decoder
        .colortype()
        .map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;
    let icc = decoder.get_tag_u8_vec(Tag::from_u16_exhaustive(ICC_PROFILE_TAG)).ok();

    let result = decoder
        .read_image()
        .map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;

    let (samples, channels, bit_depth) = match (color_type, result) {
        (ColorType::Gray(8), DecodingResult::U8(buf)) => (widen(&buf), 1, 8),
        (ColorType::GrayA(8), DecodingResult::U8(buf)) => (widen(&buf), 2, 8),
        (ColorType::RGB(8), DecodingResult::U8(buf)) => (widen(&buf), 3, 8),
        (ColorType::RGBA(8), DecodingResult::U8(buf)) => (widen(&buf), 4, 8),
        (ColorType::Gray(16), DecodingResult::U16(buf)) => (buf, 1, 16),
        (ColorType::GrayA(16), DecodingResult::U16(buf)) => (buf, 2, 16),
        (ColorType::RGB(16), DecodingResult::U16(buf)) => (buf, 3, 16),
        (ColorType::RGBA(16), DecodingResult::U16(buf)) => (buf, 4, 16),
        (ct, _) => {
            return Err(IoError::UnsupportedBitDepth(format!("TIFF color type {:?}", ct)));
        }
    };

    trace!(width, height, channels, bit_depth, icc = icc.is_some(), "tiff decoded");
    Decoded::new(width, height, expand_samples(&samples, channels), bit_depth, icc)
}

/// Writes an RGB image to a TIFF file, embedding `icc` when given.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, icc: Option<&[u8]>) -> IoResult<()> {
    use tiff::encoder::{colortype, Compression, TiffEncoder};

    let file = File::create(path.as_ref())?;
    let mut encoder = TiffEncoder::new(file)
        .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?
        .with_compression(Compression::Lzw);
    let (width, height) = image.dimensions();
    let icc_tag = Tag::from_u16_exhaustive(ICC_PROFILE_TAG);

    if image.bit_depth() == 8 {
        let data: Vec<u8> = image.pixels().iter().flatten().map(|&v| narrow_sample(v)).collect();
        let mut tiff_image = encoder
            .new_image::<colortype::RGB8>(width, height)
            .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;
        if let Some(icc) = icc {
            tiff_image
                .encoder()
                .write_tag(icc_tag, icc)
                .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;
        }
        tiff_image
            .write_data(&data)
            .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;
    } else {
        let data: Vec<u16> = image.pixels().iter().flatten().copied().collect();
        let mut tiff_image = encoder
            .new_image::<colortype::RGB16>(width, height)
            .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;
        if let Some(icc) = icc {
            tiff_image
                .encoder()
                .write_tag(icc_tag, icc)
                .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;
        }
        tiff_image
            .write_data(&data)
            .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;
    }
    Ok(())
}

fn widen(buf: &[u8]) -> Vec<u16> {
    buf.iter().map(|&v| v as u16 * 257).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcurves_core::ColorSpace;

    fn ramp(bit_depth: u8) -> Image {
        let data = (0..24 * 20u32)
            .map(|i| {
                let v = if bit_depth == 8 { (i % 256) as u16 * 257 } else { (i * 131) as u16 };
                [v, 0xffff - v, v / 2]
            })
            .collect();
        Image::from_data(24, 20, ColorSpace::SrgbD65, data)
            .unwrap()
            .with_bit_depth(bit_depth)
    }

    #[test]
    fn roundtrip_16bit_with_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.tif");
        let image = ramp(16);
        let icc: Vec<u8> = (0..=255u8).collect();

        write(&path, &image, Some(&icc)).unwrap();
        let decoded = read(&path).unwrap();

        assert_eq!(decoded.icc.as_deref(), Some(&icc[..]));
        assert_eq!(decoded.image.color_space(), ColorSpace::Profiled);
        assert_eq!(decoded.image.bit_depth(), 16);
        assert_eq!(decoded.image.pixels(), image.pixels());
    }

    #[test]
    fn roundtrip_8bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test8.tiff");
        let image = ramp(8);

        write(&path, &image, None).unwrap();
        let decoded = read(&path).unwrap();

        assert!(decoded.icc.is_none());
        assert_eq!(decoded.image.bit_depth(), 8);
        assert_eq!(decoded.image.pixels(), image.pixels());
    }
}
