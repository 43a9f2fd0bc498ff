//! PNG format support.
//!
//! Reads 8- and 16-bit grayscale, RGB and their alpha variants (palette
//! and sub-byte images are expanded to 8 bits); alpha is dropped. Writes
//! RGB at the image's acquisition bit depth with an iCCP chunk.
//!
//! # Example
//!
//! ```rust,ignore
//! use labcurves_io::png;
//!
//! let decoded = png::read("input.png")?;
//! png::write("output.png", &decoded.image, decoded.icc.as_deref())?;
//! ```

use crate::{expand_samples, narrow_sample, Decoded, IoError, IoResult};
use labcurves_core::Image;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Decoded> {
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let icc = reader.info().icc_profile.as_ref().map(|p| p.to_vec());

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let bytes = &buf[..info.buffer_size()];

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => {
            return Err(IoError::DecodeError("palette was not expanded".into()));
        }
    };

    let (samples, bit_depth) = match info.bit_depth {
        png::BitDepth::Eight => (bytes.iter().map(|&v| v as u16 * 257).collect(), 8),
        png::BitDepth::Sixteen => (bytes_to_u16(bytes), 16),
        other => {
            return Err(IoError::UnsupportedBitDepth(format!("{:?} {:?}", info.color_type, other)));
        }
    };

    trace!(width = info.width, height = info.height, channels, bit_depth, "png decoded");
    Decoded::new(info.width, info.height, expand_samples(&samples, channels), bit_depth, icc)
}

/// Writes an RGB image to a PNG file, embedding `icc` when given.
///
/// Images acquired at 8 bits are written with 8 bits per sample, all
/// others with 16.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, icc: Option<&[u8]>) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);

    let eight_bit = image.bit_depth() == 8;
    let mut info = png::Info::with_size(image.width(), image.height());
    info.color_type = png::ColorType::Rgb;
    info.bit_depth = if eight_bit {
        png::BitDepth::Eight
    } else {
        png::BitDepth::Sixteen
    };
    info.icc_profile = icc.map(Cow::Borrowed);

    let encoder = png::Encoder::with_info(writer, info).map_err(|e| IoError::EncodeError(e.to_string()))?;
    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    let data: Vec<u8> = if eight_bit {
        image.pixels().iter().flatten().map(|&v| narrow_sample(v)).collect()
    } else {
        image.pixels().iter().flatten().flat_map(|v| v.to_be_bytes()).collect()
    };

    png_writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer.finish().map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(())
}

/// Converts big-endian byte slice to u16 vector.
fn bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcurves_core::ColorSpace;

    fn gradient(bit_depth: u8) -> Image {
        let data = (0..32 * 16u32)
            .map(|i| {
                let v = (i * 127) as u16;
                if bit_depth == 8 {
                    let b = (i % 256) as u16 * 257;
                    [b, 0xffff - b, 0x8080]
                } else {
                    [v, v.wrapping_mul(3), 0xffff - v]
                }
            })
            .collect();
        Image::from_data(32, 16, ColorSpace::SrgbD65, data)
            .unwrap()
            .with_bit_depth(bit_depth)
    }

    #[test]
    fn roundtrip_16bit_with_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.png");
        let image = gradient(16);
        let icc = b"embedded profile bytes".to_vec();

        write(&path, &image, Some(&icc)).unwrap();
        let decoded = read(&path).unwrap();

        assert_eq!(decoded.icc.as_deref(), Some(&icc[..]));
        assert_eq!(decoded.image.color_space(), ColorSpace::Profiled);
        assert_eq!(decoded.image.bit_depth(), 16);
        assert_eq!(decoded.image.pixels(), image.pixels());
    }

    #[test]
    fn roundtrip_8bit_without_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test8.png");
        let image = gradient(8);

        write(&path, &image, None).unwrap();
        let decoded = read(&path).unwrap();

        assert!(decoded.icc.is_none());
        assert_eq!(decoded.image.color_space(), ColorSpace::SrgbD65);
        assert_eq!(decoded.image.bit_depth(), 8);
        assert_eq!(decoded.image.pixels(), image.pixels());
    }

    #[test]
    fn gray_is_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let file = File::create(&path).unwrap();
        let mut encoder = png::Encoder::new(BufWriter::new(file), 2, 1);
        encoder.set_color(png::ColorType::GrayscaleAlpha);
        encoder.set_depth(png::BitDepth::Eight);
        let mut w = encoder.write_header().unwrap();
        w.write_image_data(&[10, 255, 200, 0]).unwrap();
        w.finish().unwrap();

        let decoded = read(&path).unwrap();
        assert_eq!(decoded.image.pixel(0, 0), [2570; 3]);
        assert_eq!(decoded.image.pixel(1, 0), [51400; 3]);
    }
}
