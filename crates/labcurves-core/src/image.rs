//! Pixel buffer for LabCurves processing.
//!
//! [`Image`] owns a flat, row-major array of `width * height` pixels, each a
//! triplet of 16-bit samples:
//!
//! ```text
//! Memory: [[c0 c1 c2] [c0 c1 c2] [c0 c1 c2] ...]  <- Row 0
//!         [[c0 c1 c2] [c0 c1 c2] [c0 c1 c2] ...]  <- Row 1
//!         ...
//! ```
//!
//! Three channels are always allocated, even for operations that only touch
//! one. Ownership is exclusive: [`Clone`] performs a deep copy, and no two
//! live buffers share storage.
//!
//! # Parallelism
//!
//! Per-pixel operations split the flat index range across the rayon pool;
//! crop and bin split by output row. Workers write disjoint ranges, so no
//! locking is involved.
//!
//! # Usage
//!
//! ```rust
//! use labcurves_core::{ColorSpace, Image};
//!
//! let mut img = Image::filled(4, 4, ColorSpace::Lab, [0x4000, 0x8080, 0x8080]);
//! let small = img.binned(1);
//! assert_eq!((small.width(), small.height()), (2, 2));
//!
//! let corner = img.cropped(1, 1, 2, 2);
//! assert_eq!(corner.pixel(0, 0), [0x4000, 0x8080, 0x8080]);
//!
//! img.crop_in_place(0, 0, 2, 2);
//! assert_eq!(img.width(), 2);
//! ```

use crate::{ColorSpace, Error, LabView, Result, LAB_NEUTRAL};
use rayon::prelude::*;
use std::fmt;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// One pixel: three 16-bit samples whose meaning follows the color space.
pub type Pixel = [u16; 3];

/// Largest supported width or height.
pub const MAX_DIMENSION: u32 = 0xFFFF;

/// Largest supported bin exponent.
///
/// A `2^7 x 2^7` block of `0xFFFF` samples still fits the `u32` accumulator.
const MAX_BIN_SCALE: u32 = 7;

/// Owned 3-channel 16-bit pixel buffer tagged with a [`ColorSpace`].
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    data: Vec<Pixel>,
    width: u32,
    height: u32,
    color_space: ColorSpace,
    /// Bit depth of the source the pixels were acquired from (8 or 16).
    bit_depth: u8,
}

impl Image {
    /// Creates a zero-filled buffer.
    ///
    /// # Panics
    ///
    /// Panics if either dimension exceeds [`MAX_DIMENSION`].
    pub fn new(width: u32, height: u32, color_space: ColorSpace) -> Self {
        Self::filled(width, height, color_space, [0; 3])
    }

    /// Creates a buffer with every pixel set to `value`.
    ///
    /// # Panics
    ///
    /// Panics if either dimension exceeds [`MAX_DIMENSION`].
    pub fn filled(width: u32, height: u32, color_space: ColorSpace, value: Pixel) -> Self {
        assert!(
            width <= MAX_DIMENSION && height <= MAX_DIMENSION,
            "image {width}x{height} exceeds the {MAX_DIMENSION} pixel limit"
        );
        Self {
            data: vec![value; width as usize * height as usize],
            width,
            height,
            color_space,
            bit_depth: 16,
        }
    }

    /// Creates a buffer from decoded pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if a dimension exceeds
    /// [`MAX_DIMENSION`] or `data.len() != width * height`.
    pub fn from_data(width: u32, height: u32, color_space: ColorSpace, data: Vec<Pixel>) -> Result<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("limit is {MAX_DIMENSION} per side"),
            ));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} pixels, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            color_space,
            bit_depth: 16,
        })
    }

    /// Sets the acquisition bit depth, builder style.
    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a zero-area buffer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Declared color space of the channel triplets.
    #[inline]
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Retags the buffer after an external conversion rewrote its pixels.
    #[inline]
    pub fn set_color_space(&mut self, color_space: ColorSpace) {
        self.color_space = color_space;
    }

    /// Bit depth at acquisition.
    #[inline]
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// All pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.data
    }

    /// All pixels, row-major, mutable.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.data
    }

    /// Consumes the buffer and returns its pixels.
    pub fn into_data(self) -> Vec<Pixel> {
        self.data
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the buffer.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        self.data[self.index(x, y)]
    }

    /// Sets the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the buffer.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: Pixel) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Returns row `y`.
    #[inline]
    pub fn row(&self, y: u32) -> &[Pixel] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    /// Sets every pixel to `value`.
    pub fn fill(&mut self, value: Pixel) {
        self.data.par_iter_mut().for_each(|p| *p = value);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for image {}x{}",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    /// Returns a new buffer holding the `w x h` rectangle at `(x, y)`.
    ///
    /// The source is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the rectangle is empty or leaves the buffer. Use
    /// [`checked_cropped`](Self::checked_cropped) for user-supplied regions.
    pub fn cropped(&self, x: u32, y: u32, w: u32, h: u32) -> Image {
        assert!(w > 0 && h > 0, "empty crop rectangle {w}x{h}");
        assert!(
            x as u64 + w as u64 <= self.width as u64 && y as u64 + h as u64 <= self.height as u64,
            "crop ({x}, {y}, {w}x{h}) exceeds image bounds {}x{}",
            self.width,
            self.height
        );
        trace!(x, y, w, h, "Image::cropped");

        let src_width = self.width as usize;
        let mut out = Image {
            data: vec![[0; 3]; w as usize * h as usize],
            width: w,
            height: h,
            color_space: self.color_space,
            bit_depth: self.bit_depth,
        };
        out.data
            .par_chunks_mut(w as usize)
            .enumerate()
            .for_each(|(row, dst)| {
                let start = (y as usize + row) * src_width + x as usize;
                dst.copy_from_slice(&self.data[start..start + w as usize]);
            });
        out
    }

    /// Replaces the buffer by its `w x h` rectangle at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Same contract as [`cropped`](Self::cropped).
    pub fn crop_in_place(&mut self, x: u32, y: u32, w: u32, h: u32) {
        *self = self.cropped(x, y, w, h);
    }

    /// Like [`cropped`](Self::cropped) but reports a bad rectangle as an error.
    pub fn checked_cropped(&self, x: u32, y: u32, w: u32, h: u32) -> Result<Image> {
        let fits = w > 0
            && h > 0
            && x as u64 + w as u64 <= self.width as u64
            && y as u64 + h as u64 <= self.height as u64;
        if !fits {
            return Err(Error::invalid_region(x, y, w, h, self.width, self.height));
        }
        Ok(self.cropped(x, y, w, h))
    }

    /// Box-downsamples by `2^scale` per axis into a new buffer.
    ///
    /// The output is `(width >> scale) x (height >> scale)`. Each output
    /// sample is the integer mean of its `2^scale x 2^scale` source block,
    /// computed by summing and shifting right by `2 * scale`. Source rows
    /// and columns beyond the last full block are dropped. `scale == 0`
    /// returns an unchanged copy.
    ///
    /// # Panics
    ///
    /// Panics if `scale > 7` or the result would have zero area.
    pub fn binned(&self, scale: u32) -> Image {
        if scale == 0 {
            return self.clone();
        }
        assert!(scale <= MAX_BIN_SCALE, "bin scale {scale} exceeds {MAX_BIN_SCALE}");
        let new_width = self.width >> scale;
        let new_height = self.height >> scale;
        assert!(
            new_width > 0 && new_height > 0,
            "binning {}x{} by 2^{scale} leaves no pixels",
            self.width,
            self.height
        );
        debug!(
            from_w = self.width,
            from_h = self.height,
            to_w = new_width,
            to_h = new_height,
            "Image::binned"
        );

        let step = 1usize << scale;
        let shift = 2 * scale;
        let src_width = self.width as usize;
        let mut out = Image {
            data: vec![[0; 3]; new_width as usize * new_height as usize],
            width: new_width,
            height: new_height,
            color_space: self.color_space,
            bit_depth: self.bit_depth,
        };
        out.data
            .par_chunks_mut(new_width as usize)
            .enumerate()
            .for_each(|(out_y, dst)| {
                let top = out_y * step;
                for (out_x, px) in dst.iter_mut().enumerate() {
                    let left = out_x * step;
                    let mut sum = [0u32; 3];
                    for row in top..top + step {
                        let start = row * src_width + left;
                        for src in &self.data[start..start + step] {
                            sum[0] += src[0] as u32;
                            sum[1] += src[1] as u32;
                            sum[2] += src[2] as u32;
                        }
                    }
                    *px = [
                        (sum[0] >> shift) as u16,
                        (sum[1] >> shift) as u16,
                        (sum[2] >> shift) as u16,
                    ];
                }
            });
        out
    }

    /// Box-downsamples in place. `scale == 0` leaves the buffer untouched.
    ///
    /// # Panics
    ///
    /// Same contract as [`binned`](Self::binned).
    pub fn bin_in_place(&mut self, scale: u32) {
        if scale != 0 {
            *self = self.binned(scale);
        }
    }

    /// Isolates one Lab channel for display.
    ///
    /// - [`LabView::L`]: a and b become neutral
    /// - [`LabView::A`]: a is copied into L, then a and b become neutral
    /// - [`LabView::B`]: b is copied into L, then a and b become neutral
    /// - [`LabView::Lab`]: no change
    ///
    /// The transform is not reversible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorSpaceMismatch`] unless the buffer is Lab.
    pub fn view_lab(&mut self, view: LabView) -> Result<()> {
        if self.color_space != ColorSpace::Lab {
            return Err(Error::color_space_mismatch(ColorSpace::Lab, self.color_space));
        }
        let source = match view {
            LabView::Lab => return Ok(()),
            LabView::L => 0,
            LabView::A => 1,
            LabView::B => 2,
        };
        self.data.par_iter_mut().for_each(|px| {
            px[0] = px[source];
            px[1] = LAB_NEUTRAL;
            px[2] = LAB_NEUTRAL;
        });
        Ok(())
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color_space", &self.color_space)
            .field("bit_depth", &self.bit_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 Lab buffer where pixel (x, y) = [x + 10 * y, 100 + x, 200 + y].
    fn numbered() -> Image {
        let data = (0..16u16)
            .map(|i| {
                let (x, y) = (i % 4, i / 4);
                [x + 10 * y, 100 + x, 200 + y]
            })
            .collect();
        Image::from_data(4, 4, ColorSpace::Lab, data).unwrap()
    }

    #[test]
    fn test_new_and_access() {
        let mut img = Image::new(3, 2, ColorSpace::SrgbD65);
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.len(), 6);
        assert_eq!(img.bit_depth(), 16);
        img.set_pixel(2, 1, [1, 2, 3]);
        assert_eq!(img.pixel(2, 1), [1, 2, 3]);
        assert_eq!(img.row(1)[2], [1, 2, 3]);
    }

    #[test]
    fn test_from_data_length_mismatch() {
        let err = Image::from_data(2, 2, ColorSpace::Lab, vec![[0; 3]; 3]).unwrap_err();
        assert!(err.to_string().contains("expected 4 pixels"));
    }

    #[test]
    fn test_from_data_too_large() {
        assert!(Image::from_data(70_000, 0, ColorSpace::Lab, Vec::new()).is_err());
    }

    #[test]
    fn test_clone_is_deep() {
        let a = numbered();
        let mut b = a.clone();
        b.set_pixel(0, 0, [9, 9, 9]);
        assert_eq!(a.pixel(0, 0), [0, 100, 200]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cropped_keeps_source() {
        let img = numbered();
        let crop = img.cropped(1, 1, 2, 2);
        assert_eq!(crop.dimensions(), (2, 2));
        assert_eq!(crop.pixel(0, 0), [11, 101, 201]);
        assert_eq!(crop.pixel(1, 0), [12, 102, 201]);
        assert_eq!(crop.pixel(0, 1), [21, 101, 202]);
        assert_eq!(crop.pixel(1, 1), [22, 102, 202]);
        assert_eq!(img, numbered());
    }

    #[test]
    fn test_crop_in_place() {
        let mut img = numbered();
        img.crop_in_place(2, 0, 2, 3);
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.pixel(0, 2), [22, 102, 202]);
    }

    #[test]
    #[should_panic(expected = "exceeds image bounds")]
    fn test_crop_out_of_bounds_panics() {
        numbered().cropped(3, 3, 2, 2);
    }

    #[test]
    fn test_checked_crop_reports_error() {
        let err = numbered().checked_cropped(3, 3, 2, 2).unwrap_err();
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_bin_constant() {
        let img = Image::filled(4, 4, ColorSpace::Lab, [0x1234, 0x8080, 0x7000]);
        let small = img.binned(1);
        assert_eq!(small.dimensions(), (2, 2));
        assert!(small.pixels().iter().all(|p| *p == [0x1234, 0x8080, 0x7000]));
    }

    #[test]
    fn test_bin_averages_blocks() {
        let small = numbered().binned(1);
        // Top-left block: L = 0, 1, 10, 11 -> 22 / 4 = 5
        assert_eq!(small.pixel(0, 0), [5, 100, 200]);
        // Bottom-right block: L = 22, 23, 32, 33 -> 110 / 4 = 27
        assert_eq!(small.pixel(1, 1), [27, 102, 202]);
    }

    #[test]
    fn test_bin_drops_partial_blocks() {
        let img = Image::filled(7, 5, ColorSpace::Lab, [0xffff; 3]);
        let small = img.binned(2);
        assert_eq!(small.dimensions(), (1, 1));
        assert_eq!(small.pixel(0, 0), [0xffff; 3]);
    }

    #[test]
    fn test_bin_zero_is_noop() {
        let mut img = numbered();
        img.bin_in_place(0);
        assert_eq!(img, numbered());
        assert_eq!(numbered().binned(0), numbered());
    }

    #[test]
    fn test_view_lab() {
        let mut img = Image::filled(2, 2, ColorSpace::Lab, [0x4000, 0x9000, 0x7000]);
        img.view_lab(LabView::A).unwrap();
        assert_eq!(img.pixel(1, 1), [0x9000, LAB_NEUTRAL, LAB_NEUTRAL]);

        let mut img = Image::filled(2, 2, ColorSpace::Lab, [0x4000, 0x9000, 0x7000]);
        img.view_lab(LabView::L).unwrap();
        assert_eq!(img.pixel(0, 0), [0x4000, LAB_NEUTRAL, LAB_NEUTRAL]);

        let mut img = Image::filled(2, 2, ColorSpace::Lab, [0x4000, 0x9000, 0x7000]);
        img.view_lab(LabView::B).unwrap();
        assert_eq!(img.pixel(0, 1), [0x7000, LAB_NEUTRAL, LAB_NEUTRAL]);
    }

    #[test]
    fn test_view_lab_requires_lab() {
        let mut img = Image::new(2, 2, ColorSpace::SrgbD65);
        assert!(img.view_lab(LabView::L).is_err());
    }
}
