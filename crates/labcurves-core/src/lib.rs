//! # labcurves-core
//!
//! Core types for LabCurves image processing.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - [`Image`] - Owned width x height buffer of 3-channel 16-bit pixels
//! - [`ColorSpace`] - The space the channel triplets are expressed in
//! - [`LabView`] - Single-channel isolation for Lab previews
//! - [`Error`], [`Result`] - Error handling for buffer operations
//!
//! ## Channel Semantics
//!
//! Every pixel holds three `u16` samples. Their meaning depends on the
//! buffer's [`ColorSpace`]: `R, G, B` for device RGB spaces, `L, a, b` for
//! [`ColorSpace::Lab`]. In the Lab encoding the chroma axes are centered on
//! [`LAB_NEUTRAL`] (`0x8080`).
//!
//! ## Crate Structure
//!
//! ```text
//! labcurves-core (this crate)
//!    ^
//!    |
//!    +-- labcurves-curve (curves, spline solver)
//!    +-- labcurves-ops (curve application)
//!    +-- labcurves-icc (Lab <-> RGB conversion)
//!    +-- labcurves-io (PNG/TIFF codecs)
//!    +-- labcurves-pipeline (processing pipeline, session)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod error;
pub mod image;

pub use colorspace::{ColorSpace, LabView, LAB_NEUTRAL};
pub use error::{Error, Result};
pub use image::{Image, Pixel, MAX_DIMENSION};

/// Prelude module for convenient imports.
///
/// ```
/// use labcurves_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::{ColorSpace, LabView, LAB_NEUTRAL};
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image, Pixel};
}
