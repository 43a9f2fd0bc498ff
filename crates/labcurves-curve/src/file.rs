//! Curve file format (`.dlc`).
//!
//! Curve files persist the anchors and the interpolation mode, never the
//! table; reading regenerates the table.
//!
//! # Format
//!
//! ```text
//! ;
//! ; LabCurves Curve File
//! ;
//! ; This curve was written from within LabCurves
//! ;
//! Spline
//! 0 0
//! 0.25 0.18
//! 1 1
//! ```
//!
//! - lines starting with `;` are comments, blank lines are ignored
//! - an optional `Spline` or `Linear` marker precedes the anchors
//!   (default `Spline`)
//! - every other line holds `x y`, two numbers in [0, 1], x increasing
//!
//! A plain list of `x y` lines is therefore a valid curve file.

use crate::{Curve, CurveChannel, CurveError, CurveResult, Interpolation, LUT_SIZE};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// File extension of curve files.
pub const CURVE_FILE_EXTENSION: &str = "dlc";

/// Header written by the tools when the user gives no description.
pub const DEFAULT_HEADER: &str = "LabCurves Curve File\n\nThis curve was written from within LabCurves";

impl Curve {
    /// Reads a curve file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let curve = Curve::from_file("contrast.dlc", CurveChannel::Lightness)?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P, channel: CurveChannel) -> CurveResult<Self> {
        let file = File::open(path.as_ref())?;
        let curve = Self::parse(BufReader::new(file), channel)?;
        debug!(path = %path.as_ref().display(), anchors = curve.anchors().len(), "curve read");
        Ok(curve)
    }

    /// Replaces this curve by the contents of a curve file, keeping the
    /// channel.
    ///
    /// The curve is untouched if reading or parsing fails.
    pub fn read_curve<P: AsRef<Path>>(&mut self, path: P) -> CurveResult<()> {
        *self = Self::from_file(path, self.channel())?;
        Ok(())
    }

    /// Parses a curve from a reader.
    pub fn parse<R: BufRead>(reader: R, channel: CurveChannel) -> CurveResult<Self> {
        let mut interpolation = None;
        let mut anchors = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (first, second, rest) = (fields.next(), fields.next(), fields.next());
            match (first, second, rest) {
                (Some(word), None, None) => {
                    let mode = Interpolation::from_keyword(word)
                        .ok_or_else(|| CurveError::parse(line_no, format!("unexpected '{word}'")))?;
                    if !anchors.is_empty() || interpolation.is_some() {
                        return Err(CurveError::parse(
                            line_no,
                            "interpolation marker must precede the anchors",
                        ));
                    }
                    interpolation = Some(mode);
                }
                (Some(x), Some(y), None) => {
                    let x = parse_coord(x, line_no)?;
                    let y = parse_coord(y, line_no)?;
                    anchors.push(crate::Anchor::new(x, y));
                }
                _ => {
                    return Err(CurveError::parse(line_no, "expected 'x y'"));
                }
            }
        }

        Curve::from_anchors(channel, anchors, interpolation.unwrap_or_default())
    }

    /// Writes the anchors to a curve file.
    ///
    /// `header` is free text written as comment lines; `None` writes no
    /// comments at all.
    ///
    /// # Errors
    ///
    /// [`CurveError::NotAnchorCurve`] for curves without anchors.
    pub fn write_curve<P: AsRef<Path>>(&self, path: P, header: Option<&str>) -> CurveResult<()> {
        if self.anchors().is_empty() {
            return Err(CurveError::NotAnchorCurve);
        }
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, header)?;
        writer.flush()?;
        debug!(path = %path.as_ref().display(), anchors = self.anchors().len(), "curve written");
        Ok(())
    }

    /// Writes the curve file text to any writer.
    pub fn write_to<W: Write>(&self, writer: &mut W, header: Option<&str>) -> CurveResult<()> {
        if self.anchors().is_empty() {
            return Err(CurveError::NotAnchorCurve);
        }
        if let Some(header) = header {
            writeln!(writer, ";")?;
            for line in header.lines() {
                let line = line.trim_start_matches(';').trim();
                if line.is_empty() {
                    writeln!(writer, ";")?;
                } else {
                    writeln!(writer, "; {line}")?;
                }
            }
            writeln!(writer, ";")?;
        }
        writeln!(writer, "{}", self.interpolation().keyword())?;
        for anchor in self.anchors() {
            writeln!(writer, "{} {}", anchor.x, anchor.y)?;
        }
        Ok(())
    }

    /// Writes `x y` samples of the table for plotting.
    ///
    /// One line every `scale` input levels; both columns are divided by
    /// `scale` (256 gives an 8-bit view of the curve).
    ///
    /// # Panics
    ///
    /// Panics if `scale` is zero.
    pub fn dump_data<P: AsRef<Path>>(&self, path: P, scale: u32) -> CurveResult<()> {
        assert!(scale > 0, "dump scale must be positive");
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        let scale_f = scale as f64;
        for i in (0..LUT_SIZE).step_by(scale as usize) {
            writeln!(writer, "{} {}", i as f64 / scale_f, self.lut()[i] as f64 / scale_f)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn parse_coord(token: &str, line: usize) -> CurveResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| CurveError::parse(line, format!("invalid number '{token}'")))
}
