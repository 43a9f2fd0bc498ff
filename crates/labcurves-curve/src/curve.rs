//! Tone curves with a dense 16-bit lookup table.
//!
//! A [`Curve`] is described by up to [`MAX_ANCHORS`] user anchors in the unit
//! square and realized as a [`LUT_SIZE`]-entry table mapping every 16-bit
//! input level to a 16-bit output level. The table is derived: it is
//! regenerated after every anchor edit and never edited directly.
//!
//! # Interpolation
//!
//! - [`Interpolation::Spline`]: natural cubic spline through the anchors
//! - [`Interpolation::Linear`]: straight segments between anchors
//!
//! Both are evaluated at each of the 65536 input levels. Inputs left of the
//! first anchor take the first anchor's y, inputs right of the last anchor
//! the last anchor's y, so the table never overshoots outside the anchored
//! range.
//!
//! # Example
//!
//! ```rust
//! use labcurves_curve::{Anchor, Curve, CurveChannel, Interpolation};
//!
//! let mut curve = Curve::new(CurveChannel::Lightness);
//! curve.set_interpolation(Interpolation::Linear).unwrap();
//! curve.set_anchors(vec![Anchor::new(0.0, 0.0), Anchor::new(1.0, 1.0)]).unwrap();
//! assert_eq!(curve.lookup(0x1234), 0x1234);
//! ```

use crate::spline::NaturalSpline;
use crate::{CurveError, CurveResult, ToneFunction};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Number of table entries, one per 16-bit input level.
pub const LUT_SIZE: usize = 0x10000;

/// Maximum number of anchors per curve.
pub const MAX_ANCHORS: usize = 50;

/// Minimum x distance kept between neighboring anchors while editing.
pub const ANCHOR_MIN_GAP: f64 = 0.005;

/// Table value of a saturation curve that leaves chroma unchanged.
///
/// The saturation factor is `lut / 0x7fff`, so this value is exactly 1.
pub const SATURATION_NEUTRAL: u16 = 0x7fff;

const MAX_SAMPLE: f64 = 0xffff as f64;

/// Channel a curve is intended for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveChannel {
    /// Lab lightness.
    #[serde(alias = "l")]
    Lightness,
    /// Lab `a` chroma axis.
    #[serde(alias = "a")]
    ChromaA,
    /// Lab `b` chroma axis.
    #[serde(alias = "b")]
    ChromaB,
    /// Saturation factor curve.
    Saturation,
}

impl CurveChannel {
    /// All channels in pipeline order.
    pub const ALL: [Self; 4] = [Self::Lightness, Self::ChromaA, Self::ChromaB, Self::Saturation];

    /// Position in [`ALL`](Self::ALL).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Lightness => 0,
            Self::ChromaA => 1,
            Self::ChromaB => 2,
            Self::Saturation => 3,
        }
    }

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lightness => "L",
            Self::ChromaA => "a",
            Self::ChromaB => "b",
            Self::Saturation => "saturation",
        }
    }
}

impl fmt::Display for CurveChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the table of a curve was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// Dense table only (tone function or composition); no anchors.
    Full,
    /// Table derived from the anchor list.
    Anchor,
}

/// Interpolation between anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Natural cubic spline.
    #[default]
    Spline,
    /// Piecewise linear.
    Linear,
}

impl Interpolation {
    /// Keyword used in curve files.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Spline => "Spline",
            Self::Linear => "Linear",
        }
    }

    /// Parses a curve file keyword, case-insensitively.
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("spline") {
            Some(Self::Spline)
        } else if word.eq_ignore_ascii_case("linear") {
            Some(Self::Linear)
        } else {
            None
        }
    }
}

/// Order of a curve composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionOrder {
    /// The other curve is applied to the output of this one:
    /// `other[self[i]]`.
    AfterThis,
    /// The other curve is applied first: `self[other[i]]`.
    BeforeThis,
}

/// A control point in the unit square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Input level in [0, 1].
    pub x: f64,
    /// Output level in [0, 1].
    pub y: f64,
}

impl Anchor {
    /// Creates an anchor.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A tone curve and its 65536-entry lookup table.
///
/// [`Clone`] copies the anchors and the full table.
#[derive(Clone, PartialEq)]
pub struct Curve {
    channel: CurveChannel,
    kind: CurveKind,
    interpolation: Interpolation,
    anchors: Vec<Anchor>,
    lut: Vec<u16>,
}

impl Curve {
    /// Creates the null curve for `channel`.
    ///
    /// See [`set_null_curve`](Self::set_null_curve).
    pub fn new(channel: CurveChannel) -> Self {
        let mut curve = Self {
            channel,
            kind: CurveKind::Anchor,
            interpolation: Interpolation::Spline,
            anchors: Vec::new(),
            lut: vec![0; LUT_SIZE],
        };
        curve.set_null_curve(channel);
        curve
    }

    /// Creates a curve from anchors.
    ///
    /// # Errors
    ///
    /// Same as [`set_anchors`](Self::set_anchors).
    pub fn from_anchors(
        channel: CurveChannel,
        anchors: Vec<Anchor>,
        interpolation: Interpolation,
    ) -> CurveResult<Self> {
        let mut curve = Self::new(channel);
        curve.interpolation = interpolation;
        curve.set_anchors(anchors)?;
        Ok(curve)
    }

    /// Creates a dense curve sampled from a tone function.
    pub fn from_function(channel: CurveChannel, function: &ToneFunction) -> Self {
        let mut curve = Self::new(channel);
        curve.set_curve_from_function(function);
        curve
    }

    /// Intended channel.
    #[inline]
    pub fn channel(&self) -> CurveChannel {
        self.channel
    }

    /// Whether the table comes from anchors or was filled directly.
    #[inline]
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Interpolation mode used for anchor curves.
    #[inline]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Anchors, sorted by x. Empty for [`CurveKind::Full`] curves.
    #[inline]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// The dense table.
    #[inline]
    pub fn lut(&self) -> &[u16] {
        &self.lut
    }

    /// Maps one 16-bit level through the table.
    #[inline]
    pub fn lookup(&self, value: u16) -> u16 {
        self.lut[value as usize]
    }

    /// Changes the interpolation mode, regenerating the table of an anchor
    /// curve.
    ///
    /// # Errors
    ///
    /// Same as [`set_curve_from_anchors`](Self::set_curve_from_anchors).
    pub fn set_interpolation(&mut self, interpolation: Interpolation) -> CurveResult<()> {
        if self.interpolation == interpolation {
            return Ok(());
        }
        let previous = self.interpolation;
        self.interpolation = interpolation;
        if self.kind == CurveKind::Anchor {
            if let Err(e) = self.set_curve_from_anchors() {
                self.interpolation = previous;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Replaces the anchors and regenerates the table.
    ///
    /// The curve is left unchanged if the anchors are rejected.
    ///
    /// # Errors
    ///
    /// - [`CurveError::InvalidAnchors`] for fewer than 2 anchors, values
    ///   outside [0, 1] or x not strictly increasing
    /// - [`CurveError::TooManyAnchors`] beyond [`MAX_ANCHORS`]
    pub fn set_anchors(&mut self, anchors: Vec<Anchor>) -> CurveResult<()> {
        if anchors.len() < 2 {
            return Err(CurveError::InvalidAnchors(format!(
                "need at least 2 anchors, got {}",
                anchors.len()
            )));
        }
        let lut = build_lut(&anchors, self.interpolation)?;
        self.anchors = anchors;
        self.lut = lut;
        self.kind = CurveKind::Anchor;
        Ok(())
    }

    /// Regenerates the table from the current anchors.
    ///
    /// # Panics
    ///
    /// Panics with fewer than 2 anchors; callers keep at least two.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the table untouched, if the anchors are
    /// structurally invalid (non-increasing x, values outside the box).
    pub fn set_curve_from_anchors(&mut self) -> CurveResult<()> {
        assert!(
            self.anchors.len() >= 2,
            "{} curve rebuilt with {} anchors",
            self.channel,
            self.anchors.len()
        );
        self.lut = build_lut(&self.anchors, self.interpolation)?;
        self.kind = CurveKind::Anchor;
        Ok(())
    }

    /// Fills the table from a tone function sampled over the unit box.
    ///
    /// The curve becomes [`CurveKind::Full`] and loses its anchors.
    pub fn set_curve_from_function(&mut self, function: &ToneFunction) {
        trace!(?function, "Curve::set_curve_from_function");
        self.set_curve_from_fn(|x| function.eval(x));
    }

    /// Fills the table from an arbitrary function of x in [0, 1].
    pub fn set_curve_from_fn<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64 + Sync,
    {
        fill_lut(&mut self.lut, f);
        self.anchors.clear();
        self.kind = CurveKind::Full;
    }

    /// Resets to the no-op curve of `channel`.
    ///
    /// For L, a and b this is the identity (`lut[i] = i`) with anchors
    /// (0, 0) and (1, 1). For saturation it is the horizontal line whose
    /// table is [`SATURATION_NEUTRAL`], i.e. a factor of exactly 1.
    pub fn set_null_curve(&mut self, channel: CurveChannel) {
        self.channel = channel;
        self.kind = CurveKind::Anchor;
        if channel == CurveChannel::Saturation {
            let y = SATURATION_NEUTRAL as f64 / MAX_SAMPLE;
            self.anchors = vec![Anchor::new(0.0, y), Anchor::new(1.0, y)];
            self.lut.clear();
            self.lut.resize(LUT_SIZE, SATURATION_NEUTRAL);
        } else {
            self.anchors = vec![Anchor::new(0.0, 0.0), Anchor::new(1.0, 1.0)];
            self.lut.clear();
            self.lut.extend(0..=u16::MAX);
        }
    }

    /// Changes the intended channel without touching the table.
    pub(crate) fn retag(&mut self, channel: CurveChannel) {
        self.channel = channel;
    }

    /// Returns the composition of this curve with `other`.
    ///
    /// Composition is not commutative; `order` picks which curve runs
    /// first. The result is a [`CurveKind::Full`] curve for this curve's
    /// channel.
    pub fn compose(&self, other: &Curve, order: CompositionOrder) -> Curve {
        let lut = (0..LUT_SIZE)
            .into_par_iter()
            .map(|i| match order {
                CompositionOrder::AfterThis => other.lut[self.lut[i] as usize],
                CompositionOrder::BeforeThis => self.lut[other.lut[i] as usize],
            })
            .collect();
        Curve {
            channel: self.channel,
            kind: CurveKind::Full,
            interpolation: self.interpolation,
            anchors: Vec::new(),
            lut,
        }
    }

    /// Inserts an anchor at `x`, taking y from the current table.
    ///
    /// Returns the index of the new anchor.
    ///
    /// # Errors
    ///
    /// - [`CurveError::NotAnchorCurve`] for dense curves
    /// - [`CurveError::TooManyAnchors`] when the curve is full
    /// - [`CurveError::InvalidAnchors`] when `x` lies within
    ///   [`ANCHOR_MIN_GAP`] of an existing anchor
    pub fn insert_anchor(&mut self, x: f64) -> CurveResult<usize> {
        if self.kind != CurveKind::Anchor {
            return Err(CurveError::NotAnchorCurve);
        }
        if self.anchors.len() >= MAX_ANCHORS {
            return Err(CurveError::TooManyAnchors {
                count: self.anchors.len() + 1,
                max: MAX_ANCHORS,
            });
        }
        let x = x.clamp(0.0, 1.0);
        if self.anchors.iter().any(|a| (a.x - x).abs() < ANCHOR_MIN_GAP) {
            return Err(CurveError::InvalidAnchors(format!(
                "x = {x} is too close to an existing anchor"
            )));
        }
        let y = self.lut[(x * MAX_SAMPLE).round() as usize] as f64 / MAX_SAMPLE;
        let index = self.anchors.partition_point(|a| a.x < x);

        let mut anchors = self.anchors.clone();
        anchors.insert(index, Anchor::new(x, y));
        self.set_anchors(anchors)?;
        debug!(channel = %self.channel, index, x, y, "anchor inserted");
        Ok(index)
    }

    /// Deletes anchor `index` if more than two anchors remain.
    ///
    /// Returns `false` when the deletion was refused.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn delete_anchor(&mut self, index: usize) -> CurveResult<bool> {
        assert!(index < self.anchors.len(), "anchor index {index} out of range");
        if self.anchors.len() <= 2 {
            return Ok(false);
        }
        let mut anchors = self.anchors.clone();
        anchors.remove(index);
        self.set_anchors(anchors)?;
        Ok(true)
    }

    /// Moves anchor `index` towards `(x, y)`.
    ///
    /// x is kept at least [`ANCHOR_MIN_GAP`] away from both neighbors and
    /// inside [0, 1]; y is clamped to [0, 1].
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn move_anchor(&mut self, index: usize, x: f64, y: f64) -> CurveResult<()> {
        let n = self.anchors.len();
        assert!(index < n, "anchor index {index} out of range");

        let lower = if index > 0 {
            self.anchors[index - 1].x + ANCHOR_MIN_GAP
        } else {
            0.0
        };
        let upper = if index + 1 < n {
            self.anchors[index + 1].x - ANCHOR_MIN_GAP
        } else {
            1.0
        };
        let (lower, upper) = (lower.max(0.0), upper.min(1.0));

        let mut anchors = self.anchors.clone();
        if lower <= upper {
            anchors[index].x = x.clamp(lower, upper);
        }
        anchors[index].y = y.clamp(0.0, 1.0);
        self.set_anchors(anchors)
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve")
            .field("channel", &self.channel)
            .field("kind", &self.kind)
            .field("interpolation", &self.interpolation)
            .field("anchors", &self.anchors)
            .finish_non_exhaustive()
    }
}

fn validate_anchors(anchors: &[Anchor]) -> CurveResult<()> {
    if anchors.len() > MAX_ANCHORS {
        return Err(CurveError::TooManyAnchors {
            count: anchors.len(),
            max: MAX_ANCHORS,
        });
    }
    let in_box = |v: f64| (0.0..=1.0).contains(&v);
    if let Some(a) = anchors.iter().find(|a| !in_box(a.x) || !in_box(a.y)) {
        return Err(CurveError::InvalidAnchors(format!(
            "anchor ({}, {}) outside the unit square",
            a.x, a.y
        )));
    }
    if let Some(w) = anchors.windows(2).find(|w| w[1].x <= w[0].x) {
        return Err(CurveError::InvalidAnchors(format!(
            "x not strictly increasing: {} after {}",
            w[1].x, w[0].x
        )));
    }
    Ok(())
}

fn build_lut(anchors: &[Anchor], interpolation: Interpolation) -> CurveResult<Vec<u16>> {
    validate_anchors(anchors)?;
    let first = anchors[0];
    let last = anchors[anchors.len() - 1];
    let mut lut = vec![0u16; LUT_SIZE];

    match interpolation {
        Interpolation::Spline => {
            let xs: Vec<f64> = anchors.iter().map(|a| a.x).collect();
            let ys: Vec<f64> = anchors.iter().map(|a| a.y).collect();
            let spline = NaturalSpline::new(&xs, &ys)?;
            fill_lut(&mut lut, |x| {
                if x <= first.x {
                    first.y
                } else if x >= last.x {
                    last.y
                } else {
                    spline.eval(x)
                }
            });
        }
        Interpolation::Linear => {
            fill_lut(&mut lut, |x| {
                if x <= first.x {
                    return first.y;
                }
                if x >= last.x {
                    return last.y;
                }
                let i = anchors.partition_point(|a| a.x <= x);
                let (a0, a1) = (anchors[i - 1], anchors[i]);
                a0.y + (x - a0.x) * (a1.y - a0.y) / (a1.x - a0.x)
            });
        }
    }
    trace!(anchors = anchors.len(), ?interpolation, "lut rebuilt");
    Ok(lut)
}

/// Evaluates `f` at every input level and stores the rounded, clamped result.
fn fill_lut<F>(lut: &mut [u16], f: F)
where
    F: Fn(f64) -> f64 + Sync,
{
    lut.par_iter_mut().enumerate().for_each(|(i, v)| {
        *v = to_sample(f(i as f64 / MAX_SAMPLE));
    });
}

#[inline]
fn to_sample(y: f64) -> u16 {
    if y.is_nan() {
        return 0;
    }
    (y.clamp(0.0, 1.0) * MAX_SAMPLE).round() as u16
}
