//! Fixed tone functions over the unit box.
//!
//! Each [`ToneFunction`] maps x in [0, 1] to y in [0, 1] and carries its own
//! parameters, so a curve can be filled from it without a shared
//! "function plus spare arguments" signature.
//!
//! # Reference
//!
//! - sRGB: IEC 61966-2-1:1999
//! - BT.709: ITU-R BT.709-6 OETF
//! - Gamma tool: the two-parameter gamma with a linear toe used by ufraw

use serde::{Deserialize, Serialize};

/// A pure tone function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum ToneFunction {
    /// sRGB encoding (linear to display).
    Srgb,
    /// sRGB decoding (display to linear).
    InverseSrgb,
    /// BT.709 OETF, as used by dcraw.
    Bt709,
    /// Pure 1/2.2 power.
    Pure22,
    /// Power `gamma` with a C1-continuous linear segment below `linearity`.
    GammaTool {
        /// Exponent of the power segment (e.g. 0.45).
        gamma: f64,
        /// Input level where the linear segment ends, in [0, 1).
        linearity: f64,
    },
    /// [`GammaTool`](Self::GammaTool) followed by sRGB decoding, for flows
    /// that apply the sRGB encoding later on their own.
    DeltaGammaTool {
        /// Exponent of the power segment.
        gamma: f64,
        /// Input level where the linear segment ends.
        linearity: f64,
    },
}

impl ToneFunction {
    /// Evaluates the function at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            Self::Srgb => srgb(x),
            Self::InverseSrgb => inverse_srgb(x),
            Self::Bt709 => bt709(x),
            Self::Pure22 => x.max(0.0).powf(1.0 / 2.2),
            Self::GammaTool { gamma, linearity } => gamma_tool(x, gamma, linearity),
            Self::DeltaGammaTool { gamma, linearity } => inverse_srgb(gamma_tool(x, gamma, linearity)),
        }
    }
}

/// sRGB OETF.
///
/// ```text
/// if x <= 0.0031308: 12.92 * x
/// else:              1.055 * x^(1/2.4) - 0.055
/// ```
#[inline]
pub fn srgb(x: f64) -> f64 {
    if x <= 0.0031308 {
        x * 12.92
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB EOTF, the inverse of [`srgb`].
#[inline]
pub fn inverse_srgb(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// BT.709 OETF.
#[inline]
pub fn bt709(x: f64) -> f64 {
    if x < 0.018 {
        4.5 * x
    } else {
        1.099 * x.powf(0.45) - 0.099
    }
}

/// Gamma with a linear toe.
///
/// Above `linearity` the output is `(a*x + b)^gamma`, below it `c*x`, where
/// `a`, `b`, `c` make the result pass through (1, 1) and join the two
/// segments with matching value and slope.
///
/// ```text
/// a = 1 / (1 + linearity * (gamma - 1))
/// b = linearity * (gamma - 1) * a
/// c = (a * linearity + b)^gamma / linearity
/// ```
///
/// `linearity <= 0` gives a pure power, `linearity >= 1` the identity.
pub fn gamma_tool(x: f64, gamma: f64, linearity: f64) -> f64 {
    if gamma <= 0.0 || linearity >= 1.0 {
        return x;
    }
    if linearity <= 0.0 {
        return x.max(0.0).powf(gamma);
    }
    let a = 1.0 / (1.0 + linearity * (gamma - 1.0));
    let b = linearity * (gamma - 1.0) * a;
    if x < linearity {
        let c = (a * linearity + b).powf(gamma) / linearity;
        c * x
    } else {
        (a * x + b).powf(gamma)
    }
}
