//! Natural cubic spline through anchor points.
//!
//! The second derivatives at the knots solve a tridiagonal system
//!
//! ```text
//! h[i-1]/6 * M[i-1] + (h[i-1] + h[i])/3 * M[i] + h[i]/6 * M[i+1]
//!     = (y[i+1] - y[i]) / h[i] - (y[i] - y[i-1]) / h[i-1]
//! ```
//!
//! with `h[i] = x[i+1] - x[i]` and the natural boundary `M[0] = M[n-1] = 0`.
//! The system is solved in O(n) by forward elimination and back
//! substitution; a dense solver is never needed for n <= 50.

use crate::{CurveError, CurveResult};

/// Solves a tridiagonal system in place (Thomas algorithm).
///
/// `sub[i]` multiplies `x[i-1]`, `diag[i]` multiplies `x[i]` and `sup[i]`
/// multiplies `x[i+1]` in row `i`; `sub[0]` and `sup[n-1]` are ignored.
/// Returns `None` when a pivot vanishes.
pub fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Option<Vec<f64>> {
    let n = diag.len();
    debug_assert!(sub.len() == n && sup.len() == n && rhs.len() == n);
    if n == 0 {
        return Some(Vec::new());
    }

    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    if diag[0] == 0.0 {
        return None;
    }
    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];

    for i in 1..n {
        let pivot = diag[i] - sub[i] * c[i - 1];
        if pivot == 0.0 {
            return None;
        }
        c[i] = if i + 1 < n { sup[i] / pivot } else { 0.0 };
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / pivot;
    }

    for i in (0..n - 1).rev() {
        d[i] -= c[i] * d[i + 1];
    }
    Some(d)
}

/// Natural cubic spline over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct NaturalSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot.
    ypp: Vec<f64>,
}

impl NaturalSpline {
    /// Fits the spline through `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// - [`CurveError::InvalidAnchors`] for fewer than 2 knots, mismatched
    ///   lengths or non-increasing x
    /// - [`CurveError::Spline`] if the system is singular
    pub fn new(xs: &[f64], ys: &[f64]) -> CurveResult<Self> {
        let n = xs.len();
        if n < 2 || ys.len() != n {
            return Err(CurveError::InvalidAnchors(format!(
                "spline needs at least 2 matching knots, got {} x and {} y",
                n,
                ys.len()
            )));
        }
        if let Some(i) = (1..n).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(CurveError::InvalidAnchors(format!(
                "knot x not strictly increasing at index {}: {} after {}",
                i,
                xs[i],
                xs[i - 1]
            )));
        }

        let mut sub = vec![0.0; n];
        let mut diag = vec![1.0; n];
        let mut sup = vec![0.0; n];
        let mut rhs = vec![0.0; n];

        for i in 1..n - 1 {
            let h0 = xs[i] - xs[i - 1];
            let h1 = xs[i + 1] - xs[i];
            sub[i] = h0 / 6.0;
            diag[i] = (h0 + h1) / 3.0;
            sup[i] = h1 / 6.0;
            rhs[i] = (ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0;
        }

        let ypp = solve_tridiagonal(&sub, &diag, &sup, &rhs)
            .ok_or_else(|| CurveError::Spline("singular tridiagonal system".into()))?;

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            ypp,
        })
    }

    /// First knot x.
    #[inline]
    pub fn x_min(&self) -> f64 {
        self.xs[0]
    }

    /// Last knot x.
    #[inline]
    pub fn x_max(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Second derivatives at the knots.
    pub fn second_derivatives(&self) -> &[f64] {
        &self.ypp
    }

    /// Evaluates the spline at `t`.
    ///
    /// Outside the knot range the boundary polynomial is extended; callers
    /// that need flat extrapolation clamp `t` first.
    pub fn eval(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let h = self.xs[i + 1] - self.xs[i];
        let dt = t - self.xs[i];
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.ypp[i], self.ypp[i + 1]);

        y0 + dt
            * ((y1 - y0) / h - (m1 / 6.0 + m0 / 3.0) * h
                + dt * (0.5 * m0 + dt * ((m1 - m0) / (6.0 * h))))
    }

    /// Index `i` of the interval `[xs[i], xs[i+1]]` used for `t`.
    #[inline]
    fn interval(&self, t: f64) -> usize {
        // partition_point over the interior knots keeps i in 0..=n-2
        let last = self.xs.len() - 1;
        self.xs[1..last].partition_point(|&x| x <= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn tridiagonal_matches_known_solution() {
        // [2 1 0; 1 2 1; 0 1 2] * [1 2 3] = [4 8 8]
        let x = solve_tridiagonal(&[0.0, 1.0, 1.0], &[2.0, 2.0, 2.0], &[1.0, 1.0, 0.0], &[4.0, 8.0, 8.0])
            .unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn tridiagonal_zero_pivot() {
        assert!(solve_tridiagonal(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 0.0], &[1.0, 1.0]).is_none());
    }

    #[test]
    fn two_knots_are_linear() {
        let s = NaturalSpline::new(&[0.0, 1.0], &[0.2, 0.8]).unwrap();
        assert_abs_diff_eq!(s.eval(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s.eval(0.25), 0.35, epsilon = 1e-12);
    }

    #[test]
    fn passes_through_knots() {
        let xs = [0.0, 0.2, 0.5, 0.7, 1.0];
        let ys = [0.0, 0.3, 0.4, 0.8, 1.0];
        let s = NaturalSpline::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(s.eval(*x), *y, epsilon = 1e-12);
        }
        let ypp = s.second_derivatives();
        assert_eq!(ypp[0], 0.0);
        assert_eq!(ypp[4], 0.0);
    }

    #[test]
    fn reproduces_a_line() {
        let xs = [0.0, 0.1, 0.4, 0.9, 1.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.25 + 0.5 * x).collect();
        let s = NaturalSpline::new(&xs, &ys).unwrap();
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            assert_abs_diff_eq!(s.eval(t), 0.25 + 0.5 * t, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_unsorted_knots() {
        assert!(NaturalSpline::new(&[0.0, 0.5, 0.5, 1.0], &[0.0; 4]).is_err());
        assert!(NaturalSpline::new(&[0.0], &[0.0]).is_err());
    }
}
