//! Beta distribution summaries for pass/fail posteriors.
//!
//! A [`BetaDistribution`] tracks the belief that a hash function produces
//! uniform bucket distributions: `alpha` counts uniform verdicts, `beta`
//! counts non-uniform ones (each plus the prior). This module evaluates
//! the density, mode, CDF and quantiles of Beta(α, β) and derives the
//! plotting primitives consumed by a rendering layer: confidence bounds,
//! the [`ProbabilityArea`] rectangle and sampled [`CurvePoint`]s.
//!
//! # Mathematical Definition
//! ```text
//! f(x; α, β) = x^(α−1) · (1−x)^(β−1) / B(α, β),   x ∈ [0, 1]
//! F(x; α, β) = I_x(α, β)
//! mode       = (α − 1) / (α + β − 2)               for α, β > 1
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{HashDistError, Result};
use crate::special;

/// Beta(α, β) on `[0, 1]`.
///
/// Both shape parameters are validated at construction, so every
/// accessor below is infallible except the ones taking a probability or a
/// confidence percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BetaDistribution {
    alpha: f64,
    beta: f64,
}

impl BetaDistribution {
    /// Creates Beta(α, β).
    ///
    /// # Errors
    /// Returns [`HashDistError::Domain`] if either parameter is not a
    /// finite value `> 0`.
    ///
    /// # Examples
    /// ```
    /// use hashdist::beta::BetaDistribution;
    /// let d = BetaDistribution::new(3.0, 2.0).unwrap();
    /// assert!((d.mode() - 2.0 / 3.0).abs() < 1e-12);
    /// assert!(BetaDistribution::new(0.0, 1.0).is_err());
    /// ```
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(HashDistError::domain(format!(
                "Beta alpha must be finite and > 0, got {alpha}"
            )));
        }
        if !beta.is_finite() || beta <= 0.0 {
            return Err(HashDistError::domain(format!(
                "Beta beta must be finite and > 0, got {beta}"
            )));
        }
        Ok(Self { alpha, beta })
    }

    /// Beta(1, 1), the uniform (uninformative) prior.
    pub fn uniform() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns a copy with `alpha` (on success) or `beta` (on failure)
    /// incremented by one.
    pub fn observe(&self, success: bool) -> Self {
        if success {
            Self {
                alpha: self.alpha + 1.0,
                ..*self
            }
        } else {
            Self {
                beta: self.beta + 1.0,
                ..*self
            }
        }
    }

    /// Mean = α / (α + β).
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Probability density at `x`.
    ///
    /// Outside `[0, 1]` the density is 0. At the boundaries the limit is
    /// returned: `+∞` when the corresponding shape parameter is `< 1`,
    /// the other parameter when it is exactly 1 (`f(0; 1, β) = β`), and 0
    /// when it is `> 1`.
    ///
    /// # Returns
    /// `NaN` if `x` is NaN.
    ///
    /// # Examples
    /// ```
    /// use hashdist::beta::BetaDistribution;
    /// let d = BetaDistribution::new(2.0, 2.0).unwrap();
    /// // f(x) = 6x(1−x)
    /// assert!((d.density(0.5) - 1.5).abs() < 1e-9);
    /// assert_eq!(d.density(0.0), 0.0);
    /// ```
    pub fn density(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if !(0.0..=1.0).contains(&x) {
            return 0.0;
        }
        if x == 0.0 {
            return boundary_density(self.alpha, self.beta);
        }
        if x == 1.0 {
            return boundary_density(self.beta, self.alpha);
        }
        let ln_pdf = (self.alpha - 1.0) * x.ln() + (self.beta - 1.0) * (1.0 - x).ln()
            - special::ln_beta(self.alpha, self.beta);
        ln_pdf.exp()
    }

    /// The location of highest density.
    ///
    /// For α, β > 1 this is `(α − 1) / (α + β − 2)`. Degenerate shapes
    /// resolve to a boundary:
    ///
    /// | shape | mode |
    /// |---|---|
    /// | α = β = 1 (flat) | 0.5 |
    /// | α ≤ 1 ≤ β | 0 |
    /// | β ≤ 1 ≤ α | 1 |
    /// | α < 1, β < 1 (U-shaped) | 0 |
    pub fn mode(&self) -> f64 {
        let (a, b) = (self.alpha, self.beta);
        if a > 1.0 && b > 1.0 {
            (a - 1.0) / (a + b - 2.0)
        } else if a == 1.0 && b == 1.0 {
            0.5
        } else if a <= 1.0 && b >= 1.0 {
            0.0
        } else if a >= 1.0 && b <= 1.0 {
            1.0
        } else {
            // U-shaped: both boundaries are modes, report the lower one.
            0.0
        }
    }

    /// Density at the mode, the peak height used for plotting.
    pub fn highest_density(&self) -> f64 {
        self.density(self.mode())
    }

    /// CDF F(x) = I_x(α, β).
    pub fn cdf(&self, x: f64) -> f64 {
        special::regularized_incomplete_beta(x, self.alpha, self.beta)
    }

    /// Inverse CDF: the `x` with `F(x) = p`.
    ///
    /// # Algorithm
    /// Bisection on `[0, 1]`. The CDF is continuous and strictly
    /// increasing on the open interval, so this always converges.
    ///
    /// # Errors
    /// Returns [`HashDistError::Domain`] if `p` is NaN or outside `[0, 1]`.
    ///
    /// # Examples
    /// ```
    /// use hashdist::beta::BetaDistribution;
    /// // Beta(2,1): F(x) = x², so F⁻¹(p) = √p
    /// let d = BetaDistribution::new(2.0, 1.0).unwrap();
    /// assert!((d.quantile(0.25).unwrap() - 0.5).abs() < 1e-9);
    /// ```
    pub fn quantile(&self, p: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(HashDistError::domain(format!(
                "quantile probability must be in [0, 1], got {p}"
            )));
        }
        if p == 0.0 {
            return Ok(0.0);
        }
        if p == 1.0 {
            return Ok(1.0);
        }

        let mut lo = 0.0_f64;
        let mut hi = 1.0_f64;
        for _ in 0..200 {
            let mid = (lo + hi) / 2.0;
            if hi - lo < 1e-15 {
                break;
            }
            if self.cdf(mid) < p {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok((lo + hi) / 2.0)
    }

    /// Quantile bounds for a confidence percentage in `(0, 100)`.
    ///
    /// With `k = confidence_percentage / 100`, `low = F⁻¹(k)` and
    /// `high = F⁻¹(1 − k)`. `k` is therefore the probability mass left in
    /// each tail: `2.5` gives the central 95% interval, `50` collapses both
    /// bounds onto the median, and for `k > 0.5` the bounds cross
    /// (`low > high`).
    ///
    /// # Errors
    /// Returns [`HashDistError::Domain`] if the percentage is not in `(0, 100)`.
    pub fn confidence_bounds(&self, confidence_percentage: f64) -> Result<ConfidenceBounds> {
        if !(confidence_percentage > 0.0 && confidence_percentage < 100.0) {
            return Err(HashDistError::domain(format!(
                "confidence percentage must be in (0, 100), got {confidence_percentage}"
            )));
        }
        let k = confidence_percentage / 100.0;
        Ok(ConfidenceBounds {
            low: self.quantile(k)?,
            high: self.quantile(1.0 - k)?,
        })
    }

    /// Rectangle spanning the confidence bounds horizontally and
    /// `[0, highest_density]` vertically.
    ///
    /// # Errors
    /// Same as [`BetaDistribution::confidence_bounds`].
    pub fn probability_area(&self, confidence_percentage: f64) -> Result<ProbabilityArea> {
        let bounds = self.confidence_bounds(confidence_percentage)?;
        Ok(ProbabilityArea {
            x1: bounds.low,
            x2: bounds.high,
            y1: 0.0,
            y2: self.highest_density(),
        })
    }
}

impl Default for BetaDistribution {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Density at the boundary where the shape parameter `near` applies.
fn boundary_density(near: f64, far: f64) -> f64 {
    if near < 1.0 {
        f64::INFINITY
    } else if near == 1.0 {
        // f = (1−x)^(far−1) / B(1, far) → far
        far
    } else {
        0.0
    }
}

/// Lower and upper quantile bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBounds {
    pub low: f64,
    pub high: f64,
}

/// Confidence-region overlay rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbabilityArea {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
}

/// One sampled x position with the density of every variant.
///
/// Serializes flat, as `{"x": 0.5, "fnv1a": 1.2, "xxhash": 0.9}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    #[serde(flatten)]
    pub densities: BTreeMap<String, f64>,
}

/// Finest grid spacing [`density_curve`] accepts; one million points.
pub const MIN_CURVE_INCREMENT: f64 = 1e-6;

/// Samples the densities of several named distributions on a grid.
///
/// Grid points are `0, increment, 2·increment, …` up to 1. A point is
/// kept only if at least one variant's density exceeds `density_floor`,
/// which trims the flat tails from the plot.
///
/// # Errors
/// Returns [`HashDistError::Config`] if `increment` is not in
/// `[MIN_CURVE_INCREMENT, 1]`.
pub fn density_curve(
    variants: &BTreeMap<String, BetaDistribution>,
    increment: f64,
    density_floor: f64,
) -> Result<Vec<CurvePoint>> {
    if !(MIN_CURVE_INCREMENT..=1.0).contains(&increment) {
        return Err(HashDistError::config(format!(
            "curve increment must be in [{MIN_CURVE_INCREMENT}, 1], got {increment}"
        )));
    }

    let steps = (1.0 / increment + 1e-9).floor() as usize;
    let mut points = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let x = (i as f64 * increment).min(1.0);
        let densities: BTreeMap<String, f64> = variants
            .iter()
            .map(|(name, dist)| (name.clone(), dist.density(x)))
            .collect();
        if densities.values().any(|&d| d > density_floor) {
            points.push(CurvePoint { x, densities });
        }
    }
    Ok(points)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn quantile_is_monotonic(
            a in 0.5_f64..60.0,
            b in 0.5_f64..60.0,
            p1 in 0.0_f64..=1.0,
            p2 in 0.0_f64..=1.0,
        ) {
            let d = BetaDistribution::new(a, b).unwrap();
            let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
            prop_assert!(d.quantile(lo).unwrap() <= d.quantile(hi).unwrap() + 1e-12);
        }

        #[test]
        fn quantile_roundtrip(a in 1.0_f64..60.0, b in 1.0_f64..60.0, p in 0.01_f64..0.99) {
            let d = BetaDistribution::new(a, b).unwrap();
            let x = d.quantile(p).unwrap();
            prop_assert!((d.cdf(x) - p).abs() < 1e-8, "F(F⁻¹({p})) = {}", d.cdf(x));
        }

        #[test]
        fn density_non_negative(a in 0.2_f64..50.0, b in 0.2_f64..50.0, x in 0.0_f64..=1.0) {
            let d = BetaDistribution::new(a, b).unwrap();
            prop_assert!(d.density(x) >= 0.0);
        }

        #[test]
        fn mode_maximizes_density(a in 1.01_f64..40.0, b in 1.01_f64..40.0, x in 0.001_f64..0.999) {
            let d = BetaDistribution::new(a, b).unwrap();
            prop_assert!(d.density(x) <= d.highest_density() * (1.0 + 1e-9));
        }

        #[test]
        fn mode_in_unit_interval(a in 0.1_f64..40.0, b in 0.1_f64..40.0) {
            let m = BetaDistribution::new(a, b).unwrap().mode();
            prop_assert!((0.0..=1.0).contains(&m));
        }
    }
}
