//! Goodness-of-fit tests of bucket counts against the uniform distribution.
//!
//! # Tests
//!
//! - **Chi-squared**: `χ² = Σ (Oᵢ − E)² / E` with `E = n / b`. A run passes
//!   when `χ² ≤ b`. This threshold is a fixed heuristic (roughly "χ² no
//!   larger than its degrees of freedom plus one"), not a lookup against the
//!   χ²(b−1) distribution; it is kept because changing it changes pass rates.
//! - **Kolmogorov–Smirnov**: `D = maxᵢ |F̂(i) − (i+1)/b|` where `F̂` is the
//!   empirical CDF over buckets. A run passes when `D ≤ 1.36 / √n`, the
//!   large-sample two-sided critical value at α = 0.05.
//!   Reference: Massey (1951), "The Kolmogorov-Smirnov Test for Goodness of
//!   Fit", *JASA* 46(253).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HashDistError, Result};
use crate::simulate::BucketCounts;

/// Asymptotic two-sided KS coefficient at the 5% significance level.
pub const KS_COEFFICIENT_5PCT: f64 = 1.36;

/// How the two sub-tests combine into one pass/fail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictPolicy {
    /// Both chi-squared and KS must pass.
    #[default]
    CombinedStrict,
    /// Only the KS test decides.
    KsOnly,
}

/// Outcome of testing one run's bucket counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestVerdict {
    pub chi_squared: f64,
    pub chi_squared_pass: bool,
    pub ks_statistic: f64,
    pub ks_critical_value: f64,
    pub ks_pass: bool,
    /// Combined verdict under the tester's [`VerdictPolicy`].
    pub pass: bool,
}

/// Sum of counts, rejecting empty input and a zero total.
fn checked_total(counts: &[u64]) -> Result<u64> {
    if counts.is_empty() {
        return Err(HashDistError::config("bucket counts are empty"));
    }
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return Err(HashDistError::config(
            "bucket counts sum to zero, nothing to test",
        ));
    }
    Ok(total)
}

/// Pearson's chi-squared statistic against a uniform expectation.
///
/// # Complexity
/// Time: O(b), Space: O(1)
///
/// # Errors
/// [`HashDistError::Config`] if `counts` is empty or sums to zero.
///
/// # Examples
/// ```
/// use hashdist::uniformity::chi_squared;
/// assert_eq!(chi_squared(&[100, 100, 100, 100]).unwrap(), 0.0);
/// assert_eq!(chi_squared(&[1000, 0, 0, 0]).unwrap(), 3000.0);
/// ```
pub fn chi_squared(counts: &[u64]) -> Result<f64> {
    let total = checked_total(counts)?;
    let expected = total as f64 / counts.len() as f64;
    Ok(chi_squared_with_expected(counts, expected))
}

/// `Σ (Oᵢ − E)² / E` for a caller-supplied expectation `E > 0`.
pub(crate) fn chi_squared_with_expected(counts: &[u64], expected: f64) -> f64 {
    counts
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

/// KS statistic `D` between the bucket-level empirical CDF and the
/// discrete uniform CDF `(i + 1) / b`.
///
/// Always in `[0, 1]`.
///
/// # Complexity
/// Time: O(b), Space: O(1)
///
/// # Errors
/// [`HashDistError::Config`] if `counts` is empty or sums to zero.
///
/// # Examples
/// ```
/// use hashdist::uniformity::ks_statistic;
/// assert_eq!(ks_statistic(&[250, 250, 250, 250]).unwrap(), 0.0);
/// assert!((ks_statistic(&[1000, 0, 0, 0]).unwrap() - 0.75).abs() < 1e-12);
/// ```
pub fn ks_statistic(counts: &[u64]) -> Result<f64> {
    let total = checked_total(counts)? as f64;
    let buckets = counts.len() as f64;

    let mut cumulative = 0_u64;
    let mut d_max = 0.0_f64;
    for (i, &count) in counts.iter().enumerate() {
        cumulative += count;
        let ecdf = cumulative as f64 / total;
        let uniform = (i + 1) as f64 / buckets;
        d_max = d_max.max((ecdf - uniform).abs());
    }
    Ok(d_max)
}

/// Critical value `1.36 / √n` for `n` samples.
///
/// # Returns
/// `+∞` for `n = 0`.
pub fn ks_critical_value(total_samples: u64) -> f64 {
    KS_COEFFICIENT_5PCT / (total_samples as f64).sqrt()
}

/// Applies both tests and combines them per [`VerdictPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformityTester {
    policy: VerdictPolicy,
}

impl UniformityTester {
    pub fn new(policy: VerdictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> VerdictPolicy {
        self.policy
    }

    /// Tests a completed run.
    ///
    /// # Errors
    /// [`HashDistError::Config`] if the counts are empty or sum to zero.
    pub fn test(&self, counts: &BucketCounts) -> Result<TestVerdict> {
        self.test_counts(counts.counts())
    }

    /// Tests a raw count slice.
    ///
    /// # Errors
    /// [`HashDistError::Config`] if `counts` is empty or sums to zero.
    pub fn test_counts(&self, counts: &[u64]) -> Result<TestVerdict> {
        let total = checked_total(counts)?;
        let buckets = counts.len();

        let chi_squared = chi_squared_with_expected(counts, total as f64 / buckets as f64);
        let chi_squared_pass = chi_squared <= buckets as f64;

        let ks_statistic = ks_statistic(counts)?;
        let ks_critical_value = ks_critical_value(total);
        let ks_pass = ks_statistic <= ks_critical_value;

        let pass = match self.policy {
            VerdictPolicy::CombinedStrict => chi_squared_pass && ks_pass,
            VerdictPolicy::KsOnly => ks_pass,
        };

        debug!(
            buckets,
            total,
            chi_squared,
            ks_statistic,
            ks_critical_value,
            pass,
            "uniformity verdict"
        );

        Ok(TestVerdict {
            chi_squared,
            chi_squared_pass,
            ks_statistic,
            ks_critical_value,
            ks_pass,
            pass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- chi_squared ---

    #[test]
    fn test_chi_squared_perfectly_uniform() {
        assert_eq!(chi_squared(&[100, 100, 100, 100]).unwrap(), 0.0);
    }

    #[test]
    fn test_chi_squared_maximal_skew() {
        assert_eq!(chi_squared(&[1000, 0, 0, 0]).unwrap(), 3000.0);
    }

    #[test]
    fn test_chi_squared_small_deviation() {
        // E = 50: (10² + 10²) / 50 = 4
        assert!((chi_squared(&[60, 40]).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_chi_squared_non_integer_expectation() {
        // n = 10, b = 3, E = 10/3
        let e = 10.0 / 3.0;
        let expected = ((4.0 - e) * (4.0 - e) + 2.0 * (3.0 - e) * (3.0 - e)) / e;
        assert!((chi_squared(&[4, 3, 3]).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_chi_squared_rejects_bad_input() {
        assert!(chi_squared(&[]).unwrap_err().is_config());
        assert!(chi_squared(&[0, 0, 0]).unwrap_err().is_config());
    }

    // --- ks ---

    #[test]
    fn test_ks_uniform_is_zero() {
        assert_eq!(ks_statistic(&[250, 250, 250, 250]).unwrap(), 0.0);
    }

    #[test]
    fn test_ks_maximal_skew() {
        let d = ks_statistic(&[1000, 0, 0, 0]).unwrap();
        assert!((d - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_ks_skew_at_the_end() {
        // ECDF stays 0 until the last bucket; max gap is (b−1)/b.
        let d = ks_statistic(&[0, 0, 0, 0, 500]).unwrap();
        assert!((d - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_ks_single_bucket() {
        assert_eq!(ks_statistic(&[17]).unwrap(), 0.0);
    }

    #[test]
    fn test_ks_rejects_bad_input() {
        assert!(ks_statistic(&[]).unwrap_err().is_config());
        assert!(ks_statistic(&[0, 0]).unwrap_err().is_config());
    }

    #[test]
    fn test_ks_critical_value() {
        assert!((ks_critical_value(1000) - 0.043_007).abs() < 1e-5);
        assert!((ks_critical_value(100) - 0.136).abs() < 1e-12);
        assert_eq!(ks_critical_value(0), f64::INFINITY);
    }

    // --- tester ---

    #[test]
    fn test_uniform_counts_pass() {
        let tester = UniformityTester::default();
        let v = tester.test_counts(&[100, 100, 100, 100]).unwrap();
        assert_eq!(v.chi_squared, 0.0);
        assert_eq!(v.ks_statistic, 0.0);
        assert!(v.chi_squared_pass && v.ks_pass && v.pass);
    }

    #[test]
    fn test_skewed_counts_fail_both() {
        let tester = UniformityTester::new(VerdictPolicy::CombinedStrict);
        let v = tester.test_counts(&[1000, 0, 0, 0]).unwrap();
        assert!(!v.chi_squared_pass);
        assert!(!v.ks_pass);
        assert!(!v.pass);
    }

    #[test]
    fn test_policy_ks_only_ignores_chi_squared() {
        // Alternating ±15 around E = 100: D = 0.015 stays under the
        // critical value 0.043, but χ² = 10·15²/100 = 22.5 > b = 10.
        let counts = [115, 85, 115, 85, 115, 85, 115, 85, 115, 85];
        let strict = UniformityTester::new(VerdictPolicy::CombinedStrict)
            .test_counts(&counts)
            .unwrap();
        let ks_only = UniformityTester::new(VerdictPolicy::KsOnly)
            .test_counts(&counts)
            .unwrap();
        assert!((strict.chi_squared - 22.5).abs() < 1e-9);
        assert!(!strict.chi_squared_pass);
        assert!(strict.ks_pass, "D = {}", strict.ks_statistic);
        assert!(!strict.pass);
        assert!(ks_only.pass);
    }

    #[test]
    fn test_chi_squared_threshold_is_inclusive() {
        // E = 50: (55−50)²/50 + (45−50)²/50 = 1 ≤ b = 2
        let v = UniformityTester::default().test_counts(&[55, 45]).unwrap();
        assert!((v.chi_squared - 1.0).abs() < 1e-12);
        assert!(v.chi_squared_pass);
        // E = 50: (60−50)²/50·2 = 4 > 2
        let v = UniformityTester::default().test_counts(&[60, 40]).unwrap();
        assert!(!v.chi_squared_pass);
    }

    #[test]
    fn test_tester_rejects_bad_input() {
        let tester = UniformityTester::default();
        assert!(tester.test_counts(&[]).is_err());
        assert!(tester.test_counts(&[0]).is_err());
    }

    #[test]
    fn test_verdict_serializes_camel_case() {
        let v = UniformityTester::default().test_counts(&[5, 5]).unwrap();
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["chiSquared"], 0.0);
        assert_eq!(json["ksStatistic"], 0.0);
        assert_eq!(json["pass"], true);
    }

    #[test]
    fn test_policy_serde_names() {
        let p: VerdictPolicy = serde_json::from_str("\"ks-only\"").unwrap();
        assert_eq!(p, VerdictPolicy::KsOnly);
        assert_eq!(
            serde_json::to_string(&VerdictPolicy::CombinedStrict).unwrap(),
            "\"combined-strict\""
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn chi_squared_non_negative(counts in proptest::collection::vec(0_u64..1000, 1..40)) {
            prop_assume!(counts.iter().sum::<u64>() > 0);
            prop_assert!(chi_squared(&counts).unwrap() >= 0.0);
        }

        #[test]
        fn chi_squared_zero_for_equal_counts(c in 1_u64..10_000, b in 1_usize..64) {
            let counts = vec![c; b];
            prop_assert_eq!(chi_squared(&counts).unwrap(), 0.0);
        }

        #[test]
        fn ks_in_unit_interval(counts in proptest::collection::vec(0_u64..1000, 1..40)) {
            prop_assume!(counts.iter().sum::<u64>() > 0);
            let d = ks_statistic(&counts).unwrap();
            prop_assert!((0.0..=1.0).contains(&d), "D = {d}");
        }

        #[test]
        fn equal_counts_always_pass(c in 1_u64..10_000, b in 1_usize..64) {
            let v = UniformityTester::default().test_counts(&vec![c; b]).unwrap();
            prop_assert!(v.pass);
        }
    }
}
