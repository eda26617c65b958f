//! Sequential Beta-posterior accumulation of pass/fail verdicts.
//!
//! Each hash function gets a [`HashFunctionProfile`] keyed by name. Every
//! recorded verdict is a Bernoulli trial: a pass increments α, a fail
//! increments β. Updates build on the previous cumulative state, so after
//! `k` passes and `m` fails from prior `(α₀, β₀)` the profile holds
//! exactly `(α₀ + k, β₀ + m)` regardless of call order.
//!
//! Alongside the posterior, each profile keeps plain `tests_passed` /
//! `total_tests` counters that always start at zero, for a pass-rate
//! display independent of the prior.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::beta::BetaDistribution;

/// Running state for one hash function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashFunctionProfile {
    name: String,
    distribution: BetaDistribution,
    tests_passed: u64,
    total_tests: u64,
}

impl HashFunctionProfile {
    fn new(name: &str, prior: BetaDistribution) -> Self {
        Self {
            name: name.to_string(),
            distribution: prior,
            tests_passed: 0,
            total_tests: 0,
        }
    }

    fn update(&mut self, pass: bool) {
        self.distribution = self.distribution.observe(pass);
        self.total_tests += 1;
        if pass {
            self.tests_passed += 1;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current Beta(α, β) posterior.
    pub fn distribution(&self) -> BetaDistribution {
        self.distribution
    }

    pub fn tests_passed(&self) -> u64 {
        self.tests_passed
    }

    pub fn total_tests(&self) -> u64 {
        self.total_tests
    }

    /// Passed tests as a percentage of all tests.
    ///
    /// # Returns
    /// `None` before the first recorded test.
    pub fn pass_rate(&self) -> Option<f64> {
        if self.total_tests == 0 {
            return None;
        }
        Some(self.tests_passed as f64 / self.total_tests as f64 * 100.0)
    }
}

/// Session-scoped store of profiles, keyed by hash-function name.
///
/// Entries are created on first record and never removed; the whole store
/// is cleared with [`TrialAccumulator::reset`] when the session is
/// reconfigured.
///
/// # Examples
/// ```
/// use hashdist::beta::BetaDistribution;
/// use hashdist::trials::TrialAccumulator;
/// let mut acc = TrialAccumulator::new(BetaDistribution::uniform());
/// acc.record("fnv1a", true);
/// let d = acc.record("fnv1a", false);
/// assert_eq!((d.alpha(), d.beta()), (2.0, 2.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrialAccumulator {
    prior: BetaDistribution,
    profiles: BTreeMap<String, HashFunctionProfile>,
}

impl TrialAccumulator {
    /// Empty store whose new profiles start at `prior`.
    pub fn new(prior: BetaDistribution) -> Self {
        Self {
            prior,
            profiles: BTreeMap::new(),
        }
    }

    pub fn prior(&self) -> BetaDistribution {
        self.prior
    }

    /// Records one verdict for `key` and returns its updated posterior.
    ///
    /// The profile is created from the prior if absent.
    pub fn record(&mut self, key: &str, pass: bool) -> BetaDistribution {
        let prior = self.prior;
        let profile = self
            .profiles
            .entry(key.to_string())
            .or_insert_with(|| HashFunctionProfile::new(key, prior));
        profile.update(pass);

        let d = profile.distribution;
        debug!(
            hash = key,
            pass,
            alpha = d.alpha(),
            beta = d.beta(),
            total_tests = profile.total_tests,
            "recorded trial"
        );
        d
    }

    pub fn get(&self, key: &str) -> Option<&HashFunctionProfile> {
        self.profiles.get(key)
    }

    /// Profiles in name order.
    pub fn profiles(&self) -> impl Iterator<Item = &HashFunctionProfile> {
        self.profiles.values()
    }

    /// Read-only copy of every posterior, keyed by name.
    pub fn snapshot(&self) -> BTreeMap<String, BetaDistribution> {
        self.profiles
            .iter()
            .map(|(name, p)| (name.clone(), p.distribution))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Drops every profile; the prior is kept.
    pub fn reset(&mut self) {
        self.profiles.clear();
    }

    /// Drops every profile and switches to a new prior.
    pub fn reset_with_prior(&mut self, prior: BetaDistribution) {
        self.prior = prior;
        self.profiles.clear();
    }
}

impl Default for TrialAccumulator {
    fn default() -> Self {
        Self::new(BetaDistribution::uniform())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_record_starts_from_prior() {
        let mut acc = TrialAccumulator::default();
        let d = acc.record("xxhash", true);
        assert_eq!((d.alpha(), d.beta()), (2.0, 1.0));
        let p = acc.get("xxhash").unwrap();
        assert_eq!(p.tests_passed(), 1);
        assert_eq!(p.total_tests(), 1);
    }

    #[test]
    fn test_counters_independent_of_prior() {
        let prior = BetaDistribution::new(5.0, 3.0).unwrap();
        let mut acc = TrialAccumulator::new(prior);
        acc.record("fnv1a", false);
        acc.record("fnv1a", true);
        acc.record("fnv1a", false);
        let p = acc.get("fnv1a").unwrap();
        assert_eq!(p.distribution().alpha(), 6.0);
        assert_eq!(p.distribution().beta(), 5.0);
        assert_eq!(p.tests_passed(), 1);
        assert_eq!(p.total_tests(), 3);
    }

    #[test]
    fn test_keys_do_not_interfere() {
        let mut acc = TrialAccumulator::default();
        acc.record("a", true);
        acc.record("b", false);
        acc.record("a", true);
        assert_eq!(acc.get("a").unwrap().distribution().alpha(), 3.0);
        assert_eq!(acc.get("a").unwrap().distribution().beta(), 1.0);
        assert_eq!(acc.get("b").unwrap().distribution().alpha(), 1.0);
        assert_eq!(acc.get("b").unwrap().distribution().beta(), 2.0);
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_pass_rate() {
        let mut acc = TrialAccumulator::default();
        acc.record("h", true);
        acc.record("h", true);
        acc.record("h", false);
        acc.record("h", true);
        let rate = acc.get("h").unwrap().pass_rate().unwrap();
        assert!((rate - 75.0).abs() < 1e-12);
    }

    #[test]
    fn test_pass_rate_none_before_tests() {
        let p = HashFunctionProfile::new("h", BetaDistribution::uniform());
        assert_eq!(p.pass_rate(), None);
    }

    #[test]
    fn test_snapshot_and_order() {
        let mut acc = TrialAccumulator::default();
        acc.record("zeta", true);
        acc.record("alpha", false);
        let names: Vec<_> = acc.profiles().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        let snap = acc.snapshot();
        assert_eq!(snap["zeta"].alpha(), 2.0);
        assert_eq!(snap["alpha"].beta(), 2.0);
    }

    #[test]
    fn test_reset() {
        let mut acc = TrialAccumulator::default();
        acc.record("a", true);
        acc.reset();
        assert!(acc.is_empty());
        assert!(acc.get("a").is_none());

        let prior = BetaDistribution::new(2.0, 2.0).unwrap();
        acc.reset_with_prior(prior);
        let d = acc.record("a", true);
        assert_eq!((d.alpha(), d.beta()), (3.0, 2.0));
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let mut acc = TrialAccumulator::default();
        acc.record("fnv1a", true);
        let json = serde_json::to_value(acc.get("fnv1a").unwrap()).unwrap();
        assert_eq!(json["name"], "fnv1a");
        assert_eq!(json["testsPassed"], 1);
        assert_eq!(json["totalTests"], 1);
        assert_eq!(json["distribution"]["alpha"], 2.0);
        assert_eq!(json["distribution"]["beta"], 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn posterior_is_prior_plus_counts(
            a0 in 0.1_f64..10.0,
            b0 in 0.1_f64..10.0,
            verdicts in proptest::collection::vec(any::<bool>(), 0..200),
        ) {
            let prior = BetaDistribution::new(a0, b0).unwrap();
            let mut acc = TrialAccumulator::new(prior);
            for &v in &verdicts {
                acc.record("h", v);
            }
            let k = verdicts.iter().filter(|&&v| v).count() as f64;
            let m = verdicts.len() as f64 - k;
            match acc.get("h") {
                Some(p) => {
                    prop_assert!((p.distribution().alpha() - (a0 + k)).abs() < 1e-9);
                    prop_assert!((p.distribution().beta() - (b0 + m)).abs() < 1e-9);
                    prop_assert_eq!(p.total_tests(), verdicts.len() as u64);
                }
                None => prop_assert!(verdicts.is_empty()),
            }
        }

        #[test]
        fn order_independent(
            verdicts in proptest::collection::vec(any::<bool>(), 1..100),
        ) {
            let mut forward = TrialAccumulator::default();
            let mut backward = TrialAccumulator::default();
            for &v in &verdicts {
                forward.record("h", v);
            }
            for &v in verdicts.iter().rev() {
                backward.record("h", v);
            }
            prop_assert_eq!(forward.snapshot(), backward.snapshot());
            prop_assert_eq!(
                forward.get("h").map(|p| p.tests_passed()),
                backward.get("h").map(|p| p.tests_passed())
            );
        }
    }
}
