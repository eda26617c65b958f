//! Bucket simulation: random identifiers → hash → bucket counts.
//!
//! A run draws `samples` fresh identifiers from an [`IdSource`], hashes the
//! hyphenated lowercase form (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`) with a
//! [`HashAdapter`], reduces the result modulo the bucket count and
//! increments that bucket. Counts are commutative, so sample order does
//! not matter.
//!
//! [`BucketSimulator::convergence_trace`] feeds the *same* identifier
//! stream to several adapters and records how their chi-squared statistic
//! evolves as samples accumulate.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{HashDistError, Result};
use crate::hash::{bucket_index, HashAdapter};
use crate::random::IdSource;
use crate::uniformity::chi_squared_with_expected;

/// Per-bucket sample counts for one run.
///
/// Index `i` holds the number of samples that landed in bucket `i`; the
/// counts always sum to [`BucketCounts::total`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    counts: Vec<u64>,
}

impl BucketCounts {
    /// `buckets` empty buckets.
    ///
    /// # Errors
    /// [`HashDistError::Config`] if `buckets == 0`.
    pub fn new(buckets: usize) -> Result<Self> {
        if buckets == 0 {
            return Err(HashDistError::config("bucket count must be >= 1, got 0"));
        }
        Ok(Self {
            counts: vec![0; buckets],
        })
    }

    /// Wraps precomputed counts.
    ///
    /// # Errors
    /// [`HashDistError::Config`] if `counts` is empty.
    pub fn from_counts(counts: Vec<u64>) -> Result<Self> {
        if counts.is_empty() {
            return Err(HashDistError::config("bucket counts are empty"));
        }
        Ok(Self { counts })
    }

    /// Adds one sample with raw hash output `hash`.
    pub fn record(&mut self, hash: i64) {
        let i = bucket_index(hash, self.counts.len());
        self.counts[i] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Rows for a bar chart: `("Bucket 0", c₀), ("Bucket 1", c₁), …`.
    pub fn labeled(&self) -> Vec<BucketRow> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| BucketRow {
                bucket: format!("Bucket {i}"),
                count,
            })
            .collect()
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.counts
    }
}

/// One bar of the bucket histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketRow {
    pub bucket: String,
    pub count: u64,
}

/// Chi-squared values of every traced adapter after `iteration` samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracePoint {
    pub iteration: u64,
    pub chi_squared: BTreeMap<String, f64>,
}

fn validate_counts(samples: u64, buckets: usize) -> Result<()> {
    if buckets < 1 {
        return Err(HashDistError::config(format!(
            "bucket count must be >= 1, got {buckets}"
        )));
    }
    if samples < 1 {
        return Err(HashDistError::config(format!(
            "sample count must be >= 1, got {samples}"
        )));
    }
    if buckets == 1 {
        warn!("single bucket: every run is trivially uniform");
    }
    Ok(())
}

/// Draws identifiers from its source and accumulates bucket counts.
#[derive(Debug)]
pub struct BucketSimulator<S> {
    source: S,
}

impl<S: IdSource> BucketSimulator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Runs one simulation of `samples` identifiers over `buckets` buckets.
    ///
    /// # Complexity
    /// Time: O(samples), Space: O(buckets)
    ///
    /// # Errors
    /// - [`HashDistError::Config`] if `samples < 1` or `buckets < 1`.
    /// - Any error of the identifier source, unchanged.
    ///
    /// # Examples
    /// ```
    /// use hashdist::hash::Fnv1a;
    /// use hashdist::random::SeededIdSource;
    /// use hashdist::simulate::BucketSimulator;
    /// let mut sim = BucketSimulator::new(SeededIdSource::new(1));
    /// let counts = sim.simulate(1000, 10, &Fnv1a).unwrap();
    /// assert_eq!(counts.bucket_count(), 10);
    /// assert_eq!(counts.total(), 1000);
    /// ```
    pub fn simulate(
        &mut self,
        samples: u64,
        buckets: usize,
        hash: &dyn HashAdapter,
    ) -> Result<BucketCounts> {
        validate_counts(samples, buckets)?;

        let mut counts = BucketCounts::new(buckets)?;
        let mut buf = Uuid::encode_buffer();
        for _ in 0..samples {
            let id = self.source.next_id()?;
            let text = id.hyphenated().encode_lower(&mut buf);
            counts.record(hash.hash(text));
        }

        debug!(hash = hash.name(), buckets, samples, "simulation run complete");
        Ok(counts)
    }

    /// Feeds one identifier stream to every adapter and samples their
    /// chi-squared statistic every `step` identifiers.
    ///
    /// Produces `iterations / step` points; a trailing partial step is
    /// not reported.
    ///
    /// # Errors
    /// - [`HashDistError::Config`] if `adapters` is empty, `buckets < 1`,
    ///   `iterations < 1`, `step < 1` or `step > iterations`.
    /// - Any error of the identifier source, unchanged.
    pub fn convergence_trace(
        &mut self,
        adapters: &[Arc<dyn HashAdapter>],
        buckets: usize,
        iterations: u64,
        step: u64,
    ) -> Result<Vec<TracePoint>> {
        validate_counts(iterations, buckets)?;
        if adapters.is_empty() {
            return Err(HashDistError::config("no hash functions to trace"));
        }
        if step < 1 || step > iterations {
            return Err(HashDistError::config(format!(
                "trace step must be in [1, {iterations}], got {step}"
            )));
        }

        let mut cumulative: Vec<BucketCounts> = adapters
            .iter()
            .map(|_| BucketCounts::new(buckets))
            .collect::<Result<_>>()?;
        let mut points = Vec::with_capacity((iterations / step) as usize);
        let mut buf = Uuid::encode_buffer();

        for i in 1..=iterations {
            let id = self.source.next_id()?;
            let text = id.hyphenated().encode_lower(&mut buf);
            for (adapter, counts) in adapters.iter().zip(cumulative.iter_mut()) {
                counts.record(adapter.hash(text));
            }

            if i % step == 0 {
                let expected = i as f64 / buckets as f64;
                let chi_squared = adapters
                    .iter()
                    .zip(&cumulative)
                    .map(|(adapter, counts)| {
                        (
                            adapter.name().to_string(),
                            chi_squared_with_expected(counts.counts(), expected),
                        )
                    })
                    .collect();
                points.push(TracePoint {
                    iteration: i,
                    chi_squared,
                });
            }
        }

        debug!(
            adapters = adapters.len(),
            buckets,
            iterations,
            step,
            points = points.len(),
            "convergence trace complete"
        );
        Ok(points)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::hash::{Fnv1a, SimpleHash};
    use crate::random::SeededIdSource;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn counts_sum_to_samples(
            seed in 0_u64..10_000,
            samples in 1_u64..2_000,
            buckets in 1_usize..64,
        ) {
            let mut sim = BucketSimulator::new(SeededIdSource::new(seed));
            let counts = sim.simulate(samples, buckets, &Fnv1a).unwrap();
            prop_assert_eq!(counts.bucket_count(), buckets);
            prop_assert_eq!(counts.total(), samples);

            let counts = sim.simulate(samples, buckets, &SimpleHash).unwrap();
            prop_assert_eq!(counts.bucket_count(), buckets);
            prop_assert_eq!(counts.total(), samples);
        }
    }
}
