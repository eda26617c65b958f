//! Simulation session: configuration, adapters, and the profile store.
//!
//! A [`Session`] owns everything one configuration needs. Each call to
//! [`Session::run_round`] simulates every configured hash function once,
//! tests the counts, and records the verdict into that function's profile.
//! Changing the configuration through [`Session::reconfigure`] discards all
//! profiles; results never merge across configurations.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::beta::{density_curve, BetaDistribution, CurvePoint, ProbabilityArea};
use crate::config::SimulationConfig;
use crate::error::{HashDistError, Result};
use crate::hash::{HashAdapter, HashRegistry, XxHash32};
use crate::random::{IdSource, OsUuidSource};
use crate::simulate::{BucketCounts, BucketSimulator, TracePoint};
use crate::trials::{HashFunctionProfile, TrialAccumulator};
use crate::uniformity::{TestVerdict, UniformityTester};

/// Everything one simulation run of one hash function produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub hash: String,
    pub counts: BucketCounts,
    pub verdict: TestVerdict,
    /// Posterior after recording this run.
    pub distribution: BetaDistribution,
}

/// A configured simulation session.
pub struct Session {
    config: SimulationConfig,
    registry: HashRegistry,
    adapters: Vec<Arc<dyn HashAdapter>>,
    tester: UniformityTester,
    simulator: BucketSimulator<Box<dyn IdSource + Send>>,
    accumulator: TrialAccumulator,
    rounds: u64,
}

impl Session {
    /// Builds a session over the built-in adapters with OS randomness.
    ///
    /// # Errors
    /// As [`Session::new`].
    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        Self::new(config, HashRegistry::with_builtins(), OsUuidSource)
    }

    /// Builds a session.
    ///
    /// A configured `xxhash_seed` replaces the registry's `xxhash` adapter
    /// with one using that seed.
    ///
    /// # Errors
    /// - [`HashDistError::Config`] if the configuration is invalid.
    /// - [`HashDistError::UnknownHash`] if it names an unregistered hash.
    pub fn new(
        config: SimulationConfig,
        registry: HashRegistry,
        source: impl IdSource + Send + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let registry = apply_seed(registry, &config);
        let adapters = registry.resolve(&config.hashes)?;
        let prior = config.prior_distribution()?;
        let source: Box<dyn IdSource + Send> = Box::new(source);

        Ok(Self {
            tester: UniformityTester::new(config.policy),
            simulator: BucketSimulator::new(source),
            accumulator: TrialAccumulator::new(prior),
            adapters,
            registry,
            config,
            rounds: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &HashRegistry {
        &self.registry
    }

    /// Completed rounds since the last (re)configuration.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Replaces the configuration and discards every profile.
    ///
    /// On error the session is left unchanged.
    ///
    /// # Errors
    /// As [`Session::new`].
    pub fn reconfigure(&mut self, config: SimulationConfig) -> Result<()> {
        config.validate()?;
        let registry = apply_seed(self.registry.clone(), &config);
        let adapters = registry.resolve(&config.hashes)?;
        let prior = config.prior_distribution()?;

        info!(
            buckets = config.buckets,
            samples = config.samples,
            hashes = ?config.hashes,
            discarded_profiles = self.accumulator.len(),
            "session reconfigured, profiles reset"
        );

        self.tester = UniformityTester::new(config.policy);
        self.accumulator.reset_with_prior(prior);
        self.adapters = adapters;
        self.registry = registry;
        self.config = config;
        self.rounds = 0;
        Ok(())
    }

    /// Simulates, tests and records one run of the named hash function.
    ///
    /// # Errors
    /// - [`HashDistError::UnknownHash`] if `name` is not configured.
    /// - Simulation and testing errors, unchanged.
    pub fn run_one(&mut self, name: &str) -> Result<RunReport> {
        let adapter = self
            .adapters
            .iter()
            .find(|a| a.name() == name)
            .cloned()
            .ok_or_else(|| HashDistError::UnknownHash {
                name: name.to_string(),
            })?;
        self.run_adapter(adapter.as_ref())
    }

    /// Runs every configured hash function once, in configured order.
    ///
    /// # Errors
    /// The first simulation or testing error. Profiles already updated in
    /// this round keep their update, but the round is not counted, so
    /// [`Session::rounds`] can lag behind a profile's `total_tests`.
    pub fn run_round(&mut self) -> Result<Vec<RunReport>> {
        let adapters = self.adapters.clone();
        let reports = adapters
            .iter()
            .map(|adapter| self.run_adapter(adapter.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.rounds += 1;
        debug!(round = self.rounds, "round complete");
        Ok(reports)
    }

    /// Runs `rounds` rounds and returns the last round's reports.
    ///
    /// # Errors
    /// As [`Session::run_round`]; `rounds == 0` is a configuration error.
    pub fn run_rounds(&mut self, rounds: u64) -> Result<Vec<RunReport>> {
        if rounds == 0 {
            return Err(HashDistError::config("round count must be >= 1, got 0"));
        }
        let mut last = Vec::new();
        for _ in 0..rounds {
            last = self.run_round()?;
        }
        Ok(last)
    }

    fn run_adapter(&mut self, adapter: &dyn HashAdapter) -> Result<RunReport> {
        let counts = self
            .simulator
            .simulate(self.config.samples, self.config.buckets, adapter)?;
        let verdict = self.tester.test(&counts)?;
        let distribution = self.accumulator.record(adapter.name(), verdict.pass);
        Ok(RunReport {
            hash: adapter.name().to_string(),
            counts,
            verdict,
            distribution,
        })
    }

    pub fn profile(&self, name: &str) -> Option<&HashFunctionProfile> {
        self.accumulator.get(name)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &HashFunctionProfile> {
        self.accumulator.profiles()
    }

    /// Posterior of every profile, keyed by name.
    pub fn distributions(&self) -> BTreeMap<String, BetaDistribution> {
        self.accumulator.snapshot()
    }

    /// Density curves of every profile on the configured grid.
    ///
    /// # Errors
    /// [`HashDistError::Config`] if the chart increment is invalid.
    pub fn density_curve(&self) -> Result<Vec<CurvePoint>> {
        let chart = &self.config.chart;
        density_curve(&self.distributions(), chart.increment, chart.density_floor)
    }

    /// Confidence overlay of every profile at the configured percentage.
    ///
    /// # Errors
    /// [`HashDistError::Domain`] if the confidence percentage is invalid.
    pub fn probability_areas(&self) -> Result<BTreeMap<String, ProbabilityArea>> {
        let pct = self.config.chart.confidence_percentage;
        self.accumulator
            .profiles()
            .map(|p| -> Result<(String, ProbabilityArea)> {
                Ok((p.name().to_string(), p.distribution().probability_area(pct)?))
            })
            .collect()
    }

    /// Chi-squared convergence of the configured hash functions over one
    /// shared identifier stream. Does not touch the profiles.
    ///
    /// Set `xxhash_seed = 0xabcd` to trace xxHash32 with the seed commonly
    /// used for this chart.
    ///
    /// # Errors
    /// As [`BucketSimulator::convergence_trace`].
    pub fn convergence_trace(&mut self, iterations: u64, step: u64) -> Result<Vec<TracePoint>> {
        self.simulator
            .convergence_trace(&self.adapters, self.config.buckets, iterations, step)
    }
}

fn apply_seed(mut registry: HashRegistry, config: &SimulationConfig) -> HashRegistry {
    if let Some(seed) = config.xxhash_seed {
        registry.register(XxHash32::with_seed(seed));
    }
    registry
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("accumulator", &self.accumulator)
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}
