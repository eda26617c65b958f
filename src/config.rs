//! Session configuration.
//!
//! Every section is `#[serde(default)]`, so an empty TOML document yields
//! the defaults:
//!
//! ```toml
//! buckets = 10
//! samples = 1000
//! policy = "combined-strict"   # or "ks-only"
//! prior = [1.0, 1.0]
//! hashes = ["xxhash", "fnv1a", "simple-hash"]
//! # xxhash_seed = 43981      # re-seed the registry's `xxhash` adapter
//!
//! [chart]
//! increment = 0.01
//! density_floor = 0.01
//! confidence_percentage = 2.5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::beta::{BetaDistribution, MIN_CURVE_INCREMENT};
use crate::error::{HashDistError, Result};
use crate::uniformity::VerdictPolicy;

/// Parameters of a simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of buckets each run hashes into.
    pub buckets: usize,
    /// Identifiers drawn per run.
    pub samples: u64,
    /// How chi-squared and KS combine into a verdict.
    pub policy: VerdictPolicy,
    /// Starting `[alpha, beta]` for every profile.
    pub prior: [f64; 2],
    /// Registry names of the hash functions to simulate, in run order.
    pub hashes: Vec<String>,
    /// Seed for the `xxhash` adapter; `None` keeps the registry's own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xxhash_seed: Option<u32>,
    /// Plotting parameters for the Beta chart.
    pub chart: ChartSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            buckets: 10,
            samples: 1000,
            policy: VerdictPolicy::CombinedStrict,
            prior: [1.0, 1.0],
            hashes: vec![
                "xxhash".to_string(),
                "fnv1a".to_string(),
                "simple-hash".to_string(),
            ],
            xxhash_seed: None,
            chart: ChartSettings::default(),
        }
    }
}

/// Beta-chart sampling and overlay parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Grid spacing on `[0, 1]` for density curves.
    pub increment: f64,
    /// Points where no variant's density exceeds this are dropped.
    pub density_floor: f64,
    /// Tail mass in percent on each side of the probability area.
    pub confidence_percentage: f64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            increment: 0.01,
            density_floor: 0.01,
            confidence_percentage: 2.5,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// [`HashDistError::Parse`] for malformed TOML, otherwise the errors of
    /// [`SimulationConfig::validate`].
    ///
    /// # Examples
    /// ```
    /// use hashdist::config::SimulationConfig;
    /// let cfg = SimulationConfig::from_toml_str("buckets = 4\nsamples = 400").unwrap();
    /// assert_eq!(cfg.buckets, 4);
    /// assert_eq!(cfg.hashes.len(), 3);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    /// [`HashDistError::Io`] if the file cannot be read, otherwise as
    /// [`SimulationConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks every field.
    ///
    /// # Errors
    /// [`HashDistError::Config`] for bucket/sample counts below 1, an empty
    /// hash list, a non-positive prior, a curve increment outside
    /// `[MIN_CURVE_INCREMENT, 1]`, or a confidence percentage outside `(0, 100)`.
    pub fn validate(&self) -> Result<()> {
        if self.buckets < 1 {
            return Err(HashDistError::config(format!(
                "buckets must be >= 1, got {}",
                self.buckets
            )));
        }
        if self.samples < 1 {
            return Err(HashDistError::config(format!(
                "samples must be >= 1, got {}",
                self.samples
            )));
        }
        if self.hashes.is_empty() {
            return Err(HashDistError::config("no hash functions configured"));
        }
        self.prior_distribution()?;

        let chart = &self.chart;
        if !(MIN_CURVE_INCREMENT..=1.0).contains(&chart.increment) {
            return Err(HashDistError::config(format!(
                "chart.increment must be in [{MIN_CURVE_INCREMENT}, 1], got {}",
                chart.increment
            )));
        }
        if !chart.density_floor.is_finite() || chart.density_floor < 0.0 {
            return Err(HashDistError::config(format!(
                "chart.density_floor must be finite and >= 0, got {}",
                chart.density_floor
            )));
        }
        if !(chart.confidence_percentage > 0.0 && chart.confidence_percentage < 100.0) {
            return Err(HashDistError::config(format!(
                "chart.confidence_percentage must be in (0, 100), got {}",
                chart.confidence_percentage
            )));
        }
        Ok(())
    }

    /// The configured prior as a distribution.
    ///
    /// # Errors
    /// [`HashDistError::Config`] if either component is not finite and `> 0`.
    pub fn prior_distribution(&self) -> Result<BetaDistribution> {
        let [alpha, beta] = self.prior;
        BetaDistribution::new(alpha, beta)
            .map_err(|e| HashDistError::config(format!("invalid prior: {e}")))
    }
}
