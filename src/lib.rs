//! # hashdist
//!
//! How evenly does a hash function spread random identifiers over buckets?
//!
//! This crate simulates hash bucket assignment, tests each run for
//! uniformity with chi-squared and Kolmogorov–Smirnov statistics, and
//! tracks the pass/fail history of every hash function as a Beta
//! posterior that can be summarized for plotting.
//!
//! ## Modules
//!
//! - [`hash`] — Hash adapters (FNV-1a, xxHash32, a simple string hash) and registry
//! - [`random`] — Identifier sources: OS-random or seeded UUIDs
//! - [`simulate`] — Bucket counting and chi-squared convergence traces
//! - [`uniformity`] — Chi-squared and KS goodness-of-fit verdicts
//! - [`trials`] — Per-hash Beta posterior accumulation
//! - [`beta`] — Beta density, mode, quantiles, confidence areas, curves
//! - [`special`] — Log-gamma, log-beta, regularized incomplete beta
//! - [`config`] — TOML-loadable session configuration
//! - [`session`] — Ties the pieces together per configuration
//!
//! ## Data Flow
//!
//! ```text
//! IdSource → BucketSimulator → UniformityTester → TrialAccumulator → BetaDistribution
//! ```
//!
//! ## Example
//!
//! ```
//! use hashdist::config::SimulationConfig;
//! use hashdist::hash::HashRegistry;
//! use hashdist::random::SeededIdSource;
//! use hashdist::session::Session;
//!
//! let config = SimulationConfig::from_toml_str("buckets = 8\nsamples = 2000").unwrap();
//! let mut session =
//!     Session::new(config, HashRegistry::with_builtins(), SeededIdSource::new(1)).unwrap();
//! session.run_rounds(5).unwrap();
//! let fnv = session.profile("fnv1a").unwrap();
//! assert_eq!(fnv.total_tests(), 5);
//! ```

pub mod beta;
pub mod config;
pub mod error;
pub mod hash;
pub mod random;
pub mod session;
pub mod simulate;
pub mod special;
pub mod trials;
pub mod uniformity;

pub use error::{HashDistError, Result};
