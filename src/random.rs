//! Sources of random identifiers.
//!
//! The simulator draws one fresh 128-bit identifier per sample and hashes
//! its hyphenated string form. [`IdSource`] abstracts where identifiers come
//! from so production runs use OS randomness ([`OsUuidSource`]) while tests
//! and reproducible experiments use a seeded generator ([`SeededIdSource`]).
//!
//! # Reproducibility
//!
//! [`SeededIdSource`] is built on `SmallRng` (Xoshiro256++); the identifier
//! stream is deterministic for a given seed on the same platform.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::error::Result;

/// Produces unpredictable, effectively non-repeating identifiers.
pub trait IdSource {
    /// Next identifier.
    ///
    /// # Errors
    /// A source that can fail reports a configuration-class error; the
    /// simulation aborts on it and does not retry.
    fn next_id(&mut self) -> Result<Uuid>;
}

impl<S: IdSource + ?Sized> IdSource for &mut S {
    fn next_id(&mut self) -> Result<Uuid> {
        (**self).next_id()
    }
}

impl<S: IdSource + ?Sized> IdSource for Box<S> {
    fn next_id(&mut self) -> Result<Uuid> {
        (**self).next_id()
    }
}

/// Random (v4) UUIDs from the operating system's randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsUuidSource;

impl IdSource for OsUuidSource {
    fn next_id(&mut self) -> Result<Uuid> {
        Ok(Uuid::new_v4())
    }
}

/// Creates a fast, seeded random number generator.
///
/// # Examples
/// ```
/// use hashdist::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Version-4 UUIDs built from a seeded `SmallRng`.
///
/// The version and variant bits are set like real v4 UUIDs, so the
/// hashed strings have the same shape as [`OsUuidSource`] output.
///
/// # Examples
/// ```
/// use hashdist::random::{IdSource, SeededIdSource};
/// let mut a = SeededIdSource::new(7);
/// let mut b = SeededIdSource::new(7);
/// assert_eq!(a.next_id().unwrap(), b.next_id().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct SeededIdSource {
    rng: SmallRng,
}

impl SeededIdSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: create_rng(seed),
        }
    }
}

impl IdSource for SeededIdSource {
    fn next_id(&mut self) -> Result<Uuid> {
        let mut bytes = [0_u8; 16];
        self.rng.fill(&mut bytes);
        Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}
