//! Hash adapters: string → integer functions whose bucket spread is tested.
//!
//! The simulator treats every hash as a black box behind [`HashAdapter`].
//! Outputs are `i64` so adapters that overflow into negative values (the
//! classic `h * 31 + c` string hash) or exceed 32 bits are representable;
//! [`bucket_index`] normalizes them before the modulo step.
//!
//! Built-in adapters:
//!
//! | Name | Adapter | Output |
//! |---|---|---|
//! | `xxhash` | [`XxHash32`] | u32 |
//! | `fnv1a` | [`Fnv1a`] | u32 |
//! | `simple-hash` | [`SimpleHash`] | \|i32\| |

use std::fmt;
use std::sync::Arc;

use crate::error::{HashDistError, Result};

/// A named string hash function.
pub trait HashAdapter: Send + Sync {
    /// Registry key; also the profile key the session records verdicts under.
    fn name(&self) -> &str;

    /// Hashes `input`. May be negative or wider than 32 bits.
    fn hash(&self, input: &str) -> i64;
}

/// Maps a raw hash output to a bucket in `0..buckets`.
///
/// Negative outputs are made non-negative by absolute value first.
///
/// # Panics
/// Panics if `buckets == 0`; callers validate the bucket count.
///
/// # Examples
/// ```
/// use hashdist::hash::bucket_index;
/// assert_eq!(bucket_index(17, 10), 7);
/// assert_eq!(bucket_index(-17, 10), 7);
/// assert_eq!(bucket_index(i64::MIN, 10), 8);
/// ```
pub fn bucket_index(hash: i64, buckets: usize) -> usize {
    (hash.unsigned_abs() % buckets as u64) as usize
}

// ============================================================================
// FNV-1a
// ============================================================================

const FNV_OFFSET_32: u32 = 2_166_136_261;
const FNV_PRIME_32: u32 = 16_777_619;

/// 32-bit FNV-1a over the UTF-16 code units of the input.
///
/// For ASCII input (UUID strings) code units and bytes coincide.
///
/// Reference: Fowler, Noll & Vo, <http://www.isthe.com/chongo/tech/comp/fnv/>.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv1a;

impl Fnv1a {
    pub fn hash32(input: &str) -> u32 {
        input.encode_utf16().fold(FNV_OFFSET_32, |hash, unit| {
            (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME_32)
        })
    }
}

impl HashAdapter for Fnv1a {
    fn name(&self) -> &str {
        "fnv1a"
    }

    fn hash(&self, input: &str) -> i64 {
        i64::from(Self::hash32(input))
    }
}

// ============================================================================
// xxHash32
// ============================================================================

/// xxHash32 over the UTF-8 bytes of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHash32 {
    seed: u32,
}

impl XxHash32 {
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl HashAdapter for XxHash32 {
    fn name(&self) -> &str {
        "xxhash"
    }

    fn hash(&self, input: &str) -> i64 {
        i64::from(xxhash_rust::xxh32::xxh32(input.as_bytes(), self.seed))
    }
}

// ============================================================================
// Simple string hash
// ============================================================================

/// `h = h·31 + c` over UTF-16 code units in wrapping 32-bit signed
/// arithmetic, then absolute value.
///
/// The wrapping step routinely goes negative; the absolute value is taken
/// in 64 bits so `i32::MIN` maps to `2³¹` rather than overflowing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleHash;

impl SimpleHash {
    pub fn hash_i32(input: &str) -> i32 {
        input.encode_utf16().fold(0_i32, |hash, unit| {
            (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        })
    }
}

impl HashAdapter for SimpleHash {
    fn name(&self) -> &str {
        "simple-hash"
    }

    fn hash(&self, input: &str) -> i64 {
        i64::from(Self::hash_i32(input)).abs()
    }
}

// ============================================================================
// Closure adapter
// ============================================================================

/// Wraps a closure as a [`HashAdapter`].
///
/// # Examples
/// ```
/// use hashdist::hash::{FnHash, HashAdapter};
/// let len_hash = FnHash::new("len", |s: &str| s.len() as i64);
/// assert_eq!(len_hash.hash("abcd"), 4);
/// ```
pub struct FnHash<F> {
    name: String,
    f: F,
}

impl<F> FnHash<F>
where
    F: Fn(&str) -> i64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> HashAdapter for FnHash<F>
where
    F: Fn(&str) -> i64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self, input: &str) -> i64 {
        (self.f)(input)
    }
}

impl<F> fmt::Debug for FnHash<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHash").field("name", &self.name).finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Name-keyed collection of adapters, in registration order.
#[derive(Clone, Default)]
pub struct HashRegistry {
    adapters: Vec<Arc<dyn HashAdapter>>,
}

impl HashRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `xxhash` (seed 0), `fnv1a` and `simple-hash`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(XxHash32::default());
        registry.register(Fnv1a);
        registry.register(SimpleHash);
        registry
    }

    /// Adds an adapter, replacing any existing one with the same name.
    pub fn register(&mut self, adapter: impl HashAdapter + 'static) {
        let adapter: Arc<dyn HashAdapter> = Arc::new(adapter);
        match self
            .adapters
            .iter()
            .position(|a| a.name() == adapter.name())
        {
            Some(i) => self.adapters[i] = adapter,
            None => self.adapters.push(adapter),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn HashAdapter>> {
        self.adapters.iter().find(|a| a.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Looks up every name, in order.
    ///
    /// # Errors
    /// [`HashDistError::UnknownHash`] for the first unregistered name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn HashAdapter>>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| HashDistError::UnknownHash {
                    name: name.to_string(),
                })
            })
            .collect()
    }
}

impl fmt::Debug for HashRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_vectors() {
        assert_eq!(Fnv1a::hash32(""), 0x811c_9dc5);
        assert_eq!(Fnv1a::hash32("a"), 0xe40c_292c);
        assert_eq!(Fnv1a::hash32("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_xxhash_reference_vectors() {
        let h = XxHash32::default();
        assert_eq!(h.hash(""), 0x02cc_5d05);
        assert_eq!(h.seed(), 0);
        assert_ne!(XxHash32::with_seed(0xabcd).hash("abc"), h.hash("abc"));
    }

    #[test]
    fn test_simple_hash_matches_java_string_hash() {
        // Same recurrence as java.lang.String#hashCode.
        assert_eq!(SimpleHash::hash_i32(""), 0);
        assert_eq!(SimpleHash::hash_i32("a"), 97);
        assert_eq!(SimpleHash::hash_i32("hello"), 99_162_322);
        // Overflows into negative territory.
        assert_eq!(SimpleHash::hash_i32("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn test_simple_hash_is_non_negative() {
        assert_eq!(SimpleHash.hash("polygenelubricants"), 1_i64 << 31);
        let id = "4f1c2a9e-8b7d-4c3e-9a6f-0d2b1e5c7a88";
        assert!(SimpleHash.hash(id) >= 0);
    }

    #[test]
    fn test_bucket_index_normalizes_sign() {
        assert_eq!(bucket_index(0, 1), 0);
        assert_eq!(bucket_index(-1, 4), 1);
        assert_eq!(bucket_index(i64::from(u32::MAX), 10), 5);
        for h in [-1_000_003_i64, -7, 0, 7, 1 << 40] {
            assert!(bucket_index(h, 13) < 13);
        }
    }

    #[test]
    fn test_registry_builtins() {
        let registry = HashRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["xxhash", "fnv1a", "simple-hash"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("fnv1a").is_some());
        assert!(registry.get("md5").is_none());
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = HashRegistry::with_builtins();
        registry.register(FnHash::new("fnv1a", |_| 42));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("fnv1a").unwrap().hash("x"), 42);
    }

    #[test]
    fn test_registry_resolve() {
        let registry = HashRegistry::with_builtins();
        let resolved = registry.resolve(&["simple-hash", "xxhash"]).unwrap();
        let names: Vec<_> = resolved.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["simple-hash", "xxhash"]);

        let err = registry.resolve(&["fnv1a", "crc32"]).err().unwrap();
        assert!(matches!(err, HashDistError::UnknownHash { ref name } if name == "crc32"));
    }
}
