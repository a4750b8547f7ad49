//! Estimator capability contract consumed by the workload runner.
//!
//! The runner only needs to insert elements, read an estimate, merge two instances built
//! from one configuration, and know the configured precision. [`HyperLogLog`] is the
//! production implementation, [`ExactCounter`] is an exact baseline used to check timing and
//! reporting independently of estimator accuracy.
//!
//! [`HyperLogLog`]: crate::hyperloglog::HyperLogLog

use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};

use clap::ValueEnum;
use hashbrown::HashSet;
use wyhash::WyHash;

/// Estimator trait representing the operations measured by the harness.
pub trait Estimator<T: ?Sized>: Sized {
    /// Build a new empty instance. Instances built from the same config share no state and
    /// can be merged with each other.
    fn build(config: &EstimatorConfig) -> Self;
    /// Count `item`; adding an already counted item does not change the estimate.
    fn add(&mut self, item: &T);
    /// Current estimate of the number of distinct items.
    fn result(&self) -> f64;
    /// Fold the state of `other` into `self`.
    fn merge(&mut self, other: &Self);
    /// Configured precision (log2 of register count).
    fn precision(&self) -> u32;
}

/// Configuration shared by all estimator instances of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorConfig {
    precision: u32,
    sparse: bool,
}

impl EstimatorConfig {
    /// Dense mode configuration with `2^precision` registers
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            sparse: false,
        }
    }

    /// Allow estimators to start in sparse representation
    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse
    }
}

/// Estimator implementations the harness can build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EstimatorKind {
    /// HyperLogLog++ with LogLog-Beta bias correction.
    #[default]
    #[value(name = "hll")]
    HyperLogLog,
    /// Exact distinct count of item hashes.
    Exact,
}

/// Exact distinct counter keeping every item hash.
pub struct ExactCounter<H: Hasher + Default = WyHash> {
    precision: u32,
    hashes: HashSet<u64>,
    build_hasher: BuildHasherDefault<H>,
}

impl<H: Hasher + Default> ExactCounter<H> {
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            hashes: HashSet::new(),
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Number of distinct hashes seen
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl<T, H> Estimator<T> for ExactCounter<H>
where
    T: Hash + ?Sized,
    H: Hasher + Default,
{
    fn build(config: &EstimatorConfig) -> Self {
        Self::new(config.precision())
    }

    #[inline]
    fn add(&mut self, item: &T) {
        self.hashes.insert(self.build_hasher.hash_one(item));
    }

    fn result(&self) -> f64 {
        self.hashes.len() as f64
    }

    fn merge(&mut self, other: &Self) {
        self.hashes.extend(other.hashes.iter().copied());
    }

    fn precision(&self) -> u32 {
        self.precision
    }
}
