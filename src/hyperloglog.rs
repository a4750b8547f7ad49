//! HyperLogLog++ estimator with runtime precision.
//!
//! `HyperLogLog` is defined with precision `P` in `[4..24]` range, which defines number of
//! bits to use for register indices, and always uses 6-bit registers.
//!
//! # Representations
//!
//! ## Dense representation
//! `2^P` registers packed into `u32` words together with the number of zero registers and
//! the registers' harmonic sum, which are updated dynamically as more data being inserted,
//! allowing to have truly constant `estimate` operations.
//! LogLog-Beta bias correction is used for the estimate up to `P = 18`, larger precisions use
//! the raw HyperLogLog estimate with linear counting for small cardinalities.
//!   - Expected error:
//!     P = 4:  1.04 / sqrt(2^4)  = 26.00%
//!     P = 10: 1.04 / sqrt(2^10) = 3.25%
//!     P = 12: 1.04 / sqrt(2^12) = 1.62%
//!     P = 18: 1.04 / sqrt(2^18) = 0.20%
//!     P = 24: 1.04 / sqrt(2^24) = 0.03%
//!
//! ## Sparse representation
//! Only used when sparse mode is enabled. Encoded hashes are kept in a set and counted
//! exactly until the set would exceed half of the dense memory, then the estimator is
//! upgraded to dense representation. Benchmarks run with sparse mode disabled.

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use wyhash::WyHash;

use crate::representation::{MAX_PRECISION, MIN_PRECISION};
use crate::dense::Dense;
use crate::estimator::{Estimator, EstimatorConfig};
use crate::representation::{encode_hash, Representation, RepresentationTrait};
use crate::sparse::Sparse;

pub struct HyperLogLog<H: Hasher + Default = WyHash> {
    precision: u32,
    representation: Representation,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
}

impl<H: Hasher + Default> HyperLogLog<H> {
    /// Creates new dense `HyperLogLog` with `2^precision` registers.
    ///
    /// # Panics
    ///
    /// Panics when `precision` is outside of `[4..24]` range.
    pub fn new(precision: u32) -> Self {
        Self::assert_precision(precision);
        Self {
            precision,
            representation: Dense::new(precision).into(),
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Creates new `HyperLogLog` starting in sparse representation.
    ///
    /// # Panics
    ///
    /// Panics when `precision` is outside of `[4..24]` range.
    pub fn new_sparse(precision: u32) -> Self {
        Self::assert_precision(precision);
        Self {
            precision,
            representation: Sparse::new(precision).into(),
            build_hasher: BuildHasherDefault::default(),
        }
    }

    fn assert_precision(precision: u32) {
        assert!(
            (MIN_PRECISION..=MAX_PRECISION).contains(&precision),
            "precision {precision} is outside of [{MIN_PRECISION}..{MAX_PRECISION}] range"
        );
    }

    /// Insert a hashable item into `HyperLogLog`
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        self.insert_hash(hasher.finish());
    }

    /// Insert hash into `HyperLogLog`
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        self.insert_encoded_hash(encode_hash(hash, self.precision));
    }

    #[inline]
    fn insert_encoded_hash(&mut self, h: u32) {
        if !self.representation.insert_encoded_hash(h) {
            self.upgrade_to_dense();
            self.representation.insert_encoded_hash(h);
        }
    }

    /// Switch sparse representation to dense one, no-op for dense representation
    fn upgrade_to_dense(&mut self) {
        if let Representation::Sparse(sparse) = &self.representation {
            log::trace!(
                "upgrading {} encoded hashes to dense representation",
                sparse.len()
            );
            self.representation = sparse.to_dense(self.precision).into();
        }
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> f64 {
        self.representation.estimate()
    }

    /// Merge `rhs` into `self`
    ///
    /// # Panics
    ///
    /// Panics when estimators have different precision.
    pub fn merge(&mut self, rhs: &Self) {
        assert_eq!(
            self.precision, rhs.precision,
            "cannot merge estimators of different precision"
        );
        match &rhs.representation {
            Representation::Sparse(rhs) => {
                // when `rhs` has sparse representation - just insert its hashes into `self`
                rhs.items().for_each(|h| self.insert_encoded_hash(h));
            }
            Representation::Dense(rhs) => {
                self.upgrade_to_dense();
                if let Representation::Dense(lhs) = &mut self.representation {
                    lhs.merge(rhs);
                }
            }
        }
    }

    /// Return configured precision
    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Return whether sparse representation is used
    #[inline]
    pub fn is_sparse(&self) -> bool {
        matches!(self.representation, Representation::Sparse(_))
    }

    /// Return memory size of `HyperLogLog`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() - size_of::<Representation>() + self.representation.size_of()
    }
}

impl<H: Hasher + Default> Clone for HyperLogLog<H> {
    fn clone(&self) -> Self {
        Self {
            precision: self.precision,
            representation: self.representation.clone(),
            build_hasher: BuildHasherDefault::default(),
        }
    }
}

impl<H: Hasher + Default> PartialEq for HyperLogLog<H> {
    fn eq(&self, rhs: &Self) -> bool {
        self.precision == rhs.precision && self.representation == rhs.representation
    }
}

impl<H: Hasher + Default> Debug for HyperLogLog<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ representation: {}, estimate: {:.0}, size: {} }}",
            self.representation.name(),
            self.estimate(),
            self.size_of()
        )
    }
}

impl<T, H> Estimator<T> for HyperLogLog<H>
where
    T: Hash + ?Sized,
    H: Hasher + Default,
{
    fn build(config: &EstimatorConfig) -> Self {
        if config.is_sparse() {
            Self::new_sparse(config.precision())
        } else {
            Self::new(config.precision())
        }
    }

    #[inline]
    fn add(&mut self, item: &T) {
        self.insert(item);
    }

    #[inline]
    fn result(&self) -> f64 {
        self.estimate()
    }

    #[inline]
    fn merge(&mut self, other: &Self) {
        HyperLogLog::merge(self, other);
    }

    #[inline]
    fn precision(&self) -> u32 {
        self.precision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn relative_error(estimate: f64, actual: usize) -> f64 {
        (estimate - actual as f64).abs() / actual as f64
    }

    /// Harmonic sum is accumulated in `f64`, so the insertion order may change its last bits.
    fn assert_estimates_close(lhs: f64, rhs: f64) {
        assert!((lhs - rhs).abs() <= 1e-4 * rhs.max(1.0), "{lhs} != {rhs}");
    }

    #[test_case(4, 1_000)]
    #[test_case(10, 10_000)]
    #[test_case(12, 10_000)]
    #[test_case(14, 100_000)]
    #[test_case(18, 100_000)]
    #[test_case(19, 100_000)]
    #[test_case(24, 1_000_000)]
    fn test_dense_estimate_within_error_bound(precision: u32, n: usize) {
        let mut hll = HyperLogLog::<WyHash>::new(precision);
        for i in 0..n {
            hll.insert(&i);
        }
        let std_error = 1.04 / ((1usize << precision) as f64).sqrt();
        assert!(!hll.is_sparse());
        assert!(
            relative_error(hll.estimate(), n) < (3.0 * std_error).max(0.01),
            "estimate = {}, n = {}",
            hll.estimate(),
            n
        );
    }

    #[test]
    fn test_insert() {
        let mut hll = HyperLogLog::<WyHash>::new_sparse(12);

        assert_eq!(hll.estimate(), 0.0);

        hll.insert("test item 1");
        assert_eq!(hll.estimate(), 1.0);

        // Re-insert the same item, estimate should remain the same.
        hll.insert("test item 1");
        assert_eq!(hll.estimate(), 1.0);

        hll.insert("test item 2");
        assert_eq!(hll.estimate(), 2.0);
    }

    #[test]
    fn test_dense_ignores_duplicates() {
        let mut once = HyperLogLog::<WyHash>::new(10);
        let mut twice = HyperLogLog::<WyHash>::new(10);
        for i in 0..5_000u64 {
            once.insert(&i);
            twice.insert(&i);
            twice.insert(&i);
        }
        assert_eq!(once, twice);
    }

    #[test_case(0 => "{ representation: Sparse, estimate: 0, size: ")]
    #[test_case(1 => "{ representation: Sparse, estimate: 1, size: ")]
    #[test_case(100 => "{ representation: Sparse, estimate: 100, size: ")]
    fn test_sparse_debug(n: usize) -> String {
        let mut hll = HyperLogLog::<WyHash>::new_sparse(12);
        for i in 0..n {
            hll.insert(&i);
        }
        let debug = format!("{:?}", hll);
        assert!(debug.ends_with(&format!("size: {} }}", hll.size_of())));
        debug[..debug.rfind("size: ").unwrap() + 6].to_string()
    }

    #[test]
    fn test_sparse_upgrades_to_dense() {
        let mut hll = HyperLogLog::<WyHash>::new_sparse(8);
        let max_len = Dense::words(8) / 2;
        for i in 0..max_len {
            hll.insert(&i);
        }
        assert!(hll.is_sparse());
        for i in max_len..1_000 {
            hll.insert(&i);
        }
        assert!(!hll.is_sparse());
        assert!(relative_error(hll.estimate(), 1_000) < 0.2);
    }

    #[test]
    fn test_sparse_and_dense_agree_after_upgrade() {
        let mut sparse = HyperLogLog::<WyHash>::new_sparse(10);
        let mut dense = HyperLogLog::<WyHash>::new(10);
        for i in 0..10_000u64 {
            sparse.insert(&i);
            dense.insert(&i);
        }
        assert!(!sparse.is_sparse());
        assert_estimates_close(sparse.estimate(), dense.estimate());
    }

    #[test_case(0, 0)]
    #[test_case(10, 0)]
    #[test_case(0, 10)]
    #[test_case(10, 10_000)]
    #[test_case(10_000, 10)]
    #[test_case(10_000, 10_000)]
    fn test_merge_matches_single_estimator(lhs_n: u64, rhs_n: u64) {
        for sparse in [false, true] {
            let config = EstimatorConfig::new(12).sparse(sparse);
            let mut lhs = <HyperLogLog as Estimator<u64>>::build(&config);
            let mut rhs = <HyperLogLog as Estimator<u64>>::build(&config);
            let mut all = <HyperLogLog as Estimator<u64>>::build(&config);
            for i in 0..lhs_n {
                lhs.insert(&i);
                all.insert(&i);
            }
            for i in 0..rhs_n {
                rhs.insert(&(i + 1_000_000));
                all.insert(&(i + 1_000_000));
            }

            lhs.merge(&rhs);

            assert_estimates_close(lhs.estimate(), all.estimate());
            assert_eq!(lhs.is_sparse(), all.is_sparse());
        }
    }

    #[test]
    #[should_panic(expected = "cannot merge estimators of different precision")]
    fn test_merge_different_precision_panics() {
        let mut lhs = HyperLogLog::<WyHash>::new(10);
        let rhs = HyperLogLog::<WyHash>::new(12);
        lhs.merge(&rhs);
    }

    #[test]
    #[should_panic(expected = "outside of [4..24] range")]
    fn test_precision_out_of_range_panics() {
        HyperLogLog::<WyHash>::new(3);
    }

    #[test]
    #[should_panic(expected = "precision 25 is outside of [4..24] range")]
    fn test_precision_above_sparse_index_panics() {
        HyperLogLog::<WyHash>::new_sparse(25);
    }
}
