//! ## Dense representation
//! HyperLogLog++ with `M = 2^P` registers of `REGISTER_WIDTH` bits packed into `u32` words.
//!
//! [Original HyperLogLog++ paper](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf)
//!
//! Words layout:
//! - data[0]       - stores number of HyperLogLog registers set to 0.
//! - data[1..3]    - stores harmonic sum of HyperLogLog registers (`f64` bits, low word first).
//! - data[3..]     - stores register ranks using `REGISTER_WIDTH` bits per each register.

use std::mem::{size_of, size_of_val};

use crate::beta::{beta_horner, MAX_BETA_PRECISION};
use crate::representation::{decode_hash, RepresentationTrait, REGISTER_WIDTH};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Dense {
    precision: u32,
    data: Vec<u32>,
}

impl Dense {
    /// Create new empty `Dense` representation with `2^precision` registers
    pub(crate) fn new(precision: u32) -> Self {
        let m = 1usize << precision;
        let mut data = vec![0u32; Self::words(precision)];
        data[0] = m as u32;
        let mut dense = Self { precision, data };
        dense.set_sum(m as f64);
        dense
    }

    /// Number of `u32` words based on #registers, stored zero registers, two words of harmonic
    /// sum, and one extra word for branchless register updates (see `set_register`).
    #[inline]
    pub(crate) fn words(precision: u32) -> usize {
        (1usize << precision) * REGISTER_WIDTH / 32 + 4
    }

    /// Harmonic sum of the registers
    #[inline]
    fn sum(&self) -> f64 {
        f64::from_bits(u64::from(self.data[1]) | (u64::from(self.data[2]) << 32))
    }

    #[inline]
    fn set_sum(&mut self, sum: f64) {
        let bits = sum.to_bits();
        self.data[1] = bits as u32;
        self.data[2] = (bits >> 32) as u32;
    }

    /// Number of registers
    #[inline]
    fn m(&self) -> usize {
        1 << self.precision
    }

    /// Raise register `idx` to `new_rank` if it is larger than the current rank
    #[inline]
    fn update_rank(&mut self, idx: u32, new_rank: u32) {
        let old_rank = self.get_register(idx);
        if new_rank > old_rank {
            self.set_register(idx, old_rank, new_rank);
        }
    }

    /// Get `idx` register
    #[inline]
    fn get_register(&self, idx: u32) -> u32 {
        let bit_idx = (idx as usize) * REGISTER_WIDTH;
        let u32_idx = (bit_idx / 32) + 3;
        let bit_pos = bit_idx % 32;
        let bits = &self.data[u32_idx..u32_idx + 2];
        let bits_1 = REGISTER_WIDTH.min(32 - bit_pos);
        let bits_2 = REGISTER_WIDTH - bits_1;
        let mask_1: u32 = (1 << bits_1) - 1;
        let mask_2: u32 = (1 << bits_2) - 1;

        ((bits[0] >> bit_pos) & mask_1) | ((bits[1] & mask_2) << bits_1)
    }

    /// Set `idx` register to new value `rank`
    #[inline]
    fn set_register(&mut self, idx: u32, old_rank: u32, new_rank: u32) {
        let bit_idx = (idx as usize) * REGISTER_WIDTH;
        let u32_idx = (bit_idx / 32) + 3;
        let bit_pos = bit_idx % 32;
        let bits = &mut self.data[u32_idx..u32_idx + 2];
        let bits_1 = REGISTER_WIDTH.min(32 - bit_pos);
        let bits_2 = REGISTER_WIDTH - bits_1;
        let mask_1: u32 = (1 << bits_1) - 1;
        let mask_2: u32 = (1 << bits_2) - 1;

        // Unconditionally update two `u32` words based on `new_rank` bits and masks
        bits[0] &= !(mask_1 << bit_pos);
        bits[0] |= (new_rank & mask_1) << bit_pos;
        bits[1] &= !mask_2;
        bits[1] |= (new_rank >> bits_1) & mask_2;

        let zeros = &mut self.data[0];
        *zeros -= u32::from(old_rank == 0) & u32::from(*zeros > 0);

        let mut sum = self.sum();
        sum -= 1.0 / ((1u64 << old_rank) as f64);
        sum += 1.0 / ((1u64 << new_rank) as f64);
        self.set_sum(sum);
    }

    /// Merge two `Dense` representations by taking register-wise maximum.
    #[inline]
    pub(crate) fn merge(&mut self, rhs: &Dense) {
        debug_assert_eq!(self.precision, rhs.precision);
        for idx in 0..self.m() as u32 {
            let lhs_rank = self.get_register(idx);
            let rhs_rank = rhs.get_register(idx);
            if rhs_rank > lhs_rank {
                self.set_register(idx, lhs_rank, rhs_rank);
            }
        }
    }

    /// Number of registers still set to 0
    #[cfg(test)]
    pub(crate) fn zeros(&self) -> u32 {
        self.data[0]
    }
}

impl RepresentationTrait for Dense {
    #[inline]
    fn insert_encoded_hash(&mut self, h: u32) -> bool {
        let (idx, rank) = decode_hash(h, self.precision);
        self.update_rank(idx, rank);
        true
    }

    /// Return LogLog-Beta cardinality estimate, or the raw HyperLogLog estimate with linear
    /// counting for precisions without beta coefficients
    #[inline]
    fn estimate(&self) -> f64 {
        let m = self.m() as f64;
        let zeros = f64::from(self.data[0]);
        let sum = self.sum();
        if self.precision <= MAX_BETA_PRECISION {
            return alpha(self.m()) * m * (m - zeros) / (sum + beta_horner(zeros, self.precision));
        }
        let raw = alpha(self.m()) * m * m / sum;
        if raw <= 2.5 * m && zeros > 0.0 {
            m * (m / zeros).ln()
        } else {
            raw
        }
    }

    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.data.as_slice())
    }

    fn name(&self) -> &'static str {
        "Dense"
    }
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::encode_hash;
    use test_case::test_case;

    #[test_case(4 => 7)]
    #[test_case(10 => 196)]
    #[test_case(12 => 772)]
    #[test_case(18 => 49156)]
    #[test_case(24 => 3_145_732)]
    fn test_words(precision: u32) -> usize {
        Dense::words(precision)
    }

    #[test]
    fn test_registers_round_trip() {
        let mut dense = Dense::new(6);
        for idx in 0..64u32 {
            dense.update_rank(idx, idx % 63 + 1);
        }
        for idx in 0..64u32 {
            assert_eq!(dense.get_register(idx), idx % 63 + 1);
        }
        assert_eq!(dense.zeros(), 0);
    }

    #[test]
    fn test_rank_only_increases() {
        let mut dense = Dense::new(4);
        dense.update_rank(3, 5);
        dense.update_rank(3, 2);
        assert_eq!(dense.get_register(3), 5);
        assert_eq!(dense.zeros(), 15);
    }

    /// Harmonic sum computed from scratch over the current registers
    fn registers_sum(dense: &Dense) -> f64 {
        (0..dense.m() as u32)
            .map(|idx| 1.0 / ((1u64 << dense.get_register(idx)) as f64))
            .sum()
    }

    #[test]
    fn test_stored_sum_tracks_registers_at_max_beta_precision() {
        let mut dense = Dense::new(18);
        for i in 0..2_000_000u64 {
            dense.insert_encoded_hash(encode_hash(wyhash::wyhash(&i.to_le_bytes(), 0), 18));
        }
        let exact = registers_sum(&dense);
        assert!(
            (dense.sum() - exact).abs() <= 1e-9 * exact,
            "stored sum {} != register sum {}",
            dense.sum(),
            exact
        );
    }

    #[test]
    fn test_small_terms_are_not_lost_in_large_sum() {
        let mut dense = Dense::new(18);
        for rank in 1..=24 {
            for idx in 0..dense.m() as u32 {
                dense.update_rank(idx, rank);
            }
        }
        // every register holds rank 24, so the sum is exactly m / 2^24
        assert_eq!(dense.sum(), registers_sum(&dense));
        assert_eq!(dense.sum(), (1u64 << 18) as f64 / (1u64 << 24) as f64);
    }

    #[test]
    fn test_merge_keeps_sum_exact() {
        let mut lhs = Dense::new(18);
        let mut rhs = Dense::new(18);
        for i in 0..500_000u64 {
            let h = encode_hash(wyhash::wyhash(&i.to_le_bytes(), 1), 18);
            if i % 2 == 0 {
                lhs.insert_encoded_hash(h);
            } else {
                rhs.insert_encoded_hash(h);
            }
        }
        lhs.merge(&rhs);
        let exact = registers_sum(&lhs);
        assert!((lhs.sum() - exact).abs() <= 1e-9 * exact);
    }

    #[test]
    fn test_linear_counting_above_beta_precision() {
        let mut dense = Dense::new(20);
        for idx in 0..1000u32 {
            dense.update_rank(idx * 7, 1);
        }
        let m = (1u64 << 20) as f64;
        assert_eq!(dense.estimate(), m * (m / (m - 1000.0)).ln());
        assert!((dense.estimate() - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_empty_estimate_is_zero() {
        for precision in 4..=24 {
            assert_eq!(Dense::new(precision).estimate(), 0.0);
        }
    }

    #[test]
    fn test_merge_takes_maximum() {
        let mut lhs = Dense::new(4);
        lhs.update_rank(0, 3);
        lhs.update_rank(1, 1);
        let mut rhs = Dense::new(4);
        rhs.update_rank(0, 1);
        rhs.update_rank(1, 4);
        rhs.update_rank(2, 2);

        lhs.merge(&rhs);

        assert_eq!(lhs.get_register(0), 3);
        assert_eq!(lhs.get_register(1), 4);
        assert_eq!(lhs.get_register(2), 2);
        assert_eq!(lhs.zeros(), 13);
    }
}
