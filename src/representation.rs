use enum_dispatch::enum_dispatch;

use crate::dense::Dense;
use crate::sparse::Sparse;

/// Width of a HyperLogLog register in bits.
pub(crate) const REGISTER_WIDTH: usize = 6;
/// Largest rank a register can hold.
const MAX_RANK: u32 = (1 << REGISTER_WIDTH) - 1;
/// Number of hash bits kept as the register index of an encoded hash.
const SPARSE_INDEX_BITS: usize = 32 - REGISTER_WIDTH - 1;
/// Smallest supported precision.
pub(crate) const MIN_PRECISION: u32 = 4;
/// Largest supported precision, the register index must fit into the sparse index.
pub(crate) const MAX_PRECISION: u32 = 24;

/// Representation types supported by `HyperLogLog`
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch]
pub(crate) enum Representation {
    Sparse(Sparse),
    Dense(Dense),
}

/// Representation trait which must be implemented by all representations.
#[enum_dispatch(Representation)]
pub(crate) trait RepresentationTrait {
    /// Insert encoded hash.
    /// Returns false when the representation is full and must be upgraded.
    fn insert_encoded_hash(&mut self, h: u32) -> bool;
    fn estimate(&self) -> f64;
    fn size_of(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// Compute the encoding of the given hash: sparse register index in the upper bits,
/// rank of the normal precision register in the lowest `REGISTER_WIDTH` bits.
///
/// Encoded hash is never zero since rank is at least 1.
#[inline]
pub(crate) fn encode_hash(hash: u64, precision: u32) -> u32 {
    let idx = (hash as u32) & ((1 << SPARSE_INDEX_BITS) - 1);
    let rank = ((!hash >> precision).trailing_zeros() + 1).min(MAX_RANK);
    (idx << REGISTER_WIDTH) | rank
}

/// Return normal index and rank from encoded hash
#[inline]
pub(crate) fn decode_hash(h: u32, precision: u32) -> (u32, u32) {
    let rank = h & MAX_RANK;
    let idx = (h >> REGISTER_WIDTH) & ((1 << precision) - 1);
    (idx, rank)
}
