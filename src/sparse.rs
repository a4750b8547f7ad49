//! ## Sparse representation
//! Allows to count small cardinality exactly (within hash collisions chance) by storing
//! encoded hashes in a set, until the set grows larger than half of the dense words.

use std::mem::size_of;

use hashbrown::HashSet;

use crate::dense::Dense;
use crate::representation::RepresentationTrait;

/// Sparse representation container
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Sparse {
    /// Encoded hashes seen so far
    hashes: HashSet<u32>,
    /// Maximum number of encoded hashes before switching to dense representation
    max_len: usize,
}

impl Sparse {
    /// Create new empty `Sparse` representation sized for `2^precision` registers
    pub(crate) fn new(precision: u32) -> Self {
        Self {
            hashes: HashSet::new(),
            max_len: Dense::words(precision) / 2,
        }
    }

    /// Return encoded hashes stored within `Sparse` representation
    #[inline]
    pub(crate) fn items(&self) -> impl Iterator<Item = u32> + '_ {
        self.hashes.iter().copied()
    }

    /// Number of stored encoded hashes
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Convert into dense representation of the given precision
    pub(crate) fn to_dense(&self, precision: u32) -> Dense {
        let mut dense = Dense::new(precision);
        for h in self.items() {
            dense.insert_encoded_hash(h);
        }
        dense
    }
}

impl RepresentationTrait for Sparse {
    #[inline]
    fn insert_encoded_hash(&mut self, h: u32) -> bool {
        if self.hashes.contains(&h) {
            return true;
        }
        if self.hashes.len() >= self.max_len {
            return false;
        }
        self.hashes.insert(h);
        true
    }

    #[inline]
    fn estimate(&self) -> f64 {
        self.hashes.len() as f64
    }

    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + self.hashes.capacity() * size_of::<u32>()
    }

    fn name(&self) -> &'static str {
        "Sparse"
    }
}
