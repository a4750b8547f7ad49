//! Random benchmark input in the encodings read by [`crate::input`].

use std::mem::size_of;

use rand::Rng;

/// Characters of generated string records.
pub const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Input generation error
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("{n} elements of {element_size} bytes do not fit into memory")]
    TooLarge { n: usize, element_size: usize },
}

/// Total output size of `n` elements of `element_size` bytes
fn output_size(n: usize, element_size: usize) -> Result<usize, GeneratorError> {
    n.checked_mul(element_size)
        .ok_or(GeneratorError::TooLarge { n, element_size })
}

/// `n` uniformly random `u64` values, big-endian encoded.
pub fn generate_integers<R: Rng>(rng: &mut R, n: usize) -> Result<Vec<u8>, GeneratorError> {
    let mut bytes = Vec::with_capacity(output_size(n, size_of::<u64>())?);
    for _ in 0..n {
        bytes.extend_from_slice(&rng.gen::<u64>().to_be_bytes());
    }
    Ok(bytes)
}

/// `n` records of `len` characters drawn uniformly from [`ALPHANUMERIC`].
pub fn generate_records<R: Rng>(
    rng: &mut R,
    n: usize,
    len: usize,
) -> Result<Vec<u8>, GeneratorError> {
    Ok((0..output_size(n, len)?)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())])
        .collect())
}
