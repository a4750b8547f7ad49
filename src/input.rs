//! Decoding of the raw benchmark input.
//!
//! Input carries no header and no delimiters: either `n` consecutive 8-byte big-endian
//! integers or `n` consecutive records of `len` bytes. Anything shorter is an error, the
//! harness never runs on a partial input.

use std::io::{self, BufReader, ErrorKind, Read};
use std::time::Instant;

use log::debug;

use crate::config::DataType;

/// Input reading error
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("input ended after {read} of {expected} elements")]
    Truncated { read: usize, expected: usize },
    #[error("failed to read input")]
    Io(#[from] io::Error),
}

/// Decoded input, all elements of the configured datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSequence {
    Integers(Vec<u64>),
    Records(Vec<String>),
}

impl InputSequence {
    pub fn len(&self) -> usize {
        match self {
            InputSequence::Integers(data) => data.len(),
            InputSequence::Records(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Upper bound of elements reserved up front, the requested count is not trusted until read.
const MAX_RESERVED_ELEMENTS: usize = 1 << 20;
/// Upper bound of record bytes reserved up front.
const MAX_RESERVED_RECORD_BYTES: usize = 1 << 16;

/// Read exactly `n` big-endian `u64` values.
pub fn read_integers<R: Read>(reader: R, n: usize) -> Result<Vec<u64>, InputError> {
    let mut reader = BufReader::new(reader);
    let mut data = Vec::with_capacity(n.min(MAX_RESERVED_ELEMENTS));
    let mut buf = [0u8; 8];
    for read in 0..n {
        read_element(&mut reader, &mut buf, read, n)?;
        data.push(u64::from_be_bytes(buf));
    }
    Ok(data)
}

/// Read exactly `n` records of `len` bytes, decoded as (lossy) UTF-8 text.
pub fn read_records<R: Read>(reader: R, n: usize, len: usize) -> Result<Vec<String>, InputError> {
    let mut reader = BufReader::new(reader);
    let mut data = Vec::with_capacity(n.min(MAX_RESERVED_ELEMENTS));
    let mut buf = Vec::with_capacity(len.min(MAX_RESERVED_RECORD_BYTES));
    for read in 0..n {
        read_record(&mut reader, &mut buf, len, read, n)?;
        data.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(data)
}

/// Read one record of `len` bytes into `buf`, growing it only as bytes arrive.
#[inline]
fn read_record<R: Read>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    len: usize,
    read: usize,
    expected: usize,
) -> Result<(), InputError> {
    buf.clear();
    reader.by_ref().take(len as u64).read_to_end(buf)?;
    if buf.len() < len {
        return Err(InputError::Truncated { read, expected });
    }
    Ok(())
}

#[inline]
fn read_element<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    read: usize,
    expected: usize,
) -> Result<(), InputError> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => InputError::Truncated { read, expected },
        _ => InputError::Io(err),
    })
}

/// Read `n` elements of `datatype` and report the time spent decoding on standard error.
pub fn read_input<R: Read>(
    reader: R,
    datatype: &DataType,
    n: usize,
) -> Result<InputSequence, InputError> {
    let start = Instant::now();
    let input = match datatype {
        DataType::UInt64 => InputSequence::Integers(read_integers(reader, n)?),
        DataType::FixedString { len } => InputSequence::Records(read_records(reader, n, *len)?),
    };
    let seconds = start.elapsed().as_secs_f64();
    eprintln!("Reading data took {seconds}");
    debug!(
        "decoded {} {} elements ({} bytes)",
        input.len(),
        datatype,
        input.len() * datatype.element_size()
    );
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_read_integers_big_endian() {
        let bytes = [
            0u8, 0, 0, 0, 0, 0, 0, 1, //
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
        ];
        let data = read_integers(&bytes[..], 2).unwrap();
        assert_eq!(data, vec![1, 0x0123_4567_89ab_cdef]);
    }

    #[test]
    fn test_read_integers_ignores_trailing_bytes() {
        let bytes = [0xffu8; 20];
        assert_eq!(read_integers(&bytes[..], 2).unwrap(), vec![u64::MAX; 2]);
    }

    #[test]
    fn test_read_records() {
        let data = read_records(&b"abcdefghij"[..], 3, 3).unwrap();
        assert_eq!(data, vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn test_read_records_lossy() {
        let data = read_records(&[b'a', 0xff][..], 1, 2).unwrap();
        assert_eq!(data, vec!["a\u{fffd}"]);
    }

    #[test_case(0, 0)]
    #[test_case(0, 5)]
    #[test_case(7, 7)]
    #[test_case(100, 100)]
    fn test_read_input_length(n: usize, available: usize) {
        let bytes = vec![7u8; available * 8];
        let input = read_input(&bytes[..], &DataType::UInt64, n).unwrap();
        assert_eq!(input.len(), n);

        let bytes = vec![b'x'; available * 4];
        let input = read_input(&bytes[..], &DataType::FixedString { len: 4 }, n).unwrap();
        assert_eq!(input.len(), n);
    }

    #[test]
    fn test_empty_input() {
        let input = read_input(io::empty(), &DataType::UInt64, 0).unwrap();
        assert!(input.is_empty());
        assert_eq!(input, InputSequence::Integers(vec![]));
    }

    #[test]
    fn test_truncated_integers() {
        let bytes = [0u8; 20];
        let err = read_integers(&bytes[..], 3).unwrap_err();
        assert!(matches!(
            err,
            InputError::Truncated {
                read: 2,
                expected: 3
            }
        ));
    }

    #[test]
    fn test_truncated_records() {
        let err = read_input(&b"abcde"[..], &DataType::FixedString { len: 3 }, 2).unwrap_err();
        assert_eq!(err.to_string(), "input ended after 1 of 2 elements");
    }

    #[test]
    fn test_huge_count_on_short_input_is_truncated() {
        let bytes = [0u8; 24];
        let err = read_integers(&bytes[..], usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            InputError::Truncated {
                read: 3,
                expected: usize::MAX
            }
        ));

        let err = read_input(io::empty(), &DataType::UInt64, 100_000_000_000).unwrap_err();
        assert_eq!(
            err.to_string(),
            "input ended after 0 of 100000000000 elements"
        );
    }

    #[test]
    fn test_huge_record_len_on_short_input_is_truncated() {
        let err = read_records(&b"abcdef"[..], usize::MAX, 1 << 40).unwrap_err();
        assert!(matches!(
            err,
            InputError::Truncated {
                read: 0,
                expected: usize::MAX
            }
        ));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_io_error() {
        let err = read_integers(FailingReader, 1).unwrap_err();
        assert!(matches!(err, InputError::Io(ref e) if e.kind() == ErrorKind::PermissionDenied));

        let err = read_records(FailingReader, 1, 4).unwrap_err();
        assert!(matches!(err, InputError::Io(ref e) if e.kind() == ErrorKind::PermissionDenied));
    }
}
