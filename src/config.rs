//! Workload configuration resolved from the positional command line arguments
//! `<mode> <datatype> <m> <n> [len]`.

use std::fmt::{Display, Formatter};
use std::mem::size_of;
use std::str::FromStr;

use crate::representation::{MAX_PRECISION, MIN_PRECISION};
use crate::estimator::{EstimatorConfig, EstimatorKind};

/// Smallest register count the production estimator supports
pub const MIN_REGISTER_COUNT: u64 = 1 << MIN_PRECISION;
/// Largest register count the production estimator supports
pub const MAX_REGISTER_COUNT: u64 = 1 << MAX_PRECISION;

pub const USAGE: &str = "\
usage: measure <merge|query> <str|uint64> <m> <n> [len]
  where
merge - perform a merge experiment
query - perform a query experiment
str - assume stdin contains fixed-length strings
uint64 - assume stdin contains big-endian uint64s
m - number of registers (a power of two)
n - the number of elements to read from stdin
len - length of strings to read from stdin";

/// Configuration error, detected before any input is read.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{}", USAGE)]
    WrongArgumentCount(usize),
    #[error("Invalid mode `{0}' given: must be `merge' or `query'")]
    InvalidMode(String),
    #[error("Invalid datatype `{0}' given: must be `str' or `uint64'")]
    InvalidDataType(String),
    #[error("Invalid number of registers `{0}' given: must be an integer")]
    InvalidRegisterCount(String),
    #[error("The number of registers must be a power of two!")]
    RegisterCountNotPowerOfTwo(i64),
    #[error(
        "The number of registers must be between {} and {}",
        MIN_REGISTER_COUNT,
        MAX_REGISTER_COUNT
    )]
    RegisterCountOutOfRange(u64),
    #[error("Invalid number of elements `{0}' given: must be an integer")]
    InvalidElementCount(String),
    #[error("The number of elements to read must be non-negative!")]
    NegativeElementCount(i64),
    #[error("Len must be given for datatype str")]
    MissingLen,
    #[error("Invalid len `{0}' given: must be an integer")]
    InvalidLen(String),
    #[error("Len must be positive")]
    NonPositiveLen(i64),
    #[error("Len must be given only for datatype str")]
    UnexpectedLen,
}

/// Experiment to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Insert every element into one estimator and query it.
    Query,
    /// Build two estimators from halves of the input and merge them into a third one.
    Merge,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Mode::Query),
            "merge" => Ok(Mode::Merge),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Mode::Query => "query",
            Mode::Merge => "merge",
        })
    }
}

/// Encoding of the elements on standard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 8-byte big-endian unsigned integers
    UInt64,
    /// Records of exactly `len` bytes
    FixedString { len: usize },
}

impl DataType {
    /// Number of input bytes per element
    pub fn element_size(&self) -> usize {
        match self {
            DataType::UInt64 => size_of::<u64>(),
            DataType::FixedString { len } => *len,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::UInt64 => f.write_str("uint64"),
            DataType::FixedString { len } => write!(f, "str[{len}]"),
        }
    }
}

/// Fully validated configuration of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    pub mode: Mode,
    pub datatype: DataType,
    pub register_count: u64,
    /// log2 of `register_count`
    pub precision: u32,
    pub element_count: usize,
    pub estimator: EstimatorKind,
    /// Allow estimators to start in sparse representation
    pub sparse: bool,
}

impl WorkloadConfig {
    /// Validate positional arguments `<mode> <datatype> <m> <n> [len]`, checked in this order.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        if !(4..=5).contains(&args.len()) {
            return Err(ConfigError::WrongArgumentCount(args.len()));
        }
        let arg = |i: usize| args[i].as_ref();

        let mode = arg(0).parse::<Mode>()?;

        let is_str = match arg(1) {
            "str" => true,
            "uint64" => false,
            dt => return Err(ConfigError::InvalidDataType(dt.to_string())),
        };

        let m = arg(2)
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidRegisterCount(arg(2).to_string()))?;
        let register_count = u64::try_from(m)
            .ok()
            .filter(|m| m.is_power_of_two())
            .ok_or(ConfigError::RegisterCountNotPowerOfTwo(m))?;
        let precision = register_count.trailing_zeros();
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(ConfigError::RegisterCountOutOfRange(register_count));
        }

        let n = arg(3)
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidElementCount(arg(3).to_string()))?;
        let element_count =
            usize::try_from(n).map_err(|_| ConfigError::NegativeElementCount(n))?;

        let datatype = match (is_str, args.get(4).map(|len| len.as_ref())) {
            (true, None) => return Err(ConfigError::MissingLen),
            (true, Some(len)) => {
                let len = len
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidLen(len.to_string()))?;
                match usize::try_from(len) {
                    Ok(len) if len >= 1 => DataType::FixedString { len },
                    _ => return Err(ConfigError::NonPositiveLen(len)),
                }
            }
            (false, Some(_)) => return Err(ConfigError::UnexpectedLen),
            (false, None) => DataType::UInt64,
        };

        Ok(Self {
            mode,
            datatype,
            register_count,
            precision,
            element_count,
            estimator: EstimatorKind::default(),
            sparse: false,
        })
    }

    pub fn with_estimator(mut self, estimator: EstimatorKind) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Configuration every estimator of this run is built from
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig::new(self.precision).sparse(self.sparse)
    }
}
