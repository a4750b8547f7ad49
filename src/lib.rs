//! `cardinality-bench` is a single-shot micro-benchmark harness for distinct-count estimators.
//!
//! It decodes a raw input stream, times either the insertion of every element into one
//! estimator (query workload) or the merge of two partial estimators into a third one
//! (merge workload), and prints a fixed five-line report. The production estimator is a
//! runtime-precision HyperLogLog++ with LogLog-Beta bias correction.
mod beta;
pub mod config;
mod dense;
pub mod estimator;
pub mod generator;
pub mod hyperloglog;
pub mod input;
pub mod report;
mod representation;
mod sparse;
pub mod workload;

pub use config::{ConfigError, DataType, Mode, WorkloadConfig};
pub use estimator::{Estimator, EstimatorConfig, EstimatorKind, ExactCounter};
pub use hyperloglog::HyperLogLog;
pub use input::{read_input, InputError, InputSequence};
pub use report::Report;

/// Initialize `env_logger` writing to standard error, `warn` level unless `RUST_LOG` says otherwise.
pub fn init_env_logger() -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init()
}
