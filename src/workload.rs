//! Timed experiments.
//!
//! Only the operation under test runs between the two clock reads: estimator construction,
//! input decoding and (for merge) building the partial estimators stay outside.

use std::hash::Hash;
use std::time::Instant;

use log::debug;

use crate::config::{Mode, WorkloadConfig};
use crate::estimator::{Estimator, EstimatorConfig, EstimatorKind, ExactCounter};
use crate::hyperloglog::HyperLogLog;
use crate::input::InputSequence;
use crate::report::Report;

/// Insert every element in input order into one estimator, timing only the insertion loop.
pub fn measure_query<E, T>(config: &EstimatorConfig, data: &[T]) -> Report
where
    E: Estimator<T>,
{
    let mut estimator = E::build(config);

    let start = Instant::now();
    for item in data {
        estimator.add(item);
    }
    let seconds = start.elapsed().as_secs_f64();

    Report::new(seconds, estimator.result(), estimator.precision())
}

/// Build two estimators from the halves of `data` and time merging both into a third one.
pub fn measure_merge<E, T>(config: &EstimatorConfig, data: &[T]) -> Report
where
    E: Estimator<T>,
{
    let (seconds, merged) = timed_merge::<E, T>(config, data);
    Report::new(seconds, merged.result(), merged.precision())
}

/// Split point of the merge workload: first half gets `[0, n / 2)`, second `[n / 2, n)`.
#[inline]
pub fn split_halves<T>(data: &[T]) -> (&[T], &[T]) {
    data.split_at(data.len() / 2)
}

fn timed_merge<E, T>(config: &EstimatorConfig, data: &[T]) -> (f64, E)
where
    E: Estimator<T>,
{
    let mut first = E::build(config);
    let mut second = E::build(config);
    let mut merged = E::build(config);

    let (first_half, second_half) = split_halves(data);
    first_half.iter().for_each(|item| first.add(item));
    second_half.iter().for_each(|item| second.add(item));

    let start = Instant::now();
    merged.merge(&first);
    merged.merge(&second);
    let seconds = start.elapsed().as_secs_f64();

    (seconds, merged)
}

fn measure<E, T>(mode: Mode, config: &EstimatorConfig, data: &[T]) -> Report
where
    E: Estimator<T>,
{
    match mode {
        Mode::Query => measure_query::<E, T>(config, data),
        Mode::Merge => measure_merge::<E, T>(config, data),
    }
}

fn measure_with<T: Hash>(
    kind: EstimatorKind,
    mode: Mode,
    config: &EstimatorConfig,
    data: &[T],
) -> Report {
    match kind {
        EstimatorKind::HyperLogLog => measure::<HyperLogLog, T>(mode, config, data),
        EstimatorKind::Exact => measure::<ExactCounter, T>(mode, config, data),
    }
}

/// Run the configured experiment on decoded input.
pub fn run(config: &WorkloadConfig, input: &InputSequence) -> Report {
    let estimator_config = config.estimator_config();
    debug!(
        "running {} workload with {:?} estimator: {} elements, {} registers, sparse: {}",
        config.mode,
        config.estimator,
        input.len(),
        config.register_count,
        estimator_config.is_sparse()
    );
    let report = match input {
        InputSequence::Integers(data) => {
            measure_with(config.estimator, config.mode, &estimator_config, data)
        }
        InputSequence::Records(data) => {
            measure_with(config.estimator, config.mode, &estimator_config, data)
        }
    };
    debug!("measured {:?}", report);
    report
}
