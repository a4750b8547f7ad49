use std::io;

use anyhow::{Context, Result};
use cardinality_bench::{init_env_logger, read_input, workload, EstimatorKind, WorkloadConfig};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(
    about = "Measures query or merge cost of a distinct-count estimator on input read from stdin",
    long_about = None
)]
struct Args {
    /// <merge|query> <str|uint64> <m> <n> [len]
    #[arg(value_name = "ARGS", allow_negative_numbers = true)]
    args: Vec<String>,
    /// Estimator to measure.
    #[arg(long, value_enum, default_value_t = EstimatorKind::HyperLogLog)]
    estimator: EstimatorKind,
    /// Let estimators start in sparse representation instead of forcing dense mode.
    #[arg(long, default_value_t = false)]
    sparse: bool,
}

fn main() -> Result<()> {
    init_env_logger()?;

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            err.print()?;
            return Ok(());
        }
    };

    let config = match WorkloadConfig::from_args(&args.args) {
        Ok(config) => config
            .with_estimator(args.estimator)
            .with_sparse(args.sparse),
        Err(err) => {
            // configuration errors end the run before any input is read
            eprintln!("{err}");
            return Ok(());
        }
    };
    info!("{:?}", config);

    let input = read_input(io::stdin().lock(), &config.datatype, config.element_count)
        .with_context(|| {
            format!(
                "failed to read {} {} elements from stdin",
                config.element_count, config.datatype
            )
        })?;

    let report = workload::run(&config, &input);
    report.write_to(io::stdout().lock())?;

    Ok(())
}
