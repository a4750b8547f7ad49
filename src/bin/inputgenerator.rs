use std::io::{self, Write};
use std::time::Instant;

use anyhow::{bail, Result};
use cardinality_bench::generator::{generate_integers, generate_records};
use cardinality_bench::init_env_logger;
use clap::{Parser, ValueEnum};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Datatype {
    /// 8-byte big-endian unsigned integers.
    Uint64,
    /// Fixed-length alphanumeric strings.
    Str,
}

#[derive(Parser, Debug)]
#[command(about = "Generates random benchmark input on stdout", long_about = None)]
struct Args {
    /// Number of elements to create.
    n: usize,
    /// Datatype of the elements.
    #[arg(value_enum)]
    datatype: Datatype,
    /// Random number generator seed.
    seed: u64,
    /// Length of strings to create (for str input).
    #[arg(long)]
    len: Option<usize>,
}

fn main() -> Result<()> {
    init_env_logger()?;

    let args = Args::parse();

    let len = match (args.datatype, args.len) {
        (Datatype::Str, None) => bail!("datatype str requires --len"),
        (Datatype::Str, Some(0)) => bail!("--len must be positive"),
        (Datatype::Uint64, Some(_)) => {
            bail!("--len can be used only in conjunction with datatype str")
        }
        (_, len) => len.unwrap_or_default(),
    };

    let mut rng = StdRng::seed_from_u64(args.seed);

    let start = Instant::now();
    let bytes = match args.datatype {
        Datatype::Uint64 => generate_integers(&mut rng, args.n)?,
        Datatype::Str => generate_records(&mut rng, args.n, len)?,
    };
    eprintln!("data generation took {}", start.elapsed().as_secs_f64());
    debug!("generated {} bytes with seed {}", bytes.len(), args.seed);

    let start = Instant::now();
    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    eprintln!("data writing took {}", start.elapsed().as_secs_f64());

    Ok(())
}
