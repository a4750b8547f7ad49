//! Line-oriented benchmark report parsed by downstream tooling.
//!
//! Every run prints exactly these five lines to standard output:
//!
//! ```text
//! time <seconds as %g>
//! estimate <estimate as %f>
//! bitsize <(1 << logM) * 8>
//! compressCount -1
//! rebaseCount -1
//! ```

use std::fmt::{Display, Formatter};
use std::io::{self, Write};

/// Value of internal estimator counters not tracked by this harness.
pub const NOT_TRACKED: i64 = -1;
/// Bits of state reported per register.
pub const BITS_PER_REGISTER: u64 = 8;

/// Outcome of a single measured run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub elapsed_seconds: f64,
    pub estimate: f64,
    pub register_bit_size: u64,
    pub compress_count: i64,
    pub rebase_count: i64,
}

impl Report {
    /// Create report for an estimator with `2^precision` registers.
    pub fn new(elapsed_seconds: f64, estimate: f64, precision: u32) -> Self {
        Self {
            elapsed_seconds,
            estimate,
            register_bit_size: (1u64 << precision) * BITS_PER_REGISTER,
            compress_count: NOT_TRACKED,
            rebase_count: NOT_TRACKED,
        }
    }

    /// Write the report and flush `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{self}")?;
        writer.flush()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "time {}", format_general(self.elapsed_seconds))?;
        writeln!(f, "estimate {:.6}", self.estimate)?;
        writeln!(f, "bitsize {}", self.register_bit_size)?;
        writeln!(f, "compressCount {}", self.compress_count)?;
        writeln!(f, "rebaseCount {}", self.rebase_count)
    }
}

/// Significant digits printed by `format_general`.
const GENERAL_PRECISION: i32 = 6;

/// Format `x` the way C `printf("%g")` does: 6 significant digits, trailing zeros removed,
/// scientific notation when the exponent is below -4 or at least 6.
pub fn format_general(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // exponent after rounding to the requested number of significant digits
    let scientific = format!("{:.*e}", (GENERAL_PRECISION - 1) as usize, x);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= GENERAL_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (GENERAL_PRECISION - 1 - exponent) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, x)).to_string()
    }
}

fn strip_trailing_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
