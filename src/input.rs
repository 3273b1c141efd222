use std::io::{BufRead, Write};
use tracing::warn;

pub const MIN_COUNT: usize = 1;
pub const MAX_COUNT: usize = 250;
pub const DEFAULT_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountWarning {
    /// Not an integer at all.
    InvalidInput,
    /// An integer outside `MIN_COUNT..=MAX_COUNT`.
    OutOfRange,
}

impl CountWarning {
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput => format!("Invalid input. Defaulting to {} movies.", DEFAULT_COUNT),
            Self::OutOfRange => format!("Invalid range! Defaulting to {} movies.", DEFAULT_COUNT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountResolution {
    pub count: usize,
    pub warning: Option<CountWarning>,
}

/// Turns raw user input into the number of chart entries to scrape.
/// Never fails: anything unusable falls back to `DEFAULT_COUNT`.
pub fn resolve_count(raw: &str) -> CountResolution {
    match raw.trim().parse::<i64>() {
        Ok(n) if (MIN_COUNT as i64..=MAX_COUNT as i64).contains(&n) => CountResolution {
            count: n as usize,
            warning: None,
        },
        Ok(_) => CountResolution {
            count: DEFAULT_COUNT,
            warning: Some(CountWarning::OutOfRange),
        },
        Err(_) => CountResolution {
            count: DEFAULT_COUNT,
            warning: Some(CountWarning::InvalidInput),
        },
    }
}

/// Resolves a count and reports any fallback to the console.
pub fn resolve_and_report<W: Write>(raw: &str, out: &mut W) -> usize {
    let resolution = resolve_count(raw);
    if let Some(warning) = resolution.warning {
        warn!(input = raw.trim(), "count rejected, using default");
        let _ = writeln!(out, "{}", warning.message());
    }
    resolution.count
}

/// Asks for the count on `out` and reads one line from `input`.
pub fn prompt_count<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> usize {
    let _ = write!(
        out,
        "Enter the number of top movies to scrape ({}-{}): ",
        MIN_COUNT, MAX_COUNT
    );
    let _ = out.flush();

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => resolve_and_report(&line, out),
        Err(e) => {
            warn!("failed to read count from console: {}", e);
            let _ = writeln!(out, "{}", CountWarning::InvalidInput.message());
            DEFAULT_COUNT
        }
    }
}
