//! # Coefficient file loaders
//!
//! Readers turning the text formats in which geomagnetic models are distributed into
//! coefficient sources ([`crate::coefficients`]).
//!
//! | Format | Entry points | Result |
//! |--------|--------------|--------|
//! | WMM `.COF` | [`load_wmm`] / [`parse_wmm`] | [`SparseSHCoefficientsTimeDependent`](crate::coefficients::SparseSHCoefficientsTimeDependent), two nodes `[epoch, epoch + 5y]` |
//! | EMM static + secular variation | [`load_emm`] / [`parse_emm`] | [`CombinedSHCoefficients`](crate::coefficients::CombinedSHCoefficients) |
//! | IGRF table | [`load_igrf`] / [`parse_igrf`] | [`SparseSHCoefficientsTimeDependent`](crate::coefficients::SparseSHCoefficientsTimeDependent) |
//! | SHC (CHAOS, SIFM, IGRF) | [`load_shc`] / [`parse_shc`], [`load_shc_combined`] | [`ShcCoefficients`] / [`CombinedSHCoefficients`](crate::coefficients::CombinedSHCoefficients) |
//!
//! ## Errors
//! -----------------
//! Malformed content fails with a [`ParseCoeffError`] wrapped in
//! [`MagModError::Parsing`](crate::magmod_errors::MagModError::Parsing). Line numbers are
//! 1-based and count every physical line of the file, comments and blank lines included.
//!
//! Records are tokenised with `nom`; fields are separated by blanks.
mod emm;
mod igrf;
mod shc;
mod wmm;

use nom::{
    character::complete::{i64 as int64, space0, space1},
    combinator::all_consuming,
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};
use thiserror::Error;

use crate::{constants::DecimalYear, time::is_supported_year};

pub use emm::{load_emm, parse_emm};
pub use igrf::{load_igrf, parse_igrf};
pub use shc::{load_shc, load_shc_combined, parse_shc, ShcCoefficients};
pub use wmm::{load_wmm, parse_wmm};

/// Line-level errors of the coefficient file readers.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ParseCoeffError {
    #[error("The file has no header line")]
    MissingHeader,
    #[error("Invalid line #{line}: {content}")]
    InvalidLine { line: usize, content: String },
    #[error("Invalid line #{line}: order {m} exceeds degree {n}")]
    OrderExceedsDegree { line: usize, n: usize, m: usize },
    #[error("Invalid line #{line}: expected {expected} values, found {found}")]
    ValueCount {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl ParseCoeffError {
    pub(crate) fn invalid_line(line: usize, content: &str) -> Self {
        ParseCoeffError::InvalidLine {
            line,
            content: content.trim_end().to_string(),
        }
    }
}

/// Non-blank lines with their 1-based line numbers.
///
/// With `skip_comments`, lines starting with `#` are dropped as well.
pub(crate) fn content_lines(
    contents: &str,
    skip_comments: bool,
) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(move |(_, line)| {
            let line = line.trim_start();
            !line.is_empty() && !(skip_comments && line.starts_with('#'))
        })
}

fn parse_number_list(input: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(delimited(space0, separated_list0(space1, double), space0)).parse(input)
}

fn parse_record(input: &str) -> IResult<&str, (i64, i64, Vec<f64>)> {
    all_consuming(delimited(
        space0,
        (
            int64,
            preceded(space1, int64),
            many0(preceded(space1, double)),
        ),
        space0,
    ))
    .parse(input)
}

/// Blank-separated floats filling the whole line.
pub(crate) fn numbers(line: &str) -> Option<Vec<f64>> {
    parse_number_list(line).ok().map(|(_, values)| values)
}

/// A coefficient record `n m v1 v2 …` with integer `n` and `m`.
pub(crate) fn record(line: &str) -> Option<(i64, i64, Vec<f64>)> {
    parse_record(line).ok().map(|(_, rec)| rec)
}

/// Validate the `(n, m)` of a record. `m` may be negative (SHC sine terms), `|m| ≤ n` is enforced.
pub(crate) fn check_record_index(
    line: usize,
    content: &str,
    n: i64,
    m: i64,
) -> Result<(usize, usize), ParseCoeffError> {
    if n < 0 {
        return Err(ParseCoeffError::invalid_line(line, content));
    }
    let (n, m) = (n as usize, m.unsigned_abs() as usize);
    if m > n {
        Err(ParseCoeffError::OrderExceedsDegree { line, n, m })
    } else {
        Ok((n, m))
    }
}

/// Reject a header line whose decimal years fall outside the supported calendar range.
pub(crate) fn check_years(
    line: usize,
    content: &str,
    years: &[DecimalYear],
) -> Result<(), ParseCoeffError> {
    if years.iter().all(|year| is_supported_year(*year)) {
        Ok(())
    } else {
        Err(ParseCoeffError::invalid_line(line, content))
    }
}

/// Check that a record carries the expected number of values.
pub(crate) fn check_value_count(
    line: usize,
    values: &[f64],
    expected: usize,
) -> Result<(), ParseCoeffError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(ParseCoeffError::ValueCount {
            line,
            expected,
            found: values.len(),
        })
    }
}
