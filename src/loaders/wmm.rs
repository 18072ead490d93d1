//! Reader of the World Magnetic Model `.COF` coefficient files.
//!
//! ```text
//!     2015.0            WMM-2015        12/15/2014
//!   1  0  -29438.5       0.0       10.7        0.0
//!   1  1   -1501.1    4796.2       17.9      -26.8
//!   ...
//! 999999999999999999999999999999999999999999999999
//! 999999999999999999999999999999999999999999999999
//! ```
//!
//! The header holds the epoch (decimal year), the model name and its release date.
//! Each record is `n m g h dg dh` with the rates in nT/year. Lines made of nines only
//! close the coefficient block and are skipped.
use std::sync::LazyLock;

use camino::Utf8Path;
use nom::{
    bytes::complete::take_till1,
    character::complete::{space0, space1},
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use regex::Regex;
use tracing::debug;

use super::{
    check_record_index, check_value_count, check_years, content_lines, record, ParseCoeffError,
};
use crate::{
    coefficients::{SHCoefficients, SparseSHCoefficientsTimeDependent},
    constants::{DecimalYear, WMM_VALIDITY_SPAN},
    magmod_errors::MagModError,
};

static END_OF_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*9+\s*$").expect("end-of-block pattern is a valid regex"));

/// Header line of a `.COF` file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CofHeader {
    pub epoch: DecimalYear,
    pub name: String,
    pub version: String,
}

/// One `n m v1 v2 [v3 v4]` record of a `.COF` file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CofRecord {
    pub line: usize,
    pub n: usize,
    pub m: usize,
    pub values: Vec<f64>,
}

fn parse_header_line(input: &str) -> IResult<&str, (f64, &str, &str)> {
    (
        preceded(space0, double),
        preceded(space1, take_till1(char::is_whitespace)),
        preceded(space1, take_till1(char::is_whitespace)),
    )
        .parse(input)
}

/// Split a `.COF` file into its header and its records.
///
/// Records may carry two (`g h`) or four (`g h dg dh`) values.
pub(crate) fn parse_cof(contents: &str) -> Result<(CofHeader, Vec<CofRecord>), ParseCoeffError> {
    let mut lines = content_lines(contents, false);

    let (header_line, header) = lines.next().ok_or(ParseCoeffError::MissingHeader)?;
    let (_, (epoch, name, version)) = parse_header_line(header)
        .map_err(|_| ParseCoeffError::invalid_line(header_line, header))?;
    check_years(header_line, header, &[epoch, epoch + WMM_VALIDITY_SPAN])?;
    let header = CofHeader {
        epoch,
        name: name.to_string(),
        version: version.to_string(),
    };

    let records = lines
        .filter(|(_, content)| !END_OF_BLOCK.is_match(content))
        .map(|(line, content)| {
            let (n, m, values) =
                record(content).ok_or_else(|| ParseCoeffError::invalid_line(line, content))?;
            let (n, m) = check_record_index(line, content, n, m)?;
            if values.len() != 2 {
                check_value_count(line, &values, 4)?;
            }
            Ok(CofRecord { line, n, m, values })
        })
        .collect::<Result<Vec<_>, ParseCoeffError>>()?;

    Ok((header, records))
}

/// Parse the contents of a WMM coefficient file.
///
/// Return
/// ------
/// * a two-node internal source valid from the epoch to five years later
pub fn parse_wmm(contents: &str) -> Result<SparseSHCoefficientsTimeDependent, MagModError> {
    let (header, records) = parse_cof(contents)?;
    for rec in &records {
        check_value_count(rec.line, &rec.values, 4)?;
    }

    let terms = records.into_iter().map(|rec| {
        (
            (rec.n, rec.m),
            (rec.values[0], rec.values[1], rec.values[2], rec.values[3]),
        )
    });
    let coeff = SparseSHCoefficientsTimeDependent::from_secular_variation(
        header.epoch,
        WMM_VALIDITY_SPAN,
        terms,
        true,
    )?;

    debug!(
        model = %header.name,
        version = %header.version,
        epoch = header.epoch,
        degree = coeff.degree(),
        "parsed WMM coefficients"
    );
    Ok(coeff)
}

/// Load a WMM coefficient file (e.g. `WMM.COF`).
pub fn load_wmm(path: &Utf8Path) -> Result<SparseSHCoefficientsTimeDependent, MagModError> {
    debug!(%path, "loading WMM model");
    parse_wmm(&std::fs::read_to_string(path)?)
}
