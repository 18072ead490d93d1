//! Reader of the IGRF coefficient table (`igrf11coeffs.txt`, `igrf12coeffs.txt`).
//!
//! ```text
//! # comments
//! c/s deg ord IGRF IGRF ... DGRF IGRF SV
//! g/h n m 1900.0 1905.0 ... 2005.0 2010.0 2010-15
//! g 1 0 -31543 -31464 ... -29554.63 -29496.5 11.4
//! h 1 1   5922   5909 ...   5077.99   4945.1 -28.8
//! ```
//!
//! The header row lists the epochs (decimal years). A trailing non-numeric column marks
//! the secular variation valid for the five years after the last epoch; it is turned into
//! one extra node `v_last + 5·sv` at `last + 5`.
use std::collections::BTreeMap;

use camino::Utf8Path;
use nom::{
    branch::alt,
    character::complete::{char, space1},
    combinator::rest,
    sequence::terminated,
    IResult, Parser,
};
use tracing::debug;

use super::{
    check_record_index, check_value_count, check_years, content_lines, record, ParseCoeffError,
};
use crate::{
    coefficients::{SHCoefficients, SparseSHCoefficientsTimeDependent},
    constants::WMM_VALIDITY_SPAN,
    magmod_errors::MagModError,
    time::decimal_years_to_mjd2000,
};

/// Epochs of the header row and whether a secular-variation column follows them.
fn parse_header(line: usize, content: &str) -> Result<(Vec<f64>, bool), ParseCoeffError> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    if tokens.len() < 4 || tokens[..3] != ["g/h", "n", "m"] {
        return Err(ParseCoeffError::invalid_line(line, content));
    }

    let mut epochs = Vec::with_capacity(tokens.len() - 3);
    let mut has_sv = false;
    for (idx, token) in tokens.iter().enumerate().skip(3) {
        match token.parse::<f64>() {
            Ok(year) if !has_sv => epochs.push(year),
            // only the last column may be the secular variation
            Err(_) if idx == tokens.len() - 1 && !epochs.is_empty() => has_sv = true,
            _ => return Err(ParseCoeffError::invalid_line(line, content)),
        }
    }
    Ok((epochs, has_sv))
}

fn parse_kind(input: &str) -> IResult<&str, (char, &str)> {
    (terminated(alt((char('g'), char('h'))), space1), rest).parse(input)
}

/// Parse the contents of an IGRF coefficient table.
pub fn parse_igrf(contents: &str) -> Result<SparseSHCoefficientsTimeDependent, MagModError> {
    let mut lines = content_lines(contents, true);

    // label row, then the header with the epochs
    lines.next().ok_or(ParseCoeffError::MissingHeader)?;
    let (header_line, header) = lines.next().ok_or(ParseCoeffError::MissingHeader)?;
    let (epochs, has_sv) = parse_header(header_line, header)?;
    let ncols = epochs.len() + usize::from(has_sv);

    let mut years = epochs;
    if has_sv {
        years.push(years[years.len() - 1] + WMM_VALIDITY_SPAN);
    }
    check_years(header_line, header, &years)?;
    let ntimes = years.len();

    let mut terms: BTreeMap<(usize, usize), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for (line, content) in lines {
        let (_, (kind, tail)) =
            parse_kind(content).map_err(|_| ParseCoeffError::invalid_line(line, content))?;
        let (n, m, mut values) =
            record(tail).ok_or_else(|| ParseCoeffError::invalid_line(line, content))?;
        let (n, m) = check_record_index(line, content, n, m)?;
        check_value_count(line, &values, ncols)?;

        if has_sv {
            let sv = values[ncols - 1];
            values[ncols - 1] = values[ncols - 2] + WMM_VALIDITY_SPAN * sv;
        }

        let entry = terms
            .entry((n, m))
            .or_insert_with(|| (vec![0.0; ntimes], vec![0.0; ntimes]));
        match kind {
            'g' => entry.0 = values,
            _ => entry.1 = values,
        }
    }

    let coeff = SparseSHCoefficientsTimeDependent::new(
        decimal_years_to_mjd2000(&years)?,
        terms,
        true,
    )?;
    debug!(
        nodes = ntimes,
        first = years[0],
        last = years[ntimes - 1],
        degree = coeff.degree(),
        "parsed IGRF coefficients"
    );
    Ok(coeff)
}

/// Load an IGRF coefficient table.
pub fn load_igrf(path: &Utf8Path) -> Result<SparseSHCoefficientsTimeDependent, MagModError> {
    debug!(%path, "loading IGRF model");
    parse_igrf(&std::fs::read_to_string(path)?)
}
