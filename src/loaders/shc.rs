//! Reader of the SHC format used by the CHAOS, SIFM and recent IGRF releases.
//!
//! ```text
//! # comments
//!   1 20 2 6 1
//!                1997.0021 1997.1019
//!   1  0   -29614.3548 -29614.0573
//!   1  1    -1727.8463  -1727.6941
//!   1 -1     5186.5282   5186.3709
//! ```
//!
//! The header is `nmin nmax ntimes [spline_order [steps]]`, followed by the row of the
//! `ntimes` epochs (decimal years). Each record `n m v1 … v_ntimes` holds a `g` term when
//! `m ≥ 0` and an `h` term of order `|m|` when `m < 0`. The spline order is not used:
//! coefficients are interpolated linearly between the epochs.
use std::{collections::BTreeMap, sync::Arc};

use camino::Utf8Path;
use tracing::debug;

use super::{
    check_record_index, check_value_count, check_years, content_lines, numbers, record,
    ParseCoeffError,
};
use crate::{
    coefficients::{
        CoefficientSet, CombinedSHCoefficients, SHCoefficients, SparseSHCoefficientsConstant,
        SparseSHCoefficientsTimeDependent, Validity,
    },
    constants::MJD2000,
    magmod_errors::MagModError,
    time::decimal_years_to_mjd2000,
};

/// Coefficients read from an SHC file.
///
/// Files with a single epoch hold a static field; more epochs give a time-dependent one.
#[derive(Debug, Clone, PartialEq)]
pub enum ShcCoefficients {
    Constant(SparseSHCoefficientsConstant),
    TimeDependent(SparseSHCoefficientsTimeDependent),
}

impl ShcCoefficients {
    pub fn into_shared(self) -> Arc<dyn SHCoefficients> {
        match self {
            ShcCoefficients::Constant(c) => Arc::new(c),
            ShcCoefficients::TimeDependent(c) => Arc::new(c),
        }
    }

    fn inner(&self) -> &dyn SHCoefficients {
        match self {
            ShcCoefficients::Constant(c) => c,
            ShcCoefficients::TimeDependent(c) => c,
        }
    }
}

impl SHCoefficients for ShcCoefficients {
    fn degree(&self) -> usize {
        self.inner().degree()
    }

    fn is_internal(&self) -> bool {
        self.inner().is_internal()
    }

    fn validity(&self) -> Validity {
        self.inner().validity()
    }

    fn get(&self, n: usize, m: usize, time: MJD2000) -> Result<(f64, f64), MagModError> {
        self.inner().get(n, m, time)
    }

    fn eval(&self, time: MJD2000) -> CoefficientSet {
        self.inner().eval(time)
    }
}

/// `nmin nmax ntimes` of the header line.
fn parse_header(line: usize, content: &str) -> Result<(usize, usize, usize), ParseCoeffError> {
    let values = numbers(content).ok_or_else(|| ParseCoeffError::invalid_line(line, content))?;
    let as_count = |v: f64| (v >= 0.0 && v.fract() == 0.0).then_some(v as usize);
    match values.as_slice() {
        [nmin, nmax, ntimes, ..] => match (as_count(*nmin), as_count(*nmax), as_count(*ntimes)) {
            (Some(nmin), Some(nmax), Some(ntimes)) if ntimes > 0 && nmin <= nmax => {
                Ok((nmin, nmax, ntimes))
            }
            _ => Err(ParseCoeffError::invalid_line(line, content)),
        },
        _ => Err(ParseCoeffError::ValueCount {
            line,
            expected: 3,
            found: values.len(),
        }),
    }
}

/// Parse the contents of an SHC file.
pub fn parse_shc(contents: &str) -> Result<ShcCoefficients, MagModError> {
    let mut lines = content_lines(contents, true);

    let (header_line, header) = lines.next().ok_or(ParseCoeffError::MissingHeader)?;
    let (nmin, nmax, ntimes) = parse_header(header_line, header)?;

    let (times_line, times) = lines.next().ok_or(ParseCoeffError::MissingHeader)?;
    let years =
        numbers(times).ok_or_else(|| ParseCoeffError::invalid_line(times_line, times))?;
    check_value_count(times_line, &years, ntimes)?;
    check_years(times_line, times, &years)?;

    let mut terms: BTreeMap<(usize, usize), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for (line, content) in lines {
        let (n, m_signed, values) =
            record(content).ok_or_else(|| ParseCoeffError::invalid_line(line, content))?;
        let (n, m) = check_record_index(line, content, n, m_signed)?;
        if n < nmin || n > nmax {
            return Err(ParseCoeffError::invalid_line(line, content).into());
        }
        check_value_count(line, &values, ntimes)?;

        let entry = terms
            .entry((n, m))
            .or_insert_with(|| (vec![0.0; ntimes], vec![0.0; ntimes]));
        if m_signed < 0 {
            entry.1 = values;
        } else {
            entry.0 = values;
        }
    }

    let coeff = if ntimes == 1 {
        ShcCoefficients::Constant(SparseSHCoefficientsConstant::new(
            terms.into_iter().map(|(nm, (g, h))| (nm, (g[0], h[0]))),
            true,
        )?)
    } else {
        ShcCoefficients::TimeDependent(SparseSHCoefficientsTimeDependent::new(
            decimal_years_to_mjd2000(&years)?,
            terms,
            true,
        )?)
    };

    debug!(
        nmin,
        nmax,
        nodes = ntimes,
        degree = coeff.degree(),
        "parsed SHC coefficients"
    );
    Ok(coeff)
}

/// Load an SHC coefficient file.
pub fn load_shc(path: &Utf8Path) -> Result<ShcCoefficients, MagModError> {
    debug!(%path, "loading SHC model");
    parse_shc(&std::fs::read_to_string(path)?)
}

/// Load a core field model and its static (crustal) part and combine them.
pub fn load_shc_combined(
    core_path: &Utf8Path,
    static_path: &Utf8Path,
) -> Result<CombinedSHCoefficients, MagModError> {
    CombinedSHCoefficients::new(vec![
        load_shc(core_path)?.into_shared(),
        load_shc(static_path)?.into_shared(),
    ])
}

#[cfg(test)]
mod shc_test {
    use super::*;
    use crate::time::decimal_year_to_mjd2000;

    const CORE: &str = "# CHAOS-like core field
# second comment line
  1 2 3 6 1
       2000.0 2001.0 2002.0
  1  0  -29600.0 -29590.0 -29580.0
  1  1   -1700.0  -1690.0  -1680.0
  1 -1    5100.0   5090.0   5080.0
  2  0   -2300.0  -2310.0  -2320.0
  2 -2    -500.0   -510.0   -520.0
";

    const STATIC: &str = "# static
 3 4 1 0 0
 2000.0
 3 0 1.5
 4 -4 -0.25
";

    #[test]
    fn test_time_dependent() {
        let coeff = parse_shc(CORE).unwrap();
        assert!(matches!(coeff, ShcCoefficients::TimeDependent(_)));
        assert_eq!(coeff.degree(), 2);
        assert_eq!(
            coeff.validity(),
            Validity::new(
                decimal_year_to_mjd2000(2000.0).unwrap(),
                decimal_year_to_mjd2000(2002.0).unwrap()
            )
            .unwrap()
        );

        let t = decimal_year_to_mjd2000(2001.0).unwrap();
        assert_eq!(coeff.get(1, 1, t).unwrap(), (-1690.0, 5090.0));
        assert_eq!(coeff.get(2, 2, t).unwrap(), (0.0, -510.0));
        assert_eq!(coeff.get(2, 1, t).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_constant() {
        let coeff = parse_shc(STATIC).unwrap();
        assert!(matches!(coeff, ShcCoefficients::Constant(_)));
        assert_eq!(coeff.degree(), 4);
        assert!(coeff.validity().is_unbounded());
        assert_eq!(coeff.get(4, 4, 0.0).unwrap(), (0.0, -0.25));
    }

    #[test]
    fn test_combined() {
        let combined = CombinedSHCoefficients::new(vec![
            parse_shc(CORE).unwrap().into_shared(),
            parse_shc(STATIC).unwrap().into_shared(),
        ])
        .unwrap();
        assert_eq!(combined.degree(), 4);
        assert_eq!(combined.validity(), parse_shc(CORE).unwrap().validity());
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            parse_shc(&CORE.replace("1 -1    5100.0", "1 -3    5100.0")).unwrap_err(),
            MagModError::Parsing(ParseCoeffError::OrderExceedsDegree { line: 7, n: 1, m: 3 })
        );
        assert_eq!(
            parse_shc(&CORE.replace("2000.0 2001.0 2002.0", "2000.0 2001.0")).unwrap_err(),
            MagModError::Parsing(ParseCoeffError::ValueCount {
                line: 4,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            parse_shc("# nothing\n").unwrap_err(),
            MagModError::Parsing(ParseCoeffError::MissingHeader)
        );
        assert_eq!(
            parse_shc(" 1 2\n").unwrap_err(),
            MagModError::Parsing(ParseCoeffError::ValueCount {
                line: 1,
                expected: 3,
                found: 2
            })
        );
        // degree outside the [nmin, nmax] range of the header
        assert!(parse_shc(&CORE.replace("2  0  -2300.0", "3  0  -2300.0")).is_err());
    }

    #[test]
    fn test_unsupported_times() {
        for times in ["2000.0 inf 2002.0", "NaN 2001.0 2002.0", "2000.0 2001.0 1e300"] {
            assert_eq!(
                parse_shc(&CORE.replace("2000.0 2001.0 2002.0", times)).unwrap_err(),
                MagModError::Parsing(ParseCoeffError::InvalidLine {
                    line: 4,
                    content: format!("       {times}")
                })
            );
        }
        assert!(matches!(
            parse_shc(&STATIC.replace(" 2000.0", " -1e9")).unwrap_err(),
            MagModError::Parsing(ParseCoeffError::InvalidLine { line: 3, .. })
        ));
    }
}
