//! # Time conversions
//!
//! Coefficient validities and evaluation times are expressed in **MJD2000** (days since
//! 2000-01-01T00:00 UTC). Model files, on the other hand, label their epochs with
//! **decimal years**. The conversion maps the fraction of a year linearly onto the days
//! of that calendar year, so leap years stretch the day scale accordingly.
//!
//! Calendar arithmetic is delegated to [`hifitime`].
//!
//! Only the calendar years [`MIN_YEAR`]`..=`[`MAX_YEAR`] are supported; anything else,
//! NaN and infinities included, fails with [`MagModError::TimeOutOfRange`].
use hifitime::{Epoch, TimeScale};

use crate::{
    constants::{DecimalYear, MAX_YEAR, MIN_YEAR, MJD2000, MJD2000_ORIGIN},
    magmod_errors::MagModError,
};

/// MJD2000 of January 1st, 00:00 UTC of the given calendar year.
fn year_start(year: i32) -> Result<MJD2000, MagModError> {
    // midnight UTC falls on a whole MJD; rounding drops the leap second residue
    Epoch::maybe_from_gregorian_utc(year, 1, 1, 0, 0, 0, 0)
        .map(|epoch| epoch.to_mjd_utc_days().round() - MJD2000_ORIGIN)
        .map_err(|_| MagModError::TimeOutOfRange(year as f64))
}

/// Start and end (MJD2000) of a supported calendar year.
fn year_bounds(year: i32) -> Result<(MJD2000, MJD2000), MagModError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(MagModError::TimeOutOfRange(year as f64));
    }
    Ok((year_start(year)?, year_start(year + 1)?))
}

/// Whether a decimal year falls inside the supported calendar range.
pub fn is_supported_year(decimal_year: DecimalYear) -> bool {
    (MIN_YEAR as f64..(MAX_YEAR + 1) as f64).contains(&decimal_year)
}

/// Convert a decimal year into MJD2000.
///
/// Arguments
/// ---------
/// * `decimal_year`: a date as decimal year (e.g. `2015.5`)
///
/// Return
/// ------
/// * the same instant in MJD2000 days
///
/// Errors
/// ------
/// * [`MagModError::TimeOutOfRange`] for non-finite years or years outside
///   [`MIN_YEAR`]`..=`[`MAX_YEAR`]
pub fn decimal_year_to_mjd2000(decimal_year: DecimalYear) -> Result<MJD2000, MagModError> {
    if !is_supported_year(decimal_year) {
        return Err(MagModError::TimeOutOfRange(decimal_year));
    }
    let year = decimal_year.floor();
    let (start, end) = year_bounds(year as i32)?;
    Ok(start + (decimal_year - year) * (end - start))
}

/// Convert MJD2000 into a decimal year.
///
/// Arguments
/// ---------
/// * `mjd2000`: days since 2000-01-01T00:00 UTC
///
/// Return
/// ------
/// * the same instant as a decimal year
///
/// Errors
/// ------
/// * [`MagModError::TimeOutOfRange`] outside the supported calendar range
pub fn mjd2000_to_decimal_year(mjd2000: MJD2000) -> Result<DecimalYear, MagModError> {
    let approx = 2000.0 + (mjd2000 / 365.25).floor();
    if !is_supported_year(approx) {
        return Err(MagModError::TimeOutOfRange(mjd2000));
    }
    let mut year = approx as i32;
    let (mut start, mut end) = year_bounds(year)?;
    while mjd2000 < start {
        year -= 1;
        (start, end) = year_bounds(year)?;
    }
    while mjd2000 >= end {
        year += 1;
        (start, end) = year_bounds(year)?;
    }
    Ok(year as f64 + (mjd2000 - start) / (end - start))
}

/// Express a [`hifitime::Epoch`] as MJD2000 (UTC).
pub fn epoch_to_mjd2000(epoch: &Epoch) -> MJD2000 {
    epoch.to_mjd_utc_days() - MJD2000_ORIGIN
}

/// Build a [`hifitime::Epoch`] from an MJD2000 value (UTC).
pub fn mjd2000_to_epoch(mjd2000: MJD2000) -> Epoch {
    Epoch::from_mjd_in_time_scale(mjd2000 + MJD2000_ORIGIN, TimeScale::UTC)
}

/// Convert a slice of decimal years into MJD2000.
pub fn decimal_years_to_mjd2000(years: &[DecimalYear]) -> Result<Vec<MJD2000>, MagModError> {
    years.iter().map(|y| decimal_year_to_mjd2000(*y)).collect()
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_year_start() {
        assert_eq!(year_start(2000), Ok(0.0));
        assert_eq!(year_start(2001), Ok(366.0));
        assert_eq!(year_start(2002), Ok(731.0));
        assert_eq!(year_start(1999), Ok(-365.0));
    }

    #[test]
    fn test_decimal_year_to_mjd2000() {
        assert_eq!(decimal_year_to_mjd2000(2000.0), Ok(0.0));
        assert_eq!(decimal_year_to_mjd2000(2000.5), Ok(183.0));
        assert_eq!(decimal_year_to_mjd2000(2010.0), Ok(3653.0));
        assert_eq!(decimal_year_to_mjd2000(2015.0), Ok(5479.0));
        assert_abs_diff_eq!(
            decimal_year_to_mjd2000(1900.0).unwrap(),
            -36524.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_unsupported_years() {
        for year in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e12, -1e12, 10_000.0] {
            assert!(matches!(
                decimal_year_to_mjd2000(year),
                Err(MagModError::TimeOutOfRange(_))
            ));
        }
        assert!(decimal_year_to_mjd2000(9999.9).is_ok());
        assert!(decimal_year_to_mjd2000(-9999.0).is_ok());
        assert_eq!(
            decimal_years_to_mjd2000(&[2000.0, f64::INFINITY]),
            Err(MagModError::TimeOutOfRange(f64::INFINITY))
        );

        assert!(mjd2000_to_decimal_year(f64::NAN).is_err());
        assert!(mjd2000_to_decimal_year(1e15).is_err());
    }

    #[test]
    fn test_mjd2000_to_decimal_year() {
        assert_eq!(mjd2000_to_decimal_year(0.0), Ok(2000.0));
        assert_eq!(mjd2000_to_decimal_year(183.0), Ok(2000.5));
        assert_eq!(mjd2000_to_decimal_year(5479.0), Ok(2015.0));
        assert_abs_diff_eq!(
            mjd2000_to_decimal_year(-0.5).unwrap(),
            1999.0 + 364.5 / 365.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_round_trip() {
        for i in 0..400 {
            let t = -40000.0 + i as f64 * 211.37;
            let year = mjd2000_to_decimal_year(t).unwrap();
            assert_abs_diff_eq!(decimal_year_to_mjd2000(year).unwrap(), t, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_epoch_bridge() {
        let epoch = Epoch::from_gregorian_utc_at_midnight(2015, 1, 1);
        assert_abs_diff_eq!(epoch_to_mjd2000(&epoch), 5479.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            epoch_to_mjd2000(&mjd2000_to_epoch(1234.25)),
            1234.25,
            epsilon = 1e-9
        );
    }
}
