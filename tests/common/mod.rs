use approx::assert_relative_eq;
use magmod::coefficients::SHCoefficients;
use magmod::time::decimal_year_to_mjd2000;

/// Validity of a source, as decimal years, or `None` for an unbounded one.
pub type ExpectedValidity = Option<(f64, f64)>;

pub fn assert_coefficient_source<C: SHCoefficients + ?Sized>(
    coeff: &C,
    degree: usize,
    validity: ExpectedValidity,
    is_internal: bool,
) {
    assert_eq!(coeff.degree(), degree);
    assert_eq!(coeff.is_internal(), is_internal);

    let actual = coeff.validity();
    match validity {
        Some((start, end)) => {
            assert_relative_eq!(
                actual.start,
                decimal_year_to_mjd2000(start).unwrap(),
                epsilon = 1e-8,
                max_relative = 1e-8
            );
            assert_relative_eq!(
                actual.end,
                decimal_year_to_mjd2000(end).unwrap(),
                epsilon = 1e-8,
                max_relative = 1e-8
            );
        }
        None => assert!(actual.is_unbounded()),
    }
}
