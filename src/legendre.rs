//! # Schmidt semi-normalised associated Legendre functions
//!
//! This module evaluates the functions `P(n,m)(sin φ)` and their derivatives with respect
//! to the latitude `φ`, for all `0 ≤ m ≤ n ≤ degree`. They are the latitude part of every
//! spherical-harmonic synthesis performed by the crate.
//!
//! ## Normalisation
//!
//! The Schmidt semi-normalised functions are related to the unnormalised associated
//! Legendre functions `P_n^m` (without Condon–Shortley phase) by
//!
//! ```text
//! P(n,0) = P_n
//! P(n,m) = sqrt(2 (n-m)! / (n+m)!) · P_n^m          (m > 0)
//! ```
//!
//! and stay bounded by 1 in absolute value for every degree.
//!
//! ## Algorithm
//!
//! With `s = sin φ` and `c = cos φ`:
//!
//! ```text
//! P(0,0) = 1,  P(1,1) = c
//! P(n,n) = sqrt((2n-1) / 2n) · c · P(n-1,n-1)                                  (n ≥ 2)
//! P(n,m) = [(2n-1) · s · P(n-1,m) - sqrt((n-1)² - m²) · P(n-2,m)] / sqrt(n² - m²)
//! ```
//!
//! The normalisation is carried by the recurrence coefficients. The derivatives follow
//! from differentiating both recurrences (`ds/dφ = c`, `dc/dφ = -s`), so no step divides by
//! `cos φ` and the poles need no special treatment here.
//!
//! The only quantity that is singular at the poles is `P(n,m) / cos φ`, needed by the east
//! component of the field. Its limit is provided by [`sectoral_pole_limit`].
//!
//! ## Layout
//!
//! Values are stored in a flat triangular array, `P(n,m)` at index `n(n+1)/2 + m`.
use crate::{
    constants::{Degree, RADEG},
    magmod_errors::MagModError,
};

/// Offset of the first term of degree `n` in the triangular layout.
#[inline]
pub fn offset(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Number of `(n, m)` terms up to and including `degree`.
#[inline]
pub fn term_count(degree: usize) -> usize {
    (degree + 1) * (degree + 2) / 2
}

/// Legendre function values and latitude derivatives for one latitude.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendreTerms {
    degree: usize,
    p: Vec<f64>,
    dp: Vec<f64>,
}

impl LegendreTerms {
    /// Evaluate the terms from the sine and cosine of the latitude.
    ///
    /// The caller guarantees `sin² + cos² = 1` and `cos ≥ 0`.
    pub fn new(sin_lat: f64, cos_lat: f64, degree: usize) -> Self {
        let size = term_count(degree);
        let mut p = vec![0.0; size];
        let mut dp = vec![0.0; size];
        p[0] = 1.0;

        if degree == 0 {
            return LegendreTerms { degree, p, dp };
        }

        // diagonal P(n,n)
        p[offset(1) + 1] = cos_lat;
        dp[offset(1) + 1] = -sin_lat;
        for n in 2..=degree {
            let k = ((2 * n - 1) as f64 / (2 * n) as f64).sqrt();
            let prev = offset(n - 1) + n - 1;
            let idx = offset(n) + n;
            p[idx] = k * cos_lat * p[prev];
            dp[idx] = k * (cos_lat * dp[prev] - sin_lat * p[prev]);
        }

        // forward in n for every order m
        for m in 0..degree {
            let mf = m as f64;
            for n in (m + 1)..=degree {
                let nf = n as f64;
                let a = (2 * n - 1) as f64;
                let b = ((nf - 1.0) * (nf - 1.0) - mf * mf).max(0.0).sqrt();
                let norm = 1.0 / (nf * nf - mf * mf).sqrt();

                let i1 = offset(n - 1) + m;
                // P(n-2, m) vanishes for n - 2 < m, b is zero there
                let (p2, dp2) = if n >= m + 2 {
                    let i2 = offset(n - 2) + m;
                    (p[i2], dp[i2])
                } else {
                    (0.0, 0.0)
                };

                let idx = offset(n) + m;
                p[idx] = (a * sin_lat * p[i1] - b * p2) * norm;
                dp[idx] = (a * (cos_lat * p[i1] + sin_lat * dp[i1]) - b * dp2) * norm;
            }
        }

        LegendreTerms { degree, p, dp }
    }

    /// Evaluate the terms for a latitude in radians.
    pub fn from_latitude(latitude_rad: f64, degree: usize) -> Self {
        let (sin_lat, cos_lat) = latitude_rad.sin_cos();
        Self::new(sin_lat, cos_lat.abs(), degree)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// `P(n,m)`; panics if `(n, m)` lies outside the triangle.
    #[inline]
    pub fn p(&self, n: usize, m: usize) -> f64 {
        debug_assert!(m <= n && n <= self.degree);
        self.p[offset(n) + m]
    }

    /// `dP(n,m)/dφ`; panics if `(n, m)` lies outside the triangle.
    #[inline]
    pub fn dp(&self, n: usize, m: usize) -> f64 {
        debug_assert!(m <= n && n <= self.degree);
        self.dp[offset(n) + m]
    }

    /// Function values in triangular order.
    pub fn values(&self) -> &[f64] {
        &self.p
    }

    /// Latitude derivatives in triangular order.
    pub fn derivatives(&self) -> &[f64] {
        &self.dp
    }

    /// Consume the terms and return `(values, derivatives)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.p, self.dp)
    }
}

/// Evaluate the Schmidt semi-normalised Legendre functions and their latitude derivatives.
///
/// Arguments
/// ---------
/// * `latitude`: latitude in degrees, within `[-90, 90]`
/// * `degree`: maximum degree, non-negative
///
/// Return
/// ------
/// * the [`LegendreTerms`] holding `(degree+1)(degree+2)/2` values and derivatives
///
/// Errors
/// ------
/// * [`MagModError::InvalidLatitude`] when the latitude is outside `[-90, 90]` or NaN
/// * [`MagModError::InvalidDegree`] when `degree < 0`
pub fn legendre(latitude: Degree, degree: i32) -> Result<LegendreTerms, MagModError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(MagModError::InvalidLatitude(latitude));
    }
    let degree = usize::try_from(degree).map_err(|_| MagModError::InvalidDegree(degree as i64))?;

    let (sin_lat, cos_lat) = latitude_sin_cos(latitude);
    Ok(LegendreTerms::new(sin_lat, cos_lat, degree))
}

/// `(sin φ, cos φ)` of a latitude in degrees, exact at the poles.
pub(crate) fn latitude_sin_cos(latitude: Degree) -> (f64, f64) {
    // (90°).to_radians().cos() is not zero
    if latitude.abs() == 90.0 {
        (latitude.signum(), 0.0)
    } else {
        (latitude * RADEG).sin_cos()
    }
}

/// Limit of `P(n,1)(sin φ) / cos φ` for `n = 0..=degree`.
///
/// The series obeys the order-1 recurrence with `Q(0) = 0` and `Q(1) = 1`; it is used for
/// the east component of the field where `cos φ` vanishes. Every order `m ≥ 2` term divided
/// by `cos φ` tends to zero there.
pub fn sectoral_pole_limit(sin_lat: f64, degree: usize) -> Vec<f64> {
    let mut q = vec![0.0; degree + 1];
    if degree == 0 {
        return q;
    }
    q[1] = 1.0;
    for n in 2..=degree {
        let nf = n as f64;
        let a = (2 * n - 1) as f64;
        let b = ((nf - 1.0) * (nf - 1.0) - 1.0).sqrt();
        q[n] = (a * sin_lat * q[n - 1] - b * q[n - 2]) / (nf * nf - 1.0).sqrt();
    }
    q
}
