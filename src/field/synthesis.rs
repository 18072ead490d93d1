//! Spherical-harmonic summation of the field at one geocentric location.
//!
//! With `P(n,m)` the Schmidt semi-normalised functions of the geocentric latitude `φ`,
//! `dP` their latitude derivatives and `a` the reference radius:
//!
//! ```text
//! internal: w(n) = (a/r)^(n+2),  k(n) = -(n+1)
//! external: w(n) = (r/a)^(n-1),  k(n) = n
//!
//! N = -Σ w(n) (g cos mλ + h sin mλ) dP(n,m)
//! E =  Σ w(n) m (g sin mλ - h cos mλ) P(n,m) / cos φ
//! D =  Σ k(n) w(n) (g cos mλ + h sin mλ) P(n,m)
//! ```
//!
//! Where `cos φ` vanishes, `P(n,1) / cos φ` is replaced by its limit and the `m ≥ 2`
//! terms of `E` drop out.
//!
//! At `r = 0` an internal source is singular. Each component is then its `r → 0` limit
//! along the radius: `±inf` with the sign of the lowest degree contributing to it, or `0`
//! when no degree does.
use nalgebra::Vector3;

use crate::{
    coefficients::CoefficientSet,
    constants::{Degree, Kilometer, POLE_COS_EPS, RADEG},
    legendre::{latitude_sin_cos, sectoral_pole_limit, LegendreTerms},
};

/// Degree range, reference radius and kind of the summation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SynthesisParams {
    pub min_degree: usize,
    pub max_degree: usize,
    pub reference_radius: Kilometer,
    pub is_internal: bool,
}

/// `cos(mλ)` and `sin(mλ)` for `m = 0..=degree`, by angle addition.
fn longitude_harmonics(longitude: Degree, degree: usize) -> (Vec<f64>, Vec<f64>) {
    let (slon, clon) = (longitude * RADEG).sin_cos();
    let mut cos_ml = vec![1.0; degree + 1];
    let mut sin_ml = vec![0.0; degree + 1];
    for m in 1..=degree {
        cos_ml[m] = cos_ml[m - 1] * clon - sin_ml[m - 1] * slon;
        sin_ml[m] = sin_ml[m - 1] * clon + cos_ml[m - 1] * slon;
    }
    (cos_ml, sin_ml)
}

/// Field vector `(N, E, D)` in nT in the local geocentric frame.
///
/// Arguments
/// ---------
/// * `coeff`: coefficients at the evaluation time
/// * `latitude`: geocentric latitude in degrees, within `[-90, 90]`
/// * `longitude`: longitude in degrees
/// * `radius`: geocentric radius in kilometers
/// * `params`: degree range, reference radius and source kind
pub(crate) fn synthesize(
    coeff: &CoefficientSet,
    latitude: Degree,
    longitude: Degree,
    radius: Kilometer,
    params: &SynthesisParams,
) -> Vector3<f64> {
    let degree = params.max_degree.min(coeff.degree());
    // external sources have no degree-0 term
    let min_degree = if params.is_internal {
        params.min_degree
    } else {
        params.min_degree.max(1)
    };
    if min_degree > degree {
        return Vector3::zeros();
    }

    let (sin_lat, cos_lat) = latitude_sin_cos(latitude);
    let legendre = LegendreTerms::new(sin_lat, cos_lat, degree);
    let (cos_ml, sin_ml) = longitude_harmonics(longitude, degree);
    let at_pole = cos_lat.abs() < POLE_COS_EPS;
    let pole_limit = if at_pole {
        sectoral_pole_limit(sin_lat, degree)
    } else {
        Vec::new()
    };

    let singular = params.is_internal && radius == 0.0;
    let ratio = if params.is_internal {
        params.reference_radius / radius
    } else {
        radius / params.reference_radius
    };

    let (mut north, mut east, mut down) = (0.0, 0.0, 0.0);
    for n in min_degree..=degree {
        let (weight, radial) = if params.is_internal {
            (ratio.powi(n as i32 + 2), -((n + 1) as f64))
        } else {
            (ratio.powi(n as i32 - 1), n as f64)
        };

        let (mut dn, mut de, mut dd) = (0.0, 0.0, 0.0);
        for m in 0..=n {
            let (g, h) = (coeff.g(n, m), coeff.h(n, m));
            let cos_term = g * cos_ml[m] + h * sin_ml[m];
            let sin_term = g * sin_ml[m] - h * cos_ml[m];

            dn -= cos_term * legendre.dp(n, m);
            dd += cos_term * legendre.p(n, m);
            if !at_pole {
                de += m as f64 * sin_term * legendre.p(n, m);
            } else if m == 1 {
                de += sin_term * pole_limit[n];
            }
        }

        if singular {
            for (total, term) in [(&mut north, dn), (&mut east, de), (&mut down, radial * dd)] {
                if *total == 0.0 && term != 0.0 {
                    *total = term.signum() * f64::INFINITY;
                }
            }
        } else {
            north += weight * dn;
            east += weight * de;
            down += radial * weight * dd;
        }
    }

    if !at_pole {
        east /= cos_lat;
    }
    Vector3::new(north, east, down)
}
