//! Comparison of the recursive Legendre evaluation with a direct polynomial evaluation.
use approx::assert_abs_diff_eq;
use itertools::iproduct;
use magmod::legendre::{legendre, offset};

const DEGREE: usize = 20;

/// Coefficients (increasing powers) of the Legendre polynomials P_0 ..= P_degree.
fn legendre_polynomials(degree: usize) -> Vec<Vec<f64>> {
    let mut polys = vec![vec![1.0], vec![0.0, 1.0]];
    for n in 2..=degree {
        // n P_n = (2n - 1) x P_{n-1} - (n - 1) P_{n-2}
        let mut p = vec![0.0; n + 1];
        for (k, c) in polys[n - 1].iter().enumerate() {
            p[k + 1] += (2 * n - 1) as f64 * c / n as f64;
        }
        for (k, c) in polys[n - 2].iter().enumerate() {
            p[k] -= (n - 1) as f64 * c / n as f64;
        }
        polys.push(p);
    }
    polys.truncate(degree + 1);
    polys
}

fn differentiate(poly: &[f64]) -> Vec<f64> {
    poly.iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| k as f64 * c)
        .collect()
}

fn evaluate(poly: &[f64], x: f64) -> f64 {
    poly.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Schmidt semi-normalised P(n,m)(x) from the m-th derivative of P_n.
fn reference_values(degree: usize, x: f64) -> Vec<f64> {
    let y = 1.0 - x * x;
    let mut values = vec![0.0; offset(degree + 1)];
    for (n, poly) in legendre_polynomials(degree).iter().enumerate() {
        let mut derivative = poly.clone();
        for m in 0..=n {
            let scale = if m == 0 {
                1.0
            } else {
                // sqrt(2 (n-m)! / (n+m)!) (1 - x²)^(m/2)
                let ratio: f64 = ((n - m + 1)..=(n + m)).map(|k| 1.0 / k as f64).product();
                (2.0 * ratio).sqrt() * y.powf(m as f64 / 2.0)
            };
            values[offset(n) + m] = scale * evaluate(&derivative, x);
            derivative = differentiate(&derivative);
        }
    }
    values
}

/// Latitude derivatives expressed with the neighbouring orders of the same degree.
fn reference_derivatives(degree: usize, p: &[f64]) -> Vec<f64> {
    let at = |n: usize, m: usize| p[offset(n) + m];
    let mut dp = vec![0.0; p.len()];
    if degree >= 1 {
        dp[offset(1)] = at(1, 1);
        dp[offset(1) + 1] = -at(1, 0);
    }
    for n in 2..=degree {
        let nf = n as f64;
        dp[offset(n)] = (nf * (nf + 1.0) / 2.0).sqrt() * at(n, 1);
        dp[offset(n) + 1] = 0.5
            * (((nf + 2.0) * (nf - 1.0)).sqrt() * at(n, 2)
                - (2.0 * nf * (nf + 1.0)).sqrt() * at(n, 0));
        for m in 2..n {
            let mf = m as f64;
            dp[offset(n) + m] = 0.5
                * (((nf + mf + 1.0) * (nf - mf)).sqrt() * at(n, m + 1)
                    - ((nf + mf) * (nf - mf + 1.0)).sqrt() * at(n, m - 1));
        }
        dp[offset(n) + n] = -(nf / 2.0).sqrt() * at(n, n - 1);
    }
    dp
}

#[test]
fn test_against_polynomial_evaluation() {
    for (lat_step, degree) in iproduct!(0..=36, [0, 1, 2, 5, DEGREE]) {
        let latitude = -90.0 + 5.0 * lat_step as f64;
        let x = if latitude.abs() == 90.0 {
            latitude.signum()
        } else {
            latitude.to_radians().sin()
        };

        let terms = legendre(latitude, degree as i32).unwrap();
        let p_ref = reference_values(degree, x);
        let dp_ref = reference_derivatives(degree, &p_ref);

        assert_eq!(terms.values().len(), p_ref.len());
        for (idx, (p, expected)) in terms.values().iter().zip(&p_ref).enumerate() {
            assert_abs_diff_eq!(*p, *expected, epsilon = 1e-6);
            assert_abs_diff_eq!(terms.derivatives()[idx], dp_ref[idx], epsilon = 1e-6);
        }
    }
}

#[test]
fn test_reference_sanity() {
    // P(2,0) = (3x² - 1) / 2, P(2,2) = sqrt(3)/2 (1 - x²)
    let p = reference_values(2, 0.5);
    assert_abs_diff_eq!(p[offset(2)], -0.125, epsilon = 1e-15);
    assert_abs_diff_eq!(p[offset(2) + 2], 3.0_f64.sqrt() / 2.0 * 0.75, epsilon = 1e-15);
}
