//! # Spherical-harmonic coefficient model
//!
//! Geomagnetic models are parameterised by Gauss coefficients `g(n,m)` and `h(n,m)`,
//! the cosine and sine weights of the spherical harmonics of degree `n` and order `m`.
//! This module defines the common contract of every coefficient source and the value
//! types it is expressed with.
//!
//! ## Public API
//!
//! - [`SHCoefficients`](crate::coefficients::SHCoefficients) – read-only contract shared by all sources.
//! - [`Validity`](crate::coefficients::Validity) – closed time interval (MJD2000) over which a source is authoritative.
//! - [`CoefficientSet`](crate::coefficients::CoefficientSet) – dense triangular snapshot of a source at one time.
//! - [`SparseSHCoefficientsConstant`](crate::coefficients::SparseSHCoefficientsConstant) – static source, unbounded validity.
//! - [`SparseSHCoefficientsTimeDependent`](crate::coefficients::SparseSHCoefficientsTimeDependent) – values at time nodes,
//!   linear in between and linearly extrapolated outside.
//! - [`CombinedSHCoefficients`](crate::coefficients::CombinedSHCoefficients) – sum of several sources.
//!
//! ## Invariants
//!
//! - Every stored term satisfies `m ≤ n ≤ degree`.
//! - `degree` is the largest `n` carrying a non-zero value.
//! - The validity interval is never empty.
//! - Sources are immutable after construction and `Send + Sync`, so they can be shared
//!   through an `Arc` by concurrent evaluations.
//!
//! ## Typical usage
//!
//! ```rust
//! use magmod::coefficients::{SHCoefficients, SparseSHCoefficientsConstant};
//!
//! // a single axial dipole term
//! let dipole = SparseSHCoefficientsConstant::new([((1, 0), (-29442.0, 0.0))], true).unwrap();
//! assert_eq!(dipole.degree(), 1);
//! assert_eq!(dipole.get(1, 0, 0.0).unwrap(), (-29442.0, 0.0));
//! assert_eq!(dipole.get(1, 1, 0.0).unwrap(), (0.0, 0.0));
//! assert!(dipole.get(2, 0, 0.0).is_err());
//! ```
mod combined;
mod sparse;

use std::fmt::Debug;

pub use combined::CombinedSHCoefficients;
pub use sparse::{SparseSHCoefficientsConstant, SparseSHCoefficientsTimeDependent};

use crate::{
    constants::MJD2000,
    legendre::{offset, term_count},
    magmod_errors::MagModError,
};

/// Closed time interval `[start, end]`, in MJD2000 days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validity {
    pub start: MJD2000,
    pub end: MJD2000,
}

impl Validity {
    /// Build a validity interval.
    ///
    /// Errors
    /// ------
    /// * [`MagModError::InvalidValidity`] if `start > end` or either bound is NaN.
    pub fn new(start: MJD2000, end: MJD2000) -> Result<Self, MagModError> {
        // written so that NaN bounds are rejected too
        if start <= end {
            Ok(Validity { start, end })
        } else {
            Err(MagModError::InvalidValidity { start, end })
        }
    }

    /// The `(-inf, inf)` validity of static sources.
    pub fn unbounded() -> Self {
        Validity {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    pub fn contains(&self, time: MJD2000) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start == f64::NEG_INFINITY && self.end == f64::INFINITY
    }

    /// Common part of two intervals, `None` when they do not overlap.
    pub fn intersect(&self, other: &Validity) -> Option<Validity> {
        Validity::new(self.start.max(other.start), self.end.min(other.end)).ok()
    }
}

impl From<Validity> for (f64, f64) {
    fn from(v: Validity) -> Self {
        (v.start, v.end)
    }
}

/// Dense `(g, h)` coefficients of a source evaluated at one time,
/// stored in the triangular layout of [`crate::legendre`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSet {
    degree: usize,
    g: Vec<f64>,
    h: Vec<f64>,
}

impl CoefficientSet {
    pub fn zeros(degree: usize) -> Self {
        CoefficientSet {
            degree,
            g: vec![0.0; term_count(degree)],
            h: vec![0.0; term_count(degree)],
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    #[inline]
    pub fn g(&self, n: usize, m: usize) -> f64 {
        self.g[offset(n) + m]
    }

    #[inline]
    pub fn h(&self, n: usize, m: usize) -> f64 {
        self.h[offset(n) + m]
    }

    /// Set the pair stored at a triangular index.
    #[inline]
    pub(crate) fn set_at(&mut self, index: usize, g: f64, h: f64) {
        self.g[index] = g;
        self.h[index] = h;
    }

    /// Add another set into this one; `other` must not exceed this degree.
    pub(crate) fn accumulate(&mut self, other: &CoefficientSet) {
        debug_assert!(other.degree <= self.degree);
        for (acc, v) in self.g.iter_mut().zip(other.g.iter()) {
            *acc += v;
        }
        for (acc, v) in self.h.iter_mut().zip(other.h.iter()) {
            *acc += v;
        }
    }
}

/// Contract shared by every spherical-harmonic coefficient source.
pub trait SHCoefficients: Debug + Send + Sync {
    /// Maximum degree carrying a non-zero coefficient.
    fn degree(&self) -> usize;

    /// `true` for sources internal to the Earth (main and crustal field),
    /// `false` for external (magnetospheric) sources.
    fn is_internal(&self) -> bool;

    /// Time interval over which the source is authoritative.
    fn validity(&self) -> Validity;

    /// Coefficient pair `(g, h)` of the term `(n, m)` at `time`.
    ///
    /// Outside the validity interval the value is an extrapolation, not an error.
    ///
    /// Errors
    /// ------
    /// * [`MagModError::CoefficientIndexOutOfRange`] when `m > n` or `n > degree`.
    fn get(&self, n: usize, m: usize, time: MJD2000) -> Result<(f64, f64), MagModError>;

    /// All coefficients at `time`, dense up to [`SHCoefficients::degree`].
    fn eval(&self, time: MJD2000) -> CoefficientSet;

    fn is_valid(&self, time: MJD2000) -> bool {
        self.validity().contains(time)
    }
}

/// Check that `(n, m)` addresses a term of a source of the given degree.
pub(crate) fn check_index(n: usize, m: usize, degree: usize) -> Result<(), MagModError> {
    if m > n || n > degree {
        Err(MagModError::CoefficientIndexOutOfRange { n, m, degree })
    } else {
        Ok(())
    }
}
