use std::collections::BTreeMap;

use itertools::Itertools;
use nalgebra::DMatrix;

use super::{check_index, CoefficientSet, SHCoefficients, Validity};
use crate::{
    constants::{DecimalYear, MJD2000},
    legendre::offset,
    magmod_errors::MagModError,
    time::decimal_year_to_mjd2000,
};

/// Triangular indices of the stored terms, sorted, with the degree they span.
#[derive(Debug, Clone, PartialEq)]
struct SparseIndex {
    index: Vec<usize>,
    degree: usize,
}

impl SparseIndex {
    fn position(&self, n: usize, m: usize) -> Result<Option<usize>, MagModError> {
        check_index(n, m, self.degree)?;
        Ok(self.index.binary_search(&(offset(n) + m)).ok())
    }
}

/// Collect `(n, m) → value` pairs keyed by triangular index, dropping all-zero terms.
///
/// A later entry for the same `(n, m)` replaces an earlier one.
fn collect_terms<V, I>(
    terms: I,
    is_zero: impl Fn(&V) -> bool,
) -> Result<(SparseIndex, Vec<V>), MagModError>
where
    I: IntoIterator<Item = ((usize, usize), V)>,
{
    let mut sorted = BTreeMap::new();
    let mut degree_of = BTreeMap::new();
    for ((n, m), value) in terms {
        check_index(n, m, n)?;
        let idx = offset(n) + m;
        sorted.insert(idx, value);
        degree_of.insert(idx, n);
    }
    sorted.retain(|_, v| !is_zero(v));

    let degree = sorted
        .keys()
        .filter_map(|idx| degree_of.get(idx))
        .copied()
        .max()
        .unwrap_or(0);
    let (index, values): (Vec<_>, Vec<_>) = sorted.into_iter().unzip();

    Ok((SparseIndex { index, degree }, values))
}

/// Static sparse coefficients with an unbounded validity.
///
/// Typical of crustal field models (e.g. the CHAOS static part) and of the static part
/// of EMM. Missing `(n, m)` terms are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseSHCoefficientsConstant {
    index: SparseIndex,
    g: Vec<f64>,
    h: Vec<f64>,
    is_internal: bool,
}

impl SparseSHCoefficientsConstant {
    /// Build a constant source from `((n, m), (g, h))` entries.
    ///
    /// Errors
    /// ------
    /// * [`MagModError::CoefficientIndexOutOfRange`] if an entry has `m > n`.
    pub fn new<I>(terms: I, is_internal: bool) -> Result<Self, MagModError>
    where
        I: IntoIterator<Item = ((usize, usize), (f64, f64))>,
    {
        let (index, values) = collect_terms(terms, |(g, h)| *g == 0.0 && *h == 0.0)?;
        let (g, h) = values.into_iter().unzip();
        Ok(SparseSHCoefficientsConstant {
            index,
            g,
            h,
            is_internal,
        })
    }

    /// Number of stored (non-zero) terms.
    pub fn len(&self) -> usize {
        self.index.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.index.is_empty()
    }
}

impl SHCoefficients for SparseSHCoefficientsConstant {
    fn degree(&self) -> usize {
        self.index.degree
    }

    fn is_internal(&self) -> bool {
        self.is_internal
    }

    fn validity(&self) -> Validity {
        Validity::unbounded()
    }

    fn get(&self, n: usize, m: usize, _time: MJD2000) -> Result<(f64, f64), MagModError> {
        Ok(self
            .index
            .position(n, m)?
            .map_or((0.0, 0.0), |pos| (self.g[pos], self.h[pos])))
    }

    fn eval(&self, _time: MJD2000) -> CoefficientSet {
        let mut set = CoefficientSet::zeros(self.index.degree);
        for (pos, idx) in self.index.index.iter().enumerate() {
            set.set_at(*idx, self.g[pos], self.h[pos]);
        }
        set
    }
}

/// Sparse coefficients sampled at increasing time nodes.
///
/// Between two nodes the coefficients vary linearly; before the first and after the last
/// node the first and last segments are extended. With two nodes this is the first-order
/// Taylor expansion `g(t) = g(t0) + (t - t0)·dg` of secular-variation models such as WMM.
///
/// Values are stored as `terms × nodes` matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseSHCoefficientsTimeDependent {
    index: SparseIndex,
    times: Vec<MJD2000>,
    g: DMatrix<f64>,
    h: DMatrix<f64>,
    is_internal: bool,
}

impl SparseSHCoefficientsTimeDependent {
    /// Build a time-dependent source.
    ///
    /// Arguments
    /// ---------
    /// * `times`: strictly increasing time nodes (MJD2000)
    /// * `terms`: `((n, m), (g_series, h_series))` with one value per node
    /// * `is_internal`: internal/external source flag
    ///
    /// Errors
    /// ------
    /// * [`MagModError::InvalidTimeNodes`] for empty, non-finite or non-increasing nodes, or a
    ///   series whose length differs from the number of nodes
    /// * [`MagModError::CoefficientIndexOutOfRange`] if an entry has `m > n`
    pub fn new<I>(times: Vec<MJD2000>, terms: I, is_internal: bool) -> Result<Self, MagModError>
    where
        I: IntoIterator<Item = ((usize, usize), (Vec<f64>, Vec<f64>))>,
    {
        if times.is_empty() {
            return Err(MagModError::InvalidTimeNodes("no time node".into()));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(MagModError::InvalidTimeNodes("non-finite time node".into()));
        }
        if let Some((a, b)) = times.iter().tuple_windows().find(|(a, b)| a >= b) {
            return Err(MagModError::InvalidTimeNodes(format!(
                "time nodes not strictly increasing ({a} >= {b})"
            )));
        }

        let ntimes = times.len();
        let terms = terms
            .into_iter()
            .map(|(nm, (g, h))| {
                if g.len() != ntimes || h.len() != ntimes {
                    Err(MagModError::InvalidTimeNodes(format!(
                        "term {nm:?} has {}/{} values for {ntimes} time nodes",
                        g.len(),
                        h.len()
                    )))
                } else {
                    Ok((nm, (g, h)))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (index, values) = collect_terms(terms, |(g, h)| {
            g.iter().chain(h.iter()).all(|v| *v == 0.0)
        })?;

        let g = DMatrix::from_fn(values.len(), ntimes, |i, j| values[i].0[j]);
        let h = DMatrix::from_fn(values.len(), ntimes, |i, j| values[i].1[j]);

        Ok(SparseSHCoefficientsTimeDependent {
            index,
            times,
            g,
            h,
            is_internal,
        })
    }

    /// Build the two-node form of a secular-variation model.
    ///
    /// Arguments
    /// ---------
    /// * `epoch`: model epoch as decimal year
    /// * `span`: length of the validity in years
    /// * `terms`: `((n, m), (g, h, dg, dh))` with the rates in units per year
    /// * `is_internal`: internal/external source flag
    ///
    /// Return
    /// ------
    /// * a source with nodes at `epoch` and `epoch + span`, valid over that interval
    ///
    /// Errors
    /// ------
    /// * [`MagModError::TimeOutOfRange`] if `epoch` or `epoch + span` is not a supported year
    ///
    /// The nodes are placed in MJD2000 and the value is linear in days between them. When the
    /// span covers leap years this differs from `g + (t_year - epoch) * dg` in decimal years by
    /// about 1e-4 of the secular change (~0.01 nT for WMM).
    pub fn from_secular_variation<I>(
        epoch: DecimalYear,
        span: f64,
        terms: I,
        is_internal: bool,
    ) -> Result<Self, MagModError>
    where
        I: IntoIterator<Item = ((usize, usize), (f64, f64, f64, f64))>,
    {
        let times = vec![
            decimal_year_to_mjd2000(epoch)?,
            decimal_year_to_mjd2000(epoch + span)?,
        ];
        let series = terms.into_iter().map(|(nm, (g, h, dg, dh))| {
            (nm, (vec![g, g + span * dg], vec![h, h + span * dh]))
        });
        Self::new(times, series, is_internal)
    }

    /// Time nodes (MJD2000).
    pub fn times(&self) -> &[MJD2000] {
        &self.times
    }

    /// Number of stored (non-zero) terms.
    pub fn len(&self) -> usize {
        self.index.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.index.is_empty()
    }

    /// Bracketing nodes and interpolation weight of `time`.
    fn segment(&self, time: MJD2000) -> (usize, usize, f64) {
        let n = self.times.len();
        if n == 1 {
            return (0, 0, 0.0);
        }
        let j = self.times.partition_point(|t| *t <= time).clamp(1, n - 1);
        let (t0, t1) = (self.times[j - 1], self.times[j]);
        (j - 1, j, (time - t0) / (t1 - t0))
    }

    #[inline]
    fn interpolate(&self, pos: usize, segment: (usize, usize, f64)) -> (f64, f64) {
        let (j0, j1, w) = segment;
        (
            self.g[(pos, j0)] * (1.0 - w) + self.g[(pos, j1)] * w,
            self.h[(pos, j0)] * (1.0 - w) + self.h[(pos, j1)] * w,
        )
    }
}

impl SHCoefficients for SparseSHCoefficientsTimeDependent {
    fn degree(&self) -> usize {
        self.index.degree
    }

    fn is_internal(&self) -> bool {
        self.is_internal
    }

    fn validity(&self) -> Validity {
        Validity {
            start: self.times[0],
            end: self.times[self.times.len() - 1],
        }
    }

    fn get(&self, n: usize, m: usize, time: MJD2000) -> Result<(f64, f64), MagModError> {
        Ok(self
            .index
            .position(n, m)?
            .map_or((0.0, 0.0), |pos| self.interpolate(pos, self.segment(time))))
    }

    fn eval(&self, time: MJD2000) -> CoefficientSet {
        let segment = self.segment(time);
        let mut set = CoefficientSet::zeros(self.index.degree);
        for (pos, idx) in self.index.index.iter().enumerate() {
            let (g, h) = self.interpolate(pos, segment);
            set.set_at(*idx, g, h);
        }
        set
    }
}

#[cfg(test)]
mod sparse_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn time_dependent() -> SparseSHCoefficientsTimeDependent {
        SparseSHCoefficientsTimeDependent::new(
            vec![0.0, 10.0, 30.0],
            vec![
                ((1, 0), (vec![1.0, 2.0, 4.0], vec![0.0, 0.0, 0.0])),
                ((2, 1), (vec![0.0, 0.0, 0.0], vec![-1.0, 1.0, 1.0])),
                // all zero, dropped
                ((5, 5), (vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0])),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_constant() {
        let coeff = SparseSHCoefficientsConstant::new(
            vec![((2, 1), (1.5, -0.5)), ((1, 0), (2.0, 0.0)), ((7, 7), (0.0, 0.0))],
            false,
        )
        .unwrap();
        assert_eq!(coeff.degree(), 2);
        assert_eq!(coeff.len(), 2);
        assert!(!coeff.is_internal());
        assert!(coeff.validity().is_unbounded());
        assert_eq!(coeff.get(2, 1, 123.0).unwrap(), (1.5, -0.5));
        assert_eq!(coeff.get(2, 2, 123.0).unwrap(), (0.0, 0.0));
        assert_eq!(
            coeff.get(3, 0, 0.0),
            Err(MagModError::CoefficientIndexOutOfRange {
                n: 3,
                m: 0,
                degree: 2
            })
        );

        let set = coeff.eval(0.0);
        assert_eq!(set.degree(), 2);
        assert_eq!(set.g(1, 0), 2.0);
        assert_eq!(set.h(2, 1), -0.5);
        assert_eq!(set.g(2, 2), 0.0);
    }

    #[test]
    fn test_constant_rejects_order_above_degree() {
        assert_eq!(
            SparseSHCoefficientsConstant::new(vec![((1, 2), (1.0, 0.0))], true),
            Err(MagModError::CoefficientIndexOutOfRange {
                n: 1,
                m: 2,
                degree: 1
            })
        );
    }

    #[test]
    fn test_time_dependent_interpolation() {
        let coeff = time_dependent();
        assert_eq!(coeff.degree(), 2);
        assert_eq!(coeff.len(), 2);
        assert_eq!(coeff.validity(), Validity::new(0.0, 30.0).unwrap());

        // nodes are reproduced exactly
        assert_eq!(coeff.get(1, 0, 0.0).unwrap().0, 1.0);
        assert_eq!(coeff.get(1, 0, 10.0).unwrap().0, 2.0);
        assert_eq!(coeff.get(1, 0, 30.0).unwrap().0, 4.0);

        // linear in between
        assert_abs_diff_eq!(coeff.get(1, 0, 5.0).unwrap().0, 1.5, epsilon = 1e-15);
        assert_abs_diff_eq!(coeff.get(1, 0, 20.0).unwrap().0, 3.0, epsilon = 1e-15);
        assert_abs_diff_eq!(coeff.get(2, 1, 5.0).unwrap().1, 0.0, epsilon = 1e-15);

        // end segments are extended outside the validity
        assert_abs_diff_eq!(coeff.get(1, 0, -10.0).unwrap().0, 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(coeff.get(1, 0, 40.0).unwrap().0, 5.0, epsilon = 1e-15);
        assert!(!coeff.is_valid(40.0));

        let set = coeff.eval(20.0);
        assert_abs_diff_eq!(set.g(1, 0), 3.0, epsilon = 1e-15);
        assert_abs_diff_eq!(set.h(2, 1), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_time_nodes_validation() {
        assert!(matches!(
            SparseSHCoefficientsTimeDependent::new(vec![], vec![], true),
            Err(MagModError::InvalidTimeNodes(_))
        ));
        assert!(matches!(
            SparseSHCoefficientsTimeDependent::new(vec![1.0, 1.0], vec![], true),
            Err(MagModError::InvalidTimeNodes(_))
        ));
        assert!(matches!(
            SparseSHCoefficientsTimeDependent::new(
                vec![0.0, 1.0],
                vec![((1, 0), (vec![1.0], vec![0.0]))],
                true
            ),
            Err(MagModError::InvalidTimeNodes(_))
        ));
    }

    #[test]
    fn test_single_node() {
        let coeff = SparseSHCoefficientsTimeDependent::new(
            vec![100.0],
            vec![((3, 2), (vec![7.0], vec![8.0]))],
            true,
        )
        .unwrap();
        assert_eq!(coeff.validity(), Validity::new(100.0, 100.0).unwrap());
        assert_eq!(coeff.get(3, 2, -1e6).unwrap(), (7.0, 8.0));
    }

    #[test]
    fn test_secular_variation() {
        let coeff = SparseSHCoefficientsTimeDependent::from_secular_variation(
            2010.0,
            5.0,
            vec![((1, 1), (-1586.3, 4944.4, 16.5, -25.9))],
            true,
        )
        .unwrap();
        let validity = coeff.validity();
        assert_eq!(validity.start, decimal_year_to_mjd2000(2010.0).unwrap());
        assert_eq!(validity.end, decimal_year_to_mjd2000(2015.0).unwrap());

        let (g, h) = coeff.get(1, 1, decimal_year_to_mjd2000(2015.0).unwrap()).unwrap();
        assert_abs_diff_eq!(g, -1586.3 + 5.0 * 16.5, epsilon = 1e-9);
        assert_abs_diff_eq!(h, 4944.4 - 5.0 * 25.9, epsilon = 1e-9);
    }

    #[test]
    fn test_secular_variation_is_linear_in_days() {
        let (g0, dg) = (-1586.3, 16.5);
        let coeff = SparseSHCoefficientsTimeDependent::from_secular_variation(
            2010.0,
            5.0,
            vec![((1, 1), (g0, 0.0, dg, 0.0))],
            true,
        )
        .unwrap();

        // 2011.0 is 365 of the 1826 days of [2010.0, 2015.0]
        let (g, _) = coeff
            .get(1, 1, decimal_year_to_mjd2000(2011.0).unwrap())
            .unwrap();
        assert_abs_diff_eq!(g, g0 + 5.0 * dg * 365.0 / 1826.0, epsilon = 1e-9);
        assert!((g - (g0 + dg)).abs() < 1e-3 * 5.0 * dg);

        assert!(matches!(
            SparseSHCoefficientsTimeDependent::from_secular_variation(
                f64::INFINITY,
                5.0,
                vec![((1, 1), (g0, 0.0, dg, 0.0))],
                true,
            ),
            Err(MagModError::TimeOutOfRange(_))
        ));
    }
}
