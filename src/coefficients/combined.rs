use std::sync::Arc;

use super::{CoefficientSet, SHCoefficients, Validity};
use crate::{constants::MJD2000, magmod_errors::MagModError};

/// Sum of several coefficient sources of the same kind.
///
/// Used to join a core field model with its crustal (static) part, e.g. CHAOS core + static,
/// or the static and secular-variation parts of EMM. The combination is valid where all
/// members are valid, and its degree is the largest member degree. A term above a member's
/// degree simply gets no contribution from it.
#[derive(Debug, Clone)]
pub struct CombinedSHCoefficients {
    sources: Vec<Arc<dyn SHCoefficients>>,
    degree: usize,
    is_internal: bool,
    validity: Validity,
}

impl CombinedSHCoefficients {
    /// Combine sources.
    ///
    /// Errors
    /// ------
    /// * [`MagModError::NoCoefficientSources`] for an empty list
    /// * [`MagModError::ModelCombination`] if internal and external sources are mixed
    /// * [`MagModError::EmptyValidityIntersection`] if the validities do not overlap
    pub fn new(sources: Vec<Arc<dyn SHCoefficients>>) -> Result<Self, MagModError> {
        let first = sources.first().ok_or(MagModError::NoCoefficientSources)?;
        let is_internal = first.is_internal();

        if sources.iter().any(|s| s.is_internal() != is_internal) {
            return Err(MagModError::ModelCombination(
                "internal and external sources cannot be combined".into(),
            ));
        }

        let validity = sources
            .iter()
            .try_fold(Validity::unbounded(), |acc, s| acc.intersect(&s.validity()))
            .ok_or(MagModError::EmptyValidityIntersection)?;

        let degree = sources.iter().map(|s| s.degree()).max().unwrap_or(0);

        Ok(CombinedSHCoefficients {
            sources,
            degree,
            is_internal,
            validity,
        })
    }

    pub fn sources(&self) -> &[Arc<dyn SHCoefficients>] {
        &self.sources
    }
}

impl SHCoefficients for CombinedSHCoefficients {
    fn degree(&self) -> usize {
        self.degree
    }

    fn is_internal(&self) -> bool {
        self.is_internal
    }

    fn validity(&self) -> Validity {
        self.validity
    }

    fn get(&self, n: usize, m: usize, time: MJD2000) -> Result<(f64, f64), MagModError> {
        super::check_index(n, m, self.degree)?;
        self.sources
            .iter()
            .filter(|s| n <= s.degree())
            .try_fold((0.0, 0.0), |(g, h), s| {
                let (dg, dh) = s.get(n, m, time)?;
                Ok((g + dg, h + dh))
            })
    }

    fn eval(&self, time: MJD2000) -> CoefficientSet {
        let mut set = CoefficientSet::zeros(self.degree);
        for source in &self.sources {
            set.accumulate(&source.eval(time));
        }
        set
    }
}
