use thiserror::Error;

use crate::loaders::ParseCoeffError;

#[derive(Error, Debug)]
pub enum MagModError {
    #[error("Latitude out of the [-90, 90] degree range: {0}")]
    InvalidLatitude(f64),

    #[error("Invalid spherical harmonic degree: {0}")]
    InvalidDegree(i64),

    #[error("Invalid coordinate system: {0}")]
    InvalidCoordinateSystem(String),

    #[error("Negative geocentric radius: {0} km")]
    NegativeRadius(f64),

    #[error("Coefficient index (n={n}, m={m}) out of range for degree {degree}")]
    CoefficientIndexOutOfRange { n: usize, m: usize, degree: usize },

    #[error("Invalid validity interval: [{start}, {end}]")]
    InvalidValidity { start: f64, end: f64 },

    #[error("Invalid time nodes: {0}")]
    InvalidTimeNodes(String),

    #[error("Time outside the supported calendar range: {0}")]
    TimeOutOfRange(f64),

    #[error("Cannot combine coefficient sources: {0}")]
    ModelCombination(String),

    #[error("The validity intervals of the combined sources do not overlap")]
    EmptyValidityIntersection,

    #[error("At least one coefficient source is required")]
    NoCoefficientSources,

    #[error("A geoid model is required for heights above the geoid")]
    MissingGeoidModel,

    #[error("Unknown model dataset: {0}")]
    UnknownDataset(String),

    #[error("Unable to resolve the model data directory: {0}")]
    DataDirectory(String),

    #[error("Error during the coefficient file parsing: {0}")]
    Parsing(#[from] ParseCoeffError),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for MagModError {
    fn eq(&self, other: &Self) -> bool {
        use MagModError::*;
        match (self, other) {
            (InvalidLatitude(a), InvalidLatitude(b)) => a == b,
            (InvalidDegree(a), InvalidDegree(b)) => a == b,
            (InvalidCoordinateSystem(a), InvalidCoordinateSystem(b)) => a == b,
            (NegativeRadius(a), NegativeRadius(b)) => a == b,
            (
                CoefficientIndexOutOfRange { n, m, degree },
                CoefficientIndexOutOfRange {
                    n: n2,
                    m: m2,
                    degree: d2,
                },
            ) => n == n2 && m == m2 && degree == d2,
            (
                InvalidValidity { start, end },
                InvalidValidity {
                    start: s2,
                    end: e2,
                },
            ) => start == s2 && end == e2,
            (InvalidTimeNodes(a), InvalidTimeNodes(b)) => a == b,
            (TimeOutOfRange(a), TimeOutOfRange(b)) => a == b,
            (ModelCombination(a), ModelCombination(b)) => a == b,
            (UnknownDataset(a), UnknownDataset(b)) => a == b,
            (DataDirectory(a), DataDirectory(b)) => a == b,
            (Parsing(a), Parsing(b)) => a == b,

            // io errors carry no comparable payload: same variant is enough
            (IoError(_), IoError(_)) => true,

            (EmptyValidityIntersection, EmptyValidityIntersection) => true,
            (NoCoefficientSources, NoCoefficientSources) => true,
            (MissingGeoidModel, MissingGeoidModel) => true,

            _ => false,
        }
    }
}
