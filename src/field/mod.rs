//! # Magnetic field synthesis
//!
//! [`MagneticModel`] evaluates the magnetic field of a spherical-harmonic coefficient
//! source at a batch of spatio-temporal points.
//!
//! ## Pipeline
//! -----------------
//! For every point `(t, c1, c2, c3)`:
//!
//! 1. The location is expressed in geocentric spherical coordinates (latitude, longitude,
//!    radius), going through cartesian coordinates for the geodetic systems.
//! 2. The coefficients of the source are evaluated at `t` (MJD2000).
//! 3. The field `(N, E, D)` is summed in the local geocentric frame.
//! 4. The vector is rotated into the output frame.
//!
//! ## Output frames
//! -----------------
//! | Input system | Output frame |
//! |--------------|--------------|
//! | geodetic (WGS84 or geoid heights) | local geodetic (north, east, down) |
//! | geocentric spherical | local geocentric (north, east, down) |
//! | geocentric cartesian | geocentric cartesian (x, y, z) |
//!
//! All components are in nT. The output keeps the order of the input. Any invalid point
//! fails the whole batch; points outside the validity of the source are evaluated by
//! extrapolation and reported with a `tracing` warning.
//!
//! ## Example
//! -----------------
//! ```rust
//! use std::sync::Arc;
//!
//! use magmod::{
//!     coefficients::SparseSHCoefficientsConstant, coord_system::CoordinateSystem,
//!     field::MagneticModel,
//! };
//!
//! let dipole = SparseSHCoefficientsConstant::new([((1, 0), (1.0, 0.0))], true).unwrap();
//! let model = MagneticModel::new(Arc::new(dipole));
//!
//! let field = model
//!     .eval(&[[0.0, 0.0, 0.0, 6371.2]], CoordinateSystem::GeocentricSpherical)
//!     .unwrap();
//! assert!((field[0].x + 1.0).abs() < 1e-12);
//! ```
mod elements;
mod synthesis;

use std::{fmt, sync::Arc};

use nalgebra::{Matrix3, Vector3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

pub use elements::FieldElements;
use synthesis::{synthesize, SynthesisParams};

use crate::{
    coefficients::{SHCoefficients, Validity},
    constants::{Degree, Kilometer, SpatioTemporalPoint, EARTH_RADIUS, RADEG},
    conversion::{
        cartesian_to_spherical, check_latitude, ned_tilt_rotation, ned_to_cartesian_rotation,
        CoordinateConverter,
    },
    coord_system::CoordinateSystem,
    geoid::GeoidModel,
    magmod_errors::MagModError,
    time::mjd2000_to_decimal_year,
};

/// Frame in which the field of one point is returned.
#[derive(Debug, Clone, Copy)]
enum OutputFrame {
    GeocentricNed,
    /// Geodetic NED, tilted by `φ_geodetic - φ_geocentric` (radians).
    GeodeticNed(f64),
    /// ECEF, through the rotation from the geocentric NED frame.
    Cartesian(Matrix3<f64>),
}

/// `rotation * v` without the products by zero entries, so that the infinite components
/// of a field at the centre of the Earth do not turn into NaN.
fn rotate(rotation: &Matrix3<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::from_fn(|i, _| {
        (0..3)
            .filter(|&j| rotation[(i, j)] != 0.0)
            .map(|j| rotation[(i, j)] * v[j])
            .sum()
    })
}

impl OutputFrame {
    fn apply(&self, ned: Vector3<f64>) -> Vector3<f64> {
        match self {
            OutputFrame::GeocentricNed => ned,
            OutputFrame::GeodeticNed(psi) => rotate(&ned_tilt_rotation(*psi), &ned),
            OutputFrame::Cartesian(rotation) => rotate(rotation, &ned),
        }
    }

    /// The local (north, east, down) frame matching the input system.
    fn local(&self, ned: Vector3<f64>) -> Vector3<f64> {
        match self {
            OutputFrame::Cartesian(_) => ned,
            _ => self.apply(ned),
        }
    }
}

/// Geocentric spherical location of an input point with the frame of its result.
struct Location {
    latitude: Degree,
    longitude: Degree,
    radius: Kilometer,
    frame: OutputFrame,
}

/// A geomagnetic model ready to be evaluated.
///
/// Wraps a shared coefficient source together with the synthesis options. Cloning is cheap
/// and the model can be evaluated concurrently from several threads.
#[derive(Debug, Clone)]
pub struct MagneticModel {
    source: Arc<dyn SHCoefficients>,
    min_degree: usize,
    max_degree: Option<usize>,
    reference_radius: Kilometer,
    converter: CoordinateConverter,
}

impl MagneticModel {
    /// Build a model evaluating the full degree range of `source` with the 6371.2 km
    /// reference radius.
    pub fn new(source: Arc<dyn SHCoefficients>) -> Self {
        MagneticModel {
            source,
            min_degree: 0,
            max_degree: None,
            reference_radius: EARTH_RADIUS,
            converter: CoordinateConverter::new(),
        }
    }

    /// Truncate the summation above `degree`.
    pub fn with_max_degree(mut self, degree: usize) -> Self {
        self.max_degree = Some(degree);
        self
    }

    /// Skip the terms below `degree`, e.g. to isolate the crustal field.
    pub fn with_min_degree(mut self, degree: usize) -> Self {
        self.min_degree = degree;
        self
    }

    /// Reference radius `a` of the coefficients, in kilometers.
    pub fn with_reference_radius(mut self, radius: Kilometer) -> Self {
        self.reference_radius = radius;
        self
    }

    /// Geoid used to evaluate points given in
    /// [`CoordinateSystem::GeodeticAboveEgm96`].
    pub fn with_geoid(mut self, geoid: Arc<dyn GeoidModel>) -> Self {
        self.converter = self.converter.with_geoid(geoid);
        self
    }

    pub fn source(&self) -> &Arc<dyn SHCoefficients> {
        &self.source
    }

    /// Highest degree used by the summation.
    pub fn degree(&self) -> usize {
        self.max_degree
            .map_or(self.source.degree(), |d| d.min(self.source.degree()))
    }

    pub fn validity(&self) -> Validity {
        self.source.validity()
    }

    fn params(&self) -> SynthesisParams {
        SynthesisParams {
            min_degree: self.min_degree,
            max_degree: self.degree(),
            reference_radius: self.reference_radius,
            is_internal: self.source.is_internal(),
        }
    }

    fn locate(
        &self,
        coords: &Vector3<f64>,
        coord: CoordinateSystem,
    ) -> Result<Location, MagModError> {
        match coord {
            CoordinateSystem::GeodeticAboveWgs84 | CoordinateSystem::GeodeticAboveEgm96 => {
                let xyz = self.converter.to_cartesian(coords, coord)?;
                let (latitude, _, radius) = cartesian_to_spherical(&xyz);
                Ok(Location {
                    latitude,
                    longitude: coords.y,
                    radius,
                    frame: OutputFrame::GeodeticNed((coords.x - latitude) * RADEG),
                })
            }
            CoordinateSystem::GeocentricSpherical => {
                check_latitude(coords.x)?;
                if coords.z < 0.0 {
                    return Err(MagModError::NegativeRadius(coords.z));
                }
                Ok(Location {
                    latitude: coords.x,
                    longitude: coords.y,
                    radius: coords.z,
                    frame: OutputFrame::GeocentricNed,
                })
            }
            CoordinateSystem::GeocentricCartesian => {
                let (latitude, longitude, radius) = cartesian_to_spherical(coords);
                Ok(Location {
                    latitude,
                    longitude,
                    radius,
                    frame: OutputFrame::Cartesian(ned_to_cartesian_rotation(
                        latitude * RADEG,
                        longitude * RADEG,
                    )),
                })
            }
        }
    }

    /// Field in the local geocentric frame and the frame of the result.
    fn field_at(
        &self,
        point: &SpatioTemporalPoint,
        coord: CoordinateSystem,
        params: &SynthesisParams,
    ) -> Result<(Vector3<f64>, OutputFrame), MagModError> {
        let location = self.locate(&Vector3::new(point[1], point[2], point[3]), coord)?;
        let coeff = self.source.eval(point[0]);
        let field = synthesize(
            &coeff,
            location.latitude,
            location.longitude,
            location.radius,
            params,
        );
        Ok((field, location.frame))
    }

    /// Evaluate `f` on every point, in parallel with the `parallel` feature.
    fn map_points<T, F>(&self, points: &[SpatioTemporalPoint], f: F) -> Result<Vec<T>, MagModError>
    where
        T: Send,
        F: Fn(&SpatioTemporalPoint) -> Result<T, MagModError> + Sync + Send,
    {
        let validity = self.validity();
        let outside = points.iter().filter(|p| !validity.contains(p[0])).count();
        if outside > 0 {
            warn!(
                outside,
                total = points.len(),
                start = validity.start,
                end = validity.end,
                "evaluating points outside the model validity"
            );
        }
        debug!(points = points.len(), degree = self.degree(), "field evaluation");

        #[cfg(feature = "parallel")]
        let results = points.par_iter().map(f).collect();
        #[cfg(not(feature = "parallel"))]
        let results = points.iter().map(f).collect();
        results
    }

    /// Evaluate the field at a batch of points.
    ///
    /// Arguments
    /// ---------
    /// * `points`: `(time MJD2000, c1, c2, c3)` tuples, coordinates in `coord`
    /// * `coord`: coordinate system of the points, which also selects the output frame
    ///
    /// Return
    /// ------
    /// * one field vector in nT per point, in input order
    ///
    /// Errors
    /// ------
    /// * [`MagModError::InvalidLatitude`], [`MagModError::NegativeRadius`] for invalid points
    /// * [`MagModError::MissingGeoidModel`] for geoid heights without a configured geoid
    pub fn eval(
        &self,
        points: &[SpatioTemporalPoint],
        coord: CoordinateSystem,
    ) -> Result<Vec<Vector3<f64>>, MagModError> {
        let params = self.params();
        self.map_points(points, |point| {
            let (field, frame) = self.field_at(point, coord, &params)?;
            Ok(frame.apply(field))
        })
    }

    /// Evaluate the geomagnetic elements at a batch of points.
    ///
    /// The elements are computed in the local (north, east, down) frame of each point:
    /// geodetic for the geodetic systems, geocentric otherwise.
    pub fn eval_elements(
        &self,
        points: &[SpatioTemporalPoint],
        coord: CoordinateSystem,
    ) -> Result<Vec<FieldElements>, MagModError> {
        let params = self.params();
        self.map_points(points, |point| {
            let (field, frame) = self.field_at(point, coord, &params)?;
            Ok(FieldElements::from_ned(&frame.local(field)))
        })
    }
}

impl fmt::Display for MagneticModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let validity = self.validity();
        writeln!(
            f,
            "Magnetic model ({} source)",
            if self.source.is_internal() {
                "internal"
            } else {
                "external"
            }
        )?;
        writeln!(f, "  degrees        : {}..={}", self.min_degree, self.degree())?;
        writeln!(f, "  ref. radius    : {} km", self.reference_radius)?;
        if validity.is_unbounded() {
            return write!(f, "  validity       : unbounded");
        }
        match (
            mjd2000_to_decimal_year(validity.start),
            mjd2000_to_decimal_year(validity.end),
        ) {
            (Ok(start), Ok(end)) => write!(f, "  validity       : {start:.4} - {end:.4}"),
            _ => write!(
                f,
                "  validity       : MJD2000 {} - {}",
                validity.start, validity.end
            ),
        }
    }
}

/// Evaluate a model at a batch of points, see [`MagneticModel::eval`].
pub fn eval_model(
    model: &MagneticModel,
    points: &[SpatioTemporalPoint],
    coord: CoordinateSystem,
) -> Result<Vec<Vector3<f64>>, MagModError> {
    model.eval(points, coord)
}
