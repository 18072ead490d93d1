//! # Coordinate conversions
//!
//! Conversions between the four [`CoordinateSystem`]s understood by the crate, plus the frame
//! rotations needed to express a field vector computed in the local geocentric
//! (north, east, down) frame in the frame of the input coordinates.
//!
//! ## Units & conventions
//!
//! - Angles in **degrees**, distances in **kilometers**.
//! - Longitudes are returned in `(-180, 180]`.
//! - The WGS84 ellipsoid ([`WGS84_A`], [`WGS84_EPS2`]) is the geodetic reference.
//!
//! ```text
//! geodetic (WGS84) ──► cartesian ──► spherical
//! geodetic (geoid) ──► geodetic (WGS84)       (h + N(φ, λ), needs a GeoidModel)
//! ```
use std::sync::Arc;

use nalgebra::{Matrix3, Vector3};

use crate::{
    constants::{Degree, Kilometer, Radian, RADEG, WGS84_A, WGS84_EPS2},
    coord_system::CoordinateSystem,
    geoid::GeoidModel,
    magmod_errors::MagModError,
};

/// Geodetic (WGS84) latitude, longitude and height → geocentric cartesian coordinates.
///
/// Arguments
/// ---------
/// * `latitude`: geodetic latitude in degrees
/// * `longitude`: longitude in degrees
/// * `height`: height above the ellipsoid in kilometers
///
/// Return
/// ------
/// * cartesian (x, y, z) in kilometers
pub fn geodetic_to_cartesian(latitude: Degree, longitude: Degree, height: Kilometer) -> Vector3<f64> {
    let (slat, clat) = (latitude * RADEG).sin_cos();
    let (slon, clon) = (longitude * RADEG).sin_cos();

    // radius of curvature in the prime vertical
    let rn = WGS84_A / (1.0 - WGS84_EPS2 * slat * slat).sqrt();

    Vector3::new(
        (rn + height) * clat * clon,
        (rn + height) * clat * slon,
        (rn * (1.0 - WGS84_EPS2) + height) * slat,
    )
}

/// Geocentric cartesian coordinates → geodetic (WGS84) latitude, longitude and height.
///
/// The latitude is obtained by fixed-point iteration of
/// `tan φ = (z + e²·N(φ)·sin φ) / p`, which converges by a factor `e²` per step.
/// The height uses the `p cos φ + z sin φ` form, well defined at the poles.
pub fn cartesian_to_geodetic(xyz: &Vector3<f64>) -> (Degree, Degree, Kilometer) {
    let p = xyz.x.hypot(xyz.y);
    let longitude = xyz.y.atan2(xyz.x);

    let mut latitude = xyz.z.atan2(p * (1.0 - WGS84_EPS2));
    for _ in 0..20 {
        let slat = latitude.sin();
        let rn = WGS84_A / (1.0 - WGS84_EPS2 * slat * slat).sqrt();
        let next = (xyz.z + WGS84_EPS2 * rn * slat).atan2(p);
        let done = (next - latitude).abs() < 1e-15;
        latitude = next;
        if done {
            break;
        }
    }

    let (slat, clat) = latitude.sin_cos();
    let height = p * clat + xyz.z * slat - WGS84_A * (1.0 - WGS84_EPS2 * slat * slat).sqrt();

    (latitude / RADEG, longitude / RADEG, height)
}

/// Geocentric spherical latitude, longitude and radius → cartesian coordinates.
pub fn spherical_to_cartesian(latitude: Degree, longitude: Degree, radius: Kilometer) -> Vector3<f64> {
    let (slat, clat) = (latitude * RADEG).sin_cos();
    let (slon, clon) = (longitude * RADEG).sin_cos();
    Vector3::new(radius * clat * clon, radius * clat * slon, radius * slat)
}

/// Cartesian coordinates → geocentric spherical latitude, longitude and radius.
///
/// The origin maps to `(0, 0, 0)`.
pub fn cartesian_to_spherical(xyz: &Vector3<f64>) -> (Degree, Degree, Kilometer) {
    let radius = xyz.norm();
    if radius == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let latitude = (xyz.z / radius).clamp(-1.0, 1.0).asin();
    let longitude = xyz.y.atan2(xyz.x);
    (latitude / RADEG, longitude / RADEG, radius)
}

/// Rotation from the local (north, east, down) frame at geocentric latitude `lat` and
/// longitude `lon` to the geocentric cartesian frame.
pub fn ned_to_cartesian_rotation(lat: Radian, lon: Radian) -> Matrix3<f64> {
    let (slat, clat) = lat.sin_cos();
    let (slon, clon) = lon.sin_cos();
    Matrix3::new(
        -slat * clon, -slon, -clat * clon,
        -slat * slon, clon, -clat * slon,
        clat, 0.0, -slat,
    )
}

/// Rotation of a (north, east, down) vector about the east axis by `psi`,
/// the difference between the target and the source latitude.
///
/// With `psi = φ_geodetic - φ_geocentric` this moves a vector from the local geocentric
/// frame to the local geodetic frame.
pub fn ned_tilt_rotation(psi: Radian) -> Matrix3<f64> {
    let (spsi, cpsi) = psi.sin_cos();
    Matrix3::new(
        cpsi, 0.0, spsi,
        0.0, 1.0, 0.0,
        -spsi, 0.0, cpsi,
    )
}

pub(crate) fn check_latitude(latitude: Degree) -> Result<(), MagModError> {
    if (-90.0..=90.0).contains(&latitude) {
        Ok(())
    } else {
        Err(MagModError::InvalidLatitude(latitude))
    }
}

/// Converts points between the supported [`CoordinateSystem`]s.
///
/// The converter only holds the optional geoid model needed by
/// [`CoordinateSystem::GeodeticAboveEgm96`]; it is cheap to clone and shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct CoordinateConverter {
    geoid: Option<Arc<dyn GeoidModel>>,
}

impl CoordinateConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the geoid model used for heights above the geoid.
    pub fn with_geoid(mut self, geoid: Arc<dyn GeoidModel>) -> Self {
        self.geoid = Some(geoid);
        self
    }

    fn geoid(&self) -> Result<&dyn GeoidModel, MagModError> {
        self.geoid.as_deref().ok_or(MagModError::MissingGeoidModel)
    }

    /// Convert one point to geocentric cartesian coordinates, validating the input.
    pub fn to_cartesian(
        &self,
        point: &Vector3<f64>,
        from: CoordinateSystem,
    ) -> Result<Vector3<f64>, MagModError> {
        if from.is_angular() {
            check_latitude(point.x)?;
        }
        match from {
            CoordinateSystem::GeodeticAboveWgs84 => {
                Ok(geodetic_to_cartesian(point.x, point.y, point.z))
            }
            CoordinateSystem::GeodeticAboveEgm96 => {
                let height = point.z + self.geoid()?.undulation(point.x, point.y);
                Ok(geodetic_to_cartesian(point.x, point.y, height))
            }
            CoordinateSystem::GeocentricSpherical => {
                if point.z < 0.0 {
                    return Err(MagModError::NegativeRadius(point.z));
                }
                Ok(spherical_to_cartesian(point.x, point.y, point.z))
            }
            CoordinateSystem::GeocentricCartesian => Ok(*point),
        }
    }

    /// Express geocentric cartesian coordinates in the `to` system.
    pub fn from_cartesian(
        &self,
        xyz: &Vector3<f64>,
        to: CoordinateSystem,
    ) -> Result<Vector3<f64>, MagModError> {
        match to {
            CoordinateSystem::GeodeticAboveWgs84 => {
                let (lat, lon, h) = cartesian_to_geodetic(xyz);
                Ok(Vector3::new(lat, lon, h))
            }
            CoordinateSystem::GeodeticAboveEgm96 => {
                let (lat, lon, h) = cartesian_to_geodetic(xyz);
                let height = h - self.geoid()?.undulation(lat, lon);
                Ok(Vector3::new(lat, lon, height))
            }
            CoordinateSystem::GeocentricSpherical => {
                let (lat, lon, r) = cartesian_to_spherical(xyz);
                Ok(Vector3::new(lat, lon, r))
            }
            CoordinateSystem::GeocentricCartesian => Ok(*xyz),
        }
    }

    /// Convert a single point from one coordinate system to another.
    pub fn convert_point(
        &self,
        point: &Vector3<f64>,
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> Result<Vector3<f64>, MagModError> {
        if from == to {
            if from.is_angular() {
                check_latitude(point.x)?;
            }
            return Ok(*point);
        }
        let xyz = self.to_cartesian(point, from)?;
        self.from_cartesian(&xyz, to)
    }

    /// Convert a batch of points, preserving their order.
    ///
    /// Arguments
    /// ---------
    /// * `points`: coordinates expressed in `from`
    /// * `from`: source coordinate system
    /// * `to`: target coordinate system
    ///
    /// Return
    /// ------
    /// * the converted points, or the first conversion error
    pub fn convert(
        &self,
        points: &[Vector3<f64>],
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> Result<Vec<Vector3<f64>>, MagModError> {
        points
            .iter()
            .map(|p| self.convert_point(p, from, to))
            .collect()
    }
}

#[cfg(test)]
mod conversion_test {
    use super::*;
    use crate::{constants::WGS84_B, geoid::EllipsoidGeoid};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_geodetic_to_cartesian() {
        let xyz = geodetic_to_cartesian(0.0, 0.0, 0.0);
        assert_abs_diff_eq!(xyz, Vector3::new(WGS84_A, 0.0, 0.0), epsilon = 1e-9);

        let xyz = geodetic_to_cartesian(90.0, 0.0, 0.0);
        assert_abs_diff_eq!(xyz, Vector3::new(0.0, 0.0, WGS84_B), epsilon = 1e-9);

        let xyz = geodetic_to_cartesian(0.0, 90.0, 10.0);
        assert_abs_diff_eq!(xyz, Vector3::new(0.0, WGS84_A + 10.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_geodetic_round_trip() {
        for lat in (-90i32..=90).step_by(15) {
            for lon in (-165..=180).step_by(45) {
                for h in [-5.0, 0.0, 100.0, 35786.0] {
                    let xyz = geodetic_to_cartesian(lat as f64, lon as f64, h);
                    let (lat2, lon2, h2) = cartesian_to_geodetic(&xyz);
                    assert_abs_diff_eq!(lat2, lat as f64, epsilon = 1e-9);
                    assert_abs_diff_eq!(h2, h, epsilon = 1e-9);
                    if lat.abs() != 90 {
                        assert_abs_diff_eq!(lon2, lon as f64, epsilon = 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_spherical_round_trip() {
        let xyz = spherical_to_cartesian(30.0, -120.0, 7000.0);
        let (lat, lon, r) = cartesian_to_spherical(&xyz);
        assert_abs_diff_eq!(lat, 30.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lon, -120.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r, 7000.0, epsilon = 1e-9);

        assert_eq!(cartesian_to_spherical(&Vector3::zeros()), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_ned_rotation() {
        // at (0, 0) north is +z, east is +y, down is -x
        let rot = ned_to_cartesian_rotation(0.0, 0.0);
        assert_abs_diff_eq!(rot * Vector3::x(), Vector3::z(), epsilon = 1e-15);
        assert_abs_diff_eq!(rot * Vector3::y(), Vector3::y(), epsilon = 1e-15);
        assert_abs_diff_eq!(rot * Vector3::z(), -Vector3::x(), epsilon = 1e-15);
        assert_abs_diff_eq!(rot.transpose() * rot, Matrix3::identity(), epsilon = 1e-15);

        let tilt = ned_tilt_rotation(0.1);
        assert_abs_diff_eq!(
            ned_tilt_rotation(-0.1) * tilt,
            Matrix3::identity(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_converter_batch() {
        let converter = CoordinateConverter::new();
        let points = vec![
            Vector3::new(45.0, 10.0, 0.5),
            Vector3::new(-89.0, -170.0, 400.0),
        ];
        let spherical = converter
            .convert(
                &points,
                CoordinateSystem::GeodeticAboveWgs84,
                CoordinateSystem::GeocentricSpherical,
            )
            .unwrap();
        assert_eq!(spherical.len(), 2);
        // geocentric latitude is closer to the equator than the geodetic one
        assert!(spherical[0].x < 45.0 && spherical[0].x > 44.8);
        assert_abs_diff_eq!(spherical[0].y, 10.0, epsilon = 1e-12);

        let back = converter
            .convert(
                &spherical,
                CoordinateSystem::GeocentricSpherical,
                CoordinateSystem::GeodeticAboveWgs84,
            )
            .unwrap();
        for (a, b) in points.iter().zip(back.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_converter_errors() {
        let converter = CoordinateConverter::new();
        let err = converter.convert_point(
            &Vector3::new(91.0, 0.0, 0.0),
            CoordinateSystem::GeodeticAboveWgs84,
            CoordinateSystem::GeocentricCartesian,
        );
        assert_eq!(err, Err(MagModError::InvalidLatitude(91.0)));

        let err = converter.convert_point(
            &Vector3::new(0.0, 0.0, -1.0),
            CoordinateSystem::GeocentricSpherical,
            CoordinateSystem::GeocentricCartesian,
        );
        assert_eq!(err, Err(MagModError::NegativeRadius(-1.0)));

        let err = converter.convert_point(
            &Vector3::new(0.0, 0.0, 0.0),
            CoordinateSystem::GeodeticAboveEgm96,
            CoordinateSystem::GeocentricCartesian,
        );
        assert_eq!(err, Err(MagModError::MissingGeoidModel));
    }

    #[test]
    fn test_geoid_heights() {
        let converter = CoordinateConverter::new().with_geoid(Arc::new(EllipsoidGeoid));
        let p = Vector3::new(12.0, 34.0, 5.0);
        let q = converter
            .convert_point(
                &p,
                CoordinateSystem::GeodeticAboveEgm96,
                CoordinateSystem::GeodeticAboveWgs84,
            )
            .unwrap();
        assert_abs_diff_eq!(p, q, epsilon = 1e-9);
    }
}
