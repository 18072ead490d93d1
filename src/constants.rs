//! # Constants and type definitions for magmod
//!
//! This module centralizes the **geodetic constants**, **conversion factors** and **type
//! aliases** shared by the coefficient model, the Legendre evaluator and the field synthesizer.
//!
//! ## Overview
//!
//! - WGS84 reference ellipsoid (kilometers)
//! - Geomagnetic reference radius used by WMM, IGRF, CHAOS and EMM
//! - Calendar anchors for the MJD2000 time scale
//! - Unit aliases used in public signatures

// -------------------------------------------------------------------------------------------------
// Geodesy
// -------------------------------------------------------------------------------------------------

/// WGS84 semi-major axis in kilometers
pub const WGS84_A: f64 = 6378.137;

/// WGS84 flattening
pub const WGS84_INV_F: f64 = 298.257223563;

/// WGS84 semi-minor axis in kilometers
pub const WGS84_B: f64 = WGS84_A * (1.0 - 1.0 / WGS84_INV_F);

/// WGS84 first eccentricity squared
pub const WGS84_EPS2: f64 = 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);

/// Mean Earth radius used as the reference radius of the geomagnetic models, in kilometers
pub const EARTH_RADIUS: f64 = 6371.2;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Below this value of `|cos φ|` the east component uses the pole-limit series.
pub const POLE_COS_EPS: f64 = 1e-10;

// -------------------------------------------------------------------------------------------------
// Time
// -------------------------------------------------------------------------------------------------

/// MJD of the MJD2000 origin (2000-01-01T00:00:00 UTC)
pub const MJD2000_ORIGIN: f64 = 51544.0;

/// Span of the WMM and EMM validity, in years after the model epoch
pub const WMM_VALIDITY_SPAN: f64 = 5.0;

/// First and last calendar years accepted by the time conversions
pub const MIN_YEAR: i32 = -9999;
pub const MAX_YEAR: i32 = 9999;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Magnetic field in nanotesla
pub type NanoTesla = f64;
/// Time as Modified Julian Date 2000 (days since 2000-01-01T00:00 UTC)
pub type MJD2000 = f64;
/// Time as a decimal year (e.g. `2015.5`)
pub type DecimalYear = f64;

/// One input point of a batch evaluation: `(time, c1, c2, c3)`.
///
/// The meaning of `c1..c3` depends on the selected
/// [`CoordinateSystem`](crate::coord_system::CoordinateSystem).
pub type SpatioTemporalPoint = [f64; 4];
