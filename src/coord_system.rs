use std::{fmt, str::FromStr};

use crate::magmod_errors::MagModError;

/// Coordinate systems accepted by the conversion routines and the field synthesizer.
///
/// Coordinates are always given as a triple `(c1, c2, c3)`:
///
/// | variant                | c1                 | c2                 | c3                       |
/// |------------------------|--------------------|--------------------|--------------------------|
/// | `GeodeticAboveWgs84`   | latitude (deg)     | longitude (deg)    | height above WGS84 (km)  |
/// | `GeodeticAboveEgm96`   | latitude (deg)     | longitude (deg)    | height above geoid (km)  |
/// | `GeocentricSpherical`  | latitude (deg)     | longitude (deg)    | radius (km)              |
/// | `GeocentricCartesian`  | x (km)             | y (km)             | z (km)                   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    GeodeticAboveWgs84,
    GeodeticAboveEgm96,
    GeocentricSpherical,
    GeocentricCartesian,
}

impl CoordinateSystem {
    pub const ALL: [CoordinateSystem; 4] = [
        CoordinateSystem::GeodeticAboveWgs84,
        CoordinateSystem::GeodeticAboveEgm96,
        CoordinateSystem::GeocentricSpherical,
        CoordinateSystem::GeocentricCartesian,
    ];

    /// Short identifier, also accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateSystem::GeodeticAboveWgs84 => "GEODETIC_ABOVE_WGS84",
            CoordinateSystem::GeodeticAboveEgm96 => "GEODETIC_ABOVE_EGM96",
            CoordinateSystem::GeocentricSpherical => "GEOCENTRIC_SPHERICAL",
            CoordinateSystem::GeocentricCartesian => "GEOCENTRIC_CARTESIAN",
        }
    }

    /// `true` for the systems whose first two coordinates are latitude and longitude.
    pub fn is_angular(&self) -> bool {
        !matches!(self, CoordinateSystem::GeocentricCartesian)
    }

    /// `true` for the two geodetic systems.
    pub fn is_geodetic(&self) -> bool {
        matches!(
            self,
            CoordinateSystem::GeodeticAboveWgs84 | CoordinateSystem::GeodeticAboveEgm96
        )
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CoordinateSystem {
    type Err = MagModError;

    /// Parse a selector, ignoring case and the `-`/`_` separators
    /// (`"geodetic_above_wgs84"`, `"GEOCENTRIC-CARTESIAN"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match key.as_str() {
            "GEODETICABOVEWGS84" | "WGS84" => Ok(CoordinateSystem::GeodeticAboveWgs84),
            "GEODETICABOVEEGM96" | "EGM96" => Ok(CoordinateSystem::GeodeticAboveEgm96),
            "GEOCENTRICSPHERICAL" | "SPHERICAL" => Ok(CoordinateSystem::GeocentricSpherical),
            "GEOCENTRICCARTESIAN" | "CARTESIAN" => Ok(CoordinateSystem::GeocentricCartesian),
            _ => Err(MagModError::InvalidCoordinateSystem(s.to_string())),
        }
    }
}

impl TryFrom<i32> for CoordinateSystem {
    type Error = MagModError;

    /// Integer codes `0..=3`, in the declaration order of the variants.
    fn try_from(code: i32) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| CoordinateSystem::ALL.get(idx).copied())
            .ok_or_else(|| MagModError::InvalidCoordinateSystem(code.to_string()))
    }
}

impl From<CoordinateSystem> for i32 {
    fn from(value: CoordinateSystem) -> Self {
        match value {
            CoordinateSystem::GeodeticAboveWgs84 => 0,
            CoordinateSystem::GeodeticAboveEgm96 => 1,
            CoordinateSystem::GeocentricSpherical => 2,
            CoordinateSystem::GeocentricCartesian => 3,
        }
    }
}

#[cfg(test)]
mod coord_system_test {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(
            "GEODETIC_ABOVE_WGS84".parse::<CoordinateSystem>().unwrap(),
            CoordinateSystem::GeodeticAboveWgs84
        );
        assert_eq!(
            "geocentric-cartesian".parse::<CoordinateSystem>().unwrap(),
            CoordinateSystem::GeocentricCartesian
        );
        assert_eq!(
            "spherical".parse::<CoordinateSystem>().unwrap(),
            CoordinateSystem::GeocentricSpherical
        );
        assert_eq!(
            "ECEF".parse::<CoordinateSystem>(),
            Err(MagModError::InvalidCoordinateSystem("ECEF".into()))
        );
    }

    #[test]
    fn test_integer_codes() {
        for cs in CoordinateSystem::ALL {
            assert_eq!(CoordinateSystem::try_from(i32::from(cs)).unwrap(), cs);
        }
        assert_eq!(
            CoordinateSystem::try_from(4),
            Err(MagModError::InvalidCoordinateSystem("4".into()))
        );
        assert_eq!(
            CoordinateSystem::try_from(-1),
            Err(MagModError::InvalidCoordinateSystem("-1".into()))
        );
    }

    #[test]
    fn test_display_round_trip() {
        for cs in CoordinateSystem::ALL {
            assert_eq!(cs.to_string().parse::<CoordinateSystem>().unwrap(), cs);
        }
    }

    #[test]
    fn test_classification() {
        let geodetic: Vec<_> = CoordinateSystem::ALL
            .into_iter()
            .filter(CoordinateSystem::is_geodetic)
            .collect();
        assert_eq!(
            geodetic,
            [
                CoordinateSystem::GeodeticAboveWgs84,
                CoordinateSystem::GeodeticAboveEgm96
            ]
        );
        assert!(CoordinateSystem::GeocentricSpherical.is_angular());
        assert!(!CoordinateSystem::GeocentricCartesian.is_angular());
    }
}
