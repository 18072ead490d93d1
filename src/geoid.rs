//! # Geoid models
//!
//! Heights in the [`GeodeticAboveEgm96`](crate::coord_system::CoordinateSystem::GeodeticAboveEgm96)
//! system are measured above the geoid. Turning them into ellipsoidal heights needs the
//! geoid undulation `N(φ, λ)`: `h_ellipsoid = h_geoid + N`.
//!
//! The crate ships no geoid data. A [`GeoidGrid`] can be read from the EGM96 15' grid
//! distributed by NGA (`WW15MGH.GRD`): a header line
//! `lat_min lat_max lon_min lon_max dlat dlon` in degrees, followed by the undulations in
//! meters, row by row from `lat_max` down to `lat_min`, each row from `lon_min` to `lon_max`.
use std::fmt::Debug;

use camino::Utf8Path;
use tracing::debug;

use crate::{
    constants::{Degree, Kilometer},
    loaders::ParseCoeffError,
    magmod_errors::MagModError,
};

/// Source of geoid undulations.
pub trait GeoidModel: Debug + Send + Sync {
    /// Height of the geoid above the WGS84 ellipsoid, in **kilometers**.
    fn undulation(&self, latitude: Degree, longitude: Degree) -> Kilometer;
}

/// Regular latitude/longitude grid of geoid undulations with bilinear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoidGrid {
    lat_max: Degree,
    lon_min: Degree,
    dlat: Degree,
    dlon: Degree,
    nrows: usize,
    ncols: usize,
    /// Undulations in meters, row-major, north to south.
    values: Vec<f64>,
}

impl GeoidGrid {
    /// Read a grid file in the `WW15MGH.GRD` layout.
    pub fn from_file(path: &Utf8Path) -> Result<Self, MagModError> {
        let contents = std::fs::read_to_string(path)?;
        let grid = Self::parse(&contents)?;
        debug!(%path, rows = grid.nrows, cols = grid.ncols, "loaded geoid grid");
        Ok(grid)
    }

    /// Parse the contents of a grid file.
    pub fn parse(contents: &str) -> Result<Self, MagModError> {
        let mut numbers = Vec::new();
        let mut header_line = None;
        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            for token in line.split_whitespace() {
                let value = token.parse::<f64>().map_err(|_| ParseCoeffError::InvalidLine {
                    line: idx + 1,
                    content: line.trim_end().to_string(),
                })?;
                numbers.push(value);
            }
            header_line.get_or_insert(idx + 1);
        }

        let header_line = header_line.ok_or(ParseCoeffError::MissingHeader)?;
        if numbers.len() < 6 {
            return Err(ParseCoeffError::ValueCount {
                line: header_line,
                expected: 6,
                found: numbers.len(),
            }
            .into());
        }
        let (lat_min, lat_max, lon_min, lon_max, dlat, dlon) = (
            numbers[0], numbers[1], numbers[2], numbers[3], numbers[4], numbers[5],
        );
        if dlat <= 0.0 || dlon <= 0.0 || lat_max < lat_min || lon_max < lon_min {
            return Err(ParseCoeffError::InvalidLine {
                line: header_line,
                content: format!("{lat_min} {lat_max} {lon_min} {lon_max} {dlat} {dlon}"),
            }
            .into());
        }

        let nrows = ((lat_max - lat_min) / dlat).round() as usize + 1;
        let ncols = ((lon_max - lon_min) / dlon).round() as usize + 1;
        let values = numbers.split_off(6);
        if values.len() != nrows * ncols {
            return Err(ParseCoeffError::ValueCount {
                line: header_line,
                expected: nrows * ncols,
                found: values.len(),
            }
            .into());
        }

        Ok(GeoidGrid {
            lat_max,
            lon_min,
            dlat,
            dlon,
            nrows,
            ncols,
            values,
        })
    }

    fn node(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.ncols + col]
    }
}

impl GeoidModel for GeoidGrid {
    fn undulation(&self, latitude: Degree, longitude: Degree) -> Kilometer {
        let row_f = ((self.lat_max - latitude) / self.dlat).clamp(0.0, (self.nrows - 1) as f64);
        let lon = (longitude - self.lon_min).rem_euclid(360.0);
        let col_f = (lon / self.dlon).clamp(0.0, (self.ncols - 1) as f64);

        let row0 = (row_f.floor() as usize).min(self.nrows.saturating_sub(2));
        let col0 = (col_f.floor() as usize).min(self.ncols.saturating_sub(2));
        let row1 = (row0 + 1).min(self.nrows - 1);
        let col1 = (col0 + 1).min(self.ncols - 1);
        let wr = row_f - row0 as f64;
        let wc = col_f - col0 as f64;

        let top = self.node(row0, col0) * (1.0 - wc) + self.node(row0, col1) * wc;
        let bottom = self.node(row1, col0) * (1.0 - wc) + self.node(row1, col1) * wc;
        (top * (1.0 - wr) + bottom * wr) * 1e-3
    }
}

/// Geoid coinciding with the reference ellipsoid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EllipsoidGeoid;

impl GeoidModel for EllipsoidGeoid {
    fn undulation(&self, _latitude: Degree, _longitude: Degree) -> Kilometer {
        0.0
    }
}
