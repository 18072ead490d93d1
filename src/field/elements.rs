use std::fmt;

use nalgebra::Vector3;

use crate::constants::{Degree, NanoTesla};

/// The seven geomagnetic elements of a field vector given in a local (north, east, down) frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldElements {
    /// North component X
    pub x: NanoTesla,
    /// East component Y
    pub y: NanoTesla,
    /// Down component Z
    pub z: NanoTesla,
    /// Horizontal intensity H
    pub h: NanoTesla,
    /// Total intensity F
    pub f: NanoTesla,
    /// Declination D, positive east of north
    pub declination: Degree,
    /// Inclination I, positive downward
    pub inclination: Degree,
}

impl FieldElements {
    pub fn from_ned(field: &Vector3<f64>) -> Self {
        let (x, y, z) = (field.x, field.y, field.z);
        let h = x.hypot(y);
        FieldElements {
            x,
            y,
            z,
            h,
            f: field.norm(),
            declination: y.atan2(x).to_degrees(),
            inclination: z.atan2(h).to_degrees(),
        }
    }
}

impl From<Vector3<f64>> for FieldElements {
    fn from(field: Vector3<f64>) -> Self {
        FieldElements::from_ned(&field)
    }
}

impl fmt::Display for FieldElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X={:.1} nT, Y={:.1} nT, Z={:.1} nT, H={:.1} nT, F={:.1} nT, D={:.3}°, I={:.3}°",
            self.x, self.y, self.z, self.h, self.f, self.declination, self.inclination
        )
    }
}
