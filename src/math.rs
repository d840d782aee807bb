//! Regular-polygon helpers used when laying out rings.

use std::f64::consts::PI;

pub fn to_rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn to_deg(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Circumradius of a regular polygon with `n` sides of length `side`.
pub fn poly_circumradius(side: f64, n: usize) -> f64 {
    side / (2.0 * (PI / n as f64).sin())
}

/// Distance from the center of a regular `n`-gon to the middle of a side.
pub fn apothem(circumradius: f64, n: usize) -> f64 {
    circumradius * (PI / n as f64).cos()
}

/// Angle subtended at the center by one side of a regular `n`-gon.
pub fn central_angle(n: usize) -> f64 {
    2.0 * PI / n as f64
}

/// Interior angle at each corner of a regular `n`-gon.
pub fn interior_angle(n: usize) -> f64 {
    PI - central_angle(n)
}
