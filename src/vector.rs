//! A small 2D vector type used for atom positions and ring centers.
//!
//! All operations return new values; `Vector2` is `Copy` and cheap to pass
//! around. Angles are in radians and follow the usual mathematical
//! orientation (counter-clockwise positive).

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Lengths below this are treated as zero when normalising.
const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(self, other: Vector2) -> f64 {
        (self - other).length()
    }

    pub fn distance_sq(self, other: Vector2) -> f64 {
        (self - other).length_sq()
    }

    /// Unit vector in the same direction, or the zero vector when `self` has
    /// no usable length.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < EPSILON || !len.is_finite() {
            return Self::ZERO;
        }
        self / len
    }

    /// Rotate about the origin.
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn rotate_around(self, angle: f64, center: Vector2) -> Self {
        (self - center).rotate(angle) + center
    }

    /// Rotate about `center` by `angle` in whichever direction leaves the
    /// result farther from `away`.
    pub fn rotate_away_from(self, away: Vector2, center: Vector2, angle: f64) -> Self {
        let positive = self.rotate_around(angle, center);
        let negative = self.rotate_around(-angle, center);
        if negative.distance_sq(away) > positive.distance_sq(away) {
            negative
        } else {
            positive
        }
    }

    /// Angle of the vector measured from the positive x axis.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// z component of the 3D cross product. Positive when `other` lies
    /// counter-clockwise of `self`.
    pub fn cross(self, other: Vector2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn midpoint(a: Vector2, b: Vector2) -> Self {
        (a + b) * 0.5
    }

    /// The two normals of the segment `a -> b`, left one first.
    pub fn normals(a: Vector2, b: Vector2) -> [Vector2; 2] {
        let delta = b - a;
        [Vector2::new(-delta.y, delta.x), Vector2::new(delta.y, -delta.x)]
    }

    /// Mirror image of `self` across the line through `a` and `b`.
    ///
    /// Returns `self` unchanged when `a` and `b` coincide.
    pub fn reflect_across(self, a: Vector2, b: Vector2) -> Self {
        let axis = (b - a).normalized();
        if axis == Self::ZERO {
            return self;
        }
        let rel = self - a;
        let along = axis * rel.dot(axis);
        a + along * 2.0 - rel
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn centroid<I: IntoIterator<Item = Vector2>>(points: I) -> Option<Self> {
        let mut sum = Self::ZERO;
        let mut count = 0usize;
        for p in points {
            sum += p;
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Vector2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;
    fn div(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}
