//! 3-D vector type
//!
//! A plain `{x, y, z}` value type with the handful of operations panel
//! geometry needs. Kept deliberately small; dense linear algebra lives in
//! `aeroflow-solvers` on ndarray containers.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A 3-D cartesian vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// x component (streamwise, positive aft)
    pub x: f64,
    /// y component (spanwise, positive starboard)
    pub y: f64,
    /// z component (positive up)
    pub z: f64,
}

impl Vector3 {
    /// The zero vector.
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a vector from components.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Euclidean norm.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Squared norm.
    #[inline]
    pub fn norm_sqr(&self) -> f64 {
        self.dot(self)
    }

    /// Unit vector in the same direction, or zero if the norm is negligible.
    pub fn normalized(&self) -> Vector3 {
        let n = self.norm();
        if n > 1e-30 {
            *self / n
        } else {
            Vector3::ZERO
        }
    }

    /// Distance to another point.
    #[inline]
    pub fn distance_to(&self, other: &Vector3) -> f64 {
        (*self - *other).norm()
    }

    /// True when all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Freestream direction for angle of attack and sideslip, both in degrees.
    ///
    /// Matches the body-axes wind convention of classical panel codes:
    /// alpha rotates about y, beta about z.
    pub fn wind_direction(alpha_deg: f64, beta_deg: f64) -> Vector3 {
        let a = alpha_deg.to_radians();
        let b = beta_deg.to_radians();
        Vector3 {
            x: a.cos() * b.cos(),
            y: -b.sin(),
            z: a.sin() * b.cos(),
        }
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    #[inline]
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vector3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    #[inline]
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vector3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn mul(self, s: f64) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn div(self, s: f64) -> Vector3 {
        Vector3::new(self.x / s, self.y / s, self.z / s)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    #[inline]
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dot_and_cross() {
        let ex = Vector3::new(1.0, 0.0, 0.0);
        let ey = Vector3::new(0.0, 1.0, 0.0);

        assert_relative_eq!(ex.dot(&ey), 0.0);
        let ez = ex.cross(&ey);
        assert_relative_eq!(ez.x, 0.0);
        assert_relative_eq!(ez.y, 0.0);
        assert_relative_eq!(ez.z, 1.0);
    }

    #[test]
    fn test_norm_and_normalized() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(v.norm(), 5.0);
        assert_relative_eq!(v.normalized().norm(), 1.0);
        assert_eq!(Vector3::ZERO.normalized(), Vector3::ZERO);
    }

    #[test]
    fn test_wind_direction() {
        let w = Vector3::wind_direction(0.0, 0.0);
        assert_relative_eq!(w.x, 1.0);
        assert_relative_eq!(w.z, 0.0);

        let w = Vector3::wind_direction(90.0, 0.0);
        assert_relative_eq!(w.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(w.z, 1.0);

        // unit length for any combination
        let w = Vector3::wind_direction(5.0, -3.0);
        assert_relative_eq!(w.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_operators() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(-1.0, 0.5, 2.0);
        let s = a + b * 2.0 - a / 2.0;
        assert_relative_eq!(s.x, -1.5);
        assert_relative_eq!(s.y, 2.0);
        assert_relative_eq!(s.z, 5.5);
    }
}
