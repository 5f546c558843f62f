//! 2D affine matrix, 3x3 with row-vector convention.
//!
//! Points transform as row vectors (`v' = v . M`), so the translation lives
//! in the third row and `a * b` applies `a` to the point first, then `b`.
//! Bone compositions read left-to-right in application order.

use crate::angle::Angle;
use crate::vector::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub m00: f64,
    pub m01: f64,
    pub m02: f64,
    pub m10: f64,
    pub m11: f64,
    pub m12: f64,
    pub m20: f64,
    pub m21: f64,
    pub m22: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Matrix {
            m00: 1.0,
            m01: 0.0,
            m02: 0.0,
            m10: 0.0,
            m11: 1.0,
            m12: 0.0,
            m20: 0.0,
            m21: 0.0,
            m22: 1.0,
        }
    }

    pub fn zero() -> Self {
        Matrix {
            m00: 0.0,
            m01: 0.0,
            m02: 0.0,
            m10: 0.0,
            m11: 0.0,
            m12: 0.0,
            m20: 0.0,
            m21: 0.0,
            m22: 0.0,
        }
    }

    /// Build from basis rows and a translation row.
    pub fn from_axes(axis_x: Vec2, axis_y: Vec2, offset: Vec2) -> Self {
        Matrix {
            m00: axis_x.x,
            m01: axis_x.y,
            m02: 0.0,
            m10: axis_y.x,
            m11: axis_y.y,
            m12: 0.0,
            m20: offset.x,
            m21: offset.y,
            m22: 1.0,
        }
    }

    pub fn rotate(angle: Angle) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Matrix {
            m00: c,
            m01: s,
            m02: 0.0,
            m10: -s,
            m11: c,
            m12: 0.0,
            m20: 0.0,
            m21: 0.0,
            m22: 1.0,
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Matrix {
            m00: sx,
            m01: 0.0,
            m02: 0.0,
            m10: 0.0,
            m11: sy,
            m12: 0.0,
            m20: 0.0,
            m21: 0.0,
            m22: 1.0,
        }
    }

    pub fn translate(t: Vec2) -> Self {
        Matrix {
            m00: 1.0,
            m01: 0.0,
            m02: 0.0,
            m10: 0.0,
            m11: 1.0,
            m12: 0.0,
            m20: t.x,
            m21: t.y,
            m22: 1.0,
        }
    }

    pub fn axis_x(&self) -> Vec2 {
        Vec2::new(self.m00, self.m01)
    }

    pub fn axis_y(&self) -> Vec2 {
        Vec2::new(self.m10, self.m11)
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.m20, self.m21)
    }

    /// Transform a point (translation applied).
    pub fn transform_point(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            v.x * self.m00 + v.y * self.m10 + self.m20,
            v.x * self.m01 + v.y * self.m11 + self.m21,
        )
    }

    /// Transform a direction (translation ignored).
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            v.x * self.m00 + v.y * self.m10,
            v.x * self.m01 + v.y * self.m11,
        )
    }

    pub fn is_invertible(&self) -> bool {
        (self.m00 * self.m11 - self.m01 * self.m10).abs() > 1e-12
    }

    /// Inverse of an affine matrix (third column assumed (0, 0, 1)).
    pub fn inverted(&self) -> Matrix {
        let det = self.m00 * self.m11 - self.m01 * self.m10;
        if det.abs() <= 1e-12 {
            return Matrix::identity();
        }
        let inv = 1.0 / det;
        let m00 = self.m11 * inv;
        let m01 = -self.m01 * inv;
        let m10 = -self.m10 * inv;
        let m11 = self.m00 * inv;
        let m20 = -(self.m20 * m00 + self.m21 * m10);
        let m21 = -(self.m20 * m01 + self.m21 * m11);
        Matrix {
            m00,
            m01,
            m02: 0.0,
            m10,
            m11,
            m12: 0.0,
            m20,
            m21,
            m22: 1.0,
        }
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    /// Row-vector product: `(a * b).transform_point(p)` equals
    /// `b.transform_point(a.transform_point(p))`.
    fn mul(self, rhs: Matrix) -> Matrix {
        let a = &self;
        let b = &rhs;
        Matrix {
            m00: a.m00 * b.m00 + a.m01 * b.m10 + a.m02 * b.m20,
            m01: a.m00 * b.m01 + a.m01 * b.m11 + a.m02 * b.m21,
            m02: a.m00 * b.m02 + a.m01 * b.m12 + a.m02 * b.m22,
            m10: a.m10 * b.m00 + a.m11 * b.m10 + a.m12 * b.m20,
            m11: a.m10 * b.m01 + a.m11 * b.m11 + a.m12 * b.m21,
            m12: a.m10 * b.m02 + a.m11 * b.m12 + a.m12 * b.m22,
            m20: a.m20 * b.m00 + a.m21 * b.m10 + a.m22 * b.m20,
            m21: a.m20 * b.m01 + a.m21 * b.m11 + a.m22 * b.m21,
            m22: a.m20 * b.m02 + a.m21 * b.m12 + a.m22 * b.m22,
        }
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;
    fn mul(self, k: f64) -> Matrix {
        Matrix {
            m00: self.m00 * k,
            m01: self.m01 * k,
            m02: self.m02 * k,
            m10: self.m10 * k,
            m11: self.m11 * k,
            m12: self.m12 * k,
            m20: self.m20 * k,
            m21: self.m21 * k,
            m22: self.m22 * k,
        }
    }
}

impl Add for Matrix {
    type Output = Matrix;
    fn add(self, rhs: Matrix) -> Matrix {
        Matrix {
            m00: self.m00 + rhs.m00,
            m01: self.m01 + rhs.m01,
            m02: self.m02 + rhs.m02,
            m10: self.m10 + rhs.m10,
            m11: self.m11 + rhs.m11,
            m12: self.m12 + rhs.m12,
            m20: self.m20 + rhs.m20,
            m21: self.m21 + rhs.m21,
            m22: self.m22 + rhs.m22,
        }
    }
}

impl AddAssign for Matrix {
    fn add_assign(&mut self, rhs: Matrix) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) {
        assert!((a - b).mag() < 1e-9, "left={a:?} right={b:?}");
    }

    #[test]
    fn product_applies_left_first() {
        let m = Matrix::translate(Vec2::new(10.0, 0.0)) * Matrix::rotate(Angle::deg(90.0));
        close(m.transform_point(Vec2::new(5.0, 0.0)), Vec2::new(0.0, 15.0));
    }

    #[test]
    fn affine_inverse_round_trips() {
        let m = Matrix::scale(2.0, 3.0) * Matrix::rotate(Angle::deg(30.0))
            * Matrix::translate(Vec2::new(-1.0, 4.0));
        let p = Vec2::new(0.7, -2.3);
        close(m.inverted().transform_point(m.transform_point(p)), p);
    }
}
