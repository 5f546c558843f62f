//! Decomposed affine transformation: offset, rotation, skew, anisotropic scale.

use crate::angle::Angle;
use crate::matrix::Matrix;
use crate::vector::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub offset: Vec2,
    pub angle: Angle,
    pub skew_angle: Angle,
    pub scale: Vec2,
}

impl Default for Transformation {
    fn default() -> Self {
        Transformation {
            offset: Vec2::zero(),
            angle: Angle::zero(),
            skew_angle: Angle::zero(),
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transformation {
    pub fn identity() -> Self {
        Transformation::default()
    }

    fn axis_x(&self) -> Vec2 {
        Vec2::polar(self.scale.x, self.angle)
    }

    fn axis_y(&self) -> Vec2 {
        Vec2::polar(self.scale.y, self.angle + self.skew_angle + Angle::deg(90.0))
    }

    pub fn to_matrix(&self) -> Matrix {
        Matrix::from_axes(self.axis_x(), self.axis_y(), self.offset)
    }

    pub fn from_matrix(matrix: &Matrix) -> Self {
        let axis_x = matrix.axis_x();
        let axis_y = matrix.axis_y();
        Transformation {
            offset: matrix.offset(),
            angle: axis_x.angle(),
            skew_angle: axis_y.angle() - axis_x.angle() - Angle::deg(90.0),
            scale: Vec2::new(axis_x.mag(), axis_y.mag()),
        }
    }

    /// Apply to a point (`with_offset`) or a free direction (tangents).
    pub fn transform_vector(&self, v: Vec2, with_offset: bool) -> Vec2 {
        let out = self.axis_x() * v.x + self.axis_y() * v.y;
        if with_offset {
            out + self.offset
        } else {
            out
        }
    }

    /// Transform a matrix-valued quantity: this transformation feeds the
    /// matrix's input side, `transformed(v) = m(self(v))`.
    pub fn transform_matrix(&self, m: &Matrix) -> Matrix {
        self.to_matrix() * *m
    }

    /// Transform another transformation; same input-side composition as
    /// `transform_matrix`.
    pub fn transform_transformation(&self, other: &Transformation) -> Transformation {
        Transformation::from_matrix(&(self.to_matrix() * other.to_matrix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_round_trip() {
        let t = Transformation {
            offset: Vec2::new(3.0, -1.0),
            angle: Angle::deg(40.0),
            skew_angle: Angle::deg(10.0),
            scale: Vec2::new(2.0, 0.5),
        };
        let back = Transformation::from_matrix(&t.to_matrix());
        assert!((t.offset - back.offset).mag() < 1e-9);
        assert!((t.angle.as_rad() - back.angle.as_rad()).abs() < 1e-9);
        assert!((t.skew_angle.as_rad() - back.skew_angle.as_rad()).abs() < 1e-9);
        assert!((t.scale - back.scale).mag() < 1e-9);
    }
}
