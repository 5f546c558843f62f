//! Bone: a rigid 2D transform unit with a tapered capsule of influence.
//!
//! A `Bone` is plain data produced by evaluating a bone node at some time;
//! the composed world matrix is stamped into `animated_matrix` by the
//! producer. The parent relation is an opaque index into the owning graph so
//! this crate never holds node references.

use crate::angle::Angle;
use crate::matrix::Matrix;
use crate::vector::Vec2;
use serde::{Deserialize, Serialize};

/// Stable index of a bone-producing node in the owning graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub u64);

/// Guard against division by zero in the capsule geometry.
const SHAPE_EPSILON: f64 = 1e-9;

/// A bone length of exactly zero is not representable.
const MIN_LENGTH: f64 = 1e-5;

/// The bone's region of influence: two end discs joined by a tapered band.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub p0: Vec2,
    pub r0: f64,
    pub p1: Vec2,
    pub r1: f64,
}

impl Shape {
    pub fn new(p0: Vec2, r0: f64, p1: Vec2, r1: f64) -> Self {
        Shape { p0, r0, p1, r1 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Origin relative to the parent's frame.
    pub origin: Vec2,
    /// Rotation relative to the parent's frame.
    pub angle: Angle,
    /// Local x scale; applies to this bone's own length only.
    pub scalelx: f64,
    /// Recursive x scale; applies to this bone and every descendant.
    pub scalex: f64,
    length: f64,
    /// Influence radius at the origin.
    pub width: f64,
    /// Influence radius at the tip.
    pub tipwidth: f64,
    /// Z-order hint for deformation layering.
    pub depth: f64,
    /// `None` only for the root sentinel.
    pub parent: Option<BoneId>,
    /// World transform at the evaluation time, stamped by the producer.
    pub animated_matrix: Matrix,
}

impl Default for Bone {
    fn default() -> Self {
        Bone {
            name: String::new(),
            origin: Vec2::zero(),
            angle: Angle::zero(),
            scalelx: 1.0,
            scalex: 1.0,
            length: 1.0,
            width: 0.1,
            tipwidth: 0.1,
            depth: 0.0,
            parent: None,
            animated_matrix: Matrix::identity(),
        }
    }
}

impl Bone {
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn set_length(&mut self, length: f64) {
        self.length = if length < MIN_LENGTH { MIN_LENGTH } else { length };
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Scale applied to values attached to this bone but not to children.
    pub fn local_scale(&self) -> Vec2 {
        Vec2::new(self.scalelx, 1.0)
    }

    /// Tip position in the parent's frame:
    /// `origin + Rotate(angle)(Scale(scalex * scalelx, 1)(length, 0))`.
    pub fn tip(&self) -> Vec2 {
        let m = Matrix::scale(self.scalex * self.scalelx, 1.0) * Matrix::rotate(self.angle);
        self.origin + m.transform_point(Vec2::new(self.length, 0.0))
    }

    /// Capsule shape in world coordinates, derived from the stamped matrix.
    pub fn shape(&self) -> Shape {
        let origin = self.animated_matrix.transform_point(Vec2::zero());
        let mut direction = self
            .animated_matrix
            .transform_vector(Vec2::new(1.0, 0.0))
            .norm();
        let mut length = self.length * self.scalelx;
        if length < 0.0 {
            length = -length;
            direction = -direction;
        }
        Shape::new(
            origin,
            self.width,
            origin + direction * length,
            self.tipwidth,
        )
    }

    /// Normalized distance score: 0 outside the capsule, rising to 1 on the
    /// centerline. The tapered band projects the query point onto the line
    /// joining the external tangent contact points; outside that band each
    /// end disc falls off as `1 - d/r`.
    pub fn distance_to_shape_center_percent(shape: &Shape, x: Vec2) -> f64 {
        let r0 = shape.r0.abs();
        let r1 = shape.r1.abs();

        let disc0 = if r0 > SHAPE_EPSILON {
            1.0 - (x - shape.p0).mag() / r0
        } else {
            0.0
        };
        let disc1 = if r1 > SHAPE_EPSILON {
            1.0 - (x - shape.p1).mag() / r1
        } else {
            0.0
        };
        let mut best = disc0.max(disc1);

        let axis = shape.p1 - shape.p0;
        let len = axis.mag();
        // The band degenerates when one disc swallows the other or the
        // segment has no length; the discs alone cover those cases.
        if len > SHAPE_EPSILON && (r0 - r1).abs() < len {
            let dir = axis / len;
            let sn = (r0 - r1) / len;
            let cs = (1.0 - sn * sn).sqrt();
            // Feet of the tangent contact points on the centerline.
            let c0 = shape.p0 + dir * (sn * r0);
            let c1 = shape.p1 + dir * (sn * r1);
            let span = c1 - c0;
            let span_len2 = span.mag_squared();
            if span_len2 > SHAPE_EPSILON {
                let t = (x - c0).dot(span) / span_len2;
                if (0.0..=1.0).contains(&t) {
                    let allowed = (r0 + (r1 - r0) * t) * cs;
                    if allowed > SHAPE_EPSILON {
                        let center = c0 + span * t;
                        best = best.max(1.0 - (x - center).mag() / allowed);
                    }
                }
            }
        }

        best.clamp(0.0, 1.0)
    }

    /// Ease curve mapping the linear distance score to a smooth weight.
    pub fn influence_function(distance_percent: f64) -> f64 {
        (distance_percent * std::f64::consts::FRAC_PI_2).sin()
    }

    pub fn influence_percent(shape: &Shape, x: Vec2) -> f64 {
        Self::influence_function(Self::distance_to_shape_center_percent(shape, x))
    }

    pub fn have_influence_on(&self, x: Vec2) -> bool {
        Self::distance_to_shape_center_percent(&self.shape(), x) > 0.0
    }
}

/// A bone paired with its blending weight, the element type of skeleton
/// weight lists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneWeightPair {
    pub bone: Bone,
    pub weight: f64,
}

impl BoneWeightPair {
    pub fn new(bone: Bone, weight: f64) -> Self {
        BoneWeightPair { bone, weight }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_is_clamped() {
        let mut bone = Bone::default();
        bone.set_length(0.0);
        assert!(bone.length() > 0.0);
    }

    #[test]
    fn far_point_scores_zero() {
        let shape = Shape::new(Vec2::zero(), 1.0, Vec2::new(10.0, 0.0), 1.0);
        assert_eq!(
            Bone::distance_to_shape_center_percent(&shape, Vec2::new(0.0, 1e9)),
            0.0
        );
    }

    #[test]
    fn centerline_midpoint_scores_maximum() {
        let shape = Shape::new(Vec2::zero(), 1.0, Vec2::new(10.0, 0.0), 1.0);
        let mid = Bone::distance_to_shape_center_percent(&shape, Vec2::new(5.0, 0.0));
        assert!((mid - 1.0).abs() < 1e-12);
        let off = Bone::distance_to_shape_center_percent(&shape, Vec2::new(5.0, 0.5));
        assert!(off < mid && off > 0.0);
    }

    #[test]
    fn degenerate_shapes_do_not_divide_by_zero() {
        // zero-length segment: pure discs
        let shape = Shape::new(Vec2::zero(), 2.0, Vec2::zero(), 1.0);
        let p = Bone::distance_to_shape_center_percent(&shape, Vec2::new(1.0, 0.0));
        assert!((p - 0.5).abs() < 1e-12);
        // one disc containing the other
        let shape = Shape::new(Vec2::zero(), 5.0, Vec2::new(1.0, 0.0), 0.5);
        let p = Bone::distance_to_shape_center_percent(&shape, Vec2::zero());
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn influence_is_eased() {
        assert_eq!(Bone::influence_function(0.0), 0.0);
        assert!((Bone::influence_function(1.0) - 1.0).abs() < 1e-12);
        assert!((Bone::influence_function(0.5) - (std::f64::consts::FRAC_PI_4).sin()).abs() < 1e-12);
    }

    #[test]
    fn tip_follows_angle_and_scale() {
        let mut bone = Bone::default();
        bone.set_length(2.0);
        bone.angle = Angle::deg(90.0);
        bone.scalex = 1.5;
        let tip = bone.tip();
        assert!((tip.x - 0.0).abs() < 1e-9);
        assert!((tip.y - 3.0).abs() < 1e-9);
    }
}
