//! Geometry records carried through the graph: cubic segments, spline
//! vertices, outline width points and dash items.

use crate::vector::Vec2;
use serde::{Deserialize, Serialize};

/// One cubic Hermite span: endpoints plus outgoing/incoming tangents.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1: Vec2,
    pub t1: Vec2,
    pub p2: Vec2,
    pub t2: Vec2,
}

impl Segment {
    pub fn new(p1: Vec2, t1: Vec2, p2: Vec2, t2: Vec2) -> Self {
        Segment { p1, t1, p2, t2 }
    }
}

/// A spline ("bline") vertex: position, width, list origin and tangents.
/// When `split_tangent` is false the outgoing tangent mirrors the incoming.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BLinePoint {
    pub vertex: Vec2,
    pub width: f64,
    /// Normalized placement inside the owning list; spatial order matters.
    pub origin: f64,
    pub split_tangent: bool,
    pub tangent1: Vec2,
    pub tangent2: Vec2,
}

impl Default for BLinePoint {
    fn default() -> Self {
        BLinePoint {
            vertex: Vec2::zero(),
            width: 1.0,
            origin: 0.5,
            split_tangent: false,
            tangent1: Vec2::zero(),
            tangent2: Vec2::zero(),
        }
    }
}

impl BLinePoint {
    pub fn tangent2(&self) -> Vec2 {
        if self.split_tangent {
            self.tangent2
        } else {
            self.tangent1
        }
    }

    pub fn set_tangent_both(&mut self, t: Vec2) {
        self.tangent1 = t;
        self.tangent2 = t;
    }
}

/// How an outline interpolates into a width point from each side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideType {
    #[default]
    Interpolate,
    Rounded,
    Squared,
    Peak,
    Flat,
}

/// A point on an advanced outline's width curve.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WidthPoint {
    /// Position along the outline, in `[lower_bound, upper_bound]`.
    pub position: f64,
    pub width: f64,
    pub side_before: SideType,
    pub side_after: SideType,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Default for WidthPoint {
    fn default() -> Self {
        WidthPoint {
            position: 0.0,
            width: 0.01,
            side_before: SideType::Interpolate,
            side_after: SideType::Interpolate,
            lower_bound: 0.0,
            upper_bound: 1.0,
        }
    }
}

impl WidthPoint {
    /// Position mapped into [0, 1]; `looped` wraps out-of-range positions
    /// around instead of clamping them.
    pub fn norm_position(&self, looped: bool) -> f64 {
        let span = self.upper_bound - self.lower_bound;
        if span.abs() < 1e-12 {
            return 0.0;
        }
        let p = (self.position - self.lower_bound) / span;
        if looped {
            p.rem_euclid(1.0)
        } else {
            p.clamp(0.0, 1.0)
        }
    }
}

/// One dash of an outline's dash pattern.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashItem {
    pub offset: f64,
    pub length: f64,
    pub side_before: SideType,
    pub side_after: SideType,
}

impl Default for DashItem {
    fn default() -> Self {
        DashItem {
            offset: 0.1,
            length: 0.1,
            side_before: SideType::Rounded,
            side_after: SideType::Rounded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_point_normalizes_and_wraps() {
        let wp = WidthPoint {
            position: 1.25,
            lower_bound: 0.0,
            upper_bound: 1.0,
            ..WidthPoint::default()
        };
        assert!((wp.norm_position(false) - 1.0).abs() < 1e-12);
        assert!((wp.norm_position(true) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn merged_tangents_mirror() {
        let mut bp = BLinePoint::default();
        bp.set_tangent_both(Vec2::new(1.0, 2.0));
        assert_eq!(bp.tangent2(), Vec2::new(1.0, 2.0));
        bp.split_tangent = true;
        bp.tangent2 = Vec2::new(-1.0, 0.0);
        assert_eq!(bp.tangent2(), Vec2::new(-1.0, 0.0));
    }
}
