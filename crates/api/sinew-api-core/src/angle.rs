//! Angle: stored in radians, positive counter-clockwise.
//!
//! Differences do not wrap: interpolating from 359 degrees to 1 degree is a
//! 358 degree sweep unless the document migration in the graph layer has
//! normalized the waypoints. Shortest-arc logic exists only in `wrapped_dist`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub fn rad(radians: f64) -> Self {
        Angle(radians)
    }

    pub fn deg(degrees: f64) -> Self {
        Angle(degrees * PI / 180.0)
    }

    pub fn zero() -> Self {
        Angle(0.0)
    }

    pub fn as_rad(self) -> f64 {
        self.0
    }

    pub fn as_deg(self) -> f64 {
        self.0 * 180.0 / PI
    }

    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    /// Plain (non-wrapping) difference, `self - rhs`.
    pub fn dist(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }

    /// Shortest-arc difference in (-PI, PI]. Only the version-0.1 angle
    /// migration uses this.
    pub fn wrapped_dist(self, rhs: Angle) -> Angle {
        let mut d = self.0 - rhs.0;
        while d > PI {
            d -= 2.0 * PI;
        }
        while d <= -PI {
            d += 2.0 * PI;
        }
        Angle(d)
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;
    fn mul(self, rhs: f64) -> Angle {
        Angle(self.0 * rhs)
    }
}
