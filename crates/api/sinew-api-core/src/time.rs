//! Time: a point on the animation timeline, in seconds.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Two times closer than this are treated as the same instant. Waypoint and
/// activepoint lookups depend on this tolerance, not on exact float equality.
pub const TIME_EPSILON: f64 = 5e-4;

#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(pub f64);

impl Time {
    pub fn new(seconds: f64) -> Self {
        Time(seconds)
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// The far past; used as a sentinel for "before every keyframe".
    pub fn begin() -> Self {
        Time(-32767.0 * 512.0)
    }

    /// The far future; used as a sentinel for "after every keyframe".
    pub fn end() -> Self {
        Time(32767.0 * 512.0)
    }

    pub fn is_equal(self, rhs: Time) -> bool {
        (self.0 - rhs.0).abs() < TIME_EPSILON
    }

    pub fn is_less_than(self, rhs: Time) -> bool {
        self.0 < rhs.0 - TIME_EPSILON
    }

    pub fn is_more_than(self, rhs: Time) -> bool {
        self.0 > rhs.0 + TIME_EPSILON
    }
}

impl Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}

impl Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time(self.0 - rhs.0)
    }
}

impl Neg for Time {
    type Output = Time;
    fn neg(self) -> Time {
        Time(-self.0)
    }
}

impl Mul<f64> for Time {
    type Output = Time;
    fn mul(self, rhs: f64) -> Time {
        Time(self.0 * rhs)
    }
}

impl Div<Time> for Time {
    type Output = f64;
    fn div(self, rhs: Time) -> f64 {
        self.0 / rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_equality() {
        assert!(Time(1.0).is_equal(Time(1.0 + TIME_EPSILON / 2.0)));
        assert!(!Time(1.0).is_equal(Time(1.0 + TIME_EPSILON * 2.0)));
        assert!(Time(1.0).is_less_than(Time(2.0)));
        assert!(!Time(1.0).is_less_than(Time(1.0)));
    }
}
