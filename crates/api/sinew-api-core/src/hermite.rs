//! Cubic Hermite curve over an arbitrary time span.
//!
//! The curve is defined by endpoint values `p1`/`p2` and tangents `t1`/`t2`
//! expressed per unit of the whole span `[r, s]`. The same primitive drives
//! waypoint interpolation (over `Value`) and segment tangent queries (over
//! `Vec2`).

use crate::angle::Angle;
use crate::color::Color;
use crate::time::Time;
use crate::value::Value;
use crate::vector::Vec2;

/// The algebra a type needs to ride a Hermite curve.
pub trait CurvePoint: Clone {
    fn add(&self, rhs: &Self) -> Self;
    fn sub(&self, rhs: &Self) -> Self;
    fn scale(&self, k: f64) -> Self;
}

impl CurvePoint for f64 {
    fn add(&self, rhs: &Self) -> Self {
        self + rhs
    }
    fn sub(&self, rhs: &Self) -> Self {
        self - rhs
    }
    fn scale(&self, k: f64) -> Self {
        self * k
    }
}

impl CurvePoint for Vec2 {
    fn add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
    fn sub(&self, rhs: &Self) -> Self {
        *self - *rhs
    }
    fn scale(&self, k: f64) -> Self {
        *self * k
    }
}

impl CurvePoint for Angle {
    fn add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
    fn sub(&self, rhs: &Self) -> Self {
        self.dist(*rhs)
    }
    fn scale(&self, k: f64) -> Self {
        *self * k
    }
}

impl CurvePoint for Color {
    fn add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
    fn sub(&self, rhs: &Self) -> Self {
        *self - *rhs
    }
    fn scale(&self, k: f64) -> Self {
        *self * k
    }
}

impl CurvePoint for Time {
    fn add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
    fn sub(&self, rhs: &Self) -> Self {
        *self - *rhs
    }
    fn scale(&self, k: f64) -> Self {
        *self * k
    }
}

/// Component-wise algebra over the continuous value kinds. Mismatched kinds
/// keep the left operand (fail-soft); the graph layer never mixes kinds on
/// one curve.
impl CurvePoint for Value {
    fn add(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Value::Real(a), Value::Real(b)) => Value::Real(a + b),
            (Value::Integer(a), Value::Integer(b)) => Value::Integer(a + b),
            (Value::Time(a), Value::Time(b)) => Value::Time(*a + *b),
            (Value::Angle(a), Value::Angle(b)) => Value::Angle(*a + *b),
            (Value::Vector(a), Value::Vector(b)) => Value::Vector(*a + *b),
            (Value::Color(a), Value::Color(b)) => Value::Color(*a + *b),
            (Value::Gradient(a), Value::Gradient(b)) => Value::Gradient(a.add(b)),
            _ => self.clone(),
        }
    }

    fn sub(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Value::Real(a), Value::Real(b)) => Value::Real(a - b),
            (Value::Integer(a), Value::Integer(b)) => Value::Integer(a - b),
            (Value::Time(a), Value::Time(b)) => Value::Time(*a - *b),
            (Value::Angle(a), Value::Angle(b)) => Value::Angle(a.dist(*b)),
            (Value::Vector(a), Value::Vector(b)) => Value::Vector(*a - *b),
            (Value::Color(a), Value::Color(b)) => Value::Color(*a - *b),
            (Value::Gradient(a), Value::Gradient(b)) => Value::Gradient(a.sub(b)),
            _ => self.clone(),
        }
    }

    fn scale(&self, k: f64) -> Self {
        match self {
            Value::Real(a) => Value::Real(a * k),
            Value::Integer(a) => Value::Integer(((*a as f64) * k) as i64),
            Value::Time(a) => Value::Time(*a * k),
            Value::Angle(a) => Value::Angle(*a * k),
            Value::Vector(a) => Value::Vector(*a * k),
            Value::Color(a) => Value::Color(*a * k),
            Value::Gradient(a) => Value::Gradient(a.scale(k)),
            other => other.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Hermite<T: CurvePoint> {
    pub p1: T,
    pub p2: T,
    pub t1: T,
    pub t2: T,
    r: f64,
    s: f64,
}

impl<T: CurvePoint> Hermite<T> {
    pub fn new(p1: T, p2: T, t1: T, t2: T) -> Self {
        Hermite {
            p1,
            p2,
            t1,
            t2,
            r: 0.0,
            s: 1.0,
        }
    }

    /// Set the absolute time span the curve covers.
    pub fn set_rs(&mut self, r: f64, s: f64) {
        self.r = r;
        self.s = s;
    }

    pub fn span(&self) -> f64 {
        self.s - self.r
    }

    fn param(&self, x: f64) -> f64 {
        let span = self.span();
        if span.abs() < 1e-12 {
            0.0
        } else {
            ((x - self.r) / span).clamp(0.0, 1.0)
        }
    }

    /// Evaluate at absolute position `x` in `[r, s]`.
    pub fn eval(&self, x: f64) -> T {
        let u = self.param(x);
        let u2 = u * u;
        let u3 = u2 * u;
        // Hermite basis
        let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        let h11 = u3 - u2;
        self.p1
            .scale(h00)
            .add(&self.t1.scale(h10))
            .add(&self.p2.scale(h01))
            .add(&self.t2.scale(h11))
    }

    /// Derivative with respect to the normalized parameter.
    pub fn derivative(&self, x: f64) -> T {
        let u = self.param(x);
        let u2 = u * u;
        let d00 = 6.0 * u2 - 6.0 * u;
        let d10 = 3.0 * u2 - 4.0 * u + 1.0;
        let d01 = -6.0 * u2 + 6.0 * u;
        let d11 = 3.0 * u2 - 2.0 * u;
        self.p1
            .scale(d00)
            .add(&self.t1.scale(d10))
            .add(&self.p2.scale(d01))
            .add(&self.t2.scale(d11))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chord_tangents_give_linear_motion() {
        let mut h = Hermite::new(0.0, 10.0, 10.0, 10.0);
        h.set_rs(0.0, 1.0);
        assert!((h.eval(0.5) - 5.0).abs() < 1e-12);
        assert!((h.eval(0.25) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn endpoints_are_exact() {
        let mut h = Hermite::new(1.0, 4.0, 0.0, 0.0);
        h.set_rs(2.0, 6.0);
        assert_eq!(h.eval(2.0), 1.0);
        assert_eq!(h.eval(6.0), 4.0);
    }

    #[test]
    fn derivative_of_chord_is_constant() {
        let mut h = Hermite::new(Vec2::zero(), Vec2::new(2.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(2.0, 0.0));
        h.set_rs(0.0, 1.0);
        let d = h.derivative(0.3);
        assert!((d.x - 2.0).abs() < 1e-12 && d.y.abs() < 1e-12);
    }
}
