//! Value algebra: the add/multiply/average reducers shared by the list
//! aggregation nodes, and transformation application across value kinds.
//!
//! `average` only accepts types from a fixed allow-list; anything else
//! resolves to the caller-supplied default rather than a partial result.

use crate::geometry::Segment;
use crate::matrix::Matrix;
use crate::transformation::Transformation;
use crate::value::{Value, ValueType};
use crate::vector::Vec2;

/// Types over which averaging is defined.
pub const AVERAGE_TYPES: [ValueType; 7] = [
    ValueType::Real,
    ValueType::BLinePoint,
    ValueType::Matrix,
    ValueType::Segment,
    ValueType::Transformation,
    ValueType::Vector,
    ValueType::WidthPoint,
];

pub fn is_averageable(ty: &ValueType) -> bool {
    AVERAGE_TYPES.contains(ty)
}

/// The representative position of a value, used by editors to place handles.
pub fn to_vector(value: &Value) -> Vec2 {
    match value {
        Value::Vector(v) => *v,
        Value::BLinePoint(bp) => bp.vertex,
        Value::Matrix(m) => m.transform_point(Vec2::zero()),
        Value::Transformation(t) => t.transform_vector(Vec2::zero(), true),
        _ => Vec2::zero(),
    }
}

/// Component-wise sum; mismatched or unsupported types yield `default`.
pub fn add(a: &Value, b: &Value, default: &Value) -> Value {
    if a.value_type() != b.value_type() {
        return default.clone();
    }
    match (a, b) {
        (Value::Real(x), Value::Real(y)) => Value::Real(x + y),
        (Value::Vector(x), Value::Vector(y)) => Value::Vector(*x + *y),
        (Value::Matrix(x), Value::Matrix(y)) => Value::Matrix(*x + *y),
        (Value::Segment(x), Value::Segment(y)) => Value::Segment(Segment::new(
            x.p1 + y.p1,
            x.t1 + y.t1,
            x.p2 + y.p2,
            x.t2 + y.t2,
        )),
        (Value::Transformation(x), Value::Transformation(y)) => Value::Transformation(
            Transformation::from_matrix(&(x.to_matrix() + y.to_matrix())),
        ),
        (Value::BLinePoint(x), Value::BLinePoint(y)) => {
            let mut out = *x;
            out.vertex = x.vertex + y.vertex;
            out.tangent1 = x.tangent1 + y.tangent1;
            out.tangent2 = x.tangent2 + y.tangent2;
            Value::BLinePoint(out)
        }
        (Value::WidthPoint(x), Value::WidthPoint(y)) => {
            let mut out = *x;
            out.width = x.width + y.width;
            Value::WidthPoint(out)
        }
        _ => default.clone(),
    }
}

/// Scale by a scalar amplifier; unsupported types pass through unchanged.
pub fn multiply(value: &Value, amplifier: f64) -> Value {
    match value {
        Value::Real(x) => Value::Real(x * amplifier),
        Value::Vector(x) => Value::Vector(*x * amplifier),
        Value::Matrix(x) => Value::Matrix(*x * amplifier),
        Value::Segment(x) => Value::Segment(Segment::new(
            x.p1 * amplifier,
            x.t1 * amplifier,
            x.p2 * amplifier,
            x.t2 * amplifier,
        )),
        Value::Transformation(x) => {
            Value::Transformation(Transformation::from_matrix(&(x.to_matrix() * amplifier)))
        }
        Value::BLinePoint(x) => {
            let mut out = *x;
            out.vertex = x.vertex * amplifier;
            out.tangent1 = x.tangent1 * amplifier;
            out.tangent2 = x.tangent2 * amplifier;
            Value::BLinePoint(out)
        }
        Value::WidthPoint(x) => {
            let mut out = *x;
            out.width = x.width * amplifier;
            Value::WidthPoint(out)
        }
        other => other.clone(),
    }
}

/// Arithmetic mean, optionally weighted. The weights are used only when
/// there is one per value and they do not sum to zero; otherwise the plain
/// mean is taken. Empty input or mixed/unsupported types yield `default`.
pub fn average(values: &[Value], weights: Option<&[f64]>, default: &Value) -> Value {
    if values.is_empty() {
        return default.clone();
    }
    let ty = values[0].value_type();
    if !is_averageable(&ty) {
        return default.clone();
    }
    if values.iter().any(|v| v.value_type() != ty) {
        return default.clone();
    }

    let weights = weights.filter(|w| w.len() >= values.len());
    let summary_weight = match weights {
        Some(w) => {
            let total: f64 = w.iter().take(values.len()).sum();
            if total == 0.0 {
                None
            } else {
                Some(total)
            }
        }
        None => None,
    };

    let mut sum: Option<Value> = None;
    match (weights, summary_weight) {
        (Some(w), Some(total)) => {
            let amplifier = 1.0 / total;
            for (value, weight) in values.iter().zip(w.iter()) {
                let term = multiply(value, weight * amplifier);
                sum = Some(match sum {
                    None => term,
                    Some(acc) => add(&acc, &term, default),
                });
            }
        }
        _ => {
            let amplifier = 1.0 / values.len() as f64;
            for value in values {
                let term = multiply(value, amplifier);
                sum = Some(match sum {
                    None => term,
                    Some(acc) => add(&acc, &term, default),
                });
            }
        }
    }
    sum.unwrap_or_else(|| default.clone())
}

/// Shift every element by the same delta so the (weighted) average lands on
/// `target`. The inverse of `average`, supporting "drag the average handle"
/// editing. No-op when the current average cannot be computed or the target
/// type differs.
pub fn set_average_value(values: &mut [Value], weights: Option<&[f64]>, target: &Value) {
    let current = average(values, weights, &Value::Nil);
    if current == Value::Nil || current.value_type() != target.value_type() {
        return;
    }
    let delta = add(target, &multiply(&current, -1.0), &Value::Nil);
    if delta == Value::Nil {
        return;
    }
    for value in values.iter_mut() {
        let shifted = add(value, &delta, &Value::Nil);
        if shifted != Value::Nil {
            *value = shifted;
        }
    }
}

/// Apply a transformation to a value, kind by kind. Tangents and other free
/// directions transform without the offset; untransformable kinds pass
/// through unchanged.
pub fn transform(transformation: &Transformation, value: &Value) -> Value {
    match value {
        Value::Angle(a) => Value::Angle(*a + transformation.angle),
        Value::Vector(v) => Value::Vector(transformation.transform_vector(*v, true)),
        Value::Matrix(m) => Value::Matrix(transformation.transform_matrix(m)),
        Value::Transformation(t) => {
            Value::Transformation(transformation.transform_transformation(t))
        }
        Value::Segment(s) => Value::Segment(Segment::new(
            transformation.transform_vector(s.p1, true),
            transformation.transform_vector(s.t1, false),
            transformation.transform_vector(s.p2, true),
            transformation.transform_vector(s.t2, false),
        )),
        Value::BLinePoint(bp) => {
            let mut out = *bp;
            out.vertex = transformation.transform_vector(bp.vertex, true);
            out.tangent1 = transformation.transform_vector(bp.tangent1, false);
            out.tangent2 = transformation.transform_vector(bp.tangent2, false);
            Value::BLinePoint(out)
        }
        Value::WidthPoint(wp) => {
            let mut out = *wp;
            out.width = wp.width * transformation.scale.y;
            Value::WidthPoint(out)
        }
        other => other.clone(),
    }
}

/// Multiply a matrix by a scalar weight; helper for weighted blends.
pub fn weighted_matrix(m: &Matrix, weight: f64) -> Matrix {
    *m * weight
}
