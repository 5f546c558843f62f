//! Value: the tagged union carried between graph nodes.
//!
//! The active tag is the value's type; accessors return `None` on a
//! mismatched tag and callers surface that as a type error rather than
//! coercing. Lists are ordered and declare a contained type so consumers can
//! verify homogeneity without inspecting every element.

use crate::angle::Angle;
use crate::bone::{Bone, BoneId, BoneWeightPair};
use crate::color::Color;
use crate::geometry::{BLinePoint, DashItem, Segment, WidthPoint};
use crate::gradient::Gradient;
use crate::matrix::Matrix;
use crate::time::Time;
use crate::transformation::Transformation;
use crate::vector::Vec2;
use serde::{Deserialize, Serialize};

/// The closed set of value types. `Weighted` carries the contained type so
/// a "weighted real" and a "weighted vector" stay distinguishable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Nil,
    Bool,
    Integer,
    Real,
    Time,
    Angle,
    Vector,
    Color,
    Segment,
    Gradient,
    BLinePoint,
    WidthPoint,
    DashItem,
    Matrix,
    Transformation,
    Bone,
    BoneRef,
    BoneWeightPair,
    Weighted(Box<ValueType>),
    String,
    Canvas,
    List,
}

impl ValueType {
    /// Stable internal name, used by registries and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Nil => "nil",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Real => "real",
            ValueType::Time => "time",
            ValueType::Angle => "angle",
            ValueType::Vector => "vector",
            ValueType::Color => "color",
            ValueType::Segment => "segment",
            ValueType::Gradient => "gradient",
            ValueType::BLinePoint => "bline_point",
            ValueType::WidthPoint => "width_point",
            ValueType::DashItem => "dash_item",
            ValueType::Matrix => "matrix",
            ValueType::Transformation => "transformation",
            ValueType::Bone => "bone_object",
            ValueType::BoneRef => "bone_valuenode",
            ValueType::BoneWeightPair => "bone_weight_pair",
            ValueType::Weighted(_) => "weighted_value",
            ValueType::String => "string",
            ValueType::Canvas => "canvas",
            ValueType::List => "list",
        }
    }
}

/// An ordered, homogeneous sequence of values. Item order is meaningful:
/// it is spatial or temporal order (spline vertex order, dash order).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueList {
    pub contained: ValueType,
    pub items: Vec<Value>,
    /// Whether the sequence closes back on itself (spline loops).
    #[serde(default)]
    pub looped: bool,
}

impl ValueList {
    pub fn new(contained: ValueType, items: Vec<Value>) -> Self {
        ValueList {
            contained,
            items,
            looped: false,
        }
    }

    pub fn looped(contained: ValueType, items: Vec<Value>, looped: bool) -> Self {
        ValueList {
            contained,
            items,
            looped,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Time(Time),
    Angle(Angle),
    Vector(Vec2),
    Color(Color),
    Segment(Segment),
    Gradient(Gradient),
    BLinePoint(BLinePoint),
    WidthPoint(WidthPoint),
    DashItem(DashItem),
    Matrix(Matrix),
    Transformation(Transformation),
    Bone(Box<Bone>),
    /// Reference to a bone-producing node; the value form of "my parent is
    /// that bone".
    BoneRef(BoneId),
    BoneWeightPair(Box<BoneWeightPair>),
    /// A value tagged with a blending weight, for weighted-average lists.
    Weighted { weight: f64, value: Box<Value> },
    String(String),
    /// Reference to an external canvas, by its document id.
    Canvas(String),
    List(ValueList),
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Bool(_) => ValueType::Bool,
            Value::Integer(_) => ValueType::Integer,
            Value::Real(_) => ValueType::Real,
            Value::Time(_) => ValueType::Time,
            Value::Angle(_) => ValueType::Angle,
            Value::Vector(_) => ValueType::Vector,
            Value::Color(_) => ValueType::Color,
            Value::Segment(_) => ValueType::Segment,
            Value::Gradient(_) => ValueType::Gradient,
            Value::BLinePoint(_) => ValueType::BLinePoint,
            Value::WidthPoint(_) => ValueType::WidthPoint,
            Value::DashItem(_) => ValueType::DashItem,
            Value::Matrix(_) => ValueType::Matrix,
            Value::Transformation(_) => ValueType::Transformation,
            Value::Bone(_) => ValueType::Bone,
            Value::BoneRef(_) => ValueType::BoneRef,
            Value::BoneWeightPair(_) => ValueType::BoneWeightPair,
            Value::Weighted { value, .. } => ValueType::Weighted(Box::new(value.value_type())),
            Value::String(_) => ValueType::String,
            Value::Canvas(_) => ValueType::Canvas,
            Value::List(_) => ValueType::List,
        }
    }

    /// The neutral value of a type, produced when a subtree evaluation fails.
    pub fn default_for(ty: &ValueType) -> Value {
        match ty {
            ValueType::Nil => Value::Nil,
            ValueType::Bool => Value::Bool(false),
            ValueType::Integer => Value::Integer(0),
            ValueType::Real => Value::Real(0.0),
            ValueType::Time => Value::Time(Time::default()),
            ValueType::Angle => Value::Angle(Angle::zero()),
            ValueType::Vector => Value::Vector(Vec2::zero()),
            ValueType::Color => Value::Color(Color::default()),
            ValueType::Segment => Value::Segment(Segment::default()),
            ValueType::Gradient => Value::Gradient(Gradient::default()),
            ValueType::BLinePoint => Value::BLinePoint(BLinePoint::default()),
            ValueType::WidthPoint => Value::WidthPoint(WidthPoint::default()),
            ValueType::DashItem => Value::DashItem(DashItem::default()),
            ValueType::Matrix => Value::Matrix(Matrix::identity()),
            ValueType::Transformation => Value::Transformation(Transformation::identity()),
            ValueType::Bone => Value::Bone(Box::new(Bone::default())),
            ValueType::BoneRef => Value::Nil,
            ValueType::BoneWeightPair => {
                Value::BoneWeightPair(Box::new(BoneWeightPair::new(Bone::default(), 1.0)))
            }
            ValueType::Weighted(inner) => Value::Weighted {
                weight: 1.0,
                value: Box::new(Value::default_for(inner)),
            },
            ValueType::String => Value::String(String::new()),
            ValueType::Canvas => Value::Canvas(String::new()),
            ValueType::List => Value::List(ValueList::new(ValueType::Nil, Vec::new())),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<Time> {
        match self {
            Value::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_angle(&self) -> Option<Angle> {
        match self {
            Value::Angle(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec2> {
        match self {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_segment(&self) -> Option<Segment> {
        match self {
            Value::Segment(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_gradient(&self) -> Option<&Gradient> {
        match self {
            Value::Gradient(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bline_point(&self) -> Option<BLinePoint> {
        match self {
            Value::BLinePoint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_width_point(&self) -> Option<WidthPoint> {
        match self {
            Value::WidthPoint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_dash_item(&self) -> Option<DashItem> {
        match self {
            Value::DashItem(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<Matrix> {
        match self {
            Value::Matrix(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_transformation(&self) -> Option<Transformation> {
        match self {
            Value::Transformation(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bone(&self) -> Option<&Bone> {
        match self {
            Value::Bone(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bone_ref(&self) -> Option<BoneId> {
        match self {
            Value::BoneRef(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bone_weight_pair(&self) -> Option<&BoneWeightPair> {
        match self {
            Value::BoneWeightPair(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_weighted(&self) -> Option<(f64, &Value)> {
        match self {
            Value::Weighted { weight, value } => Some((*weight, value)),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ValueList> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn bone(bone: Bone) -> Value {
        Value::Bone(Box::new(bone))
    }

    pub fn bone_weight_pair(pair: BoneWeightPair) -> Value {
        Value::BoneWeightPair(Box::new(pair))
    }

    pub fn weighted(weight: f64, value: Value) -> Value {
        Value::Weighted {
            weight,
            value: Box::new(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_and_accessor_agree() {
        let v = Value::Real(2.5);
        assert_eq!(v.value_type(), ValueType::Real);
        assert_eq!(v.as_real(), Some(2.5));
        assert_eq!(v.as_integer(), None);
    }

    #[test]
    fn weighted_type_carries_contained_type() {
        let v = Value::weighted(2.0, Value::Vector(Vec2::new(1.0, 0.0)));
        assert_eq!(
            v.value_type(),
            ValueType::Weighted(Box::new(ValueType::Vector))
        );
    }

    #[test]
    fn defaults_match_their_types() {
        for ty in [
            ValueType::Real,
            ValueType::Vector,
            ValueType::Bone,
            ValueType::Transformation,
            ValueType::List,
        ] {
            assert_eq!(Value::default_for(&ty).value_type(), ty);
        }
    }

    #[test]
    fn serde_round_trip() {
        let v = Value::List(ValueList::looped(
            ValueType::Real,
            vec![Value::Real(1.0), Value::Real(2.0)],
            true,
        ));
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
