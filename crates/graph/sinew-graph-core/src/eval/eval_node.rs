//! Per-kind evaluation dispatch and the scalar operator family.

use sinew_api_core::geometry::SideType;
use sinew_api_core::{
    BLinePoint, Color, CurvePoint, DashItem, Hermite, Segment, Time, Transformation, Value,
    ValueError, ValueType, Vec2, WidthPoint,
};

use crate::canvas::Canvas;
use crate::error::GraphError;
use crate::types::{AddLinks, Node, NodeId, NodeKind, RangeLinks};

use super::{animated, bones, lists};

/// Evaluate `id` at `t`. `depth` guards against pathological cyclic wiring;
/// the graph is meant to be a DAG, but a cycle must not recurse unboundedly.
pub(crate) fn eval_node(
    canvas: &Canvas,
    id: NodeId,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    if depth > canvas.config().max_depth {
        return Err(GraphError::RecursionLimit);
    }
    let node = canvas.node(id)?;
    match &node.kind {
        NodeKind::Const(value) => Ok(value.clone()),
        NodeKind::Animated(data) => animated::eval(canvas, node, data, t, depth),
        NodeKind::Add(links) => eval_add(canvas, node, links, t, depth, false),
        NodeKind::Subtract(links) => eval_add(canvas, node, links, t, depth, true),
        NodeKind::Scale(links) => {
            let value = eval_typed(canvas, links.link, node.value_type(), t, depth)?;
            let scalar = eval_real(canvas, links.scalar, t, depth)?;
            Ok(value.scale(scalar))
        }
        NodeKind::Exp(links) => {
            let exp = eval_real(canvas, links.exp, t, depth)?;
            let scale = eval_real(canvas, links.scale, t, depth)?;
            Ok(Value::Real(scale * exp.exp()))
        }
        NodeKind::Range(links) => eval_range(canvas, node, links, t, depth),
        NodeKind::Composite(_) => eval_composite(canvas, node, t, depth),
        NodeKind::SegCalcTangent(links) => {
            let segment = eval_node(canvas, links.segment, t, depth + 1)?;
            let segment = expect(segment, &ValueType::Segment)?;
            let Value::Segment(segment) = segment else {
                unreachable!()
            };
            let amount = eval_real(canvas, links.amount, t, depth)?;
            let curve = Hermite::new(segment.p1, segment.p2, segment.t1, segment.t2);
            Ok(Value::Vector(curve.derivative(amount)))
        }
        NodeKind::Bone(_) | NodeKind::BoneRoot => bones::eval_bone(canvas, id, t, depth),
        NodeKind::BoneLink(links) => bones::eval_bone_link(canvas, node, links, t, depth),
        NodeKind::BoneInfluence(links) => bones::eval_bone_influence(canvas, links, t, depth),
        NodeKind::BoneWeightPair(links) => bones::eval_bone_weight_pair(canvas, links, t, depth),
        NodeKind::StaticList(data) => lists::eval_static_list(canvas, data, t, depth),
        NodeKind::DynamicList(data) => lists::eval_dynamic_list(canvas, data, t, depth),
    }
}

fn expect(value: Value, ty: &ValueType) -> Result<Value, GraphError> {
    value.check_type(ty)?;
    Ok(value)
}

/// Evaluate a child that must produce the parent's declared type.
pub(crate) fn eval_typed(
    canvas: &Canvas,
    id: NodeId,
    ty: &ValueType,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    expect(eval_node(canvas, id, t, depth + 1)?, ty)
}

/// Evaluate a child expected to produce a real.
pub fn eval_real(canvas: &Canvas, id: NodeId, t: Time, depth: usize) -> Result<f64, GraphError> {
    let value = eval_node(canvas, id, t, depth + 1)?;
    value.as_real().ok_or_else(|| {
        GraphError::BadType(ValueError::BadType {
            expected: ValueType::Real,
            found: value.value_type(),
        })
    })
}

/// Evaluate a child expected to produce an integer.
pub fn eval_integer(canvas: &Canvas, id: NodeId, t: Time, depth: usize) -> Result<i64, GraphError> {
    let value = eval_node(canvas, id, t, depth + 1)?;
    value.as_integer().ok_or_else(|| {
        GraphError::BadType(ValueError::BadType {
            expected: ValueType::Integer,
            found: value.value_type(),
        })
    })
}

pub(crate) fn eval_bool(
    canvas: &Canvas,
    id: NodeId,
    t: Time,
    depth: usize,
) -> Result<bool, GraphError> {
    let value = eval_node(canvas, id, t, depth + 1)?;
    value.as_bool().ok_or_else(|| {
        GraphError::BadType(ValueError::BadType {
            expected: ValueType::Bool,
            found: value.value_type(),
        })
    })
}

pub(crate) fn eval_vector(
    canvas: &Canvas,
    id: NodeId,
    t: Time,
    depth: usize,
) -> Result<Vec2, GraphError> {
    let value = eval_node(canvas, id, t, depth + 1)?;
    value.as_vector().ok_or_else(|| {
        GraphError::BadType(ValueError::BadType {
            expected: ValueType::Vector,
            found: value.value_type(),
        })
    })
}

pub(crate) fn eval_angle(
    canvas: &Canvas,
    id: NodeId,
    t: Time,
    depth: usize,
) -> Result<sinew_api_core::Angle, GraphError> {
    let value = eval_node(canvas, id, t, depth + 1)?;
    value.as_angle().ok_or_else(|| {
        GraphError::BadType(ValueError::BadType {
            expected: ValueType::Angle,
            found: value.value_type(),
        })
    })
}

/// `(lhs ± rhs) * scalar`.
fn eval_add(
    canvas: &Canvas,
    node: &Node,
    links: &AddLinks,
    t: Time,
    depth: usize,
    subtract: bool,
) -> Result<Value, GraphError> {
    let lhs = eval_typed(canvas, links.lhs, node.value_type(), t, depth)?;
    let rhs = eval_typed(canvas, links.rhs, node.value_type(), t, depth)?;
    let scalar = eval_real(canvas, links.scalar, t, depth)?;
    let combined = if subtract { lhs.sub(&rhs) } else { lhs.add(&rhs) };
    Ok(combined.scale(scalar))
}

/// Clamp `link` between `min` and `max` per the declared orderable type.
fn eval_range(
    canvas: &Canvas,
    node: &Node,
    links: &RangeLinks,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let ty = node.value_type();
    let min = eval_typed(canvas, links.min, ty, t, depth)?;
    let max = eval_typed(canvas, links.max, ty, t, depth)?;
    let link = eval_typed(canvas, links.link, ty, t, depth)?;
    let key = |v: &Value| -> f64 {
        match v {
            Value::Integer(x) => *x as f64,
            Value::Real(x) => *x,
            Value::Time(x) => x.0,
            Value::Angle(x) => x.as_rad(),
            _ => 0.0,
        }
    };
    if key(&link) < key(&min) {
        Ok(min)
    } else if key(&link) > key(&max) {
        Ok(max)
    } else {
        Ok(link)
    }
}

fn side_type(index: i64) -> SideType {
    match index {
        1 => SideType::Rounded,
        2 => SideType::Squared,
        3 => SideType::Peak,
        4 => SideType::Flat,
        _ => SideType::Interpolate,
    }
}

/// Assemble a structured value from its per-component children.
fn eval_composite(canvas: &Canvas, node: &Node, t: Time, depth: usize) -> Result<Value, GraphError> {
    let NodeKind::Composite(links) = &node.kind else {
        return Err(GraphError::WrongNodeKind);
    };
    let c = &links.components;
    let arity_error = || GraphError::BadLinkIndex {
        index: c.len(),
        count: node.link_slots().len(),
    };
    if c.len() != node.link_slots().len() {
        return Err(arity_error());
    }
    match node.value_type() {
        ValueType::Vector => Ok(Value::Vector(Vec2::new(
            eval_real(canvas, c[0], t, depth)?,
            eval_real(canvas, c[1], t, depth)?,
        ))),
        ValueType::Color => Ok(Value::Color(Color::new(
            eval_real(canvas, c[0], t, depth)?,
            eval_real(canvas, c[1], t, depth)?,
            eval_real(canvas, c[2], t, depth)?,
            eval_real(canvas, c[3], t, depth)?,
        ))),
        ValueType::Segment => Ok(Value::Segment(Segment::new(
            eval_vector(canvas, c[0], t, depth)?,
            eval_vector(canvas, c[1], t, depth)?,
            eval_vector(canvas, c[2], t, depth)?,
            eval_vector(canvas, c[3], t, depth)?,
        ))),
        ValueType::BLinePoint => Ok(Value::BLinePoint(BLinePoint {
            vertex: eval_vector(canvas, c[0], t, depth)?,
            width: eval_real(canvas, c[1], t, depth)?,
            origin: eval_real(canvas, c[2], t, depth)?,
            split_tangent: eval_bool(canvas, c[3], t, depth)?,
            tangent1: eval_vector(canvas, c[4], t, depth)?,
            tangent2: eval_vector(canvas, c[5], t, depth)?,
        })),
        ValueType::WidthPoint => Ok(Value::WidthPoint(WidthPoint {
            position: eval_real(canvas, c[0], t, depth)?,
            width: eval_real(canvas, c[1], t, depth)?,
            side_before: side_type(eval_integer(canvas, c[2], t, depth)?),
            side_after: side_type(eval_integer(canvas, c[3], t, depth)?),
            lower_bound: eval_real(canvas, c[4], t, depth)?,
            upper_bound: eval_real(canvas, c[5], t, depth)?,
        })),
        ValueType::DashItem => Ok(Value::DashItem(DashItem {
            offset: eval_real(canvas, c[0], t, depth)?.max(0.0),
            length: eval_real(canvas, c[1], t, depth)?.max(0.0),
            side_before: side_type(eval_integer(canvas, c[2], t, depth)?),
            side_after: side_type(eval_integer(canvas, c[3], t, depth)?),
        })),
        ValueType::Transformation => Ok(Value::Transformation(Transformation {
            offset: eval_vector(canvas, c[0], t, depth)?,
            angle: eval_angle(canvas, c[1], t, depth)?,
            skew_angle: eval_angle(canvas, c[2], t, depth)?,
            scale: eval_vector(canvas, c[3], t, depth)?,
        })),
        ValueType::Weighted(inner) => Ok(Value::weighted(
            eval_real(canvas, c[0], t, depth)?,
            eval_typed(canvas, c[1], &**inner, t, depth)?,
        )),
        other => Err(GraphError::UnsupportedType {
            kind: "composite",
            ty: other.clone(),
        }),
    }
}

/// Whether an operator can be solved backwards for a target output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InverseStatus {
    Ok,
    BadTime,
    BadParameter,
    BadType,
}

impl Canvas {
    /// Whether `get_inverse` would succeed for this node, time and target.
    /// Only the add operator is algebraically invertible; its inverse exists
    /// when the scalar coefficient is non-zero.
    pub fn is_invertible(&self, node: NodeId, t: Time, target: &Value) -> InverseStatus {
        let Ok(n) = self.node(node) else {
            return InverseStatus::BadParameter;
        };
        match &n.kind {
            NodeKind::Add(links) => {
                if &target.value_type() != n.value_type() {
                    return InverseStatus::BadType;
                }
                match eval_real(self, links.scalar, t, 0) {
                    Ok(s) if s != 0.0 => InverseStatus::Ok,
                    Ok(_) => InverseStatus::BadParameter,
                    Err(_) => InverseStatus::BadParameter,
                }
            }
            _ => InverseStatus::BadType,
        }
    }

    /// Solve the add operator for its `lhs` link: given the desired output,
    /// return the value `lhs` would need at `t`.
    pub fn get_inverse(&self, node: NodeId, t: Time, target: &Value) -> Result<Value, GraphError> {
        let n = self.node(node)?;
        match &n.kind {
            NodeKind::Add(links) => {
                target.check_type(n.value_type())?;
                let scalar = eval_real(self, links.scalar, t, 0)?;
                if scalar == 0.0 {
                    return Err(GraphError::NotInvertible("scalar coefficient is zero"));
                }
                let rhs = eval_typed(self, links.rhs, n.value_type(), t, 0)?;
                Ok(target.scale(1.0 / scalar).sub(&rhs))
            }
            _ => Err(GraphError::NotInvertible("node kind has no inverse")),
        }
    }
}
