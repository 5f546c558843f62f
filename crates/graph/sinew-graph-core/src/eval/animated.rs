//! Waypoint interpolation: the per-type strategies of animated nodes.
//!
//! Continuous kinds ride cubic Hermite segments whose tangents come from
//! each waypoint's before/after interpolation mode (chord, eased, TCB,
//! overshoot-clamped). Booleans use bracketing with an OR at shared
//! instants, and opaque kinds hold the most recent waypoint. Tangents are
//! derived from the local waypoint window at every call, so evaluation
//! stays a pure function of time and wiring.

use sinew_api_core::{Color, CurvePoint, Gradient, GradientStop, Hermite, Time, Value, ValueType};

use crate::canvas::Canvas;
use crate::error::GraphError;
use crate::types::{AnimatedData, Interpolation, Node, Waypoint, WaypointLink};

use super::eval_node;

/// Integer tracks are premultiplied by this around the spline so stepped
/// values land between integers smoothly instead of jittering.
const INT_PREMULT: i64 = 3 * 256;

/// Ratio weighting a segment's own duration against its neighbor's when
/// rescaling non-linear tangents.
const TIME_ADJUST: f64 = 0.5;

enum Strategy {
    Hermite,
    Bool,
    ConstantHold,
}

fn strategy_for(ty: &ValueType) -> Strategy {
    match ty {
        ValueType::Integer
        | ValueType::Real
        | ValueType::Time
        | ValueType::Angle
        | ValueType::Vector
        | ValueType::Color
        | ValueType::Gradient => Strategy::Hermite,
        ValueType::Bool => Strategy::Bool,
        _ => Strategy::ConstantHold,
    }
}

/// Resolve a waypoint's value at `t`. Static waypoints carry their value;
/// node-driven waypoints re-evaluate the child at the query time.
fn waypoint_value(
    canvas: &Canvas,
    w: &Waypoint,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    match &w.link {
        WaypointLink::Value(v) => Ok(v.clone()),
        WaypointLink::Node(id) => eval_node(canvas, *id, t, depth + 1),
    }
}

pub(super) fn eval(
    canvas: &Canvas,
    node: &Node,
    data: &AnimatedData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let ty = node.value_type();
    let wps = &data.waypoints;
    match strategy_for(ty) {
        Strategy::Hermite => eval_hermite(canvas, ty, wps, t, depth),
        Strategy::Bool => eval_bool(canvas, wps, t, depth),
        Strategy::ConstantHold => eval_constant(canvas, ty, wps, t, depth),
    }
}

// ---- constant-hold --------------------------------------------------------

fn eval_constant(
    canvas: &Canvas,
    ty: &ValueType,
    wps: &[Waypoint],
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    match wps.len() {
        0 => Ok(Value::default_for(ty)),
        1 => waypoint_value(canvas, &wps[0], t, depth),
        _ => {
            if t.0 <= wps[0].time.0 {
                return waypoint_value(canvas, &wps[0], t, depth);
            }
            let last = wps.len() - 1;
            if t.0 >= wps[last].time.0 {
                return waypoint_value(canvas, &wps[last], t, depth);
            }
            // last waypoint not after t
            let i = wps.partition_point(|w| w.time.0 <= t.0) - 1;
            waypoint_value(canvas, &wps[i], t, depth)
        }
    }
}

// ---- booleans -------------------------------------------------------------

fn eval_bool(
    canvas: &Canvas,
    wps: &[Waypoint],
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    match wps.len() {
        0 => Ok(Value::Bool(false)),
        1 => waypoint_value(canvas, &wps[0], t, depth),
        _ => {
            let last = wps.len() - 1;
            if t.0 < wps[0].time.0 {
                return waypoint_value(canvas, &wps[0], t, depth);
            }
            if t.0 > wps[last].time.0 {
                return waypoint_value(canvas, &wps[last], t, depth);
            }
            let i = wps.partition_point(|w| w.time.0 <= t.0).saturating_sub(1);
            if wps[i].time.is_equal(t) {
                return waypoint_value(canvas, &wps[i], t, depth);
            }
            // Between two waypoints both states count; OR avoids off-by-one
            // flicker at the boundary of an on/off pair.
            if i + 1 <= last {
                let a = waypoint_value(canvas, &wps[i], t, depth)?;
                let b = waypoint_value(canvas, &wps[i + 1], t, depth)?;
                return Ok(Value::Bool(
                    a.as_bool().unwrap_or(false) || b.as_bool().unwrap_or(false),
                ));
            }
            waypoint_value(canvas, &wps[i], t, depth)
        }
    }
}

// ---- hermite --------------------------------------------------------------

fn premult(ty: &ValueType, value: Value) -> Value {
    if ty == &ValueType::Integer {
        Value::Real((value.as_integer().unwrap_or(0) * INT_PREMULT) as f64)
    } else {
        value
    }
}

fn demult(ty: &ValueType, value: Value) -> Value {
    if ty == &ValueType::Integer {
        let x = value.as_real().unwrap_or(0.0) as i64;
        Value::Integer((x + INT_PREMULT / 2) / INT_PREMULT)
    } else {
        value
    }
}

fn eval_hermite(
    canvas: &Canvas,
    ty: &ValueType,
    wps: &[Waypoint],
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    match wps.len() {
        0 => Ok(Value::default_for(ty)),
        1 => waypoint_value(canvas, &wps[0], t, depth),
        _ => {
            let last = wps.len() - 1;
            if t.0 <= wps[0].time.0 {
                return waypoint_value(canvas, &wps[0], t, depth);
            }
            if t.0 >= wps[last].time.0 {
                return waypoint_value(canvas, &wps[last], t, depth);
            }
            // First segment whose end time is still ahead of t.
            let mut k = 0;
            while k + 1 < last && t.0 >= wps[k + 1].time.0 {
                k += 1;
            }
            resolve_segment(canvas, ty, wps, k, t, depth)
        }
    }
}

fn resolve_segment(
    canvas: &Canvas,
    ty: &ValueType,
    wps: &[Waypoint],
    k: usize,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let w0 = &wps[k];
    let w1 = &wps[k + 1];

    // The time axis is itself a Hermite, eased by temporal tension.
    let dt = (w1.time - w0.time).0;
    let mut time_curve = Hermite::new(
        w0.time.0,
        w1.time.0,
        dt * (1.0 - w0.temporal_tension),
        dt * (1.0 - w1.temporal_tension),
    );
    time_curve.set_rs(w0.time.0, w1.time.0);
    let warped = time_curve.eval(t.0);

    if !(w0.is_static() && w1.is_static()) {
        // Node-driven endpoints are resolved at the query time; only chord
        // interpolation is supported on such segments.
        let p1 = waypoint_value(canvas, w0, t, depth)?;
        if w0.after == Interpolation::Constant || w1.before == Interpolation::Constant {
            return Ok(p1);
        }
        let p2 = waypoint_value(canvas, w1, t, depth)?;
        let p1 = premult(ty, p1);
        let p2 = premult(ty, p2);
        let chord = p2.sub(&p1);
        let mut curve = Hermite::new(p1, p2, chord.clone(), chord);
        curve.set_rs(w0.time.0, w1.time.0);
        return Ok(demult(ty, curve.eval(warped)));
    }

    let p1 = waypoint_value(canvas, w0, t, depth)?;
    if w0.after == Interpolation::Constant || w1.before == Interpolation::Constant {
        // The whole span holds the left waypoint's value.
        return Ok(p1);
    }
    let p2 = waypoint_value(canvas, w1, t, depth)?;

    let t1 = outgoing_tangent(canvas, wps, k, t, depth)?;
    let t2 = incoming_tangent(canvas, wps, k, t, depth)?;

    let mut curve = Hermite::new(
        premult(ty, p1),
        premult(ty, p2),
        premult(ty, t1),
        premult(ty, t2),
    );
    curve.set_rs(w0.time.0, w1.time.0);
    Ok(demult(ty, curve.eval(warped)))
}

fn static_value(canvas: &Canvas, w: &Waypoint, t: Time, depth: usize) -> Result<Value, GraphError> {
    waypoint_value(canvas, w, t, depth)
}

fn chord(
    canvas: &Canvas,
    wps: &[Waypoint],
    k: usize,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let a = static_value(canvas, &wps[k], t, depth)?;
    let b = static_value(canvas, &wps[k + 1], t, depth)?;
    Ok(b.sub(&a))
}

fn seg_duration(wps: &[Waypoint], k: usize) -> f64 {
    (wps[k + 1].time - wps[k].time).0
}

/// The outgoing tangent of segment `k` at its left waypoint, with the halt
/// zeroing and neighbor-duration rescale applied.
fn outgoing_tangent(
    canvas: &Canvas,
    wps: &[Waypoint],
    k: usize,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let w0 = &wps[k];
    if w0.after == Interpolation::Halt {
        let p = static_value(canvas, w0, t, depth)?;
        return Ok(p.scale(0.0));
    }
    let mut t1 = raw_outgoing_tangent(canvas, wps, k, t, depth)?;
    if w0.after != Interpolation::Linear && k > 0 {
        let dt = seg_duration(wps, k);
        let prev_dt = seg_duration(wps, k - 1);
        t1 = t1.scale(dt * (TIME_ADJUST + 1.0) / (dt * TIME_ADJUST + prev_dt));
    }
    Ok(t1)
}

/// The outgoing tangent before halt/duration adjustments.
fn raw_outgoing_tangent(
    canvas: &Canvas,
    wps: &[Waypoint],
    k: usize,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let w0 = &wps[k];
    match w0.after {
        Interpolation::Linear | Interpolation::Halt => chord(canvas, wps, k, t, depth),
        Interpolation::Tcb => {
            if k == 0 {
                chord(canvas, wps, k, t, depth)
            } else if w0.before != Interpolation::Tcb {
                // Share the previous segment's arriving tangent for
                // continuity across the waypoint.
                incoming_tangent_unshared(canvas, wps, k - 1, t, depth)
            } else {
                let pp = static_value(canvas, &wps[k - 1], t, depth)?;
                let pc = static_value(canvas, &wps[k], t, depth)?;
                let pn = static_value(canvas, &wps[k + 1], t, depth)?;
                let (tn, c, b) = (w0.tension, w0.continuity, w0.bias);
                Ok(pc
                    .sub(&pp)
                    .scale((1.0 - tn) * (1.0 + c) * (1.0 + b) / 2.0)
                    .add(&pn.sub(&pc).scale((1.0 - tn) * (1.0 - c) * (1.0 - b) / 2.0)))
            }
        }
        Interpolation::Clamped => {
            if k == 0 {
                chord(canvas, wps, k, t, depth)
            } else {
                let pp = static_value(canvas, &wps[k - 1], t, depth)?;
                let pc = static_value(canvas, &wps[k], t, depth)?;
                let pn = static_value(canvas, &wps[k + 1], t, depth)?;
                Ok(clamped_tangent(
                    &pp,
                    &pc,
                    &pn,
                    wps[k - 1].time,
                    wps[k].time,
                    wps[k + 1].time,
                ))
            }
        }
        Interpolation::Constant | Interpolation::Manual | Interpolation::Undefined => {
            let p = static_value(canvas, w0, t, depth)?;
            Ok(p.scale(0.0))
        }
    }
}

/// The incoming tangent of segment `k` at its right waypoint. When the right
/// waypoint faces the next segment with TCB on its before side only, the
/// tangent is shared with that segment's outgoing tangent so the two curves
/// stay continuous.
fn incoming_tangent(
    canvas: &Canvas,
    wps: &[Waypoint],
    k: usize,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let w1 = &wps[k + 1];
    let has_following = k + 2 < wps.len();
    if has_following
        && w1.before == Interpolation::Tcb
        && w1.after != Interpolation::Tcb
        && w1.after != Interpolation::Constant
        && wps[k + 2].before != Interpolation::Constant
        && w1.is_static()
        && wps[k + 2].is_static()
    {
        return raw_outgoing_tangent(canvas, wps, k + 1, t, depth);
    }
    incoming_tangent_unshared(canvas, wps, k, t, depth)
}

/// The incoming tangent from segment `k`'s own rules, with halt/duration
/// adjustments but without the continuity share.
fn incoming_tangent_unshared(
    canvas: &Canvas,
    wps: &[Waypoint],
    k: usize,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let w1 = &wps[k + 1];
    if w1.before == Interpolation::Halt {
        let p = static_value(canvas, w1, t, depth)?;
        return Ok(p.scale(0.0));
    }
    let mut t2 = raw_incoming_tangent(canvas, wps, k, t, depth)?;
    let has_following = k + 2 < wps.len();
    if w1.before != Interpolation::Linear && has_following {
        let dt = seg_duration(wps, k);
        let next_dt = seg_duration(wps, k + 1);
        t2 = t2.scale(dt * (TIME_ADJUST + 1.0) / (dt * TIME_ADJUST + next_dt));
    }
    Ok(t2)
}

fn raw_incoming_tangent(
    canvas: &Canvas,
    wps: &[Waypoint],
    k: usize,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let w1 = &wps[k + 1];
    let has_following = k + 2 < wps.len();
    match w1.before {
        Interpolation::Tcb if has_following => {
            let pp = static_value(canvas, &wps[k], t, depth)?;
            let pc = static_value(canvas, &wps[k + 1], t, depth)?;
            let pn = static_value(canvas, &wps[k + 2], t, depth)?;
            let (tn, c, b) = (w1.tension, w1.continuity, w1.bias);
            Ok(pc
                .sub(&pp)
                .scale((1.0 - tn) * (1.0 - c) * (1.0 + b) / 2.0)
                .add(&pn.sub(&pc).scale((1.0 - tn) * (1.0 + c) * (1.0 - b) / 2.0)))
        }
        Interpolation::Clamped if has_following => {
            let pp = static_value(canvas, &wps[k], t, depth)?;
            let pc = static_value(canvas, &wps[k + 1], t, depth)?;
            let pn = static_value(canvas, &wps[k + 2], t, depth)?;
            Ok(clamped_tangent(
                &pp,
                &pc,
                &pn,
                wps[k].time,
                wps[k + 1].time,
                wps[k + 2].time,
            ))
        }
        // Boundary TCB/Clamped degrade to the chord, as do Linear and Halt.
        Interpolation::Linear
        | Interpolation::Halt
        | Interpolation::Tcb
        | Interpolation::Clamped => chord(canvas, wps, k, t, depth),
        Interpolation::Constant | Interpolation::Manual | Interpolation::Undefined => {
            let p = static_value(canvas, w1, t, depth)?;
            Ok(p.scale(0.0))
        }
    }
}

// ---- clamped tangents -----------------------------------------------------

/// Catmull-Rom-like tangent clamped so the curve cannot overshoot a local
/// extremum at the middle control point.
fn clamped_scalar(p1: f64, p2: f64, p3: f64, t1: Time, t2: Time, t3: Time) -> f64 {
    let pm = p1 + (p3 - p1) * ((t2 - t1).0 / (t3 - t1).0);
    if p3 > p1 {
        if p2 >= p3 || p2 <= p1 {
            0.0
        } else {
            let bias = if p2 > pm {
                (pm - p2) / (p3 - pm)
            } else if p2 < pm {
                (pm - p2) / (pm - p1)
            } else {
                0.0
            };
            (p2 - p1) * (1.0 + bias) / 2.0 + (p3 - p2) * (1.0 - bias) / 2.0
        }
    } else if p1 > p3 {
        if p2 >= p1 || p2 <= p3 {
            0.0
        } else {
            let bias = if p2 > pm {
                (pm - p2) / (pm - p1)
            } else if p2 < pm {
                (pm - p2) / (p3 - pm)
            } else {
                0.0
            };
            (p2 - p1) * (1.0 + bias) / 2.0 + (p3 - p2) * (1.0 - bias) / 2.0
        }
    } else {
        0.0
    }
}

fn clamped_color(p1: &Color, p2: &Color, p3: &Color, t1: Time, t2: Time, t3: Time) -> Color {
    Color::new(
        clamped_scalar(p1.r, p2.r, p3.r, t1, t2, t3),
        clamped_scalar(p1.g, p2.g, p3.g, t1, t2, t3),
        clamped_scalar(p1.b, p2.b, p3.b, t1, t2, t3),
        clamped_scalar(p1.a, p2.a, p3.a, t1, t2, t3),
    )
}

/// Component-wise clamped tangent across the continuous value kinds.
fn clamped_tangent(pp: &Value, pc: &Value, pn: &Value, t1: Time, t2: Time, t3: Time) -> Value {
    match (pp, pc, pn) {
        (Value::Real(a), Value::Real(b), Value::Real(c)) => {
            Value::Real(clamped_scalar(*a, *b, *c, t1, t2, t3))
        }
        (Value::Integer(a), Value::Integer(b), Value::Integer(c)) => Value::Integer(
            clamped_scalar(*a as f64, *b as f64, *c as f64, t1, t2, t3) as i64,
        ),
        (Value::Time(a), Value::Time(b), Value::Time(c)) => {
            Value::Time(Time(clamped_scalar(a.0, b.0, c.0, t1, t2, t3)))
        }
        (Value::Angle(a), Value::Angle(b), Value::Angle(c)) => {
            Value::Angle(sinew_api_core::Angle::rad(clamped_scalar(
                a.as_rad(),
                b.as_rad(),
                c.as_rad(),
                t1,
                t2,
                t3,
            )))
        }
        (Value::Vector(a), Value::Vector(b), Value::Vector(c)) => {
            Value::Vector(sinew_api_core::Vec2::new(
                clamped_scalar(a.x, b.x, c.x, t1, t2, t3),
                clamped_scalar(a.y, b.y, c.y, t1, t2, t3),
            ))
        }
        (Value::Color(a), Value::Color(b), Value::Color(c)) => {
            Value::Color(clamped_color(a, b, c, t1, t2, t3))
        }
        (Value::Gradient(a), Value::Gradient(b), Value::Gradient(c)) => {
            let stops = b
                .stops()
                .iter()
                .map(|s| GradientStop {
                    pos: s.pos,
                    color: clamped_color(
                        &a.color_at(s.pos),
                        &s.color,
                        &c.color_at(s.pos),
                        t1,
                        t2,
                        t3,
                    ),
                })
                .collect();
            Value::Gradient(Gradient::new(stops))
        }
        _ => pc.scale(0.0),
    }
}
