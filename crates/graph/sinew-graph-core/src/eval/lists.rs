//! Static and dynamic list evaluation, with the activepoint model that
//! fades entries in and out over time.

use sinew_api_core::{ops, BLinePoint, Hermite, Time, Value, ValueList, ValueType, WidthPoint};

use crate::canvas::{item_type, Canvas};
use crate::error::GraphError;
use crate::types::{Activepoint, DynamicListData, ListEntry, ListFlavor, StaticListData};

use super::eval_node;

const ON_EPSILON: f64 = 1e-7;

fn find_exact(timing: &[Activepoint], t: Time) -> Option<&Activepoint> {
    timing.iter().find(|ap| ap.time.is_equal(t))
}

fn find_prev(timing: &[Activepoint], t: Time) -> Option<&Activepoint> {
    timing.iter().rev().find(|ap| ap.time.is_less_than(t))
}

fn find_next(timing: &[Activepoint], t: Time) -> Option<&Activepoint> {
    timing.iter().find(|ap| ap.time.is_more_than(t))
}

/// Whether a list entry is on at `t`. No activepoints means always on; an
/// exact hit wins outright; otherwise the bracketing pair resolves by
/// priority, with equal priorities OR-combined.
pub fn status_at_time(entry: &ListEntry, t: Time) -> bool {
    let timing = &entry.timing;
    if timing.is_empty() {
        return true;
    }
    if timing.len() == 1 {
        return timing[0].state;
    }
    if let Some(ap) = find_exact(timing, t) {
        return ap.state;
    }
    let after = timing.iter().position(|ap| ap.time.is_more_than(t));
    match after {
        None => timing[timing.len() - 1].state,
        Some(0) => timing[0].state,
        Some(i) => {
            let prev = &timing[i - 1];
            let next = &timing[i];
            if next.priority == prev.priority {
                next.state || prev.state
            } else if next.priority > prev.priority {
                next.state
            } else {
                prev.state
            }
        }
    }
}

/// How much of the entry is on at `t`, as a continuous [0, 1] amount.
/// Between two differing-state activepoints the amount ramps linearly over
/// the window; `rising` reports the ramp direction.
pub fn amount_at_time(entry: &ListEntry, t: Time, rising: Option<&mut bool>) -> f64 {
    let timing = &entry.timing;
    if timing.is_empty() {
        return 1.0;
    }
    if let Some(ap) = find_exact(timing, t) {
        return if ap.state { 1.0 } else { 0.0 };
    }
    let prev = match find_prev(timing, t) {
        Some(p) => p,
        None => {
            return match find_next(timing, t) {
                Some(n) if n.state => 1.0,
                _ => 0.0,
            }
        }
    };
    let next = match find_next(timing, t) {
        Some(n) => n,
        None => return if prev.state { 1.0 } else { 0.0 },
    };
    if next.state == prev.state {
        return if next.state { 1.0 } else { 0.0 };
    }
    if let Some(r) = rising {
        *r = next.state;
    }
    if next.state {
        (t - prev.time).0 / (next.time - prev.time).0
    } else {
        (next.time - t).0 / (next.time - prev.time).0
    }
}

/// Evaluate one entry, discarding (with a diagnostic) values that do not
/// match the list's declared item type.
fn entry_value(
    canvas: &Canvas,
    node: crate::types::NodeId,
    expected: &ValueType,
    t: Time,
    depth: usize,
) -> Result<Option<Value>, GraphError> {
    let value = eval_node(canvas, node, t, depth + 1)?;
    if &value.value_type() == expected {
        Ok(Some(value))
    } else {
        log::warn!(
            "list item type mismatch: expected {expected:?}, got {:?}; discarding item",
            value.value_type()
        );
        Ok(None)
    }
}

pub(super) fn eval_static_list(
    canvas: &Canvas,
    data: &StaticListData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let mut items = Vec::with_capacity(data.entries.len());
    for &entry in &data.entries {
        if let Some(value) = entry_value(canvas, entry, &data.contained, t, depth)? {
            items.push(value);
        }
    }
    Ok(Value::List(ValueList::looped(
        data.contained.clone(),
        items,
        data.looped,
    )))
}

pub(super) fn eval_dynamic_list(
    canvas: &Canvas,
    data: &DynamicListData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    match data.flavor {
        ListFlavor::Plain | ListFlavor::DiList => eval_plain(canvas, data, t, depth),
        ListFlavor::BLine => eval_bline(canvas, data, t, depth),
        ListFlavor::WpList => eval_wplist(canvas, data, t, depth),
        ListFlavor::Average => eval_average(canvas, data, t, depth),
        ListFlavor::WeightedAverage => eval_weighted_average(canvas, data, t, depth),
    }
}

/// Entries currently off are skipped entirely, not included as zero-weight.
fn eval_plain(
    canvas: &Canvas,
    data: &DynamicListData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let expected = item_type(data);
    let mut items = Vec::new();
    for entry in &data.entries {
        if !status_at_time(entry, t) {
            continue;
        }
        if let Some(value) = entry_value(canvas, entry.node, &expected, t, depth)? {
            items.push(value);
        }
    }
    if data.entries.is_empty() {
        log::warn!("dynamic list has no entries");
    } else if items.is_empty() {
        log::warn!("dynamic list has no active entries at {t:?}");
    }
    Ok(Value::List(ValueList::looped(
        data.contained.clone(),
        items,
        data.looped,
    )))
}

fn eval_average(
    canvas: &Canvas,
    data: &DynamicListData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let mut values = Vec::new();
    for entry in &data.entries {
        if !status_at_time(entry, t) {
            continue;
        }
        if let Some(value) = entry_value(canvas, entry.node, &data.contained, t, depth)? {
            values.push(value);
        }
    }
    let default = Value::default_for(&data.contained);
    Ok(ops::average(&values, None, &default))
}

fn eval_weighted_average(
    canvas: &Canvas,
    data: &DynamicListData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let expected = item_type(data);
    let mut values = Vec::new();
    let mut weights = Vec::new();
    for entry in &data.entries {
        if !status_at_time(entry, t) {
            continue;
        }
        if let Some(value) = entry_value(canvas, entry.node, &expected, t, depth)? {
            if let Some((weight, inner)) = value.as_weighted() {
                weights.push(weight);
                values.push(inner.clone());
            }
        }
    }
    let default = Value::default_for(&data.contained);
    Ok(ops::average(&values, Some(&weights), &default))
}

// ---- spline vertices ------------------------------------------------------

fn blinepoint_at(
    canvas: &Canvas,
    entry: &ListEntry,
    t: Time,
    depth: usize,
) -> Result<Option<BLinePoint>, GraphError> {
    Ok(entry_value(canvas, entry.node, &ValueType::BLinePoint, t, depth)?
        .and_then(|v| v.as_bline_point()))
}

fn lerp(a: f64, b: f64, amount: f64) -> f64 {
    a + (b - a) * amount
}

/// The off/on boundary times of a partially-on entry, given the ramp
/// direction at `t`.
fn transition_window(entry: &ListEntry, t: Time, rising: bool) -> (Time, Time) {
    let prev = find_prev(&entry.timing, t).map(|ap| ap.time);
    let next = find_next(&entry.timing, t).map(|ap| ap.time);
    if rising {
        // off in the past, fully on in the future
        (
            prev.unwrap_or_else(Time::begin),
            next.unwrap_or_else(Time::end),
        )
    } else {
        // on in the past, fully off in the future
        (
            next.unwrap_or_else(Time::end),
            prev.unwrap_or_else(Time::begin),
        )
    }
}

/// Spline evaluation: fully-on vertices pass through; partially-on vertices
/// are blended between their on-state and an off-state synthesized on the
/// Hermite chord between the bracketing fully-on neighbors, with the
/// neighbors' facing tangents scaled down by the blend.
fn eval_bline(
    canvas: &Canvas,
    data: &DynamicListData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let entries = &data.entries;
    let mut out: Vec<BLinePoint> = Vec::new();
    let mut first_index: Option<usize> = None;
    let mut prev_point: Option<BLinePoint> = None;
    let mut next_scale = 1.0_f64;

    for (index, entry) in entries.iter().enumerate() {
        let mut rising = false;
        let amount = amount_at_time(entry, t, Some(&mut rising)).clamp(0.0, 1.0);

        if amount > 1.0 - ON_EPSILON {
            let Some(curr) = blinepoint_at(canvas, entry, t, depth)? else {
                continue;
            };
            if first_index.is_none() {
                first_index = Some(index);
                prev_point = Some(curr);
                out.push(curr);
                continue;
            }
            if next_scale != 1.0 {
                let prev = prev_point.unwrap_or_default();
                if let Some(last) = out.last_mut() {
                    last.split_tangent = true;
                    last.tangent2 = prev.tangent2() * next_scale;
                }
                let mut pushed = curr;
                pushed.split_tangent = true;
                pushed.tangent2 = curr.tangent2();
                pushed.tangent1 = curr.tangent1 * next_scale;
                out.push(pushed);
                next_scale = 1.0;
            } else {
                out.push(curr);
            }
            prev_point = Some(curr);
        } else if amount > 0.0 {
            let (off_time, on_time) = transition_window(entry, t, rising);
            let Some(on_state) = blinepoint_at(canvas, entry, on_time, depth)? else {
                continue;
            };

            // the neighbors that stay more on than we are
            let end = entries
                .iter()
                .enumerate()
                .skip(index + 1)
                .find(|(_, e)| amount_at_time(e, t, None) > amount)
                .map(|(i, _)| i)
                .unwrap_or_else(|| {
                    if data.looped {
                        first_index.unwrap_or(entries.len() - 1)
                    } else {
                        entries.len() - 1
                    }
                });
            let begin = entries[..index]
                .iter()
                .enumerate()
                .rev()
                .find(|(_, e)| amount_at_time(e, t, None) > amount)
                .map(|(i, _)| i)
                .unwrap_or_else(|| first_index.unwrap_or(0));

            let Some(prev_off) = blinepoint_at(canvas, &entries[begin], off_time, depth)? else {
                continue;
            };
            let Some(next_off) = blinepoint_at(canvas, &entries[end], off_time, depth)? else {
                continue;
            };

            // where this vertex would sit had it fully vanished
            let curve = Hermite::new(
                prev_off.vertex,
                next_off.vertex,
                prev_off.tangent2(),
                next_off.tangent1,
            );
            let mut off_state = BLinePoint::default();
            off_state.vertex = curve.eval(on_state.origin);
            off_state.width = lerp(prev_off.width, next_off.width, on_state.origin);
            let slope = curve.derivative(on_state.origin);
            off_state.set_tangent_both(slope);

            let prev_tangent_scalar = if begin + 1 == index {
                lerp(on_state.origin, 1.0, amount)
            } else {
                let prev_origin = prev_point.map(|p| p.origin).unwrap_or(0.0);
                lerp(on_state.origin - prev_origin, 1.0, amount)
            };
            let next_tangent_scalar = if end == index + 1 {
                lerp(1.0 - on_state.origin, 1.0, amount)
            } else {
                lerp(next_off.origin - on_state.origin, 1.0, amount)
            };
            next_scale = next_tangent_scalar;

            let mut now = BLinePoint {
                vertex: off_state.vertex + (on_state.vertex - off_state.vertex) * amount,
                width: lerp(off_state.width, on_state.width, amount),
                origin: on_state.origin,
                split_tangent: on_state.split_tangent,
                tangent1: off_state.tangent1 + (on_state.tangent1 - off_state.tangent1) * amount,
                tangent2: off_state.tangent2
                    + (on_state.tangent2() - off_state.tangent2) * amount,
            };
            if !now.split_tangent {
                now.tangent2 = now.tangent1;
            }

            if first_index.is_none() {
                now.tangent1 = now.tangent1 * prev_tangent_scalar;
                first_index = Some(index);
                prev_point = Some(now);
                out.push(now);
                continue;
            }

            let prev = prev_point.unwrap_or_default();
            if let Some(last) = out.last_mut() {
                last.split_tangent = true;
                last.tangent2 = prev.tangent2() * prev_tangent_scalar;
            }
            let mut pushed = now;
            pushed.split_tangent = true;
            pushed.tangent1 = now.tangent1 * prev_tangent_scalar;
            out.push(pushed);
            prev_point = Some(now);
        }
    }

    if next_scale != 1.0 {
        let prev = prev_point.unwrap_or_default();
        if let Some(last) = out.last_mut() {
            last.split_tangent = true;
            last.tangent2 = prev.tangent2() * next_scale;
        }
    }

    if entries.is_empty() {
        log::warn!("spline list has no entries");
    } else if out.is_empty() {
        log::warn!("spline list has no active vertices at {t:?}");
    }

    Ok(Value::List(ValueList::looped(
        ValueType::BLinePoint,
        out.into_iter().map(Value::BLinePoint).collect(),
        data.looped,
    )))
}

// ---- width points ---------------------------------------------------------

/// Width at `position` interpolated across the fully-on width points.
fn interpolated_width(
    on_points: &[(f64, f64)], // (norm position, width), sorted by position
    position: f64,
) -> Option<f64> {
    if on_points.is_empty() {
        return None;
    }
    if position <= on_points[0].0 {
        return Some(on_points[0].1);
    }
    let last = on_points.len() - 1;
    if position >= on_points[last].0 {
        return Some(on_points[last].1);
    }
    let i = on_points.partition_point(|(p, _)| *p <= position) - 1;
    let (p0, w0) = on_points[i];
    let (p1, w1) = on_points[i + 1];
    if (p1 - p0).abs() < 1e-12 {
        return Some(w0);
    }
    Some(lerp(w0, w1, (position - p0) / (p1 - p0)))
}

/// Width-point lists: a partially-on point eases its width toward the width
/// the surrounding fully-on points would give at its position, so it fades
/// into the outline instead of popping.
fn eval_wplist(
    canvas: &Canvas,
    data: &DynamicListData,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let mut on_points: Vec<(f64, f64)> = Vec::new();
    let mut staged: Vec<(WidthPoint, f64)> = Vec::new();

    for entry in &data.entries {
        let amount = amount_at_time(entry, t, None).clamp(0.0, 1.0);
        if amount <= 0.0 {
            continue;
        }
        let Some(value) = entry_value(canvas, entry.node, &ValueType::WidthPoint, t, depth)? else {
            continue;
        };
        let Some(wp) = value.as_width_point() else {
            continue;
        };
        if amount > 1.0 - ON_EPSILON {
            on_points.push((wp.norm_position(data.looped), wp.width));
        }
        staged.push((wp, amount));
    }
    on_points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut items = Vec::with_capacity(staged.len());
    for (mut wp, amount) in staged {
        if amount <= 1.0 - ON_EPSILON {
            let position = wp.norm_position(data.looped);
            let i_width = interpolated_width(&on_points, position).unwrap_or(wp.width);
            wp.width = i_width * (1.0 - amount) + wp.width * amount;
        }
        items.push(Value::WidthPoint(wp));
    }

    if data.entries.is_empty() {
        log::warn!("width point list has no entries");
    } else if items.is_empty() {
        log::warn!("width point list has no active points at {t:?}");
    }

    Ok(Value::List(ValueList::looped(
        ValueType::WidthPoint,
        items,
        data.looped,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    fn ap(id: u64, t: f64, state: bool, priority: i32) -> Activepoint {
        Activepoint {
            id,
            time: Time(t),
            state,
            priority,
        }
    }

    fn entry_with(timing: Vec<Activepoint>) -> ListEntry {
        ListEntry {
            node: NodeId(1),
            timing,
        }
    }

    #[test]
    fn no_activepoints_means_always_on() {
        let e = entry_with(vec![]);
        assert!(status_at_time(&e, Time(-10.0)));
        assert_eq!(amount_at_time(&e, Time(3.0), None), 1.0);
    }

    #[test]
    fn bracketing_resolves_on_off() {
        let e = entry_with(vec![ap(1, 0.0, true, 0), ap(2, 10.0, false, 0)]);
        assert!(status_at_time(&e, Time(5.0)));
        assert!(!status_at_time(&e, Time(15.0)));
        assert!(status_at_time(&e, Time(-5.0)));
    }

    #[test]
    fn higher_priority_wins_outright() {
        let e = entry_with(vec![ap(1, 0.0, false, 5), ap(2, 10.0, true, 0)]);
        assert!(!status_at_time(&e, Time(5.0)));
        let e = entry_with(vec![ap(1, 0.0, false, 0), ap(2, 10.0, true, 7)]);
        assert!(status_at_time(&e, Time(5.0)));
    }

    #[test]
    fn equal_priority_or_combines() {
        let e = entry_with(vec![ap(1, 0.0, false, 0), ap(2, 10.0, true, 0)]);
        assert!(status_at_time(&e, Time(5.0)));
    }

    #[test]
    fn exact_hit_returns_that_state() {
        let e = entry_with(vec![ap(1, 0.0, true, 0), ap(2, 10.0, false, 0)]);
        assert!(!status_at_time(&e, Time(10.0)));
        assert_eq!(amount_at_time(&e, Time(10.0), None), 0.0);
    }

    #[test]
    fn amount_ramps_linearly_and_monotonically() {
        let e = entry_with(vec![ap(1, 0.0, false, 0), ap(2, 10.0, true, 0)]);
        let mut rising = false;
        let a25 = amount_at_time(&e, Time(2.5), Some(&mut rising));
        assert!(rising);
        let a50 = amount_at_time(&e, Time(5.0), None);
        let a75 = amount_at_time(&e, Time(7.5), None);
        assert!((a25 - 0.25).abs() < 1e-9);
        assert!((a50 - 0.5).abs() < 1e-9);
        assert!((a75 - 0.75).abs() < 1e-9);
        assert!(a25 < a50 && a50 < a75);
    }

    #[test]
    fn falling_window_ramps_down() {
        let e = entry_with(vec![ap(1, 0.0, true, 0), ap(2, 10.0, false, 0)]);
        let mut rising = true;
        let a = amount_at_time(&e, Time(7.5), Some(&mut rising));
        assert!(!rising);
        assert!((a - 0.25).abs() < 1e-9);
    }

    #[test]
    fn interpolated_width_brackets() {
        let pts = vec![(0.0, 1.0), (1.0, 3.0)];
        assert_eq!(interpolated_width(&pts, -1.0), Some(1.0));
        assert_eq!(interpolated_width(&pts, 2.0), Some(3.0));
        assert!((interpolated_width(&pts, 0.5).unwrap() - 2.0).abs() < 1e-12);
    }
}
