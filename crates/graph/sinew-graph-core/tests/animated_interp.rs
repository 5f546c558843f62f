//! Waypoint interpolation behavior of animated nodes.

use sinew_api_core::{Time, Value, ValueType};
use sinew_graph_core::{Canvas, GraphError, Interpolation};
use sinew_test_fixtures::linear_real_track;

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn real_at(canvas: &Canvas, node: sinew_graph_core::NodeId, t: f64) -> f64 {
    canvas.value(node, Time(t)).as_real().expect("real track")
}

#[test]
fn linear_pair_interpolates_exactly() {
    let mut canvas = Canvas::new();
    let node = linear_real_track(&mut canvas, &[(0.0, 0.0), (10.0, 100.0)]);
    approx(real_at(&canvas, node, 5.0), 50.0, 1e-9);
    approx(real_at(&canvas, node, 2.5), 25.0, 1e-9);
    approx(real_at(&canvas, node, 7.5), 75.0, 1e-9);
}

#[test]
fn hermite_linear_midpoint_is_arithmetic_midpoint() {
    let mut canvas = Canvas::new();
    let node = linear_real_track(&mut canvas, &[(1.0, -4.0), (3.0, 12.0)]);
    approx(real_at(&canvas, node, 2.0), 4.0, 1e-9);
}

#[test]
fn evaluation_is_deterministic() {
    let mut canvas = Canvas::new();
    let node = linear_real_track(&mut canvas, &[(0.0, 0.0), (4.0, 1.0), (10.0, -3.0)]);
    for t in [-2.0, 0.0, 1.7, 4.0, 9.99, 10.0, 25.0] {
        let a = canvas.value(node, Time(t));
        let b = canvas.value(node, Time(t));
        assert_eq!(a, b);
    }
}

#[test]
fn out_of_range_times_clamp_to_boundary_waypoints() {
    let mut canvas = Canvas::new();
    let node = linear_real_track(&mut canvas, &[(0.0, 7.0), (10.0, 42.0)]);
    approx(real_at(&canvas, node, -100.0), 7.0, 1e-12);
    approx(real_at(&canvas, node, 0.0), 7.0, 1e-12);
    approx(real_at(&canvas, node, 10.0), 42.0, 1e-12);
    approx(real_at(&canvas, node, 1e6), 42.0, 1e-12);
}

#[test]
fn constant_after_holds_the_left_value() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    let w0 = canvas.new_waypoint(node, Time(0.0), Value::Real(5.0)).unwrap();
    canvas.new_waypoint(node, Time(10.0), Value::Real(50.0)).unwrap();
    canvas
        .update_waypoint(node, w0, |w| w.after = Interpolation::Constant)
        .unwrap();
    approx(real_at(&canvas, node, 0.0), 5.0, 0.0);
    approx(real_at(&canvas, node, 5.0), 5.0, 0.0);
    approx(real_at(&canvas, node, 9.999), 5.0, 0.0);
    approx(real_at(&canvas, node, 10.0), 50.0, 0.0);
}

#[test]
fn halt_eases_into_and_out_of_waypoints() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    let w0 = canvas.new_waypoint(node, Time(0.0), Value::Real(0.0)).unwrap();
    let w1 = canvas
        .new_waypoint(node, Time(10.0), Value::Real(100.0))
        .unwrap();
    canvas
        .update_waypoint(node, w0, |w| w.after = Interpolation::Halt)
        .unwrap();
    canvas
        .update_waypoint(node, w1, |w| w.before = Interpolation::Halt)
        .unwrap();
    // ease-in: slower than linear at the start, faster in the middle
    let early = real_at(&canvas, node, 2.5);
    let late = real_at(&canvas, node, 7.5);
    assert!(early < 25.0 && early > 0.0);
    assert!(late > 75.0 && late < 100.0);
    approx(real_at(&canvas, node, 5.0), 50.0, 1e-9);
    approx(early + late, 100.0, 1e-9);
}

#[test]
fn tcb_interior_stays_smooth_and_hits_waypoints() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    for (t, v) in [(0.0, 0.0), (5.0, 10.0), (10.0, 0.0)] {
        let id = canvas.new_waypoint(node, Time(t), Value::Real(v)).unwrap();
        canvas
            .update_waypoint(node, id, |w| {
                w.before = Interpolation::Tcb;
                w.after = Interpolation::Tcb;
            })
            .unwrap();
    }
    approx(real_at(&canvas, node, 0.0), 0.0, 1e-12);
    approx(real_at(&canvas, node, 5.0), 10.0, 1e-12);
    approx(real_at(&canvas, node, 10.0), 0.0, 1e-12);
    // symmetric data + zero tension/continuity/bias: flat tangent at the peak
    let before = real_at(&canvas, node, 4.9);
    let after = real_at(&canvas, node, 5.1);
    approx(before, after, 1e-6);
}

#[test]
fn clamped_does_not_overshoot_local_extrema() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    for (t, v) in [(0.0, 0.0), (5.0, 10.0), (10.0, 0.0)] {
        let id = canvas.new_waypoint(node, Time(t), Value::Real(v)).unwrap();
        canvas
            .update_waypoint(node, id, |w| {
                w.before = Interpolation::Clamped;
                w.after = Interpolation::Clamped;
            })
            .unwrap();
    }
    let mut t = 0.0;
    while t <= 10.0 {
        let v = real_at(&canvas, node, t);
        assert!(v <= 10.0 + 1e-9, "overshoot at t={t}: {v}");
        assert!(v >= -1e-9, "undershoot at t={t}: {v}");
        t += 0.25;
    }
}

#[test]
fn integer_tracks_premultiply_and_round() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Integer).unwrap();
    for (t, v) in [(0.0, 0), (10.0, 10)] {
        let id = canvas
            .new_waypoint(node, Time(t), Value::Integer(v))
            .unwrap();
        canvas
            .update_waypoint(node, id, |w| {
                w.before = Interpolation::Linear;
                w.after = Interpolation::Linear;
            })
            .unwrap();
    }
    assert_eq!(canvas.value(node, Time(5.0)), Value::Integer(5));
    // the x768 premultiply rounds to nearest rather than truncating
    assert_eq!(canvas.value(node, Time(2.5)), Value::Integer(3));
}

#[test]
fn bool_tracks_or_between_waypoints() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Bool).unwrap();
    canvas
        .new_waypoint(node, Time(0.0), Value::Bool(false))
        .unwrap();
    canvas
        .new_waypoint(node, Time(10.0), Value::Bool(true))
        .unwrap();
    assert_eq!(canvas.value(node, Time(-1.0)), Value::Bool(false));
    assert_eq!(canvas.value(node, Time(0.0)), Value::Bool(false));
    // between an off and an on waypoint both states count
    assert_eq!(canvas.value(node, Time(5.0)), Value::Bool(true));
    assert_eq!(canvas.value(node, Time(10.0)), Value::Bool(true));
    assert_eq!(canvas.value(node, Time(11.0)), Value::Bool(true));
}

#[test]
fn strings_hold_the_most_recent_waypoint() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::String).unwrap();
    canvas
        .new_waypoint(node, Time(0.0), Value::String("walk".into()))
        .unwrap();
    canvas
        .new_waypoint(node, Time(10.0), Value::String("run".into()))
        .unwrap();
    assert_eq!(canvas.value(node, Time(-5.0)), Value::String("walk".into()));
    assert_eq!(canvas.value(node, Time(9.0)), Value::String("walk".into()));
    assert_eq!(canvas.value(node, Time(10.0)), Value::String("run".into()));
    assert_eq!(canvas.value(node, Time(99.0)), Value::String("run".into()));
}

#[test]
fn node_driven_waypoints_resolve_at_query_time() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    let w0 = canvas.new_waypoint(node, Time(0.0), Value::Real(0.0)).unwrap();
    let driver = canvas.add_const(Value::Real(100.0));
    let w1 = canvas.new_waypoint_node(node, Time(10.0), driver).unwrap();
    for id in [w0, w1] {
        canvas
            .update_waypoint(node, id, |w| {
                w.before = Interpolation::Linear;
                w.after = Interpolation::Linear;
            })
            .unwrap();
    }
    approx(real_at(&canvas, node, 5.0), 50.0, 1e-9);
}

#[test]
fn waypoint_list_stays_sorted_without_duplicate_times() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    canvas.new_waypoint(node, Time(5.0), Value::Real(1.0)).unwrap();
    canvas.new_waypoint(node, Time(0.0), Value::Real(2.0)).unwrap();
    let dup = canvas.new_waypoint(node, Time(10.0), Value::Real(3.0)).unwrap();
    canvas.new_waypoint(node, Time(7.5), Value::Real(4.0)).unwrap();

    let err = canvas
        .new_waypoint(node, Time(5.0), Value::Real(9.0))
        .unwrap_err();
    assert!(matches!(err, GraphError::WaypointExists(_)));

    canvas.erase_waypoint(node, dup).unwrap();
    canvas.new_waypoint(node, Time(10.0), Value::Real(5.0)).unwrap();

    let times: Vec<f64> = canvas
        .waypoints(node)
        .unwrap()
        .iter()
        .map(|w| w.time.0)
        .collect();
    let mut sorted = times.clone();
    sorted.sort_by(f64::total_cmp);
    assert_eq!(times, sorted);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] > 1e-4);
    }
}

#[test]
fn find_family_distinguishes_found_from_not_found() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    let id = canvas.new_waypoint(node, Time(5.0), Value::Real(1.0)).unwrap();
    canvas.new_waypoint(node, Time(10.0), Value::Real(2.0)).unwrap();

    assert_eq!(canvas.find_waypoint(node, Time(5.0)).unwrap().id, id);
    assert!(matches!(
        canvas.find_waypoint(node, Time(6.0)),
        Err(GraphError::WaypointNotFound(_))
    ));
    assert_eq!(
        canvas.find_waypoint_next(node, Time(5.0)).unwrap().time,
        Time(10.0)
    );
    assert_eq!(
        canvas.find_waypoint_prev(node, Time(10.0)).unwrap().time,
        Time(5.0)
    );
    assert!(matches!(
        canvas.find_waypoint_prev(node, Time(5.0)),
        Err(GraphError::WaypointNotFound(_))
    ));
    assert!(matches!(
        canvas.find_waypoint_by_id(node, 999_999),
        Err(GraphError::WaypointIdNotFound(_))
    ));
}

#[test]
fn insert_time_shifts_later_waypoints() {
    let mut canvas = Canvas::new();
    let node = linear_real_track(&mut canvas, &[(0.0, 0.0), (5.0, 5.0), (10.0, 10.0)]);
    canvas.insert_time(node, Time(2.0), Time(3.0)).unwrap();
    let times: Vec<f64> = canvas
        .waypoints(node)
        .unwrap()
        .iter()
        .map(|w| w.time.0)
        .collect();
    assert_eq!(times, vec![0.0, 8.0, 13.0]);
}

#[test]
fn empty_and_single_waypoint_tracks() {
    let mut canvas = Canvas::new();
    let node = canvas.add_animated(ValueType::Real).unwrap();
    assert_eq!(canvas.value(node, Time(3.0)), Value::Real(0.0));
    canvas.new_waypoint(node, Time(5.0), Value::Real(8.0)).unwrap();
    assert_eq!(canvas.value(node, Time(-100.0)), Value::Real(8.0));
    assert_eq!(canvas.value(node, Time(100.0)), Value::Real(8.0));
}

#[test]
fn waypoints_serialize_for_hosts() {
    let mut canvas = Canvas::new();
    let node = linear_real_track(&mut canvas, &[(0.0, 1.0), (2.0, 3.0)]);
    let json = serde_json::to_string(canvas.waypoints(node).unwrap()).unwrap();
    assert!(json.contains("\"linear\""));
    let back: Vec<sinew_graph_core::Waypoint> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back[1].time, Time(2.0));
}

#[test]
fn unsupported_types_cannot_be_animated() {
    let mut canvas = Canvas::new();
    let err = canvas.add_animated(ValueType::Segment).unwrap_err();
    assert!(matches!(err, GraphError::UnsupportedType { .. }));
}
