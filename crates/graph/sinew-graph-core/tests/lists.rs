//! List evaluation: activation, entry synthesis, flavored reductions.

use sinew_api_core::{BLinePoint, Time, Value, ValueType, Vec2, WidthPoint};
use sinew_graph_core::{amount_at_time, status_at_time, Canvas, NodeKind};
use sinew_test_fixtures::real_dynamic_list;

fn list_items(value: &Value) -> &[Value] {
    &value.as_list().expect("list value").items
}

#[test]
fn activation_window_controls_membership() {
    let mut canvas = Canvas::new();
    let list = real_dynamic_list(&mut canvas, &[1.0, 2.0, 3.0]);
    // middle entry: on at t=0, off at t=10
    canvas.add_activepoint(list, 1, Time(0.0), true, 0).unwrap();
    canvas.add_activepoint(list, 1, Time(10.0), false, 0).unwrap();

    let on = canvas.value(list, Time(5.0));
    assert_eq!(
        list_items(&on),
        &[Value::Real(1.0), Value::Real(2.0), Value::Real(3.0)]
    );
    // off entries are skipped entirely, preserving the order of the rest
    let off = canvas.value(list, Time(15.0));
    assert_eq!(list_items(&off), &[Value::Real(1.0), Value::Real(3.0)]);
}

#[test]
fn status_and_amount_expose_the_activation_model() {
    let mut canvas = Canvas::new();
    let list = real_dynamic_list(&mut canvas, &[1.0]);
    canvas.add_activepoint(list, 0, Time(0.0), true, 0).unwrap();
    canvas.add_activepoint(list, 0, Time(10.0), false, 0).unwrap();

    let node = canvas.node(list).unwrap();
    let NodeKind::DynamicList(data) = &node.kind else {
        panic!("expected a dynamic list");
    };
    let entry = &data.entries[0];

    assert!(status_at_time(entry, Time(5.0)));
    assert!(!status_at_time(entry, Time(15.0)));

    // the blend amount ramps monotonically across the transition window
    let mut last = amount_at_time(entry, Time(0.0), None);
    for i in 1..=10 {
        let t = Time(i as f64);
        let amount = amount_at_time(entry, t, None);
        assert!(amount <= last + 1e-9, "amount rose while fading out");
        last = amount;
    }
    assert_eq!(amount_at_time(entry, Time(10.0), None), 0.0);
}

#[test]
fn static_list_keeps_every_entry_in_order() {
    let mut canvas = Canvas::new();
    let a = canvas.add_const(Value::Real(0.0));
    let b = canvas.add_const(Value::Real(10.0));
    let c = canvas.add_const(Value::Real(20.0));
    let list = canvas.add_static_list(ValueType::Real, vec![a, b, c]).unwrap();
    let value = canvas.value(list, Time(123.0));
    assert_eq!(
        list_items(&value),
        &[Value::Real(0.0), Value::Real(10.0), Value::Real(20.0)]
    );
}

#[test]
fn create_list_entry_blends_the_neighbors() {
    let mut canvas = Canvas::new();
    let a = canvas.add_const(Value::Real(0.0));
    let b = canvas.add_const(Value::Real(10.0));
    let c = canvas.add_const(Value::Real(20.0));
    let list = canvas.add_static_list(ValueType::Real, vec![a, b, c]).unwrap();

    let inserted = canvas
        .create_list_entry(list, 1, Time(0.0), 0.5)
        .unwrap();
    assert_eq!(canvas.value(inserted, Time(0.0)), Value::Real(15.0));

    // unlooped tail entry has no next neighbor; the entry reproduces it
    let tail = canvas.create_list_entry(list, 2, Time(0.0), 0.25).unwrap();
    assert_eq!(canvas.value(tail, Time(0.0)), Value::Real(20.0));
}

#[test]
fn create_list_entry_synthesizes_a_child_bone() {
    let mut canvas = Canvas::new();
    let mut bone = sinew_api_core::Bone::default();
    bone.set_length(10.0);
    bone.tipwidth = 0.3;
    let bone_node = canvas.add_bone(&bone);
    let list = canvas
        .add_static_list(ValueType::Bone, vec![bone_node])
        .unwrap();

    let synthesized = canvas.create_list_entry(list, 0, Time(0.0), 0.5).unwrap();
    let value = canvas.value(synthesized, Time(0.0));
    let new_bone = value.as_bone().unwrap();
    assert_eq!(new_bone.parent, Some(bone_node.into()));
    assert!((new_bone.origin.x - 11.0).abs() < 1e-9);
    assert!((new_bone.width - 0.3).abs() < 1e-12);
}

#[test]
fn mismatched_items_are_discarded_not_fatal() {
    let mut canvas = Canvas::new();
    let list = real_dynamic_list(&mut canvas, &[1.0, 2.0]);
    // sneak a vector in by rewiring the entry through the link API
    let intruder = canvas.add_const(Value::Vector(Vec2::zero()));
    assert!(canvas.set_link(list, 0, intruder).is_err());
    // the reject left the original wiring in place
    let value = canvas.value(list, Time(0.0));
    assert_eq!(list_items(&value), &[Value::Real(1.0), Value::Real(2.0)]);
}

#[test]
fn average_list_reduces_active_entries() {
    let mut canvas = Canvas::new();
    let list = canvas.add_average(ValueType::Real).unwrap();
    for v in [1.0, 2.0, 6.0] {
        let node = canvas.add_const(Value::Real(v));
        canvas.list_add(list, node, None).unwrap();
    }
    assert_eq!(canvas.value(list, Time(0.0)), Value::Real(3.0));

    // deactivate the largest entry and the mean follows
    canvas.add_activepoint(list, 2, Time(0.0), false, 0).unwrap();
    assert_eq!(canvas.value(list, Time(5.0)), Value::Real(1.5));
}

#[test]
fn weighted_average_list_normalizes_by_total_weight() {
    let mut canvas = Canvas::new();
    let list = canvas.add_weighted_average(ValueType::Real).unwrap();
    let a = canvas.add_const(Value::weighted(1.0, Value::Real(0.0)));
    let b = canvas.add_const(Value::weighted(3.0, Value::Real(10.0)));
    canvas.list_add(list, a, None).unwrap();
    canvas.list_add(list, b, None).unwrap();
    assert_eq!(canvas.value(list, Time(0.0)), Value::Real(7.5));
}

fn spline_point(x: f64, y: f64) -> BLinePoint {
    BLinePoint {
        vertex: Vec2::new(x, y),
        ..BLinePoint::default()
    }
}

#[test]
fn spline_list_passes_fully_on_vertices_through() {
    let mut canvas = Canvas::new();
    let list = canvas.add_bline();
    for p in [
        spline_point(0.0, 0.0),
        spline_point(1.0, 0.0),
        spline_point(2.0, 0.0),
    ] {
        let node = canvas.add_const(Value::BLinePoint(p));
        canvas.list_add(list, node, None).unwrap();
    }
    canvas.set_list_loop(list, true).unwrap();

    let value = canvas.value(list, Time(0.0));
    let list_value = value.as_list().unwrap();
    assert!(list_value.looped);
    assert_eq!(list_value.items.len(), 3);
    let mid = list_value.items[1].as_bline_point().unwrap();
    assert_eq!(mid.vertex, Vec2::new(1.0, 0.0));
}

#[test]
fn vanishing_vertex_blends_toward_the_neighbor_chord() {
    let mut canvas = Canvas::new();
    let list = canvas.add_bline();
    for p in [
        spline_point(0.0, 0.0),
        spline_point(1.0, 1.0),
        spline_point(2.0, 0.0),
    ] {
        let node = canvas.add_const(Value::BLinePoint(p));
        canvas.list_add(list, node, None).unwrap();
    }
    // middle vertex fades out between t=0 and t=10
    canvas.add_activepoint(list, 1, Time(0.0), true, 0).unwrap();
    canvas.add_activepoint(list, 1, Time(10.0), false, 0).unwrap();

    let value = canvas.value(list, Time(5.0));
    let items = value.as_list().unwrap().items.clone();
    assert_eq!(items.len(), 3);
    let mid = items[1].as_bline_point().unwrap();
    // halfway between fully on (1,1) and the chord position (1,0)
    assert!((mid.vertex.x - 1.0).abs() < 1e-9);
    assert!((mid.vertex.y - 0.5).abs() < 1e-9);

    // fully off: the vertex is gone
    let value = canvas.value(list, Time(20.0));
    assert_eq!(value.as_list().unwrap().items.len(), 2);
}

fn width_point(position: f64, width: f64) -> WidthPoint {
    WidthPoint {
        position,
        width,
        ..WidthPoint::default()
    }
}

#[test]
fn width_point_list_eases_widths_in() {
    let mut canvas = Canvas::new();
    let list = canvas.add_wplist();
    for wp in [width_point(0.0, 1.0), width_point(1.0, 3.0)] {
        let node = canvas.add_const(Value::WidthPoint(wp));
        canvas.list_add(list, node, None).unwrap();
    }
    let fading = canvas.add_const(Value::WidthPoint(width_point(0.5, 10.0)));
    canvas.list_add(list, fading, None).unwrap();
    canvas.add_activepoint(list, 2, Time(0.0), false, 0).unwrap();
    canvas.add_activepoint(list, 2, Time(10.0), true, 0).unwrap();

    let value = canvas.value(list, Time(5.0));
    let items = &value.as_list().unwrap().items;
    assert_eq!(items.len(), 3);
    let faded = items
        .iter()
        .filter_map(|v| v.as_width_point())
        .find(|wp| (wp.position - 0.5).abs() < 1e-9)
        .expect("fading point present");
    // halfway between the interpolated width (2.0) and its own width (10.0)
    assert!((faded.width - 6.0).abs() < 1e-9);
}

#[test]
fn dash_item_list_filters_by_status() {
    let mut canvas = Canvas::new();
    let list = canvas.add_dilist();
    for _ in 0..2 {
        let node = canvas.add_const(Value::DashItem(Default::default()));
        canvas.list_add(list, node, None).unwrap();
    }
    canvas.add_activepoint(list, 0, Time(0.0), false, 0).unwrap();
    let value = canvas.value(list, Time(5.0));
    assert_eq!(value.as_list().unwrap().items.len(), 1);
}
