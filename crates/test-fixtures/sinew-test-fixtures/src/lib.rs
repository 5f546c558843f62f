//! Canned canvases shared by the integration tests.

use sinew_api_core::{Angle, Bone, Time, Value, ValueType, Vec2};
use sinew_graph_core::{Canvas, Interpolation, NodeId};

/// An animated real with linear waypoints at the given `(time, value)`
/// pairs.
pub fn linear_real_track(canvas: &mut Canvas, keys: &[(f64, f64)]) -> NodeId {
    let node = canvas
        .add_animated(ValueType::Real)
        .expect("reals are animatable");
    for (time, value) in keys {
        let id = canvas
            .new_waypoint(node, Time(*time), Value::Real(*value))
            .expect("fixture waypoints are distinct");
        canvas
            .update_waypoint(node, id, |w| {
                w.before = Interpolation::Linear;
                w.after = Interpolation::Linear;
            })
            .unwrap();
    }
    node
}

/// A two-bone chain: a root-parented bone and a child hanging off it.
/// Returns `(parent, child)`.
pub fn two_bone_chain(
    canvas: &mut Canvas,
    parent_angle: Angle,
    parent_length: f64,
    child_origin: Vec2,
    child_length: f64,
) -> (NodeId, NodeId) {
    let mut parent = Bone::default();
    parent.name = "parent".to_string();
    parent.angle = parent_angle;
    parent.set_length(parent_length);
    let parent_node = canvas.add_bone(&parent);

    let mut child = Bone::default();
    child.name = "child".to_string();
    child.origin = child_origin;
    child.set_length(child_length);
    child.parent = Some(parent_node.into());
    let child_node = canvas.add_bone(&child);

    (parent_node, child_node)
}

/// A dynamic list of constant reals, one entry per value, no activepoints.
pub fn real_dynamic_list(canvas: &mut Canvas, values: &[f64]) -> NodeId {
    let list = canvas.add_dynamic_list(ValueType::Real);
    for v in values {
        let node = canvas.add_const(Value::Real(*v));
        canvas.list_add(list, node, None).unwrap();
    }
    list
}
