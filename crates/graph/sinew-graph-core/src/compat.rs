//! Version-keyed data migrations.
//!
//! Old documents encoded some values in ways the engine no longer produces.
//! The loader applies these after building each affected node, keyed on the
//! document version string carried by the canvas; newly authored documents
//! are never touched.

use sinew_api_core::{Angle, Value};

use crate::canvas::Canvas;
use crate::error::GraphError;
use crate::types::{ListFlavor, NodeId, NodeKind, WaypointLink};

fn version_in(canvas: &Canvas, versions: &[&str]) -> bool {
    versions.contains(&canvas.version())
}

/// Canvas format 0.1 stored wrapping angles, so a step from -179 to 180
/// degrees meant a 1 degree change; later formats store them unwrapped.
/// Pull each static constant-angle waypoint within 180 degrees of its
/// predecessor so old documents play back identically.
pub fn normalize_constant_angle_waypoints(
    canvas: &mut Canvas,
    node: NodeId,
) -> Result<(), GraphError> {
    if !version_in(canvas, &["0.1"]) {
        return Ok(());
    }
    let waypoints = canvas.waypoints(node)?;
    let mut adjustments: Vec<(u64, Angle)> = Vec::new();
    let mut prev: Option<f64> = None;
    for w in waypoints {
        let angle = match &w.link {
            WaypointLink::Value(Value::Angle(a)) => a.as_deg(),
            _ => continue,
        };
        let mut adjusted = angle;
        if let Some(prev) = prev {
            while adjusted - prev > 180.0 {
                adjusted -= 360.0;
            }
            while prev - adjusted > 180.0 {
                adjusted += 360.0;
            }
            if adjusted != angle {
                adjustments.push((w.id, Angle::deg(adjusted)));
            }
        }
        prev = Some(adjusted);
    }
    for (id, angle) in adjustments {
        canvas.update_waypoint(node, id, |w| {
            w.link = WaypointLink::Value(Value::Angle(angle));
        })?;
    }
    Ok(())
}

/// Looped splines in documents up to format 1.0 were saved with their
/// vertex list rotated by one; rotate the first vertex to the end so the
/// historical indexing is reproduced. Not applied to new documents.
pub fn rotate_looped_spline_entries(canvas: &mut Canvas, node: NodeId) -> Result<(), GraphError> {
    let version_matches =
        canvas.version() == "1.0" || canvas.version().starts_with("0.");
    if !version_matches {
        return Ok(());
    }
    let rotate = matches!(
        &canvas.node(node)?.kind,
        NodeKind::DynamicList(data)
            if data.flavor == ListFlavor::BLine && data.looped && data.entries.len() > 1
    );
    if !rotate {
        return Ok(());
    }
    let first = canvas.get_link(node, 0)?;
    canvas.list_erase(node, first)?;
    canvas.list_add(node, first, None)?;
    Ok(())
}

/// Canvases before format 0.4 saved tangent-calculation outputs scaled down
/// by half. Wrap the node in a scale-by-0.5 so old documents keep their
/// shapes; returns the node to use in place of the original.
pub fn wrap_tangent_scale(canvas: &mut Canvas, node: NodeId) -> Result<NodeId, GraphError> {
    if !version_in(canvas, &["0.1", "0.2", "0.3"]) {
        return Ok(node);
    }
    let ty = canvas.node(node)?.value_type().clone();
    let wrapper = canvas.add_scale(&Value::default_for(&ty))?;
    canvas.set_link_by_name(wrapper, "link", node)?;
    let half = canvas.add_const(Value::Real(0.5));
    canvas.set_link_by_name(wrapper, "scalar", half)?;
    Ok(wrapper)
}
