//! Bone evaluation: chained matrix composition and weighted influence.
//!
//! There is no matrix cache; every query walks the parent chain live at the
//! evaluation time. A parent composes a slightly different matrix for a
//! child than for itself — the child's origin is translated through the
//! parent's local x scale before the parent's own frame applies — and that
//! asymmetry is part of the document compatibility contract.

use sinew_api_core::{ops, Bone, Matrix, Time, Transformation, Value, Vec2};

use crate::canvas::Canvas;
use crate::error::GraphError;
use crate::types::{
    BoneInfluenceLinks, BoneLinkLinks, BoneNodeLinks, BoneWeightPairLinks, NodeId, NodeKind,
};

use super::eval_node::{eval_angle, eval_bool, eval_node, eval_real, eval_vector};

/// Total bone weight below this is treated as zero (identity transform).
const WEIGHT_EPSILON: f64 = 1e-8;

/// Resolve a bone node's parent link at `t`, degrading to the root when the
/// proposed parent is this bone itself or one of its descendants.
fn resolve_parent(
    canvas: &Canvas,
    bone: NodeId,
    links: &BoneNodeLinks,
    t: Time,
    depth: usize,
) -> Result<NodeId, GraphError> {
    let parent_value = eval_node(canvas, links.parent, t, depth + 1)?;
    let Some(parent_ref) = parent_value.as_bone_ref() else {
        return Ok(canvas.root_bone());
    };
    let proposed = NodeId::from(parent_ref);

    // ancestry walk; bounded in case of malformed wiring
    let mut current = proposed;
    for _ in 0..canvas.config().max_depth {
        if current == bone {
            log::error!("a bone cannot be parent of itself or any of its descendants");
            return Ok(canvas.root_bone());
        }
        match &canvas.node(current)?.kind {
            NodeKind::Bone(parent_links) => {
                let up = eval_node(canvas, parent_links.parent, t, depth + 1)?;
                match up.as_bone_ref() {
                    Some(id) => current = NodeId::from(id),
                    None => break,
                }
            }
            _ => break,
        }
    }
    Ok(proposed)
}

/// The matrix a parent exposes when composing for a child attached at
/// `child_origin`. The root's is a pure translation by that origin.
fn bone_matrix_for_child(
    canvas: &Canvas,
    bone: NodeId,
    t: Time,
    child_origin: Vec2,
    depth: usize,
) -> Result<Matrix, GraphError> {
    if depth > canvas.config().max_depth {
        return Err(GraphError::RecursionLimit);
    }
    let node = canvas.node(bone)?;
    match &node.kind {
        NodeKind::BoneRoot => Ok(Matrix::translate(child_origin)),
        NodeKind::Bone(links) => {
            let scalelx = eval_real(canvas, links.scalelx, t, depth)?;
            let scalex = eval_real(canvas, links.scalex, t, depth)?;
            let angle = eval_angle(canvas, links.angle, t, depth)?;
            let origin = eval_vector(canvas, links.origin, t, depth)?;
            let parent = resolve_parent(canvas, bone, links, t, depth)?;
            let parent_matrix = bone_matrix_for_child(canvas, parent, t, origin, depth + 1)?;
            Ok(Matrix::translate(Vec2::new(child_origin.x * scalelx, child_origin.y))
                * Matrix::scale(scalex, 1.0)
                * Matrix::rotate(angle)
                * parent_matrix)
        }
        _ => Err(GraphError::WrongNodeKind),
    }
}

/// A bone's own world matrix: local scale and rotation, then the parent's
/// matrix-for-child at this bone's origin.
fn bone_matrix(
    canvas: &Canvas,
    bone: NodeId,
    links: &BoneNodeLinks,
    t: Time,
    depth: usize,
) -> Result<Matrix, GraphError> {
    let scalex = eval_real(canvas, links.scalex, t, depth)?;
    let angle = eval_angle(canvas, links.angle, t, depth)?;
    let origin = eval_vector(canvas, links.origin, t, depth)?;
    let parent = resolve_parent(canvas, bone, links, t, depth)?;
    let parent_matrix = bone_matrix_for_child(canvas, parent, t, origin, depth + 1)?;
    Ok(Matrix::scale(scalex, 1.0) * Matrix::rotate(angle) * parent_matrix)
}

/// Produce the bone value, with the composed world matrix stamped in.
pub(super) fn eval_bone(
    canvas: &Canvas,
    bone: NodeId,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let node = canvas.node(bone)?;
    match &node.kind {
        NodeKind::BoneRoot => {
            let mut root = Bone::default();
            root.name = "Root Bone".to_string();
            Ok(Value::bone(root))
        }
        NodeKind::Bone(links) => {
            let mut out = Bone::default();
            out.name = eval_node(canvas, links.name, t, depth + 1)?
                .as_string()
                .unwrap_or_default()
                .to_string();
            out.origin = eval_vector(canvas, links.origin, t, depth)?;
            out.angle = eval_angle(canvas, links.angle, t, depth)?;
            out.scalelx = eval_real(canvas, links.scalelx, t, depth)?;
            out.scalex = eval_real(canvas, links.scalex, t, depth)?;
            out.set_length(eval_real(canvas, links.length, t, depth)?);
            out.width = eval_real(canvas, links.width, t, depth)?;
            out.tipwidth = eval_real(canvas, links.tipwidth, t, depth)?;
            out.depth = eval_real(canvas, links.depth, t, depth)?;
            let parent = resolve_parent(canvas, bone, links, t, depth)?;
            out.parent = Some(parent.into());
            out.animated_matrix = bone_matrix(canvas, bone, links, t, depth)?;
            Ok(Value::bone(out))
        }
        _ => Err(GraphError::WrongNodeKind),
    }
}

/// A bone's full transform for attached values: local scale first, then the
/// stamped world matrix.
fn bone_transformation(bone: &Bone) -> Transformation {
    let local = bone.local_scale();
    Transformation::from_matrix(&(Matrix::scale(local.x, local.y) * bone.animated_matrix))
}

pub(super) fn eval_bone_link(
    canvas: &Canvas,
    node: &crate::types::Node,
    links: &BoneLinkLinks,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let base = super::eval_node::eval_typed(canvas, links.base_value, node.value_type(), t, depth)?;
    let bone_ref = eval_node(canvas, links.bone, t, depth + 1)?;
    let Some(bone_id) = bone_ref.as_bone_ref() else {
        return Ok(base);
    };
    let bone_value = eval_node(canvas, NodeId::from(bone_id), t, depth + 1)?;
    let Some(bone) = bone_value.as_bone() else {
        return Ok(base);
    };

    let mut transformation = bone_transformation(bone);
    if !eval_bool(canvas, links.translate, t, depth)? {
        transformation.offset = Vec2::zero();
    }
    if !eval_bool(canvas, links.rotate, t, depth)? {
        transformation.angle = sinew_api_core::Angle::zero();
    }
    if !eval_bool(canvas, links.skew, t, depth)? {
        transformation.skew_angle = sinew_api_core::Angle::zero();
    }
    if !eval_bool(canvas, links.scale_x, t, depth)? {
        transformation.scale.x = 1.0;
    }
    if !eval_bool(canvas, links.scale_y, t, depth)? {
        transformation.scale.y = 1.0;
    }
    Ok(ops::transform(&transformation, &base))
}

/// Blend the weighted matrices of a bone-weight list into one transform.
/// A total weight near zero resolves to the identity, never a division by
/// zero — every weight being zeroed is an ordinary editing state.
fn calculate_transform(
    canvas: &Canvas,
    bone_weight_list: NodeId,
    t: Time,
    depth: usize,
) -> Result<Matrix, GraphError> {
    let list_value = eval_node(canvas, bone_weight_list, t, depth + 1)?;
    let mut transform = Matrix::zero();
    let mut total_weight = 0.0;
    if let Some(list) = list_value.as_list() {
        for item in &list.items {
            let Some(pair) = item.as_bone_weight_pair() else {
                continue;
            };
            let local = pair.bone.local_scale();
            let m = Matrix::scale(local.x, local.y) * pair.bone.animated_matrix;
            transform += m * pair.weight;
            total_weight += pair.weight;
        }
    }
    if total_weight.abs() > WEIGHT_EPSILON {
        Ok(transform * (1.0 / total_weight))
    } else {
        Ok(Matrix::identity())
    }
}

pub(super) fn eval_bone_influence(
    canvas: &Canvas,
    links: &BoneInfluenceLinks,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let transform = calculate_transform(canvas, links.bone_weight_list, t, depth)?;
    let base = eval_vector(canvas, links.link, t, depth)?;
    Ok(Value::Vector(transform.transform_point(base)))
}

pub(super) fn eval_bone_weight_pair(
    canvas: &Canvas,
    links: &BoneWeightPairLinks,
    t: Time,
    depth: usize,
) -> Result<Value, GraphError> {
    let weight = eval_real(canvas, links.weight, t, depth)?;
    let bone_ref = eval_node(canvas, links.bone, t, depth + 1)?;
    let bone = match bone_ref.as_bone_ref() {
        Some(id) => {
            let bone_value = eval_node(canvas, NodeId::from(id), t, depth + 1)?;
            bone_value.as_bone().cloned().unwrap_or_default()
        }
        None => Bone::default(),
    };
    Ok(Value::bone_weight_pair(sinew_api_core::BoneWeightPair::new(
        bone, weight,
    )))
}
