//! Canvas: the owning document scope for a graph of value nodes.
//!
//! The canvas is an arena — nodes are stored in a map keyed by stable
//! [`NodeId`] and refer to each other only through ids, which sidesteps
//! shared-ownership cycles entirely. All graph mutation goes through the
//! canvas so link types can be checked and waypoint/activepoint ids can be
//! allocated centrally. Evaluation never mutates.

use hashbrown::HashMap;
use sinew_api_core::ops;
use sinew_api_core::{Bone, Time, Value, ValueError, ValueType, Vec2};

use crate::config::EvalConfig;
use crate::error::GraphError;
use crate::types::{
    Activepoint, AddLinks, AnimatedData, BoneInfluenceLinks, BoneLinkLinks, BoneNodeLinks,
    BoneWeightPairLinks, CompositeLinks, DynamicListData, ExpLinks, ListEntry, ListFlavor, Node,
    NodeId, NodeKind, RangeLinks, ScaleLinks, SegTangentLinks, StaticListData, Waypoint,
    WaypointLink,
};

/// Value types an animated node accepts (spline, step or constant-hold).
pub fn is_animatable(ty: &ValueType) -> bool {
    matches!(
        ty,
        ValueType::Integer
            | ValueType::Real
            | ValueType::Time
            | ValueType::Angle
            | ValueType::Vector
            | ValueType::Color
            | ValueType::Gradient
            | ValueType::Bool
            | ValueType::String
            | ValueType::Canvas
            | ValueType::Bone
            | ValueType::BoneRef
    )
}

/// Value types the arithmetic operators (add/subtract/scale) combine.
pub fn is_arithmetic(ty: &ValueType) -> bool {
    matches!(
        ty,
        ValueType::Integer
            | ValueType::Real
            | ValueType::Time
            | ValueType::Angle
            | ValueType::Vector
            | ValueType::Color
            | ValueType::Gradient
    )
}

/// Value types with a total order, usable by the range operator.
pub fn is_orderable(ty: &ValueType) -> bool {
    matches!(
        ty,
        ValueType::Integer | ValueType::Real | ValueType::Time | ValueType::Angle
    )
}

/// Value types a bone link can carry through its transformation.
pub fn is_transformable(ty: &ValueType) -> bool {
    matches!(
        ty,
        ValueType::Angle
            | ValueType::Vector
            | ValueType::Matrix
            | ValueType::Segment
            | ValueType::Transformation
            | ValueType::BLinePoint
            | ValueType::WidthPoint
    )
}

#[derive(Debug)]
pub struct Canvas {
    nodes: HashMap<NodeId, Node>,
    /// The "defs" namespace: export id -> node.
    defs: HashMap<String, NodeId>,
    /// Document format version, as declared by the loader ("1.2" for new
    /// documents). Compatibility shims key on this.
    version: String,
    config: EvalConfig,
    root_bone: NodeId,
    next_node: u64,
    next_uid: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Canvas::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        let mut canvas = Canvas {
            nodes: HashMap::new(),
            defs: HashMap::new(),
            version: crate::CURRENT_CANVAS_VERSION.to_string(),
            config,
            root_bone: NodeId(0),
            next_node: 0,
            next_uid: 0,
        };
        canvas.root_bone = canvas.insert(Node::new(ValueType::Bone, NodeKind::BoneRoot));
        canvas
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Set by the loader for pre-existing documents; see [`crate::compat`].
    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    /// The synthesized root of the bone tree.
    pub fn root_bone(&self) -> NodeId {
        self.root_bone
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.next_node += 1;
        let id = NodeId(self.next_node);
        self.nodes.insert(id, node);
        id
    }

    pub(crate) fn next_uid(&mut self) -> u64 {
        self.next_uid += 1;
        self.next_uid
    }

    // ---- export namespace -------------------------------------------------

    /// Register a node under an export id. Duplicate ids are rejected and
    /// the namespace is left untouched.
    pub fn export(&mut self, id: &str, node: NodeId) -> Result<(), GraphError> {
        if id.is_empty() {
            return Err(GraphError::IdNotFound(String::new()));
        }
        if self.defs.contains_key(id) {
            return Err(GraphError::IdAlreadyExists(id.to_string()));
        }
        let node_ref = self.node_mut(node)?;
        node_ref.export_id = Some(id.to_string());
        self.defs.insert(id.to_string(), node);
        Ok(())
    }

    /// Look up an exported node. Missing ids are a distinct error from type
    /// mismatches so "insert only if absent" flows can branch correctly.
    pub fn lookup(&self, id: &str) -> Result<NodeId, GraphError> {
        self.defs
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::IdNotFound(id.to_string()))
    }

    pub fn unexport(&mut self, id: &str) -> Result<NodeId, GraphError> {
        let node = self
            .defs
            .remove(id)
            .ok_or_else(|| GraphError::IdNotFound(id.to_string()))?;
        if let Ok(n) = self.node_mut(node) {
            n.export_id = None;
        }
        Ok(node)
    }

    // ---- wiring -----------------------------------------------------------

    /// Replace a link by slot index, checking the child's declared type
    /// against the slot's expectation. On failure nothing changes.
    pub fn set_link(
        &mut self,
        node: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), GraphError> {
        let child_ty = self.node(child)?.value_type().clone();
        let parent = self.node(node)?;
        let count = parent.link_count();
        if index >= count {
            return Err(GraphError::BadLinkIndex { index, count });
        }
        let expected = match &parent.kind {
            NodeKind::StaticList(data) => data.contained.clone(),
            NodeKind::DynamicList(data) => item_type(data),
            _ => parent.link_slots()[index].ty.expected(parent),
        };
        if child_ty != expected {
            return Err(GraphError::BadType(ValueError::BadType {
                expected,
                found: child_ty,
            }));
        }
        let parent = self.node_mut(node)?;
        if parent.set_link_raw(index, child) {
            Ok(())
        } else {
            Err(GraphError::BadLinkIndex { index, count })
        }
    }

    /// Replace a link by slot name.
    pub fn set_link_by_name(
        &mut self,
        node: NodeId,
        name: &str,
        child: NodeId,
    ) -> Result<(), GraphError> {
        let index = self
            .node(node)?
            .link_index(name)
            .ok_or_else(|| GraphError::BadLinkName(name.to_string()))?;
        self.set_link(node, index, child)
    }

    pub fn get_link(&self, node: NodeId, index: usize) -> Result<NodeId, GraphError> {
        let n = self.node(node)?;
        n.get_link(index).ok_or(GraphError::BadLinkIndex {
            index,
            count: n.link_count(),
        })
    }

    pub fn get_link_by_name(&self, node: NodeId, name: &str) -> Result<NodeId, GraphError> {
        let index = self
            .node(node)?
            .link_index(name)
            .ok_or_else(|| GraphError::BadLinkName(name.to_string()))?;
        self.get_link(node, index)
    }

    // ---- factories --------------------------------------------------------

    /// A node that always produces the same value.
    pub fn add_const(&mut self, value: Value) -> NodeId {
        let ty = value.value_type();
        self.insert(Node::new(ty, NodeKind::Const(value)))
    }

    /// An animated node of the given type, with no waypoints yet.
    pub fn add_animated(&mut self, ty: ValueType) -> Result<NodeId, GraphError> {
        if !is_animatable(&ty) {
            return Err(GraphError::UnsupportedType {
                kind: "animated",
                ty,
            });
        }
        Ok(self.insert(Node::new(ty, NodeKind::Animated(AnimatedData::default()))))
    }

    fn seeded_pair(&mut self, value: &Value) -> (NodeId, NodeId) {
        let lhs = self.add_const(value.clone());
        let rhs = self.add_const(Value::default_for(&value.value_type()));
        (lhs, rhs)
    }

    /// `(lhs + rhs) * scalar`, seeded so the node initially reproduces
    /// `value`.
    pub fn add_add(&mut self, value: &Value) -> Result<NodeId, GraphError> {
        let ty = value.value_type();
        if !is_arithmetic(&ty) {
            return Err(GraphError::UnsupportedType { kind: "add", ty });
        }
        let (lhs, rhs) = self.seeded_pair(value);
        let scalar = self.add_const(Value::Real(1.0));
        Ok(self.insert(Node::new(ty, NodeKind::Add(AddLinks { lhs, rhs, scalar }))))
    }

    /// `(lhs - rhs) * scalar`.
    pub fn add_subtract(&mut self, value: &Value) -> Result<NodeId, GraphError> {
        let ty = value.value_type();
        if !is_arithmetic(&ty) {
            return Err(GraphError::UnsupportedType {
                kind: "subtract",
                ty,
            });
        }
        let (lhs, rhs) = self.seeded_pair(value);
        let scalar = self.add_const(Value::Real(1.0));
        Ok(self.insert(Node::new(
            ty,
            NodeKind::Subtract(AddLinks { lhs, rhs, scalar }),
        )))
    }

    /// `link * scalar`.
    pub fn add_scale(&mut self, value: &Value) -> Result<NodeId, GraphError> {
        let ty = value.value_type();
        if !is_arithmetic(&ty) {
            return Err(GraphError::UnsupportedType { kind: "scale", ty });
        }
        let link = self.add_const(value.clone());
        let scalar = self.add_const(Value::Real(1.0));
        Ok(self.insert(Node::new(ty, NodeKind::Scale(ScaleLinks { link, scalar }))))
    }

    /// `e^exp * scale`, seeded to reproduce `value`.
    pub fn add_exp(&mut self, value: f64) -> NodeId {
        let exp = self.add_const(Value::Real(0.0));
        let scale = self.add_const(Value::Real(value));
        self.insert(Node::new(
            ValueType::Real,
            NodeKind::Exp(ExpLinks { exp, scale }),
        ))
    }

    /// `link` clamped into `[min, max]`.
    pub fn add_range(&mut self, value: &Value) -> Result<NodeId, GraphError> {
        let ty = value.value_type();
        if !is_orderable(&ty) {
            return Err(GraphError::UnsupportedType { kind: "range", ty });
        }
        let min = self.add_const(value.clone());
        let max = self.add_const(value.clone());
        let link = self.add_const(value.clone());
        Ok(self.insert(Node::new(
            ty,
            NodeKind::Range(RangeLinks { min, max, link }),
        )))
    }

    /// A structured value assembled from per-component children, seeded by
    /// decomposing `value`.
    pub fn add_composite(&mut self, value: &Value) -> Result<NodeId, GraphError> {
        let ty = value.value_type();
        let components: Vec<NodeId> = match value {
            Value::Vector(v) => vec![
                self.add_const(Value::Real(v.x)),
                self.add_const(Value::Real(v.y)),
            ],
            Value::Color(c) => vec![
                self.add_const(Value::Real(c.r)),
                self.add_const(Value::Real(c.g)),
                self.add_const(Value::Real(c.b)),
                self.add_const(Value::Real(c.a)),
            ],
            Value::Segment(s) => vec![
                self.add_const(Value::Vector(s.p1)),
                self.add_const(Value::Vector(s.t1)),
                self.add_const(Value::Vector(s.p2)),
                self.add_const(Value::Vector(s.t2)),
            ],
            Value::BLinePoint(bp) => vec![
                self.add_const(Value::Vector(bp.vertex)),
                self.add_const(Value::Real(bp.width)),
                self.add_const(Value::Real(bp.origin)),
                self.add_const(Value::Bool(bp.split_tangent)),
                self.add_const(Value::Vector(bp.tangent1)),
                self.add_const(Value::Vector(bp.tangent2)),
            ],
            Value::WidthPoint(wp) => vec![
                self.add_const(Value::Real(wp.position)),
                self.add_const(Value::Real(wp.width)),
                self.add_const(Value::Integer(wp.side_before as i64)),
                self.add_const(Value::Integer(wp.side_after as i64)),
                self.add_const(Value::Real(wp.lower_bound)),
                self.add_const(Value::Real(wp.upper_bound)),
            ],
            Value::DashItem(di) => vec![
                self.add_const(Value::Real(di.offset)),
                self.add_const(Value::Real(di.length)),
                self.add_const(Value::Integer(di.side_before as i64)),
                self.add_const(Value::Integer(di.side_after as i64)),
            ],
            Value::Transformation(t) => vec![
                self.add_const(Value::Vector(t.offset)),
                self.add_const(Value::Angle(t.angle)),
                self.add_const(Value::Angle(t.skew_angle)),
                self.add_const(Value::Vector(t.scale)),
            ],
            Value::Weighted { weight, value } => vec![
                self.add_const(Value::Real(*weight)),
                self.add_const((**value).clone()),
            ],
            _ => {
                return Err(GraphError::UnsupportedType {
                    kind: "composite",
                    ty,
                })
            }
        };
        Ok(self.insert(Node::new(
            ty,
            NodeKind::Composite(CompositeLinks { components }),
        )))
    }

    /// The tangent of a segment at a fractional position along it.
    pub fn add_seg_calc_tangent(&mut self) -> NodeId {
        let segment = self.add_const(Value::Segment(Default::default()));
        let amount = self.add_const(Value::Real(0.5));
        self.insert(Node::new(
            ValueType::Vector,
            NodeKind::SegCalcTangent(SegTangentLinks { segment, amount }),
        ))
    }

    /// A bone node seeded from a bone value; the parent link points at the
    /// root when the value names no parent.
    pub fn add_bone(&mut self, bone: &Bone) -> NodeId {
        let parent_id = bone.parent.map(NodeId::from).unwrap_or(self.root_bone);
        let links = BoneNodeLinks {
            name: self.add_const(Value::String(bone.name.clone())),
            parent: self.add_const(Value::BoneRef(parent_id.into())),
            origin: self.add_const(Value::Vector(bone.origin)),
            angle: self.add_const(Value::Angle(bone.angle)),
            scalelx: self.add_const(Value::Real(bone.scalelx)),
            scalex: self.add_const(Value::Real(bone.scalex)),
            length: self.add_const(Value::Real(bone.length())),
            width: self.add_const(Value::Real(bone.width)),
            tipwidth: self.add_const(Value::Real(bone.tipwidth)),
            depth: self.add_const(Value::Real(bone.depth)),
        };
        self.insert(Node::new(ValueType::Bone, NodeKind::Bone(links)))
    }

    /// A value carried by a single bone's transformation, with every
    /// component of the transform individually suppressible.
    pub fn add_bone_link(&mut self, bone: NodeId, base: &Value) -> Result<NodeId, GraphError> {
        let ty = base.value_type();
        if !is_transformable(&ty) {
            return Err(GraphError::UnsupportedType {
                kind: "bonelink",
                ty,
            });
        }
        let links = BoneLinkLinks {
            bone: self.add_const(Value::BoneRef(bone.into())),
            base_value: self.add_const(base.clone()),
            translate: self.add_const(Value::Bool(true)),
            rotate: self.add_const(Value::Bool(true)),
            skew: self.add_const(Value::Bool(true)),
            scale_x: self.add_const(Value::Bool(true)),
            scale_y: self.add_const(Value::Bool(true)),
        };
        Ok(self.insert(Node::new(ty, NodeKind::BoneLink(links))))
    }

    /// A vertex deformed by a weighted set of bones.
    pub fn add_bone_influence(&mut self, base: Vec2) -> NodeId {
        let bone_weight_list = self.add_dynamic_list(ValueType::BoneWeightPair);
        let link = self.add_const(Value::Vector(base));
        self.insert(Node::new(
            ValueType::Vector,
            NodeKind::BoneInfluence(BoneInfluenceLinks {
                bone_weight_list,
                link,
            }),
        ))
    }

    pub fn add_bone_weight_pair(&mut self, bone: NodeId, weight: f64) -> NodeId {
        let links = BoneWeightPairLinks {
            bone: self.add_const(Value::BoneRef(bone.into())),
            weight: self.add_const(Value::Real(weight)),
        };
        self.insert(Node::new(
            ValueType::BoneWeightPair,
            NodeKind::BoneWeightPair(links),
        ))
    }

    /// A fixed-arity ordered list; every entry visible at all times.
    pub fn add_static_list(
        &mut self,
        contained: ValueType,
        entries: Vec<NodeId>,
    ) -> Result<NodeId, GraphError> {
        for &entry in &entries {
            let found = self.node(entry)?.value_type().clone();
            if found != contained {
                return Err(GraphError::BadType(ValueError::BadType {
                    expected: contained,
                    found,
                }));
            }
        }
        Ok(self.insert(Node::new(
            ValueType::List,
            NodeKind::StaticList(StaticListData {
                contained,
                looped: false,
                entries,
            }),
        )))
    }

    fn add_list_flavor(&mut self, data: DynamicListData, ty: ValueType) -> NodeId {
        self.insert(Node::new(ty, NodeKind::DynamicList(data)))
    }

    pub fn add_dynamic_list(&mut self, contained: ValueType) -> NodeId {
        self.add_list_flavor(
            DynamicListData {
                contained,
                looped: false,
                flavor: ListFlavor::Plain,
                entries: Vec::new(),
            },
            ValueType::List,
        )
    }

    /// A spline vertex list. New vector polygons start out looped.
    pub fn add_bline(&mut self) -> NodeId {
        self.add_list_flavor(
            DynamicListData {
                contained: ValueType::BLinePoint,
                looped: false,
                flavor: ListFlavor::BLine,
                entries: Vec::new(),
            },
            ValueType::List,
        )
    }

    pub fn add_wplist(&mut self) -> NodeId {
        self.add_list_flavor(
            DynamicListData {
                contained: ValueType::WidthPoint,
                looped: false,
                flavor: ListFlavor::WpList,
                entries: Vec::new(),
            },
            ValueType::List,
        )
    }

    pub fn add_dilist(&mut self) -> NodeId {
        self.add_list_flavor(
            DynamicListData {
                contained: ValueType::DashItem,
                looped: false,
                flavor: ListFlavor::DiList,
                entries: Vec::new(),
            },
            ValueType::List,
        )
    }

    /// Active entries reduced to their arithmetic mean; the node's declared
    /// type is the contained type.
    pub fn add_average(&mut self, contained: ValueType) -> Result<NodeId, GraphError> {
        if !ops::is_averageable(&contained) {
            return Err(GraphError::UnsupportedType {
                kind: "average",
                ty: contained,
            });
        }
        Ok(self.add_list_flavor(
            DynamicListData {
                contained: contained.clone(),
                looped: false,
                flavor: ListFlavor::Average,
                entries: Vec::new(),
            },
            contained,
        ))
    }

    /// Active `Weighted` entries reduced to their weighted mean.
    pub fn add_weighted_average(&mut self, contained: ValueType) -> Result<NodeId, GraphError> {
        if !ops::is_averageable(&contained) {
            return Err(GraphError::UnsupportedType {
                kind: "weighted_average",
                ty: contained,
            });
        }
        Ok(self.add_list_flavor(
            DynamicListData {
                contained: contained.clone(),
                looped: false,
                flavor: ListFlavor::WeightedAverage,
                entries: Vec::new(),
            },
            contained,
        ))
    }

    pub fn set_list_loop(&mut self, node: NodeId, looped: bool) -> Result<(), GraphError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::StaticList(data) => {
                data.looped = looped;
                Ok(())
            }
            NodeKind::DynamicList(data) => {
                data.looped = looped;
                Ok(())
            }
            _ => Err(GraphError::WrongNodeKind),
        }
    }

    // ---- list CRUD --------------------------------------------------------

    /// Append (index `None`) or insert a child into a list node. The child's
    /// declared type must match the list's item type.
    pub fn list_add(
        &mut self,
        node: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> Result<(), GraphError> {
        let child_ty = self.node(child)?.value_type().clone();
        let n = self.node_mut(node)?;
        match &mut n.kind {
            NodeKind::StaticList(data) => {
                if child_ty != data.contained {
                    return Err(GraphError::BadType(ValueError::BadType {
                        expected: data.contained.clone(),
                        found: child_ty,
                    }));
                }
                match index {
                    Some(i) if i < data.entries.len() => data.entries.insert(i, child),
                    _ => data.entries.push(child),
                }
                Ok(())
            }
            NodeKind::DynamicList(data) => {
                let expected = item_type(data);
                if child_ty != expected {
                    return Err(GraphError::BadType(ValueError::BadType {
                        expected,
                        found: child_ty,
                    }));
                }
                let entry = ListEntry::new(child);
                match index {
                    Some(i) if i < data.entries.len() => data.entries.insert(i, entry),
                    _ => data.entries.push(entry),
                }
                Ok(())
            }
            _ => Err(GraphError::WrongNodeKind),
        }
    }

    /// Remove the first entry whose child is `child`.
    pub fn list_erase(&mut self, node: NodeId, child: NodeId) -> Result<(), GraphError> {
        let n = self.node_mut(node)?;
        match &mut n.kind {
            NodeKind::StaticList(data) => {
                let pos = data
                    .entries
                    .iter()
                    .position(|&e| e == child)
                    .ok_or(GraphError::NodeNotFound(child))?;
                data.entries.remove(pos);
                Ok(())
            }
            NodeKind::DynamicList(data) => {
                let pos = data
                    .entries
                    .iter()
                    .position(|e| e.node == child)
                    .ok_or(GraphError::NodeNotFound(child))?;
                data.entries.remove(pos);
                Ok(())
            }
            _ => Err(GraphError::WrongNodeKind),
        }
    }

    /// Add an activepoint to one dynamic-list entry, keeping the timeline
    /// sorted. Returns the activepoint id.
    pub fn add_activepoint(
        &mut self,
        node: NodeId,
        entry: usize,
        time: Time,
        state: bool,
        priority: i32,
    ) -> Result<u64, GraphError> {
        let id = self.next_uid();
        let n = self.node_mut(node)?;
        let NodeKind::DynamicList(data) = &mut n.kind else {
            return Err(GraphError::WrongNodeKind);
        };
        let count = data.entries.len();
        let e = data
            .entries
            .get_mut(entry)
            .ok_or(GraphError::BadListIndex {
                index: entry,
                count,
            })?;
        e.timing.push(Activepoint {
            id,
            time,
            state,
            priority,
        });
        e.timing.sort_by(|a, b| a.time.0.total_cmp(&b.time.0));
        Ok(id)
    }

    pub fn erase_activepoint(
        &mut self,
        node: NodeId,
        entry: usize,
        id: u64,
    ) -> Result<(), GraphError> {
        let n = self.node_mut(node)?;
        let NodeKind::DynamicList(data) = &mut n.kind else {
            return Err(GraphError::WrongNodeKind);
        };
        let count = data.entries.len();
        let e = data
            .entries
            .get_mut(entry)
            .ok_or(GraphError::BadListIndex {
                index: entry,
                count,
            })?;
        let pos = e
            .timing
            .iter()
            .position(|ap| ap.id == id)
            .ok_or(GraphError::ActivepointIdNotFound(id))?;
        e.timing.remove(pos);
        Ok(())
    }

    /// Synthesize a new entry to insert between `index` and `index + 1`,
    /// blending the two neighbors at `time` by the fractional `origin`.
    /// Bone lists instead synthesize a child bone hanging off the indexed
    /// entry (an editor convenience, not a rendering rule).
    pub fn create_list_entry(
        &mut self,
        node: NodeId,
        index: usize,
        time: Time,
        origin: f64,
    ) -> Result<NodeId, GraphError> {
        let (contained, looped, entries) = match &self.node(node)?.kind {
            NodeKind::StaticList(data) => {
                (data.contained.clone(), data.looped, data.entries.clone())
            }
            NodeKind::DynamicList(data) => (
                data.contained.clone(),
                data.looped,
                data.entries.iter().map(|e| e.node).collect(),
            ),
            _ => return Err(GraphError::WrongNodeKind),
        };

        if entries.is_empty() {
            return Ok(self.add_const(Value::default_for(&contained)));
        }
        let index = index % entries.len();
        let prev_node = entries[index];
        let next_node = if index + 1 < entries.len() {
            entries[index + 1]
        } else if looped {
            entries[0]
        } else {
            entries[index]
        };

        if contained == ValueType::Bone {
            // Hang a new bone off the indexed entry, just past its tip.
            let next = self.value(prev_node, time);
            let mut new_bone = Bone::default();
            if let Some(b) = next.as_bone() {
                new_bone.origin = Vec2::new(1.1 * b.length(), 0.0);
                new_bone.width = b.tipwidth;
                new_bone.tipwidth = b.tipwidth;
                new_bone.depth = b.depth;
            }
            new_bone.parent = Some(prev_node.into());
            return Ok(self.add_bone(&new_bone));
        }

        let prev = self.value(prev_node, time);
        let next = self.value(next_node, time);
        let blended = match (&prev, &next) {
            (Value::Vector(a), Value::Vector(b)) => Value::Vector(*a + (*b - *a) * origin),
            (Value::Real(a), Value::Real(b)) => Value::Real(a + (b - a) * origin),
            (Value::Color(a), Value::Color(b)) => Value::Color(*a + (*b - *a) * origin),
            (Value::Angle(a), Value::Angle(b)) => Value::Angle(*a + (*b - *a) * origin),
            (Value::Time(a), Value::Time(b)) => Value::Time(*a + (*b - *a) * origin),
            _ => Value::default_for(&contained),
        };
        Ok(self.add_const(blended))
    }

    // ---- waypoint CRUD ----------------------------------------------------

    fn animated_data(&self, node: NodeId) -> Result<&AnimatedData, GraphError> {
        match &self.node(node)?.kind {
            NodeKind::Animated(data) => Ok(data),
            _ => Err(GraphError::WrongNodeKind),
        }
    }

    fn animated_data_mut(&mut self, node: NodeId) -> Result<&mut AnimatedData, GraphError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Animated(data) => Ok(data),
            _ => Err(GraphError::WrongNodeKind),
        }
    }

    pub fn waypoints(&self, node: NodeId) -> Result<&[Waypoint], GraphError> {
        Ok(&self.animated_data(node)?.waypoints)
    }

    fn push_waypoint(
        &mut self,
        node: NodeId,
        time: Time,
        link: WaypointLink,
    ) -> Result<u64, GraphError> {
        if let WaypointLink::Value(value) = &link {
            let expected = self.node(node)?.value_type().clone();
            value.check_type(&expected)?;
        }
        if self.find_waypoint(node, time).is_ok() {
            return Err(GraphError::WaypointExists(time));
        }
        let id = self.next_uid();
        let data = self.animated_data_mut(node)?;
        data.waypoints.push(Waypoint::new(id, time, link));
        data.waypoints.sort_by(|a, b| a.time.0.total_cmp(&b.time.0));
        Ok(id)
    }

    /// Insert a waypoint holding a plain value. Fails with
    /// [`GraphError::WaypointExists`] if a waypoint already sits at `time`.
    pub fn new_waypoint(&mut self, node: NodeId, time: Time, value: Value) -> Result<u64, GraphError> {
        self.push_waypoint(node, time, WaypointLink::Value(value))
    }

    /// Insert a waypoint driven by another node.
    pub fn new_waypoint_node(
        &mut self,
        node: NodeId,
        time: Time,
        child: NodeId,
    ) -> Result<u64, GraphError> {
        let expected = self.node(node)?.value_type().clone();
        let found = self.node(child)?.value_type().clone();
        if found != expected {
            return Err(GraphError::BadType(ValueError::BadType {
                expected,
                found,
            }));
        }
        self.push_waypoint(node, time, WaypointLink::Node(child))
    }

    pub fn erase_waypoint(&mut self, node: NodeId, id: u64) -> Result<(), GraphError> {
        let data = self.animated_data_mut(node)?;
        let pos = data
            .waypoints
            .iter()
            .position(|w| w.id == id)
            .ok_or(GraphError::WaypointIdNotFound(id))?;
        data.waypoints.remove(pos);
        Ok(())
    }

    /// Exact-time lookup (binary search over the sorted list).
    pub fn find_waypoint(&self, node: NodeId, time: Time) -> Result<&Waypoint, GraphError> {
        let data = self.animated_data(node)?;
        let i = data
            .waypoints
            .partition_point(|w| w.time.0 < time.0 && !w.time.is_equal(time));
        match data.waypoints.get(i) {
            Some(w) if w.time.is_equal(time) => Ok(w),
            _ => Err(GraphError::WaypointNotFound(time)),
        }
    }

    /// First waypoint strictly after `time`.
    pub fn find_waypoint_next(&self, node: NodeId, time: Time) -> Result<&Waypoint, GraphError> {
        let data = self.animated_data(node)?;
        data.waypoints
            .iter()
            .find(|w| w.time.is_more_than(time))
            .ok_or(GraphError::WaypointNotFound(time))
    }

    /// Last waypoint strictly before `time`.
    pub fn find_waypoint_prev(&self, node: NodeId, time: Time) -> Result<&Waypoint, GraphError> {
        let data = self.animated_data(node)?;
        data.waypoints
            .iter()
            .rev()
            .find(|w| w.time.is_less_than(time))
            .ok_or(GraphError::WaypointNotFound(time))
    }

    pub fn find_waypoint_by_id(&self, node: NodeId, id: u64) -> Result<&Waypoint, GraphError> {
        self.animated_data(node)?
            .waypoints
            .iter()
            .find(|w| w.id == id)
            .ok_or(GraphError::WaypointIdNotFound(id))
    }

    /// Update a waypoint in place through a closure; re-sorts and rejects a
    /// move onto another waypoint's time.
    pub fn update_waypoint(
        &mut self,
        node: NodeId,
        id: u64,
        f: impl FnOnce(&mut Waypoint),
    ) -> Result<(), GraphError> {
        let data = self.animated_data(node)?;
        let pos = data
            .waypoints
            .iter()
            .position(|w| w.id == id)
            .ok_or(GraphError::WaypointIdNotFound(id))?;
        let mut updated = data.waypoints[pos].clone();
        f(&mut updated);
        let collides = data
            .waypoints
            .iter()
            .any(|w| w.id != id && w.time.is_equal(updated.time));
        if collides {
            return Err(GraphError::WaypointExists(updated.time));
        }
        let data = self.animated_data_mut(node)?;
        data.waypoints[pos] = updated;
        data.waypoints.sort_by(|a, b| a.time.0.total_cmp(&b.time.0));
        Ok(())
    }

    /// Shift every waypoint after `location` by `delta`.
    pub fn insert_time(
        &mut self,
        node: NodeId,
        location: Time,
        delta: Time,
    ) -> Result<(), GraphError> {
        if delta.0 == 0.0 {
            return Ok(());
        }
        let data = self.animated_data_mut(node)?;
        for w in data.waypoints.iter_mut() {
            if w.time.is_more_than(location) {
                w.time = w.time + delta;
            }
        }
        data.waypoints.sort_by(|a, b| a.time.0.total_cmp(&b.time.0));
        Ok(())
    }

    // ---- evaluation -------------------------------------------------------

    /// Evaluate a node at a time. Pure in `t` and the current wiring;
    /// subtree failures are logged and resolved to the node's type default
    /// so one malformed branch cannot abort a whole scene.
    pub fn value(&self, node: NodeId, t: Time) -> Value {
        match self.try_value(node, t) {
            Ok(v) => v,
            Err(err) => {
                let ty = self
                    .node(node)
                    .map(|n| n.value_type().clone())
                    .unwrap_or(ValueType::Nil);
                log::warn!("evaluation of node {node:?} failed ({err}); substituting default");
                Value::default_for(&ty)
            }
        }
    }

    /// Evaluate a node, surfacing the typed error instead of defaulting.
    pub fn try_value(&self, node: NodeId, t: Time) -> Result<Value, GraphError> {
        crate::eval::eval_node(self, node, t, 0)
    }

    /// Whether the bone produced by `node` has any influence on `point` at
    /// `t` (its capsule shape scores above zero there).
    pub fn have_influence_on(&self, node: NodeId, t: Time, point: Vec2) -> bool {
        self.value(node, t)
            .as_bone()
            .map(|bone| bone.have_influence_on(point))
            .unwrap_or(false)
    }
}

/// The declared type of a dynamic list's items; weighted-average lists hold
/// `Weighted` wrappers of the contained type.
pub fn item_type(data: &DynamicListData) -> ValueType {
    match data.flavor {
        ListFlavor::WeightedAverage => ValueType::Weighted(Box::new(data.contained.clone())),
        _ => data.contained.clone(),
    }
}
