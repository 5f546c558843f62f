//! Graph data model: nodes, the closed kind enumeration, link tables,
//! waypoints and list activation points.
//!
//! Nodes live in an arena owned by [`Canvas`](crate::canvas::Canvas) and
//! refer to each other by stable [`NodeId`]. There is no reference counting
//! and no downcasting: every kind the engine knows is a variant of
//! [`NodeKind`], and link access is table-driven.

use serde::{Deserialize, Serialize};
use sinew_api_core::{BoneId, Time, Value, ValueType};
use uuid::Uuid;

/// Stable id of a node inside its canvas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl From<NodeId> for BoneId {
    fn from(id: NodeId) -> BoneId {
        BoneId(id.0)
    }
}

impl From<BoneId> for NodeId {
    fn from(id: BoneId) -> NodeId {
        NodeId(id.0)
    }
}

/// Interpolation mode on one side of a waypoint.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Tcb,
    Constant,
    Linear,
    Halt,
    #[default]
    Clamped,
    Manual,
    Undefined,
}

/// What a waypoint holds: a plain value, or another node driving the
/// keyframe (the two are mutually exclusive).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointLink {
    Value(Value),
    Node(NodeId),
}

/// A keyframe of an animated node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: u64,
    pub time: Time,
    pub link: WaypointLink,
    pub before: Interpolation,
    pub after: Interpolation,
    /// Kochanek-Bartels parameters; meaningful only under `Tcb`.
    pub tension: f64,
    pub continuity: f64,
    pub bias: f64,
    /// Eases the time axis of the outgoing segment independently of shape.
    pub temporal_tension: f64,
}

impl Waypoint {
    pub fn new(id: u64, time: Time, link: WaypointLink) -> Self {
        Waypoint {
            id,
            time,
            link,
            before: Interpolation::default(),
            after: Interpolation::default(),
            tension: 0.0,
            continuity: 0.0,
            bias: 0.0,
            temporal_tension: 0.0,
        }
    }

    /// A waypoint is static when it carries a plain value; node-driven
    /// waypoints must be re-resolved at every evaluation time.
    pub fn is_static(&self) -> bool {
        matches!(self.link, WaypointLink::Value(_))
    }
}

/// The waypoint sequence of an animated node, kept sorted by time with no
/// two waypoints at the same instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimatedData {
    pub waypoints: Vec<Waypoint>,
}

/// A timestamped on/off toggle controlling one dynamic-list entry.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activepoint {
    pub id: u64,
    pub time: Time,
    pub state: bool,
    /// Higher priority wins when two activepoints bracket a query time.
    pub priority: i32,
}

/// One dynamic-list item: a child node plus its activation timeline,
/// kept sorted by time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub node: NodeId,
    pub timing: Vec<Activepoint>,
}

impl ListEntry {
    pub fn new(node: NodeId) -> Self {
        ListEntry {
            node,
            timing: Vec::new(),
        }
    }
}

/// Behavioral flavor of a dynamic list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListFlavor {
    #[default]
    Plain,
    /// Spline vertices; partially-on vertices blend along the neighbor
    /// chord, and the loop flag is carried into the produced value.
    BLine,
    /// Width points; partially-on points blend their width against the
    /// fully-on interpolation.
    WpList,
    /// Dash items; plain on/off filtering.
    DiList,
    /// Active items reduced to their arithmetic mean.
    Average,
    /// Active `Weighted` items reduced to their weighted mean.
    WeightedAverage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynamicListData {
    pub contained: ValueType,
    pub looped: bool,
    pub flavor: ListFlavor,
    pub entries: Vec<ListEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticListData {
    pub contained: ValueType,
    pub looped: bool,
    pub entries: Vec<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddLinks {
    pub lhs: NodeId,
    pub rhs: NodeId,
    pub scalar: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleLinks {
    pub link: NodeId,
    pub scalar: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpLinks {
    pub exp: NodeId,
    pub scale: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeLinks {
    pub min: NodeId,
    pub max: NodeId,
    pub link: NodeId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositeLinks {
    /// One child per slot of the declared type's table, in table order.
    pub components: Vec<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegTangentLinks {
    pub segment: NodeId,
    pub amount: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneNodeLinks {
    pub name: NodeId,
    pub parent: NodeId,
    pub origin: NodeId,
    pub angle: NodeId,
    pub scalelx: NodeId,
    pub scalex: NodeId,
    pub length: NodeId,
    pub width: NodeId,
    pub tipwidth: NodeId,
    pub depth: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneLinkLinks {
    pub bone: NodeId,
    pub base_value: NodeId,
    pub translate: NodeId,
    pub rotate: NodeId,
    pub skew: NodeId,
    pub scale_x: NodeId,
    pub scale_y: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneInfluenceLinks {
    pub bone_weight_list: NodeId,
    pub link: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneWeightPairLinks {
    pub bone: NodeId,
    pub weight: NodeId,
}

/// The closed set of node kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Const(Value),
    Animated(AnimatedData),
    Add(AddLinks),
    Subtract(AddLinks),
    Scale(ScaleLinks),
    Exp(ExpLinks),
    Range(RangeLinks),
    Composite(CompositeLinks),
    SegCalcTangent(SegTangentLinks),
    Bone(BoneNodeLinks),
    /// The synthesized root of the bone tree; exactly one per canvas.
    BoneRoot,
    BoneLink(BoneLinkLinks),
    BoneInfluence(BoneInfluenceLinks),
    BoneWeightPair(BoneWeightPairLinks),
    StaticList(StaticListData),
    DynamicList(DynamicListData),
}

/// Type constraint on one link slot, resolved against the owning node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotType {
    Bool,
    Integer,
    Real,
    Angle,
    Vector,
    Segment,
    String,
    BoneRef,
    List,
    /// Same type as the owning node's declared type.
    SameAsNode,
    /// The contained type of the owning node's declared `Weighted` type.
    WeightedInner,
}

/// One row of a node kind's declarative link table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkSlot {
    pub name: &'static str,
    pub ty: SlotType,
}

const fn slot(name: &'static str, ty: SlotType) -> LinkSlot {
    LinkSlot { name, ty }
}

pub const ADD_SLOTS: &[LinkSlot] = &[
    slot("lhs", SlotType::SameAsNode),
    slot("rhs", SlotType::SameAsNode),
    slot("scalar", SlotType::Real),
];

pub const SCALE_SLOTS: &[LinkSlot] = &[
    slot("link", SlotType::SameAsNode),
    slot("scalar", SlotType::Real),
];

pub const EXP_SLOTS: &[LinkSlot] = &[
    slot("exp", SlotType::Real),
    slot("scale", SlotType::Real),
];

pub const RANGE_SLOTS: &[LinkSlot] = &[
    slot("min", SlotType::SameAsNode),
    slot("max", SlotType::SameAsNode),
    slot("link", SlotType::SameAsNode),
];

pub const SEG_CALC_TANGENT_SLOTS: &[LinkSlot] = &[
    slot("segment", SlotType::Segment),
    slot("amount", SlotType::Real),
];

pub const BONE_SLOTS: &[LinkSlot] = &[
    slot("name", SlotType::String),
    slot("parent", SlotType::BoneRef),
    slot("origin", SlotType::Vector),
    slot("angle", SlotType::Angle),
    slot("scalelx", SlotType::Real),
    slot("scalex", SlotType::Real),
    slot("length", SlotType::Real),
    slot("width", SlotType::Real),
    slot("tipwidth", SlotType::Real),
    slot("depth", SlotType::Real),
];

pub const BONE_LINK_SLOTS: &[LinkSlot] = &[
    slot("bone", SlotType::BoneRef),
    slot("base_value", SlotType::SameAsNode),
    slot("translate", SlotType::Bool),
    slot("rotate", SlotType::Bool),
    slot("skew", SlotType::Bool),
    slot("scale_x", SlotType::Bool),
    slot("scale_y", SlotType::Bool),
];

pub const BONE_INFLUENCE_SLOTS: &[LinkSlot] = &[
    slot("bone_weight_list", SlotType::List),
    slot("link", SlotType::SameAsNode),
];

pub const BONE_WEIGHT_PAIR_SLOTS: &[LinkSlot] = &[
    slot("bone", SlotType::BoneRef),
    slot("weight", SlotType::Real),
];

pub const COMPOSITE_VECTOR_SLOTS: &[LinkSlot] =
    &[slot("x", SlotType::Real), slot("y", SlotType::Real)];

pub const COMPOSITE_COLOR_SLOTS: &[LinkSlot] = &[
    slot("red", SlotType::Real),
    slot("green", SlotType::Real),
    slot("blue", SlotType::Real),
    slot("alpha", SlotType::Real),
];

pub const COMPOSITE_SEGMENT_SLOTS: &[LinkSlot] = &[
    slot("p1", SlotType::Vector),
    slot("t1", SlotType::Vector),
    slot("p2", SlotType::Vector),
    slot("t2", SlotType::Vector),
];

pub const COMPOSITE_BLINE_POINT_SLOTS: &[LinkSlot] = &[
    slot("point", SlotType::Vector),
    slot("width", SlotType::Real),
    slot("origin", SlotType::Real),
    slot("split", SlotType::Bool),
    slot("t1", SlotType::Vector),
    slot("t2", SlotType::Vector),
];

pub const COMPOSITE_WIDTH_POINT_SLOTS: &[LinkSlot] = &[
    slot("position", SlotType::Real),
    slot("width", SlotType::Real),
    slot("side_before", SlotType::Integer),
    slot("side_after", SlotType::Integer),
    slot("lower_bound", SlotType::Real),
    slot("upper_bound", SlotType::Real),
];

pub const COMPOSITE_DASH_ITEM_SLOTS: &[LinkSlot] = &[
    slot("offset", SlotType::Real),
    slot("length", SlotType::Real),
    slot("side_before", SlotType::Integer),
    slot("side_after", SlotType::Integer),
];

pub const COMPOSITE_TRANSFORMATION_SLOTS: &[LinkSlot] = &[
    slot("offset", SlotType::Vector),
    slot("angle", SlotType::Angle),
    slot("skew_angle", SlotType::Angle),
    slot("scale", SlotType::Vector),
];

pub const COMPOSITE_WEIGHTED_SLOTS: &[LinkSlot] = &[
    slot("weight", SlotType::Real),
    slot("value", SlotType::WeightedInner),
];

/// The table of composite slots for a declared type, if that type can be
/// assembled from components.
pub fn composite_slots(ty: &ValueType) -> Option<&'static [LinkSlot]> {
    match ty {
        ValueType::Vector => Some(COMPOSITE_VECTOR_SLOTS),
        ValueType::Color => Some(COMPOSITE_COLOR_SLOTS),
        ValueType::Segment => Some(COMPOSITE_SEGMENT_SLOTS),
        ValueType::BLinePoint => Some(COMPOSITE_BLINE_POINT_SLOTS),
        ValueType::WidthPoint => Some(COMPOSITE_WIDTH_POINT_SLOTS),
        ValueType::DashItem => Some(COMPOSITE_DASH_ITEM_SLOTS),
        ValueType::Transformation => Some(COMPOSITE_TRANSFORMATION_SLOTS),
        ValueType::Weighted(_) => Some(COMPOSITE_WEIGHTED_SLOTS),
        _ => None,
    }
}

/// A value node: declared result type, identity, and the kind payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub guid: Uuid,
    /// Export id inside the owning canvas, if registered.
    pub export_id: Option<String>,
    ty: ValueType,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(ty: ValueType, kind: NodeKind) -> Self {
        Node {
            guid: Uuid::new_v4(),
            export_id: None,
            ty,
            kind,
        }
    }

    /// The declared result type. Fixed after construction.
    pub fn value_type(&self) -> &ValueType {
        &self.ty
    }

    /// Stable internal kind name (non-localized).
    pub fn name(&self) -> &'static str {
        match &self.kind {
            NodeKind::DynamicList(data) => match data.flavor {
                ListFlavor::Plain => "dynamic_list",
                ListFlavor::BLine => "bline",
                ListFlavor::WpList => "wplist",
                ListFlavor::DiList => "dilist",
                ListFlavor::Average => "average",
                ListFlavor::WeightedAverage => "weighted_average",
            },
            NodeKind::Const(_) => "constant",
            NodeKind::Animated(_) => "animated",
            NodeKind::Add(_) => "add",
            NodeKind::Subtract(_) => "subtract",
            NodeKind::Scale(_) => "scale",
            NodeKind::Exp(_) => "exp",
            NodeKind::Range(_) => "range",
            NodeKind::Composite(_) => "composite",
            NodeKind::SegCalcTangent(_) => "segcalctangent",
            NodeKind::Bone(_) => "bone",
            NodeKind::BoneRoot => "bone_root",
            NodeKind::BoneLink(_) => "bonelink",
            NodeKind::BoneInfluence(_) => "boneinfluence",
            NodeKind::BoneWeightPair(_) => "boneweightpair",
            NodeKind::StaticList(_) => "static_list",
        }
    }

    /// Display name for hosts without their own localization layer.
    pub fn local_name(&self) -> &'static str {
        match self.name() {
            "constant" => "Constant",
            "animated" => "Animated",
            "add" => "Add",
            "subtract" => "Subtract",
            "scale" => "Scale",
            "exp" => "Exponential",
            "range" => "Range",
            "composite" => "Composite",
            "segcalctangent" => "Segment Tangent",
            "bone" => "Bone",
            "bone_root" => "Root Bone",
            "bonelink" => "Bone Link",
            "boneinfluence" => "Bone Influence",
            "boneweightpair" => "Bone Weight Pair",
            "static_list" => "Static List",
            "dynamic_list" => "Dynamic List",
            "bline" => "Spline",
            "wplist" => "Width Point List",
            "dilist" => "Dash Item List",
            "average" => "Average",
            "weighted_average" => "Weighted Average",
            _ => "Value Node",
        }
    }

    /// The declarative link table of this node, when its links are fixed
    /// named slots. List kinds have positional entries instead.
    pub fn link_slots(&self) -> &'static [LinkSlot] {
        match &self.kind {
            NodeKind::Add(_) | NodeKind::Subtract(_) => ADD_SLOTS,
            NodeKind::Scale(_) => SCALE_SLOTS,
            NodeKind::Exp(_) => EXP_SLOTS,
            NodeKind::Range(_) => RANGE_SLOTS,
            NodeKind::Composite(_) => composite_slots(&self.ty).unwrap_or(&[]),
            NodeKind::SegCalcTangent(_) => SEG_CALC_TANGENT_SLOTS,
            NodeKind::Bone(_) => BONE_SLOTS,
            NodeKind::BoneLink(_) => BONE_LINK_SLOTS,
            NodeKind::BoneInfluence(_) => BONE_INFLUENCE_SLOTS,
            NodeKind::BoneWeightPair(_) => BONE_WEIGHT_PAIR_SLOTS,
            _ => &[],
        }
    }

    pub fn link_count(&self) -> usize {
        match &self.kind {
            NodeKind::StaticList(data) => data.entries.len(),
            NodeKind::DynamicList(data) => data.entries.len(),
            _ => self.link_slots().len(),
        }
    }

    pub fn link_index(&self, name: &str) -> Option<usize> {
        self.link_slots().iter().position(|s| s.name == name)
    }

    pub fn get_link(&self, index: usize) -> Option<NodeId> {
        match &self.kind {
            NodeKind::StaticList(data) => data.entries.get(index).copied(),
            NodeKind::DynamicList(data) => data.entries.get(index).map(|e| e.node),
            _ => self.fixed_links().get(index).copied(),
        }
    }

    /// All outgoing links, in slot order (graph traversal).
    pub fn links(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::StaticList(data) => data.entries.clone(),
            NodeKind::DynamicList(data) => data.entries.iter().map(|e| e.node).collect(),
            NodeKind::Animated(data) => data
                .waypoints
                .iter()
                .filter_map(|w| match w.link {
                    WaypointLink::Node(id) => Some(id),
                    WaypointLink::Value(_) => None,
                })
                .collect(),
            _ => self.fixed_links(),
        }
    }

    fn fixed_links(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Add(l) | NodeKind::Subtract(l) => vec![l.lhs, l.rhs, l.scalar],
            NodeKind::Scale(l) => vec![l.link, l.scalar],
            NodeKind::Exp(l) => vec![l.exp, l.scale],
            NodeKind::Range(l) => vec![l.min, l.max, l.link],
            NodeKind::Composite(l) => l.components.clone(),
            NodeKind::SegCalcTangent(l) => vec![l.segment, l.amount],
            NodeKind::Bone(l) => vec![
                l.name, l.parent, l.origin, l.angle, l.scalelx, l.scalex, l.length, l.width,
                l.tipwidth, l.depth,
            ],
            NodeKind::BoneLink(l) => vec![
                l.bone,
                l.base_value,
                l.translate,
                l.rotate,
                l.skew,
                l.scale_x,
                l.scale_y,
            ],
            NodeKind::BoneInfluence(l) => vec![l.bone_weight_list, l.link],
            NodeKind::BoneWeightPair(l) => vec![l.bone, l.weight],
            _ => Vec::new(),
        }
    }

    /// Replace a link without type checking; the canvas performs the check.
    pub(crate) fn set_link_raw(&mut self, index: usize, child: NodeId) -> bool {
        match &mut self.kind {
            NodeKind::StaticList(data) => {
                if let Some(entry) = data.entries.get_mut(index) {
                    *entry = child;
                    return true;
                }
                false
            }
            NodeKind::DynamicList(data) => {
                if let Some(entry) = data.entries.get_mut(index) {
                    entry.node = child;
                    return true;
                }
                false
            }
            NodeKind::Add(l) | NodeKind::Subtract(l) => match index {
                0 => {
                    l.lhs = child;
                    true
                }
                1 => {
                    l.rhs = child;
                    true
                }
                2 => {
                    l.scalar = child;
                    true
                }
                _ => false,
            },
            NodeKind::Scale(l) => match index {
                0 => {
                    l.link = child;
                    true
                }
                1 => {
                    l.scalar = child;
                    true
                }
                _ => false,
            },
            NodeKind::Exp(l) => match index {
                0 => {
                    l.exp = child;
                    true
                }
                1 => {
                    l.scale = child;
                    true
                }
                _ => false,
            },
            NodeKind::Range(l) => match index {
                0 => {
                    l.min = child;
                    true
                }
                1 => {
                    l.max = child;
                    true
                }
                2 => {
                    l.link = child;
                    true
                }
                _ => false,
            },
            NodeKind::Composite(l) => {
                if let Some(slot) = l.components.get_mut(index) {
                    *slot = child;
                    return true;
                }
                false
            }
            NodeKind::SegCalcTangent(l) => match index {
                0 => {
                    l.segment = child;
                    true
                }
                1 => {
                    l.amount = child;
                    true
                }
                _ => false,
            },
            NodeKind::Bone(l) => {
                let slots = [
                    &mut l.name,
                    &mut l.parent,
                    &mut l.origin,
                    &mut l.angle,
                    &mut l.scalelx,
                    &mut l.scalex,
                    &mut l.length,
                    &mut l.width,
                    &mut l.tipwidth,
                    &mut l.depth,
                ];
                if index < slots.len() {
                    *slots[index] = child;
                    return true;
                }
                false
            }
            NodeKind::BoneLink(l) => {
                let slots = [
                    &mut l.bone,
                    &mut l.base_value,
                    &mut l.translate,
                    &mut l.rotate,
                    &mut l.skew,
                    &mut l.scale_x,
                    &mut l.scale_y,
                ];
                if index < slots.len() {
                    *slots[index] = child;
                    return true;
                }
                false
            }
            NodeKind::BoneInfluence(l) => match index {
                0 => {
                    l.bone_weight_list = child;
                    true
                }
                1 => {
                    l.link = child;
                    true
                }
                _ => false,
            },
            NodeKind::BoneWeightPair(l) => match index {
                0 => {
                    l.bone = child;
                    true
                }
                1 => {
                    l.weight = child;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}

impl SlotType {
    /// Resolve the concrete type this slot expects on the given node.
    pub fn expected(&self, node: &Node) -> ValueType {
        match self {
            SlotType::Bool => ValueType::Bool,
            SlotType::Integer => ValueType::Integer,
            SlotType::Real => ValueType::Real,
            SlotType::Angle => ValueType::Angle,
            SlotType::Vector => ValueType::Vector,
            SlotType::Segment => ValueType::Segment,
            SlotType::String => ValueType::String,
            SlotType::BoneRef => ValueType::BoneRef,
            SlotType::List => ValueType::List,
            SlotType::SameAsNode => node.value_type().clone(),
            SlotType::WeightedInner => match node.value_type() {
                ValueType::Weighted(inner) => (**inner).clone(),
                other => other.clone(),
            },
        }
    }
}
