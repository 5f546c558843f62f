//! sinew-graph-core: the value-node graph and skeletal evaluation engine.
//!
//! A canvas owns a DAG of typed, time-parameterized value nodes. Consumers
//! call [`Canvas::value`] on a root node; evaluation recurses depth-first
//! through the links, bottoming out at constants and bone chains, and is a
//! pure function of the query time and the current wiring.

pub mod canvas;
pub mod compat;
pub mod config;
pub mod error;
pub mod eval;
pub mod registry;
pub mod types;

/// Format version stamped on newly created canvases.
pub const CURRENT_CANVAS_VERSION: &str = "1.2";

pub use canvas::{is_animatable, is_arithmetic, is_orderable, is_transformable, Canvas};
pub use config::EvalConfig;
pub use error::GraphError;
pub use eval::{amount_at_time, status_at_time, InverseStatus};
pub use registry::{check_type, NodeFactory, NodeRegistry};
pub use types::{
    Activepoint, AnimatedData, DynamicListData, Interpolation, LinkSlot, ListEntry, ListFlavor,
    Node, NodeId, NodeKind, SlotType, StaticListData, Waypoint, WaypointLink,
};
