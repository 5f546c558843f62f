//! sinew-api-core: value & math layer of the Sinew engine (engine-agnostic).
//!
//! Everything here is plain data: the `Value` tagged union, the 2D math it
//! is built from, and the generic value algebra. Graph semantics (nodes,
//! links, waypoints, lists) live in `sinew-graph-core`.

pub mod angle;
pub mod bone;
pub mod color;
pub mod error;
pub mod geometry;
pub mod gradient;
pub mod hermite;
pub mod matrix;
pub mod ops;
pub mod time;
pub mod transformation;
pub mod value;
pub mod vector;

pub use angle::Angle;
pub use bone::{Bone, BoneId, BoneWeightPair, Shape};
pub use color::Color;
pub use error::ValueError;
pub use geometry::{BLinePoint, DashItem, Segment, SideType, WidthPoint};
pub use gradient::{Gradient, GradientStop};
pub use hermite::{CurvePoint, Hermite};
pub use matrix::Matrix;
pub use time::{Time, TIME_EPSILON};
pub use transformation::Transformation;
pub use value::{Value, ValueList, ValueType};
pub use vector::Vec2;
