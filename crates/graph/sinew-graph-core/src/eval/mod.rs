//! Evaluation: pure, recursive, depth-guarded.
//!
//! `eval_node` is a pure function of the query time and the current wiring.
//! There is no cache and no evaluation-order dependency; every call walks
//! the graph fresh, so results are identical forward or backward in time.

mod animated;
mod bones;
mod eval_node;
mod lists;

pub(crate) use eval_node::eval_node;
pub use eval_node::{eval_integer, eval_real, InverseStatus};

pub use lists::{amount_at_time, status_at_time};
