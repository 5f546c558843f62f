//! Evaluation limits, owned by the canvas.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Maximum evaluation recursion depth. The graph is meant to be a DAG;
    /// this bounds the damage of an authoring bug that wires a cycle.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig { max_depth: 256 }
    }
}
