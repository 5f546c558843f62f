//! Node-type registry: stable names mapped to factories.
//!
//! The registry is an explicit object owned by whoever loads documents —
//! never process-global state. `with_builtins` registers every kind this
//! crate ships; hosts can layer their own factories on top.

use hashbrown::HashMap;
use sinew_api_core::{ops, Value, ValueType};

use crate::canvas::{is_animatable, is_arithmetic, is_orderable, is_transformable, Canvas};
use crate::error::GraphError;
use crate::types::{composite_slots, NodeId};

pub type NodeFactory = fn(&mut Canvas, &Value) -> Result<NodeId, GraphError>;

pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        NodeRegistry::with_builtins()
    }
}

impl NodeRegistry {
    pub fn empty() -> Self {
        NodeRegistry {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = NodeRegistry::empty();
        registry.register("constant", |canvas, value| Ok(canvas.add_const(value.clone())));
        registry.register("animated", |canvas, value| {
            canvas.add_animated(value.value_type())
        });
        registry.register("add", |canvas, value| canvas.add_add(value));
        registry.register("subtract", |canvas, value| canvas.add_subtract(value));
        registry.register("scale", |canvas, value| canvas.add_scale(value));
        registry.register("exp", |canvas, value| {
            let seed = value.as_real().ok_or(GraphError::UnsupportedType {
                kind: "exp",
                ty: value.value_type(),
            })?;
            Ok(canvas.add_exp(seed))
        });
        registry.register("range", |canvas, value| canvas.add_range(value));
        registry.register("composite", |canvas, value| canvas.add_composite(value));
        registry.register("segcalctangent", |canvas, _| {
            Ok(canvas.add_seg_calc_tangent())
        });
        registry.register("bone", |canvas, value| {
            let bone = value.as_bone().ok_or(GraphError::UnsupportedType {
                kind: "bone",
                ty: value.value_type(),
            })?;
            Ok(canvas.add_bone(bone))
        });
        registry.register("bonelink", |canvas, value| {
            let root = canvas.root_bone();
            canvas.add_bone_link(root, value)
        });
        registry.register("boneinfluence", |canvas, value| {
            let base = value.as_vector().ok_or(GraphError::UnsupportedType {
                kind: "boneinfluence",
                ty: value.value_type(),
            })?;
            Ok(canvas.add_bone_influence(base))
        });
        registry.register("boneweightpair", |canvas, value| {
            let weight = value
                .as_bone_weight_pair()
                .map(|p| p.weight)
                .unwrap_or(1.0);
            let root = canvas.root_bone();
            Ok(canvas.add_bone_weight_pair(root, weight))
        });
        registry.register("static_list", |canvas, value| {
            let list = value.as_list().ok_or(GraphError::UnsupportedType {
                kind: "static_list",
                ty: value.value_type(),
            })?;
            let contained = list.contained.clone();
            let items = list.items.clone();
            let entries = items.into_iter().map(|v| canvas.add_const(v)).collect();
            canvas.add_static_list(contained, entries)
        });
        registry.register("dynamic_list", |canvas, value| {
            seed_dynamic_list(canvas, value, SeedFlavor::Plain)
        });
        registry.register("bline", |canvas, value| {
            seed_dynamic_list(canvas, value, SeedFlavor::BLine)
        });
        registry.register("wplist", |canvas, value| {
            seed_dynamic_list(canvas, value, SeedFlavor::WpList)
        });
        registry.register("dilist", |canvas, value| {
            seed_dynamic_list(canvas, value, SeedFlavor::DiList)
        });
        registry.register("average", |canvas, value| {
            canvas.add_average(value.value_type())
        });
        registry.register("weighted_average", |canvas, value| {
            canvas.add_weighted_average(value.value_type())
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: NodeFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Create a node by registered name, seeded from `value`. Unknown names
    /// fail with the distinguishable not-found error.
    pub fn create(
        &self,
        canvas: &mut Canvas,
        name: &str,
        value: &Value,
    ) -> Result<NodeId, GraphError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| GraphError::IdNotFound(name.to_string()))?;
        factory(canvas, value)
    }
}

enum SeedFlavor {
    Plain,
    BLine,
    WpList,
    DiList,
}

fn seed_dynamic_list(
    canvas: &mut Canvas,
    value: &Value,
    flavor: SeedFlavor,
) -> Result<NodeId, GraphError> {
    let list = value.as_list().ok_or(GraphError::UnsupportedType {
        kind: "dynamic_list",
        ty: value.value_type(),
    })?;
    let contained = list.contained.clone();
    let looped = list.looped;
    let items = list.items.clone();
    let node = match flavor {
        SeedFlavor::Plain => {
            let id = canvas.add_dynamic_list(contained);
            // new vector polygons start out looped
            if list.contained == ValueType::Vector {
                canvas.set_list_loop(id, true)?;
            }
            id
        }
        SeedFlavor::BLine => canvas.add_bline(),
        SeedFlavor::WpList => canvas.add_wplist(),
        SeedFlavor::DiList => canvas.add_dilist(),
    };
    if looped {
        canvas.set_list_loop(node, true)?;
    }
    for item in items {
        let child = canvas.add_const(item);
        canvas.list_add(node, child, None)?;
    }
    Ok(node)
}

/// Static capability query: can a node of this registered kind ever carry
/// the given value type? Used by hosts to validate wiring before commit.
pub fn check_type(name: &str, ty: &ValueType) -> bool {
    match name {
        "constant" => true,
        "animated" => is_animatable(ty),
        "add" | "subtract" | "scale" => is_arithmetic(ty),
        "exp" => ty == &ValueType::Real,
        "range" => is_orderable(ty),
        "composite" => composite_slots(ty).is_some(),
        "segcalctangent" => ty == &ValueType::Vector,
        "bone" => ty == &ValueType::Bone,
        "bone_root" => false,
        "bonelink" => is_transformable(ty),
        "boneinfluence" => ty == &ValueType::Vector,
        "boneweightpair" => ty == &ValueType::BoneWeightPair,
        "static_list" | "dynamic_list" | "bline" | "wplist" | "dilist" => ty == &ValueType::List,
        "average" | "weighted_average" => ops::is_averageable(ty),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinew_api_core::Time;

    #[test]
    fn builtin_factories_create_working_nodes() {
        let registry = NodeRegistry::with_builtins();
        let mut canvas = Canvas::new();
        let node = registry
            .create(&mut canvas, "add", &Value::Real(4.0))
            .unwrap();
        assert_eq!(canvas.value(node, Time(0.0)), Value::Real(4.0));
    }

    #[test]
    fn unknown_names_are_a_not_found_error() {
        let registry = NodeRegistry::with_builtins();
        let mut canvas = Canvas::new();
        let err = registry
            .create(&mut canvas, "no_such_kind", &Value::Real(0.0))
            .unwrap_err();
        assert!(matches!(err, GraphError::IdNotFound(_)));
    }

    #[test]
    fn capability_table_matches_factories() {
        assert!(check_type("add", &ValueType::Vector));
        assert!(!check_type("add", &ValueType::String));
        assert!(check_type("animated", &ValueType::Bool));
        assert!(!check_type("animated", &ValueType::Segment));
        assert!(check_type("average", &ValueType::Real));
        assert!(!check_type("average", &ValueType::Bool));
        assert!(!check_type("bone_root", &ValueType::Bone));
    }
}
