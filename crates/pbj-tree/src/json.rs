//! Bridge between [`Tree`] and `serde_json::Value`.
//!
//! JSON is a superset of the tree shape: objects and homogeneous arrays map
//! cleanly, but mixed arrays (`[1, {"a": 2}]`) and nested arrays have no
//! tree representation and are rejected on the way in. The outbound
//! direction is total.

use crate::tree::{Scalar, Tree, Value};

/// Error converting a JSON document into a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeShapeError {
    #[error("document root must be an object")]
    RootNotObject,
    #[error("array under key {0:?} mixes scalars and objects")]
    MixedArray(String),
    #[error("array under key {0:?} nests another array")]
    NestedArray(String),
    #[error("number under key {0:?} does not fit i64 or f64")]
    NumberOutOfRange(String),
}

impl TryFrom<serde_json::Value> for Tree {
    type Error = TreeShapeError;

    fn try_from(value: serde_json::Value) -> Result<Self, TreeShapeError> {
        match value {
            serde_json::Value::Object(map) => {
                let mut tree = Tree::new();
                for (key, v) in map {
                    let converted = convert_value(&key, v)?;
                    tree.insert(key, converted);
                }
                Ok(tree)
            }
            _ => Err(TreeShapeError::RootNotObject),
        }
    }
}

fn convert_scalar(key: &str, value: serde_json::Value) -> Result<Scalar, TreeShapeError> {
    match value {
        serde_json::Value::Bool(b) => Ok(Scalar::Bool(b)),
        serde_json::Value::String(s) => Ok(Scalar::Str(s)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Scalar::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Scalar::Float(f))
            } else {
                Err(TreeShapeError::NumberOutOfRange(key.to_string()))
            }
        }
        _ => Err(TreeShapeError::MixedArray(key.to_string())),
    }
}

fn convert_value(key: &str, value: serde_json::Value) -> Result<Value, TreeShapeError> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Object(map) => {
            let mut tree = Tree::new();
            for (k, v) in map {
                let converted = convert_value(&k, v)?;
                tree.insert(k, converted);
            }
            Ok(Value::Tree(tree))
        }
        serde_json::Value::Array(items) => {
            if items.is_empty() {
                return Ok(Value::Scalars(Vec::new()));
            }
            if items[0].is_object() {
                let mut trees = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::Object(_) => trees.push(Tree::try_from(item)?),
                        _ => return Err(TreeShapeError::MixedArray(key.to_string())),
                    }
                }
                Ok(Value::Trees(trees))
            } else {
                let mut scalars = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::Array(_) => {
                            return Err(TreeShapeError::NestedArray(key.to_string()))
                        }
                        serde_json::Value::Object(_) | serde_json::Value::Null => {
                            return Err(TreeShapeError::MixedArray(key.to_string()))
                        }
                        other => scalars.push(convert_scalar(key, other)?),
                    }
                }
                Ok(Value::Scalars(scalars))
            }
        }
        scalar => Ok(Value::Scalar(convert_scalar(key, scalar)?)),
    }
}

impl From<Scalar> for serde_json::Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Int(n) => serde_json::Value::from(n),
            // Non-finite floats have no JSON form; they degrade to null.
            Scalar::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::Bool(b) => serde_json::Value::Bool(b),
            Scalar::Str(s) => serde_json::Value::String(s),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Scalar(s) => serde_json::Value::from(s),
            Value::Tree(t) => serde_json::Value::from(t),
            Value::Scalars(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Trees(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
        }
    }
}

impl From<Tree> for serde_json::Value {
    fn from(tree: Tree) -> Self {
        let mut map = serde_json::Map::new();
        for (key, value) in tree.iter() {
            map.insert(key.to_string(), serde_json::Value::from(value.clone()));
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_round_trips() {
        let doc = json!({
            "id": 1,
            "name": "tester",
            "ratio": 0.25,
            "active": true,
            "tags": ["a", "b"],
            "leader": {"id": 2, "name": "lead"},
            "members": [{"id": 3}, {"id": 4}],
            "note": null,
        });
        let tree = Tree::try_from(doc.clone()).unwrap();
        assert_eq!(serde_json::Value::from(tree), doc);
    }

    #[test]
    fn empty_array_becomes_empty_scalar_list() {
        let tree = Tree::try_from(json!({"members": []})).unwrap();
        assert_eq!(tree.get("members"), Some(&Value::Scalars(Vec::new())));
    }

    #[test]
    fn root_must_be_object() {
        assert_eq!(
            Tree::try_from(json!([1, 2, 3])),
            Err(TreeShapeError::RootNotObject)
        );
        assert_eq!(Tree::try_from(json!(42)), Err(TreeShapeError::RootNotObject));
    }

    #[test]
    fn mixed_arrays_are_rejected() {
        assert_eq!(
            Tree::try_from(json!({"xs": [1, {"a": 2}]})),
            Err(TreeShapeError::MixedArray("xs".to_string()))
        );
        assert_eq!(
            Tree::try_from(json!({"xs": [{"a": 2}, 1]})),
            Err(TreeShapeError::MixedArray("xs".to_string()))
        );
        assert_eq!(
            Tree::try_from(json!({"xs": [[1], [2]]})),
            Err(TreeShapeError::NestedArray("xs".to_string()))
        );
    }

    #[test]
    fn null_entry_survives_to_json() {
        let mut tree = Tree::new();
        tree.insert("gone", Value::Null);
        assert_eq!(serde_json::Value::from(tree), json!({"gone": null}));
    }
}
