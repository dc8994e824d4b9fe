//! Structural conversion between [`Tree`] and [`Message`].
//!
//! The two directions are deliberately asymmetric: tree → message must
//! resolve every key against the schema and can fail, while message → tree
//! only walks fields the message reports as set and is total.

use pbj_tree::{Tree, Value};

use crate::descriptor::FieldKind;
use crate::message::{FieldValue, Message, SchemaError};

/// Copies every non-null entry of `tree` into the fields of `msg`.
///
/// Repeated fields are appended to, never replaced; callers that want exact
/// contents must start from a freshly constructed instance. Null entries
/// are skipped entirely rather than set to a zero value: key presence plus
/// a non-null value is what encodes field presence.
pub fn tree_to_message(msg: &mut Message, tree: &Tree) -> Result<(), SchemaError> {
    for (key, value) in tree.iter() {
        match value {
            Value::Null => {}
            Value::Tree(nested) => {
                tree_to_message(msg.nested_mut(key)?, nested)?;
            }
            Value::Scalars(items) => {
                if items.is_empty() {
                    // Zero appends, but the key must still name a repeated
                    // field; an unknown key errors even when empty.
                    require_repeated(msg, key)?;
                } else {
                    for item in items {
                        msg.append_scalar(key, item.clone())?;
                    }
                }
            }
            Value::Trees(items) => {
                for item in items {
                    tree_to_message(msg.append_message(key)?, item)?;
                }
            }
            Value::Scalar(s) => {
                msg.set_scalar(key, s.clone())?;
            }
        }
    }
    Ok(())
}

fn require_repeated(msg: &Message, key: &str) -> Result<(), SchemaError> {
    let field = msg
        .descriptor()
        .field(key)
        .ok_or_else(|| SchemaError::UnknownField {
            message: msg.descriptor().name().to_string(),
            field: key.to_string(),
        })?;
    match field.kind {
        FieldKind::RepeatedScalar(_) | FieldKind::RepeatedMessage(_) => Ok(()),
        _ => Err(SchemaError::TypeMismatch {
            message: msg.descriptor().name().to_string(),
            field: key.to_string(),
            expected: "repeated field",
        }),
    }
}

/// Builds a tree from every field the message reports as set.
///
/// Fields never set are omitted entirely, with no null placeholders, and
/// fields set to zero values come through as those zero values. Handles
/// arbitrary nesting depth and mixed repeated/nested combinations.
pub fn message_to_tree(msg: &Message) -> Tree {
    let mut tree = Tree::new();
    for (name, value) in msg.fields() {
        let converted = match value {
            FieldValue::Scalar(s) => Value::Scalar(s.clone()),
            FieldValue::Message(nested) => Value::Tree(message_to_tree(nested)),
            FieldValue::ScalarList(items) => Value::Scalars(items.clone()),
            FieldValue::MessageList(items) => {
                Value::Trees(items.iter().map(message_to_tree).collect())
            }
        };
        tree.insert(name, converted);
    }
    tree
}
