//! Dynamic message instances.

use std::sync::Arc;

use indexmap::IndexMap;
use pbj_tree::Scalar;

use crate::descriptor::{FieldKind, MessageDescriptor, ScalarKind};
use crate::wire::{self, WireError};

/// Error applying a value to a declared field.
///
/// `UnknownField` and `TypeMismatch` are deliberately distinct: the first
/// means the name does not exist on the type at all, the second that it
/// exists but the value cannot be coerced into its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("{message} has no field named {field:?}")]
    UnknownField { message: String, field: String },
    #[error("{message}.{field}: value is not a valid {expected}")]
    TypeMismatch {
        message: String,
        field: String,
        expected: &'static str,
    },
}

/// The value of one set field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Message(Message),
    ScalarList(Vec<Scalar>),
    MessageList(Vec<Message>),
}

/// A dynamic instance of a [`MessageDescriptor`].
///
/// Only explicitly-set fields are stored; presence is "the name is in the
/// map", never "the value differs from zero". A field set to `0` or `""`
/// is present and serializes, a field never touched does not.
#[derive(Debug, Clone)]
pub struct Message {
    descriptor: Arc<MessageDescriptor>,
    fields: IndexMap<String, FieldValue>,
}

/// Two messages are equal when they are the same declared type with the
/// same set fields; the order fields were set in does not matter.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name() == other.descriptor.name() && self.fields == other.fields
    }
}

impl Message {
    /// Fresh instance with no fields set.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: IndexMap::new(),
        }
    }

    /// Parses the wire encoding of this type.
    pub fn parse(descriptor: Arc<MessageDescriptor>, data: &[u8]) -> Result<Self, WireError> {
        wire::decode_message(descriptor, data)
    }

    /// Serializes the set fields to the wire encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        wire::encode_message(self)
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterates over set fields in the order they were set.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup(&self, name: &str) -> Result<&FieldKind, SchemaError> {
        self.descriptor
            .field(name)
            .map(|f| &f.kind)
            .ok_or_else(|| SchemaError::UnknownField {
                message: self.descriptor.name().to_string(),
                field: name.to_string(),
            })
    }

    fn mismatch(&self, name: &str, expected: &'static str) -> SchemaError {
        SchemaError::TypeMismatch {
            message: self.descriptor.name().to_string(),
            field: name.to_string(),
            expected,
        }
    }

    /// Sets a scalar field, replacing any previous value.
    pub fn set_scalar(&mut self, name: &str, value: Scalar) -> Result<(), SchemaError> {
        let kind = match self.lookup(name)? {
            FieldKind::Scalar(k) => *k,
            _ => return Err(self.mismatch(name, "scalar")),
        };
        let coerced = coerce(kind, value).ok_or_else(|| self.mismatch(name, kind.name()))?;
        self.fields
            .insert(name.to_string(), FieldValue::Scalar(coerced));
        Ok(())
    }

    /// Get-or-create access to a singular nested message field.
    pub fn nested_mut(&mut self, name: &str) -> Result<&mut Message, SchemaError> {
        let nested = match self.lookup(name)? {
            FieldKind::Message(d) => d.clone(),
            _ => return Err(self.mismatch(name, "message")),
        };
        let message_name = self.descriptor.name().to_string();
        let slot = self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| FieldValue::Message(Message::new(nested)));
        match slot {
            FieldValue::Message(m) => Ok(m),
            _ => Err(SchemaError::TypeMismatch {
                message: message_name,
                field: name.to_string(),
                expected: "message",
            }),
        }
    }

    /// Appends one element to a repeated scalar field.
    pub fn append_scalar(&mut self, name: &str, value: Scalar) -> Result<(), SchemaError> {
        let kind = match self.lookup(name)? {
            FieldKind::RepeatedScalar(k) => *k,
            _ => return Err(self.mismatch(name, "repeated scalar")),
        };
        let coerced = coerce(kind, value).ok_or_else(|| self.mismatch(name, kind.name()))?;
        let message_name = self.descriptor.name().to_string();
        let slot = self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| FieldValue::ScalarList(Vec::new()));
        match slot {
            FieldValue::ScalarList(items) => {
                items.push(coerced);
                Ok(())
            }
            _ => Err(SchemaError::TypeMismatch {
                message: message_name,
                field: name.to_string(),
                expected: "repeated scalar",
            }),
        }
    }

    /// Allocates a new element slot in a repeated message field.
    pub fn append_message(&mut self, name: &str) -> Result<&mut Message, SchemaError> {
        let nested = match self.lookup(name)? {
            FieldKind::RepeatedMessage(d) => d.clone(),
            _ => return Err(self.mismatch(name, "repeated message")),
        };
        let message_name = self.descriptor.name().to_string();
        let slot = self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| FieldValue::MessageList(Vec::new()));
        match slot {
            FieldValue::MessageList(items) => {
                items.push(Message::new(nested));
                // Just pushed, cannot be empty.
                items.last_mut().ok_or(SchemaError::TypeMismatch {
                    message: message_name,
                    field: name.to_string(),
                    expected: "repeated message",
                })
            }
            _ => Err(SchemaError::TypeMismatch {
                message: message_name,
                field: name.to_string(),
                expected: "repeated message",
            }),
        }
    }
}

impl ScalarKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Bool => "bool",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Str => "string",
        }
    }
}

/// Coerces a tree scalar into a field kind.
///
/// Integers widen into float kinds; nothing else converts, so a string in
/// an integer field is a `TypeMismatch` rather than a silent parse.
fn coerce(kind: ScalarKind, value: Scalar) -> Option<Scalar> {
    match (kind, value) {
        (ScalarKind::Int32, Scalar::Int(n)) if i32::try_from(n).is_ok() => Some(Scalar::Int(n)),
        (ScalarKind::Int64, Scalar::Int(n)) => Some(Scalar::Int(n)),
        (ScalarKind::Bool, Scalar::Bool(b)) => Some(Scalar::Bool(b)),
        (ScalarKind::Float | ScalarKind::Double, Scalar::Float(f)) => Some(Scalar::Float(f)),
        (ScalarKind::Float | ScalarKind::Double, Scalar::Int(n)) => Some(Scalar::Float(n as f64)),
        (ScalarKind::Str, Scalar::Str(s)) => Some(Scalar::Str(s)),
        _ => None,
    }
}
