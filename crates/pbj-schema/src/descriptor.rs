//! Message type descriptors: the per-type accessor table built once and
//! consulted by every conversion and wire operation.

use std::collections::HashMap;
use std::sync::Arc;

/// Scalar field kinds and their wire representations.
///
/// `Int32`/`Int64`/`Bool` are varints, `Float` is 4 bytes little-endian,
/// `Double` is 8 bytes little-endian, `Str` is length-delimited UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int32,
    Int64,
    Bool,
    Float,
    Double,
    Str,
}

/// The kind of a declared field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Message(Arc<MessageDescriptor>),
    RepeatedScalar(ScalarKind),
    RepeatedMessage(Arc<MessageDescriptor>),
}

impl FieldKind {
    pub fn is_repeated(&self) -> bool {
        matches!(
            self,
            FieldKind::RepeatedScalar(_) | FieldKind::RepeatedMessage(_)
        )
    }
}

/// One declared field: name, wire number, kind.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
}

/// The declared shape of a message type.
///
/// Built once per type via [`MessageDescriptor::builder`] and shared behind
/// an `Arc`; lookups by name (tree conversion) and by wire number (decoding)
/// are O(1).
#[derive(Debug)]
pub struct MessageDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
}

impl MessageDescriptor {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }
}

/// Builder for [`MessageDescriptor`].
///
/// Duplicate field names or wire numbers are a construction-time programmer
/// error and panic in `build`.
pub struct DescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl DescriptorBuilder {
    pub fn scalar(self, name: impl Into<String>, number: u32, kind: ScalarKind) -> Self {
        self.field(name, number, FieldKind::Scalar(kind))
    }

    pub fn message(self, name: impl Into<String>, number: u32, d: Arc<MessageDescriptor>) -> Self {
        self.field(name, number, FieldKind::Message(d))
    }

    pub fn repeated_scalar(self, name: impl Into<String>, number: u32, kind: ScalarKind) -> Self {
        self.field(name, number, FieldKind::RepeatedScalar(kind))
    }

    pub fn repeated_message(
        self,
        name: impl Into<String>,
        number: u32,
        d: Arc<MessageDescriptor>,
    ) -> Self {
        self.field(name, number, FieldKind::RepeatedMessage(d))
    }

    pub fn field(mut self, name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            number,
            kind,
        });
        self
    }

    pub fn build(self) -> Arc<MessageDescriptor> {
        let mut by_name = HashMap::with_capacity(self.fields.len());
        let mut by_number = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            assert!(
                field.number >= 1,
                "{}.{}: field numbers start at 1",
                self.name,
                field.name
            );
            assert!(
                by_name.insert(field.name.clone(), i).is_none(),
                "{}: duplicate field name {:?}",
                self.name,
                field.name
            );
            assert!(
                by_number.insert(field.number, i).is_none(),
                "{}: duplicate field number {}",
                self.name,
                field.number
            );
        }
        Arc::new(MessageDescriptor {
            name: self.name,
            fields: self.fields,
            by_name,
            by_number,
        })
    }
}
