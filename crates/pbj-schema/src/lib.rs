//! Schema-typed messages and their binary wire format.
//!
//! A [`MessageDescriptor`] declares the shape of a message type once
//! (field names, wire numbers, and kinds) and a [`Message`] is a dynamic
//! instance of one: a bag of explicitly-set fields. The [`convert`] module
//! walks messages to and from the dynamic [`pbj_tree::Tree`] representation,
//! and [`wire`] reads and writes the length-delimited binary encoding.
//!
//! Field presence is a first-class concept throughout: a field set to its
//! zero value and a field never set are different states, and both survive
//! a round trip.

pub mod convert;
mod descriptor;
mod message;
pub mod wire;

pub use convert::{message_to_tree, tree_to_message};
pub use descriptor::{DescriptorBuilder, FieldDescriptor, FieldKind, MessageDescriptor, ScalarKind};
pub use message::{FieldValue, Message, SchemaError};
pub use wire::WireError;
