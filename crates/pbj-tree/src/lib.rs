//! Dynamic key-value tree for format-agnostic request handlers.
//!
//! A [`Tree`] is the intermediate representation that sits between wire
//! codecs and handler code: an ordered map from field name to [`Value`],
//! where a value is a scalar, a nested tree, or a homogeneous sequence of
//! either. Wire codecs build trees from request bodies and serialize the
//! trees handlers return; handlers never see the wire format.

mod json;
mod tree;

pub use json::TreeShapeError;
pub use tree::{FieldAccessError, Scalar, Tree, Value};
