//! JSON format codec.

use pbj_tree::Tree;

use crate::codec::FormatCodec;
use crate::error::Error;

/// UTF-8 JSON bodies under `application/json`.
///
/// Needs no schema: trees serialize directly. Encode is total for any tree;
/// decode rejects documents whose shape has no tree representation (non-
/// object roots, mixed arrays) the same way it rejects invalid JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

pub const JSON_MIMETYPE: &str = "application/json";

impl FormatCodec for JsonCodec {
    fn mimetype(&self) -> &str {
        JSON_MIMETYPE
    }

    fn decode(&self, body: &[u8]) -> Result<Tree, Error> {
        let doc: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::MalformedPayload(e.to_string()))?;
        Tree::try_from(doc).map_err(|e| Error::MalformedPayload(e.to_string()))
    }

    fn encode(&self, tree: &Tree, _status: u16) -> Result<Vec<u8>, Error> {
        let doc = serde_json::Value::from(tree.clone());
        Ok(doc.to_string().into_bytes())
    }
}
