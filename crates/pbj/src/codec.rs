//! The pluggable wire-format contract.

use pbj_tree::Tree;

use crate::error::Error;

/// One wire representation: a mimetype plus decode/encode between raw body
/// bytes and the dynamic tree.
///
/// Implementations are stateless per request; the same codec instance is
/// shared across requests behind an `Arc` and must not carry request state.
pub trait FormatCodec: Send + Sync {
    /// The exact mimetype this codec is registered under.
    fn mimetype(&self) -> &str;

    /// Parses raw request bytes into a tree.
    fn decode(&self, body: &[u8]) -> Result<Tree, Error>;

    /// Serializes a tree for a response with the given status code.
    fn encode(&self, tree: &Tree, status: u16) -> Result<Vec<u8>, Error>;
}
