//! Schema-typed binary format codec.

use std::sync::Arc;

use pbj_schema::{message_to_tree, tree_to_message, Message, MessageDescriptor};
use pbj_tree::Tree;

use crate::codec::FormatCodec;
use crate::error::Error;

pub const PROTOBUF_MIMETYPE: &str = "application/x-protobuf";

/// Length-delimited binary bodies under `application/x-protobuf`.
///
/// Carries up to three independently optional schema types: the type
/// requests parse into, the type success responses serialize as, and an
/// error type used for 4xx responses when configured. Absences surface at
/// the point of use: decoding without a receive type is a client-visible
/// 400, encoding without a send type is a configuration bug.
///
/// ```
/// use pbj::BinaryCodec;
/// use pbj_schema::{MessageDescriptor, ScalarKind};
///
/// let person = MessageDescriptor::builder("Person")
///     .scalar("id", 1, ScalarKind::Int32)
///     .scalar("name", 2, ScalarKind::Str)
///     .build();
/// let codec = BinaryCodec::new().receives(person.clone()).sends(person);
/// ```
#[derive(Debug, Default, Clone)]
pub struct BinaryCodec {
    receive_type: Option<Arc<MessageDescriptor>>,
    send_type: Option<Arc<MessageDescriptor>>,
    error_type: Option<Arc<MessageDescriptor>>,
}

impl BinaryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema type request bodies parse into.
    pub fn receives(mut self, d: Arc<MessageDescriptor>) -> Self {
        self.receive_type = Some(d);
        self
    }

    /// Schema type success responses serialize as.
    pub fn sends(mut self, d: Arc<MessageDescriptor>) -> Self {
        self.send_type = Some(d);
        self
    }

    /// Schema type 4xx responses serialize as, when configured.
    pub fn errors(mut self, d: Arc<MessageDescriptor>) -> Self {
        self.error_type = Some(d);
        self
    }
}

impl FormatCodec for BinaryCodec {
    fn mimetype(&self) -> &str {
        PROTOBUF_MIMETYPE
    }

    fn decode(&self, body: &[u8]) -> Result<Tree, Error> {
        let descriptor = self.receive_type.as_ref().ok_or(Error::NoReceiveType)?;
        let msg = Message::parse(descriptor.clone(), body)
            .map_err(|e| Error::MalformedPayload(e.to_string()))?;
        Ok(message_to_tree(&msg))
    }

    fn encode(&self, tree: &Tree, status: u16) -> Result<Vec<u8>, Error> {
        if tree.is_empty() {
            return Ok(Vec::new());
        }
        let target = if status / 100 == 4 && self.error_type.is_some() {
            self.error_type.as_ref()
        } else {
            self.send_type.as_ref()
        };
        let descriptor = target.ok_or(Error::MissingSendType)?;
        let mut msg = Message::new(descriptor.clone());
        tree_to_message(&mut msg, tree)?;
        Ok(msg.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbj_schema::ScalarKind;
    use serde_json::json;

    fn person() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("Person")
            .scalar("id", 1, ScalarKind::Int32)
            .scalar("name", 2, ScalarKind::Str)
            .scalar("email", 3, ScalarKind::Str)
            .build()
    }

    fn api_error() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("ApiError")
            .scalar("code", 1, ScalarKind::Int32)
            .scalar("detail", 2, ScalarKind::Str)
            .build()
    }

    fn tree(doc: serde_json::Value) -> Tree {
        Tree::try_from(doc).unwrap()
    }

    #[test]
    fn decode_requires_a_receive_type() {
        let codec = BinaryCodec::new().sends(person());
        assert!(matches!(codec.decode(b"").unwrap_err(), Error::NoReceiveType));
    }

    #[test]
    fn decode_rejects_malformed_bytes() {
        let codec = BinaryCodec::new().receives(person());
        let err = codec
            .decode(b"this data is malformed because it is not a wire message.")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn encode_decode_round_trip() {
        let codec = BinaryCodec::new().receives(person()).sends(person());
        let input = tree(json!({"id": 1, "name": "tester", "email": "tester@example.com"}));
        let bytes = codec.encode(&input, 200).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), input);
    }

    #[test]
    fn empty_tree_encodes_to_empty_body() {
        let codec = BinaryCodec::new();
        assert!(codec.encode(&Tree::new(), 200).unwrap().is_empty());
    }

    #[test]
    fn encode_without_send_type_fails() {
        let codec = BinaryCodec::new().receives(person());
        assert!(matches!(
            codec.encode(&tree(json!({"id": 1})), 200).unwrap_err(),
            Error::MissingSendType
        ));
    }

    #[test]
    fn client_errors_target_the_error_type() {
        let codec = BinaryCodec::new().sends(person()).errors(api_error());
        let body = tree(json!({"code": 404, "detail": "no such team"}));
        let bytes = codec.encode(&body, 404).unwrap();

        let parsed = Message::parse(api_error(), &bytes).unwrap();
        assert_eq!(message_to_tree(&parsed), body);

        // The same tree on a success status targets the send type and
        // fails because Person has no such fields.
        assert!(matches!(
            codec.encode(&body, 200).unwrap_err(),
            Error::Schema(_)
        ));
    }

    #[test]
    fn error_status_without_error_type_uses_send_type() {
        let codec = BinaryCodec::new().sends(person());
        let body = tree(json!({"id": 1, "name": "tester"}));
        let bytes = codec.encode(&body, 404).unwrap();
        let parsed = Message::parse(person(), &bytes).unwrap();
        assert_eq!(message_to_tree(&parsed), body);
    }
}
