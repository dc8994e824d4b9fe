//! Per-request content negotiation between JSON and schema-typed binary
//! bodies.
//!
//! Handlers operate on a dynamic key-value tree ([`pbj_tree::Tree`]) and
//! never see the wire format. An [`Api`] wraps a handler with an ordered
//! list of [`FormatCodec`]s; the request's `Content-Type` header picks the
//! inbound codec, the `Accept` header picks the outbound one, and
//! decode/encode failures map onto well-defined HTTP statuses
//! ([`Error::status`]).
//!
//! ```
//! use pbj::{Api, BinaryCodec, JsonCodec, Outcome, RequestParts};
//! use pbj_schema::{MessageDescriptor, ScalarKind};
//! use std::sync::Arc;
//!
//! let person = MessageDescriptor::builder("Person")
//!     .scalar("id", 1, ScalarKind::Int32)
//!     .scalar("name", 2, ScalarKind::Str)
//!     .build();
//!
//! let api = Api::new(vec![
//!     Arc::new(JsonCodec),
//!     Arc::new(BinaryCodec::new().receives(person.clone()).sends(person)),
//! ]);
//!
//! let request = RequestParts::new("POST")
//!     .with_content_type("application/json")
//!     .with_accept("*/*")
//!     .with_body(br#"{"id": 1, "name": "Red Leader"}"#.to_vec());
//! let reply = api
//!     .dispatch(&request, |tree| {
//!         Ok(Outcome::Body(tree.unwrap_or_default()))
//!     })
//!     .unwrap();
//! assert_eq!(reply.status, 200);
//! ```

pub mod accept;
mod api;
mod codec;
mod error;
mod json;
mod outcome;
mod protobuf;
mod request;

pub use api::{Api, HandlerError, Reply};
pub use codec::FormatCodec;
pub use error::{BoxError, Error};
pub use json::{JsonCodec, JSON_MIMETYPE};
pub use outcome::Outcome;
pub use protobuf::{BinaryCodec, PROTOBUF_MIMETYPE};
pub use request::{Headers, HostRequest, RawResponse, RequestParts};
