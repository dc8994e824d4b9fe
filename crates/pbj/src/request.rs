//! The boundary to the host web framework.
//!
//! The dispatcher never talks to sockets or framework internals; it sees
//! requests through [`HostRequest`] and hands back plain bytes, a status,
//! and headers. Adapters for concrete frameworks implement the trait (or
//! just fill in a [`RequestParts`]).

use indexmap::IndexMap;

/// Response headers, ordered for deterministic output.
pub type Headers = IndexMap<String, String>;

/// What the dispatcher needs from an inbound request.
pub trait HostRequest {
    /// HTTP method name, e.g. `"POST"`.
    fn method(&self) -> &str;

    /// The `Content-Type` header, if any.
    fn content_type(&self) -> Option<&str>;

    /// The raw `Accept` header, if any.
    fn accept(&self) -> Option<&str>;

    /// Raw body bytes.
    fn body(&self) -> &[u8];
}

/// Owned request data; the plain way to feed the dispatcher from an
/// adapter or a test.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub method: String,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: Vec<u8>,
}

impl RequestParts {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, value: impl Into<String>) -> Self {
        self.content_type = Some(value.into());
        self
    }

    pub fn with_accept(mut self, value: impl Into<String>) -> Self {
        self.accept = Some(value.into());
        self
    }

    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = bytes.into();
        self
    }
}

impl HostRequest for RequestParts {
    fn method(&self) -> &str {
        &self.method
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

/// A fully-formed response the handler built itself.
///
/// The dispatcher passes it through untouched, with no negotiation and no
/// encoding, mirroring the escape hatch web frameworks give route
/// functions that return a native response object.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub body: Vec<u8>,
    pub status: u16,
    pub mimetype: String,
    pub headers: Headers,
}

impl RawResponse {
    pub fn new(body: impl Into<Vec<u8>>, status: u16, mimetype: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status,
            mimetype: mimetype.into(),
            headers: Headers::new(),
        }
    }
}
