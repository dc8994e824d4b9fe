//! The dispatcher: decode → invoke → normalize → encode.

use std::sync::Arc;

use pbj_tree::{FieldAccessError, Tree};

use crate::accept;
use crate::codec::FormatCodec;
use crate::error::{BoxError, Error};
use crate::outcome::{normalize, Normalized, Outcome};
use crate::request::{Headers, HostRequest};

/// Failure produced by a handler.
///
/// `FieldAccess` is the one error the dispatcher intercepts and converts to
/// a client-facing 400: a handler reaching for a required key the client
/// did not send means the payload was incomplete, not that the server is
/// broken. Everything else propagates opaquely to the host framework.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    FieldAccess(#[from] FieldAccessError),
    #[error(transparent)]
    Other(BoxError),
}

/// The dispatcher's output: body bytes, status, and headers, ready for the
/// host framework's response constructor. `Content-Type` is already in the
/// headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: Vec<u8>,
    pub status: u16,
    pub headers: Headers,
}

/// A configured set of format codecs wrapping handler invocations.
///
/// Built once; immutable and stateless across requests. The order codecs
/// are given in is meaningful: it is the preference order when a client's
/// Accept header ties (e.g. `*/*`).
///
/// ```
/// use pbj::{Api, JsonCodec, Outcome, RequestParts};
/// use std::sync::Arc;
///
/// let api = Api::new(vec![Arc::new(JsonCodec)]);
/// let request = RequestParts::new("POST")
///     .with_content_type("application/json")
///     .with_accept("*/*")
///     .with_body(br#"{"name": "Red Leader"}"#.to_vec());
///
/// let reply = api
///     .dispatch(&request, |tree| {
///         let tree = tree.unwrap_or_default();
///         let name = tree.str_("name")?;
///         let mut out = pbj_tree::Tree::new();
///         out.insert("name", format!("{name}'s Team"));
///         Ok(Outcome::BodyStatus(out, 201))
///     })
///     .unwrap();
/// assert_eq!(reply.status, 201);
/// ```
pub struct Api {
    codecs: Vec<Arc<dyn FormatCodec>>,
    mimetypes: Vec<String>,
}

/// Methods whose bodies carry data to decode (create/update semantics).
fn carries_body(method: &str) -> bool {
    method.eq_ignore_ascii_case("POST")
        || method.eq_ignore_ascii_case("PUT")
        || method.eq_ignore_ascii_case("PATCH")
}

/// Strips parameters and normalizes case: `Application/JSON; charset=utf-8`
/// matches a codec registered under `application/json`.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

impl Api {
    /// Builds the codec registry. Order defines Accept-tie preference.
    pub fn new(codecs: Vec<Arc<dyn FormatCodec>>) -> Self {
        let mimetypes = codecs
            .iter()
            .map(|c| c.mimetype().to_ascii_lowercase())
            .collect();
        Self { codecs, mimetypes }
    }

    /// The configured mimetypes, in preference order.
    pub fn mimetypes(&self) -> &[String] {
        &self.mimetypes
    }

    fn inbound(&self, content_type: Option<&str>) -> Result<&dyn FormatCodec, Error> {
        let declared = media_type(content_type.unwrap_or(""));
        self.mimetypes
            .iter()
            .position(|m| *m == declared)
            .map(|i| self.codecs[i].as_ref())
            .ok_or(Error::UnsupportedMediaType {
                content_type: content_type.unwrap_or("").to_string(),
            })
    }

    /// Runs one request through decode → invoke → normalize → encode.
    ///
    /// The handler receives `Some(tree)` for body-carrying methods and
    /// `None` otherwise. Outbound negotiation happens only after the
    /// handler has run: a request with an unsatisfiable Accept header is
    /// still a valid request until there is a response to encode.
    pub fn dispatch<R, H>(&self, request: &R, handler: H) -> Result<Reply, Error>
    where
        R: HostRequest,
        H: FnOnce(Option<Tree>) -> Result<Outcome, HandlerError>,
    {
        let tree = if carries_body(request.method()) {
            let codec = self.inbound(request.content_type())?;
            Some(codec.decode(request.body())?)
        } else {
            None
        };

        let outcome = handler(tree).map_err(|e| match e {
            HandlerError::FieldAccess(err) => Error::FieldAccess(err),
            HandlerError::Other(err) => Error::Handler(err),
        })?;

        if let Outcome::Raw(raw) = outcome {
            let mut headers = raw.headers;
            headers.insert("Content-Type".to_string(), raw.mimetype);
            return Ok(Reply {
                body: raw.body,
                status: raw.status,
                headers,
            });
        }

        let chosen = accept::best_match(request.accept(), &self.mimetypes)
            .ok_or(Error::NotAcceptable)?;
        let codec = &self.codecs[chosen];
        let mimetype = &self.mimetypes[chosen];

        let (body, status, mut headers) = match normalize(outcome) {
            Normalized::Empty { status } => (Vec::new(), status, Headers::new()),
            Normalized::Payload {
                tree,
                status,
                headers,
            } => (codec.encode(&tree, status)?, status, headers),
        };
        headers.insert("Content-Type".to_string(), mimetype.clone());
        Ok(Reply {
            body,
            status,
            headers,
        })
    }
}
