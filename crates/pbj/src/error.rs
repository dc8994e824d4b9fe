//! The request-processing error taxonomy and its HTTP mapping.

use pbj_schema::SchemaError;
use pbj_tree::FieldAccessError;

/// Boxed error type handlers propagate opaquely through the dispatcher.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong between raw request bytes and encoded
/// response bytes.
///
/// Every failure here is deterministic for a given input; nothing is
/// transient and nothing is retried. [`Error::status`] is the single place
/// the taxonomy maps onto HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body's declared content type matches no configured codec.
    #[error("unsupported media type: {content_type:?}")]
    UnsupportedMediaType { content_type: String },
    /// No configured mimetype satisfies the Accept header.
    #[error("no configured mimetype satisfies the Accept header")]
    NotAcceptable,
    /// The body does not conform to the negotiated wire format.
    #[error("malformed request payload: {0}")]
    MalformedPayload(String),
    /// The binary codec was asked to decode without a receive type.
    #[error("no receive type configured for binary decode")]
    NoReceiveType,
    /// A handler read a required key the client did not send.
    #[error(transparent)]
    FieldAccess(#[from] FieldAccessError),
    /// Framework glue produced a return shape the dispatcher does not accept.
    #[error("unsupported handler return shape: {0}")]
    UnsupportedReturnShape(String),
    /// The binary codec was asked to encode without a send type.
    #[error("no send type configured for binary encode")]
    MissingSendType,
    /// The handler's tree does not fit the response schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// An opaque handler failure, passed through to the host framework.
    #[error("handler error: {0}")]
    Handler(#[source] BoxError),
}

impl Error {
    /// The HTTP status this failure surfaces as.
    pub fn status(&self) -> u16 {
        match self {
            Error::UnsupportedMediaType { .. } => 415,
            Error::NotAcceptable => 406,
            Error::MalformedPayload(_) | Error::NoReceiveType | Error::FieldAccess(_) => 400,
            Error::UnsupportedReturnShape(_)
            | Error::MissingSendType
            | Error::Schema(_)
            | Error::Handler(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            Error::UnsupportedMediaType {
                content_type: "application/x-plist".into()
            }
            .status(),
            415
        );
        assert_eq!(Error::NotAcceptable.status(), 406);
        assert_eq!(Error::MalformedPayload("bad".into()).status(), 400);
        assert_eq!(Error::NoReceiveType.status(), 400);
        assert_eq!(
            Error::FieldAccess(FieldAccessError::Missing("b".into())).status(),
            400
        );
        assert_eq!(Error::MissingSendType.status(), 500);
        assert_eq!(Error::UnsupportedReturnShape("tuple".into()).status(), 500);
    }
}
