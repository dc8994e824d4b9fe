//! Handler return values and their normalization.

use pbj_tree::Tree;

use crate::error::Error;
use crate::request::{Headers, RawResponse};

/// What a handler hands back to the dispatcher.
///
/// A tagged enum instead of tuple sniffing: handlers say explicitly whether
/// they return a body, a bare status, or a pre-built response, so there is
/// no runtime guessing about what a two-element tuple meant.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A body tree with the default 200 status.
    Body(Tree),
    /// A body tree with an explicit status.
    BodyStatus(Tree, u16),
    /// Body, status, and extra response headers.
    Full(Tree, u16, Headers),
    /// No body; just a status code.
    Status(u16),
    /// A fully-formed response passed through without encoding.
    Raw(RawResponse),
}

/// The shape that reaches a codec's encode step: exactly a tree plus a
/// status plus headers, or a status-only marker. Nothing else gets that
/// far.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Normalized {
    Payload {
        tree: Tree,
        status: u16,
        headers: Headers,
    },
    Empty {
        status: u16,
    },
}

pub(crate) fn normalize(outcome: Outcome) -> Normalized {
    match outcome {
        Outcome::Body(tree) => Normalized::Payload {
            tree,
            status: 200,
            headers: Headers::new(),
        },
        Outcome::BodyStatus(tree, status) => Normalized::Payload {
            tree,
            status,
            headers: Headers::new(),
        },
        Outcome::Full(tree, status, headers) => Normalized::Payload {
            tree,
            status,
            headers,
        },
        Outcome::Status(status) => Normalized::Empty { status },
        // Raw outcomes short-circuit in the dispatcher before normalization.
        Outcome::Raw(raw) => Normalized::Payload {
            tree: Tree::new(),
            status: raw.status,
            headers: raw.headers,
        },
    }
}

/// Adapter for framework glue that still produces loose JSON-ish return
/// values: an object, a bare integer status, or an array standing in for
/// the `(body[, status[, headers]])` tuple convention.
///
/// Anything else, in particular a tuple whose first element is not a
/// mapping, is an [`Error::UnsupportedReturnShape`]: silently accepting a
/// framework-native `(string_body, status)` pair here would bypass content
/// negotiation.
impl TryFrom<serde_json::Value> for Outcome {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Error> {
        match value {
            serde_json::Value::Object(_) => {
                let tree = Tree::try_from(value)
                    .map_err(|e| Error::UnsupportedReturnShape(e.to_string()))?;
                Ok(Outcome::Body(tree))
            }
            serde_json::Value::Number(ref n) => match n.as_u64() {
                Some(status) if status <= u64::from(u16::MAX) => {
                    Ok(Outcome::Status(status as u16))
                }
                _ => Err(Error::UnsupportedReturnShape(
                    "numeric return value is not a status code".to_string(),
                )),
            },
            serde_json::Value::Array(parts) => from_tuple(parts),
            other => Err(Error::UnsupportedReturnShape(format!(
                "handlers must return a mapping, a status code, or a (mapping, \
                 status, headers) tuple; got {other}"
            ))),
        }
    }
}

fn from_tuple(parts: Vec<serde_json::Value>) -> Result<Outcome, Error> {
    if parts.is_empty() || parts.len() > 3 {
        return Err(Error::UnsupportedReturnShape(format!(
            "tuple must have 1 to 3 elements, got {}",
            parts.len()
        )));
    }
    let mut parts = parts.into_iter();
    // One unwrap-free pull per position; arity was checked above.
    let body = match parts.next() {
        Some(body @ serde_json::Value::Object(_)) => Tree::try_from(body)
            .map_err(|e| Error::UnsupportedReturnShape(e.to_string()))?,
        _ => {
            return Err(Error::UnsupportedReturnShape(
                "tuple body must be a mapping".to_string(),
            ))
        }
    };
    let status = match parts.next() {
        None => return Ok(Outcome::Body(body)),
        Some(serde_json::Value::Number(n)) => match n.as_u64() {
            Some(s) if s <= u64::from(u16::MAX) => s as u16,
            _ => {
                return Err(Error::UnsupportedReturnShape(
                    "tuple status must be a status code".to_string(),
                ))
            }
        },
        Some(_) => {
            return Err(Error::UnsupportedReturnShape(
                "tuple status must be an integer".to_string(),
            ))
        }
    };
    let headers = match parts.next() {
        None => return Ok(Outcome::BodyStatus(body, status)),
        Some(serde_json::Value::Object(map)) => {
            let mut headers = Headers::new();
            for (key, value) in map {
                match value {
                    serde_json::Value::String(s) => {
                        headers.insert(key, s);
                    }
                    _ => {
                        return Err(Error::UnsupportedReturnShape(
                            "tuple headers must map strings to strings".to_string(),
                        ))
                    }
                }
            }
            headers
        }
        Some(_) => {
            return Err(Error::UnsupportedReturnShape(
                "tuple headers must be a mapping".to_string(),
            ))
        }
    };
    Ok(Outcome::Full(body, status, headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(doc: serde_json::Value) -> Tree {
        Tree::try_from(doc).unwrap()
    }

    #[test]
    fn bare_status_normalizes_to_empty_body() {
        let outcome = Outcome::try_from(json!(204)).unwrap();
        assert_eq!(outcome, Outcome::Status(204));
        assert_eq!(normalize(outcome), Normalized::Empty { status: 204 });
    }

    #[test]
    fn mapping_defaults_to_200_and_no_headers() {
        let outcome = Outcome::try_from(json!({"a": 1})).unwrap();
        assert_eq!(
            normalize(outcome),
            Normalized::Payload {
                tree: tree(json!({"a": 1})),
                status: 200,
                headers: Headers::new(),
            }
        );
    }

    #[test]
    fn tuple_with_status() {
        let outcome = Outcome::try_from(json!([{"a": 1}, 201])).unwrap();
        assert_eq!(outcome, Outcome::BodyStatus(tree(json!({"a": 1})), 201));
    }

    #[test]
    fn tuple_with_headers() {
        let outcome =
            Outcome::try_from(json!([{"a": 1}, 201, {"Location": "/teams/2"}])).unwrap();
        match outcome {
            Outcome::Full(body, 201, headers) => {
                assert_eq!(body, tree(json!({"a": 1})));
                assert_eq!(headers.get("Location").map(String::as_str), Some("/teams/2"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_mapping_tuple_body_is_unsupported() {
        // The host framework's native ("body text", status) convention.
        let err = Outcome::try_from(json!(["created", 201])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedReturnShape(_)));
    }

    #[test]
    fn oversized_tuple_is_unsupported() {
        let err = Outcome::try_from(json!([{"a": 1}, 200, {}, "extra"])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedReturnShape(_)));
        let err = Outcome::try_from(json!([])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedReturnShape(_)));
    }

    #[test]
    fn strings_and_bools_are_unsupported_returns() {
        assert!(matches!(
            Outcome::try_from(json!("ok")).unwrap_err(),
            Error::UnsupportedReturnShape(_)
        ));
        assert!(matches!(
            Outcome::try_from(json!(true)).unwrap_err(),
            Error::UnsupportedReturnShape(_)
        ));
    }
}
