//! The tree itself: scalars, values, ordered entries, required-key access.

use indexmap::IndexMap;

/// Error raised when a handler reads a key the client did not send, or a
/// key whose value has a different shape than the handler expects.
///
/// The dispatcher converts this error into an HTTP 400: a handler reaching
/// for a required field that is not there means the client payload was
/// incomplete, not that the server is broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldAccessError {
    #[error("required key missing: {0}")]
    Missing(String),
    #[error("key has unexpected shape: {0}")]
    WrongShape(String),
}

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// One entry value in a [`Tree`].
///
/// Sequences are homogeneous: all scalars or all trees. `Null` is
/// representable so that "key present but explicitly empty" can flow through
/// a tree; codecs treat it as "field not present" when converting to a
/// schema-typed message.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Tree(Tree),
    Scalars(Vec<Scalar>),
    Trees(Vec<Tree>),
}

/// Ordered map from field name to [`Value`].
///
/// Insertion order is preserved for deterministic serialization but is
/// irrelevant for equality: two trees with the same entries compare equal
/// regardless of the order they were built in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    entries: IndexMap<String, Value>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the value under `key`, failing if the key is absent.
    pub fn required(&self, key: &str) -> Result<&Value, FieldAccessError> {
        self.entries
            .get(key)
            .ok_or_else(|| FieldAccessError::Missing(key.to_string()))
    }

    /// Required integer value.
    pub fn int(&self, key: &str) -> Result<i64, FieldAccessError> {
        match self.required(key)? {
            Value::Scalar(Scalar::Int(n)) => Ok(*n),
            _ => Err(FieldAccessError::WrongShape(key.to_string())),
        }
    }

    /// Required floating-point value; integers widen.
    pub fn float(&self, key: &str) -> Result<f64, FieldAccessError> {
        match self.required(key)? {
            Value::Scalar(Scalar::Float(f)) => Ok(*f),
            Value::Scalar(Scalar::Int(n)) => Ok(*n as f64),
            _ => Err(FieldAccessError::WrongShape(key.to_string())),
        }
    }

    /// Required boolean value.
    pub fn bool_(&self, key: &str) -> Result<bool, FieldAccessError> {
        match self.required(key)? {
            Value::Scalar(Scalar::Bool(b)) => Ok(*b),
            _ => Err(FieldAccessError::WrongShape(key.to_string())),
        }
    }

    /// Required string value.
    pub fn str_(&self, key: &str) -> Result<&str, FieldAccessError> {
        match self.required(key)? {
            Value::Scalar(Scalar::Str(s)) => Ok(s.as_str()),
            _ => Err(FieldAccessError::WrongShape(key.to_string())),
        }
    }

    /// Required nested tree.
    pub fn tree(&self, key: &str) -> Result<&Tree, FieldAccessError> {
        match self.required(key)? {
            Value::Tree(t) => Ok(t),
            _ => Err(FieldAccessError::WrongShape(key.to_string())),
        }
    }
}

impl FromIterator<(String, Value)> for Tree {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Scalar::Int(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Str(s))
    }
}

impl From<Tree> for Value {
    fn from(t: Tree) -> Self {
        Value::Tree(t)
    }
}

impl From<Vec<Scalar>> for Value {
    fn from(v: Vec<Scalar>) -> Self {
        Value::Scalars(v)
    }
}

impl From<Vec<Tree>> for Value {
    fn from(v: Vec<Tree>) -> Self {
        Value::Trees(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_insertion_order() {
        let mut a = Tree::new();
        a.insert("id", 1);
        a.insert("name", "tester");
        let mut b = Tree::new();
        b.insert("name", "tester");
        b.insert("id", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn required_reports_missing_key() {
        let mut tree = Tree::new();
        tree.insert("a", 1);
        assert!(tree.required("a").is_ok());
        assert_eq!(
            tree.required("b"),
            Err(FieldAccessError::Missing("b".to_string()))
        );
    }

    #[test]
    fn typed_getters_check_shape() {
        let mut tree = Tree::new();
        tree.insert("id", 7);
        tree.insert("name", "tester");
        tree.insert("ratio", 0.5);
        tree.insert("active", true);

        assert_eq!(tree.int("id"), Ok(7));
        assert_eq!(tree.str_("name"), Ok("tester"));
        assert_eq!(tree.float("ratio"), Ok(0.5));
        assert_eq!(tree.float("id"), Ok(7.0));
        assert_eq!(tree.bool_("active"), Ok(true));
        assert_eq!(
            tree.int("name"),
            Err(FieldAccessError::WrongShape("name".to_string()))
        );
    }

    #[test]
    fn zero_values_are_present() {
        let mut tree = Tree::new();
        tree.insert("count", 0);
        tree.insert("label", "");
        assert_eq!(tree.int("count"), Ok(0));
        assert_eq!(tree.str_("label"), Ok(""));
        assert!(tree.get("missing").is_none());
    }
}
