//! Compiled predicate representation.

use std::fmt;

use serde_json::{Map, Value};

use super::error::{FilterError, FilterResult};

/// A dotted path into a document, e.g. `options.capped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> FilterResult<Self> {
        if path.is_empty() || path.split('.').any(|segment| segment.is_empty()) {
            return Err(FilterError::EmptyFieldPath);
        }
        Ok(Self(path.split('.').map(str::to_string).collect()))
    }

    /// Resolve the path against a document, descending through nested
    /// objects. Missing fields and non-object intermediates yield `None`.
    pub fn lookup<'a>(&self, doc: &'a Map<String, Value>) -> Option<&'a Value> {
        let mut segments = self.0.iter();
        let mut current = doc.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Comparison operators over document values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A compiled filter, evaluated against result documents.
///
/// Compilation happens once per command; evaluation is pure, so the same
/// predicate and document always yield the same decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Conjunction. The empty conjunction matches every document.
    And(Vec<Predicate>),

    /// Disjunction.
    Or(Vec<Predicate>),

    /// Negated disjunction.
    Nor(Vec<Predicate>),

    /// Negation of an operator clause.
    Not(Box<Predicate>),

    /// Compare the value at `path` against a literal.
    Compare {
        path: FieldPath,
        op: CompareOp,
        value: Value,
    },

    /// Membership test against a literal set.
    In {
        path: FieldPath,
        values: Vec<Value>,
        negated: bool,
    },

    /// Field presence test.
    Exists { path: FieldPath, expected: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_empty() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
    }

    #[test]
    fn test_lookup_nested() {
        let doc = json!({"name": "events", "options": {"capped": true}});
        let doc = doc.as_object().unwrap();

        let path = FieldPath::parse("options.capped").unwrap();
        assert_eq!(path.lookup(doc), Some(&json!(true)));

        let path = FieldPath::parse("options.max_size_bytes").unwrap();
        assert_eq!(path.lookup(doc), None);

        // descending through a non-object stops the walk
        let path = FieldPath::parse("name.inner").unwrap();
        assert_eq!(path.lookup(doc), None);
    }
}
