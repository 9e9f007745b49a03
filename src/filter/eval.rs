//! Predicate evaluation against documents.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::ast::{CompareOp, FieldPath, Predicate};

impl Predicate {
    /// Decide whether `doc` satisfies this predicate.
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        match self {
            Predicate::And(clauses) => clauses.iter().all(|clause| clause.matches(doc)),
            Predicate::Or(clauses) => clauses.iter().any(|clause| clause.matches(doc)),
            Predicate::Nor(clauses) => !clauses.iter().any(|clause| clause.matches(doc)),
            Predicate::Not(inner) => !inner.matches(doc),
            Predicate::Compare { path, op, value } => matches_compare(path.lookup(doc), *op, value),
            Predicate::In {
                path,
                values,
                negated,
            } => {
                let actual = path.lookup(doc).unwrap_or(&Value::Null);
                let found = values.iter().any(|value| values_equal(actual, value));
                found != *negated
            }
            Predicate::Exists { path, expected } => path.lookup(doc).is_some() == *expected,
        }
    }
}

fn matches_compare(actual: Option<&Value>, op: CompareOp, expected: &Value) -> bool {
    match op {
        // missing fields behave as null for equality tests
        CompareOp::Eq => values_equal(actual.unwrap_or(&Value::Null), expected),
        CompareOp::Ne => !values_equal(actual.unwrap_or(&Value::Null), expected),
        CompareOp::Gt => ordered(actual, expected, |ord| ord == Ordering::Greater),
        CompareOp::Gte => ordered(actual, expected, |ord| ord != Ordering::Less),
        CompareOp::Lt => ordered(actual, expected, |ord| ord == Ordering::Less),
        CompareOp::Lte => ordered(actual, expected, |ord| ord != Ordering::Greater),
    }
}

fn ordered<F>(actual: Option<&Value>, expected: &Value, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    actual
        .and_then(|value| compare_values(value, expected))
        .map(accept)
        .unwrap_or(false)
}

/// Structural equality, comparing numbers as f64.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .map(|(x, y)| x == y)
            .unwrap_or(false),
        _ => a == b,
    }
}

/// Order two values of the same general type; mixed types are unordered.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
