//! Compiles JSON filter documents into predicates.
//!
//! The surface syntax is the familiar match style: implicit equality
//! (`{"name": "users"}`), per-field operator documents
//! (`{"name": {"$in": ["a", "b"]}}`) and logical combinators
//! (`{"$or": [...]}`), with dotted paths reaching into subdocuments.

use serde_json::{Map, Value};

use super::ast::{CompareOp, FieldPath, Predicate};
use super::error::{FilterError, FilterResult};

/// Compile a filter document into a [`Predicate`].
///
/// The empty document compiles to a predicate that matches everything.
pub fn compile(filter: &Value) -> FilterResult<Predicate> {
    let doc = filter.as_object().ok_or(FilterError::NotADocument)?;
    compile_document(doc)
}

fn compile_document(doc: &Map<String, Value>) -> FilterResult<Predicate> {
    let mut clauses = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        if key.starts_with('$') {
            clauses.push(compile_logical(key, value)?);
        } else {
            clauses.push(compile_field(key, value)?);
        }
    }
    Ok(flatten_and(clauses))
}

fn compile_logical(op: &str, operand: &Value) -> FilterResult<Predicate> {
    let clauses = || -> FilterResult<Vec<Predicate>> {
        let array = operand
            .as_array()
            .filter(|array| !array.is_empty())
            .ok_or_else(|| FilterError::InvalidOperand {
                op: op.to_string(),
                expected: "a non-empty array of documents",
            })?;
        array.iter().map(compile).collect()
    };

    match op {
        "$and" => Ok(Predicate::And(clauses()?)),
        "$or" => Ok(Predicate::Or(clauses()?)),
        "$nor" => Ok(Predicate::Nor(clauses()?)),
        other => Err(FilterError::UnknownOperator(other.to_string())),
    }
}

fn compile_field(field: &str, value: &Value) -> FilterResult<Predicate> {
    let path = FieldPath::parse(field)?;
    match value {
        // an object mentioning operators is an operator document; every key
        // in it must then be an operator
        Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
            let mut clauses = Vec::with_capacity(obj.len());
            for (op, operand) in obj {
                clauses.push(compile_operator(&path, op, operand)?);
            }
            Ok(flatten_and(clauses))
        }
        literal => Ok(Predicate::Compare {
            path,
            op: CompareOp::Eq,
            value: literal.clone(),
        }),
    }
}

fn compile_operator(path: &FieldPath, op: &str, operand: &Value) -> FilterResult<Predicate> {
    let compare = |cmp| Predicate::Compare {
        path: path.clone(),
        op: cmp,
        value: operand.clone(),
    };

    match op {
        "$eq" => Ok(compare(CompareOp::Eq)),
        "$ne" => Ok(compare(CompareOp::Ne)),
        "$gt" => Ok(compare(CompareOp::Gt)),
        "$gte" => Ok(compare(CompareOp::Gte)),
        "$lt" => Ok(compare(CompareOp::Lt)),
        "$lte" => Ok(compare(CompareOp::Lte)),

        "$in" | "$nin" => {
            let values = operand.as_array().ok_or_else(|| FilterError::InvalidOperand {
                op: op.to_string(),
                expected: "an array of values",
            })?;
            Ok(Predicate::In {
                path: path.clone(),
                values: values.clone(),
                negated: op == "$nin",
            })
        }

        "$exists" => {
            let expected = operand.as_bool().ok_or_else(|| FilterError::InvalidOperand {
                op: op.to_string(),
                expected: "a boolean",
            })?;
            Ok(Predicate::Exists {
                path: path.clone(),
                expected,
            })
        }

        "$not" => {
            let inner = operand
                .as_object()
                .filter(|obj| !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')))
                .ok_or_else(|| FilterError::InvalidOperand {
                    op: "$not".to_string(),
                    expected: "a non-empty operator document",
                })?;
            let mut clauses = Vec::with_capacity(inner.len());
            for (inner_op, inner_operand) in inner {
                clauses.push(compile_operator(path, inner_op, inner_operand)?);
            }
            Ok(Predicate::Not(Box::new(flatten_and(clauses))))
        }

        other => Err(FilterError::UnknownOperator(other.to_string())),
    }
}

fn flatten_and(mut clauses: Vec<Predicate>) -> Predicate {
    if clauses.len() == 1 {
        clauses.swap_remove(0)
    } else {
        Predicate::And(clauses)
    }
}
