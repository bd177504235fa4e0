//! Query criteria
//!
//! Parses the JSON criteria vocabulary into typed per-field conditions,
//! checked against the kind of each tracked field.
//!
//! ## Vocabulary
//! ```text
//! {"city": "Paris"}                      membership (one value)
//! {"tags": ["red", "blue"]}              membership (any listed value)
//! {"age":  {">": 28, "<=": 40}}          numeric range, operators ANDed
//! {"name": {"contains": "an"}}           substring
//! {"name": {"regex": "^A"}}              pattern
//! {"name": {"!=": ["x", "y"]}}           exclusion
//! {"city": {"in": [..]}, "tag": {"nin": [..]}}
//! ```

use regex::Regex;
use serde_json::{Number, Value};

use crate::config::FieldKind;
use crate::error::{Result, StoreError};

/// Condition on one field
#[derive(Debug, Clone)]
pub enum Criterion {
    /// Value equals one of the listed keys
    Values(Vec<String>),

    /// Value passes every operator
    Operators(Vec<Operator>),
}

/// One comparison inside an object-shaped criterion
#[derive(Debug, Clone)]
pub enum Operator {
    Gt(f64),
    Gte(f64),
    Lt(f64),
    Lte(f64),
    /// Numeric exclusion
    NotEqualNumber(Vec<f64>),
    /// Text exclusion
    NotEqualText(Vec<String>),
    In(Vec<String>),
    Nin(Vec<String>),
    Contains(String),
    Regex(Regex),
}

impl Criterion {
    /// Parse the criterion for `field` of the given kind
    pub fn parse(field: &str, kind: FieldKind, spec: &Value) -> Result<Self> {
        match spec {
            Value::Object(ops) => {
                let mut parsed = Vec::with_capacity(ops.len());
                for (name, operand) in ops {
                    parsed.push(Operator::parse(field, kind, name, operand)?);
                }
                Ok(Criterion::Operators(parsed))
            }
            other => Ok(Criterion::Values(key_list(field, other)?)),
        }
    }
}

impl Operator {
    fn parse(field: &str, kind: FieldKind, name: &str, operand: &Value) -> Result<Self> {
        let op = match (kind, name) {
            (FieldKind::Numeric, ">") => Operator::Gt(number_operand(field, name, operand)?),
            (FieldKind::Numeric, ">=") => Operator::Gte(number_operand(field, name, operand)?),
            (FieldKind::Numeric, "<") => Operator::Lt(number_operand(field, name, operand)?),
            (FieldKind::Numeric, "<=") => Operator::Lte(number_operand(field, name, operand)?),
            (FieldKind::Numeric, "!=") => {
                let values = match operand {
                    Value::Array(items) => items
                        .iter()
                        .map(|v| number_operand(field, name, v))
                        .collect::<Result<Vec<_>>>()?,
                    single => vec![number_operand(field, name, single)?],
                };
                Operator::NotEqualNumber(values)
            }
            (FieldKind::Text, "!=") => Operator::NotEqualText(key_list(field, operand)?),
            (FieldKind::Text, "contains") => Operator::Contains(text_operand(field, name, operand)?),
            (FieldKind::Text, "regex") => {
                let pattern = text_operand(field, name, operand)?;
                let regex = Regex::new(&pattern).map_err(|e| {
                    StoreError::InvalidInput(format!("Invalid regex for field {}: {}", field, e))
                })?;
                Operator::Regex(regex)
            }
            (_, "in") => Operator::In(key_list(field, operand)?),
            (_, "nin") => Operator::Nin(key_list(field, operand)?),
            (kind, other) => {
                return Err(StoreError::InvalidInput(format!(
                    "Operator {} is not supported on {:?} field {}",
                    other, kind, field
                )))
            }
        };
        Ok(op)
    }

    /// Whether an indexed value key passes this operator
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Operator::Gt(bound) => parse_number(key).is_some_and(|n| n > *bound),
            Operator::Gte(bound) => parse_number(key).is_some_and(|n| n >= *bound),
            Operator::Lt(bound) => parse_number(key).is_some_and(|n| n < *bound),
            Operator::Lte(bound) => parse_number(key).is_some_and(|n| n <= *bound),
            Operator::NotEqualNumber(excluded) => {
                parse_number(key).is_some_and(|n| !excluded.contains(&n))
            }
            Operator::NotEqualText(excluded) | Operator::Nin(excluded) => {
                !excluded.iter().any(|e| e == key)
            }
            Operator::In(allowed) => allowed.iter().any(|a| a == key),
            Operator::Contains(needle) => key.contains(needle.as_str()),
            Operator::Regex(regex) => regex.is_match(key),
        }
    }
}

// =============================================================================
// Value keys
// =============================================================================

/// Canonical text key of a scalar value.
///
/// Integral floats print without a fraction so `25` and `25.0` share a key.
pub fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_key(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn parse_number(key: &str) -> Option<f64> {
    key.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Keys for a scalar or an array of scalars; `null` entries match nothing
fn key_list(field: &str, spec: &Value) -> Result<Vec<String>> {
    match spec {
        Value::Array(items) => {
            let mut keys = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(_) | Value::Object(_) => {
                        return Err(StoreError::InvalidInput(format!(
                            "Nested value in criterion list for field {}",
                            field
                        )))
                    }
                    scalar => keys.extend(scalar_key(scalar)),
                }
            }
            Ok(keys)
        }
        Value::Object(_) => Err(StoreError::InvalidInput(format!(
            "Expected a value or list for field {}",
            field
        ))),
        scalar => Ok(scalar_key(scalar).into_iter().collect()),
    }
}

fn number_operand(field: &str, op: &str, operand: &Value) -> Result<f64> {
    let parsed = match operand {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    };
    parsed.ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "Operator {} on field {} needs a number, got {}",
            op, field, operand
        ))
    })
}

fn text_operand(field: &str, op: &str, operand: &Value) -> Result<String> {
    match operand {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(scalar_key(operand).unwrap_or_default()),
        _ => Err(StoreError::InvalidInput(format!(
            "Operator {} on field {} needs a string, got {}",
            op, field, operand
        ))),
    }
}
