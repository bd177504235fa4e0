//! Native binary record encoding
//!
//! Bincode is not self-describing, so records are first mapped onto
//! [`BinaryValue`], a tagged value tree bincode can round-trip, and mapped
//! back to `serde_json::Value` on decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Result, StoreError};

/// Value tree stored by the native binary encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BinaryValue {
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<BinaryValue>),
    /// Field order is kept
    Object(Vec<(String, BinaryValue)>),
}

impl From<&Value> for BinaryValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => BinaryValue::Null,
            Value::Bool(b) => BinaryValue::Bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    BinaryValue::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    BinaryValue::Int(i)
                } else {
                    BinaryValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => BinaryValue::String(s.clone()),
            Value::Array(items) => BinaryValue::Array(items.iter().map(BinaryValue::from).collect()),
            Value::Object(map) => BinaryValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), BinaryValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<BinaryValue> for Value {
    fn from(value: BinaryValue) -> Self {
        match value {
            BinaryValue::Null => Value::Null,
            BinaryValue::Bool(b) => Value::Bool(b),
            BinaryValue::UInt(u) => Value::Number(Number::from(u)),
            BinaryValue::Int(i) => Value::Number(Number::from(i)),
            // Non-finite floats have no JSON form
            BinaryValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            BinaryValue::String(s) => Value::String(s),
            BinaryValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            BinaryValue::Object(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (k, v) in fields {
                    map.insert(k, Value::from(v));
                }
                Value::Object(map)
            }
        }
    }
}

/// Encode a record with bincode
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    bincode::serialize(&BinaryValue::from(value))
        .map_err(|e| StoreError::Serialization(format!("bincode encode failed: {}", e)))
}

/// Decode a record produced by [`to_bytes`]
pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
    let tree: BinaryValue = bincode::deserialize(bytes)
        .map_err(|e| StoreError::Binary(format!("bincode decode failed: {}", e)))?;
    Ok(Value::from(tree))
}
