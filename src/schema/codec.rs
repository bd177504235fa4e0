//! Schema codec
//!
//! Converts records between object form and positional rows.

use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

use super::{Row, Schema};

/// Field every auto-detected schema carries
const ID_FIELD: &str = "id";

/// Object ⇄ positional row conversion driven by a [`Schema`]
#[derive(Debug, Clone, Default)]
pub struct SchemaCodec {
    schema: Schema,
}

impl SchemaCodec {
    /// Create a codec with an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with the given field list
    pub fn with_fields<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codec = Self::new();
        codec.set_schema(names)?;
        Ok(codec)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Replace the field list
    pub fn set_schema<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.set_fields(names)?;
        tracing::debug!(
            "Schema set to {} fields (version {})",
            self.schema.len(),
            self.schema.version()
        );
        Ok(())
    }

    /// Derive the schema from a sample record.
    ///
    /// Field names are sorted so independent processes seeing the same data
    /// agree on positions. `id` is always present, appended if the sample
    /// lacks it. An array sample contributes its first element.
    pub fn auto_detect_schema(&mut self, sample: &Value) -> Result<()> {
        let record = match sample {
            Value::Array(items) => items.first().ok_or_else(|| {
                StoreError::InvalidInput("Cannot detect schema from an empty array".to_string())
            })?,
            other => other,
        };

        let object = record.as_object().ok_or_else(|| {
            StoreError::InvalidInput("Schema sample must be an object".to_string())
        })?;

        let mut names: Vec<String> = object.keys().cloned().collect();
        names.sort();
        if !object.contains_key(ID_FIELD) {
            names.push(ID_FIELD.to_string());
        }

        self.set_schema(names)
    }

    /// Append a field; returns the existing position if already known
    pub fn add_field(&mut self, name: &str) -> usize {
        let before = self.schema.len();
        let pos = self.schema.push_field(name);
        if self.schema.len() > before {
            tracing::debug!("Schema field {} added at position {}", name, pos);
        }
        pos
    }

    /// Project an object onto the schema.
    ///
    /// Returns `None` when `record` is not an object; the caller keeps its
    /// input as-is. Fields outside the schema are dropped.
    pub fn object_to_array(&self, record: &Value) -> Option<Row> {
        let object = record.as_object()?;
        Some(
            self.schema
                .fields()
                .iter()
                .map(|name| object.get(name).cloned())
                .collect(),
        )
    }

    /// Rebuild an object from a positional row.
    ///
    /// Missing slots are dropped; positions past the schema are ignored.
    pub fn array_to_object(&self, row: &[Option<Value>]) -> Value {
        let mut object = Map::with_capacity(self.schema.len());
        for (name, slot) in self.schema.fields().iter().zip(row) {
            if let Some(value) = slot {
                object.insert(name.clone(), value.clone());
            }
        }
        Value::Object(object)
    }

    /// Whether every schema field is a key of `record`
    pub fn validate_object(&self, record: &Value) -> bool {
        match record.as_object() {
            Some(object) => self
                .schema
                .fields()
                .iter()
                .all(|name| object.contains_key(name)),
            None => false,
        }
    }

    /// Clear the schema so it can be rebuilt from scratch
    pub fn reset(&mut self) {
        self.schema.clear();
        tracing::debug!("Schema reset (version {})", self.schema.version());
    }

    // =========================================================================
    // Stored form
    // =========================================================================

    /// JSON form of a row for the record codec; missing slots become `null`
    pub fn row_to_value(row: &[Option<Value>]) -> Value {
        Value::Array(
            row.iter()
                .map(|slot| slot.clone().unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// Rebuild an object from a stored JSON array.
    ///
    /// Returns `None` when `stored` is not an array.
    pub fn value_to_object(&self, stored: &Value) -> Option<Value> {
        let items = stored.as_array()?;
        let row: Row = items.iter().cloned().map(Some).collect();
        Some(self.array_to_object(&row))
    }
}
