//! Schema Module
//!
//! Positional record layout shared by every record in a store.
//!
//! ## Responsibilities
//! - Keep an ordered, duplicate-free field list
//! - Map field names to positions and back
//! - Project objects onto positional rows and back
//!
//! ## Evolution
//! Fields are only ever appended. A row written before a field existed is
//! simply shorter, and the missing trailing positions decode as absent.
//!
//! ```text
//! schema v1: [id, name]          row: [7, "a"]
//! schema v1 + add_field("age"):  [id, name, age]
//! decode [7, "a"]  →  {"id": 7, "name": "a"}
//! ```

mod codec;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Result, StoreError};

pub use codec::SchemaCodec;

/// A positional record. `None` marks a field that was absent from the
/// source object, which is distinct from a stored `null`.
pub type Row = Vec<Option<Value>>;

/// Ordered field list with its name → position map
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Position → name
    fields: Vec<String>,

    /// Name → position
    field_to_index: HashMap<String, usize>,

    /// Bumped whenever the field list is replaced or cleared
    version: u64,
}

impl Schema {
    /// Create an empty schema at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the field list. Names must be unique.
    pub fn set_fields<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        let mut field_to_index = HashMap::new();

        for name in names {
            let name = name.into();
            if field_to_index.contains_key(&name) {
                return Err(StoreError::InvalidInput(format!(
                    "Duplicate schema field: {}",
                    name
                )));
            }
            field_to_index.insert(name.clone(), fields.len());
            fields.push(name);
        }

        self.fields = fields;
        self.field_to_index = field_to_index;
        self.version += 1;
        Ok(())
    }

    /// Append a field unless it is already known; returns its position
    pub fn push_field(&mut self, name: &str) -> usize {
        if let Some(&pos) = self.field_to_index.get(name) {
            return pos;
        }
        let pos = self.fields.len();
        self.fields.push(name.to_string());
        self.field_to_index.insert(name.to_string(), pos);
        pos
    }

    /// Remove every field
    pub fn clear(&mut self) {
        self.fields.clear();
        self.field_to_index.clear();
        self.version += 1;
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.field_to_index.get(name).copied()
    }

    /// Name at `pos`
    pub fn field_at(&self, pos: usize) -> Option<&str> {
        self.fields.get(pos).map(String::as_str)
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
