//! Collection Module
//!
//! Minimal in-memory line-record collection that wires the codecs and the
//! field index together.
//!
//! ## Responsibilities
//! - Encode records (positional when a schema is configured) into lines
//! - Keep the field index in step with inserts, deletes and compaction
//! - Decode candidate lines returned by index queries
//! - Read and write newline-delimited record streams
//!
//! ## Write Path
//! ```text
//! record ─► SchemaCodec (optional) ─► RecordCodec::encode ─► lines[n]
//!    └──────────────────────────────► FieldIndex::add(record, n)
//! ```

use std::collections::{BTreeSet, HashMap};
use std::io::{BufRead, Write};

use serde_json::Value;

use crate::codec::{codec_for, escape::TERMINATOR, RecordCodec};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::index::{FieldIndex, MatchMode};
use crate::schema::SchemaCodec;

/// Line-record collection held in memory
pub struct Collection {
    /// Collection configuration
    config: Config,

    /// Line codec for the configured strategy
    codec: Box<dyn RecordCodec>,

    /// Positional schema, if records are stored as rows
    schema: Option<SchemaCodec>,

    /// Index over the configured fields
    index: FieldIndex,

    /// Encoded lines; `None` marks a deleted line awaiting compaction
    lines: Vec<Option<Vec<u8>>>,
}

impl Collection {
    /// Create an empty collection.
    ///
    /// An empty schema list means the schema is detected from the first
    /// inserted record.
    pub fn open(config: Config) -> Result<Self> {
        let codec = codec_for(&config.codec)?;

        let schema = match &config.schema {
            Some(fields) => Some(SchemaCodec::with_fields(fields.iter().cloned())?),
            None => None,
        };

        let index = FieldIndex::new(config.indexes.iter().cloned());

        tracing::debug!(
            "Opened collection: strategy={}, indexed_fields={}, positional={}",
            config.codec.strategy,
            config.indexes.len(),
            schema.is_some()
        );

        Ok(Self {
            config,
            codec,
            schema,
            index,
            lines: Vec::new(),
        })
    }

    /// Append a record; returns its line number.
    ///
    /// In a positional collection a schema field the record lacks is stored
    /// as `null`, so `get` returns it as an explicit `null` member. Fields
    /// added to the schema after the line was written stay absent.
    pub fn insert(&mut self, record: &Value) -> Result<u64> {
        if !record.is_object() {
            return Err(StoreError::InvalidInput(
                "Only object records can be inserted".to_string(),
            ));
        }

        let line = self.next_line()?;
        let encoded = self.encode_record(record)?;

        self.index.add(record, line)?;
        self.lines.push(Some(encoded));

        Ok(line)
    }

    /// Decode the record stored at `line`
    pub fn get(&self, line: u64) -> Result<Option<Value>> {
        let slot = usize::try_from(line).map_err(|_| {
            StoreError::InvalidInput(format!("Line number {} is out of range", line))
        })?;

        match self.lines.get(slot) {
            Some(Some(bytes)) => self.decode_record(bytes).map(Some),
            _ => Ok(None),
        }
    }

    /// Mark `line` deleted and drop it from the index
    pub fn delete(&mut self, line: u64) -> bool {
        let Ok(slot) = usize::try_from(line) else {
            return false;
        };

        match self.lines.get_mut(slot) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.index.remove(line);
                true
            }
            _ => false,
        }
    }

    /// Records matching `criteria`, in line order
    pub fn find(&self, criteria: &Value, mode: MatchMode) -> Result<Vec<(u64, Value)>> {
        let candidates = self.index.query_with(criteria, mode)?;
        let mut out = Vec::with_capacity(candidates.len());
        for line in candidates {
            if let Some(record) = self.get(line)? {
                out.push((line, record));
            }
        }
        Ok(out)
    }

    /// Line numbers matching `criteria`
    pub fn find_lines(&self, criteria: &Value, mode: MatchMode) -> Result<BTreeSet<u64>> {
        self.index.query_with(criteria, mode)
    }

    /// Drop deleted lines and renumber the survivors.
    ///
    /// Returns the old → new mapping of every line that moved.
    pub fn compact(&mut self) -> HashMap<u64, u64> {
        let mut mapping = HashMap::new();
        let mut kept = Vec::with_capacity(self.lines.len());
        let mut new = 0u64;

        for (old, slot) in (0u64..).zip(self.lines.drain(..)) {
            if let Some(bytes) = slot {
                if new != old {
                    mapping.insert(old, new);
                }
                kept.push(Some(bytes));
                new += 1;
            }
        }

        self.lines = kept;
        self.index.replace(&mapping);

        tracing::debug!(
            "Compacted collection to {} lines ({} renumbered)",
            self.lines.len(),
            mapping.len()
        );

        mapping
    }

    /// Write every live line, one per row
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for bytes in self.lines.iter().flatten() {
            writer.write_all(bytes)?;
            if bytes.last() != Some(&TERMINATOR) {
                writer.write_all(&[TERMINATOR])?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Append every line of `reader`, indexing each decoded record.
    ///
    /// Returns the number of lines loaded.
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        if !self.config.codec.line_oriented {
            return Err(StoreError::Config(
                "Loading by line requires a line-oriented codec configuration".to_string(),
            ));
        }

        let mut loaded = 0usize;
        for chunk in reader.split(TERMINATOR) {
            let bytes = chunk?;
            if bytes.is_empty() {
                continue;
            }

            let record = self.decode_record(&bytes)?;
            let line = self.next_line()?;
            self.index.add(&record, line)?;
            self.lines.push(Some(bytes));
            loaded += 1;
        }

        tracing::debug!("Loaded {} lines", loaded);
        Ok(loaded)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of line slots, deleted ones included
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of live records
    pub fn live_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_some()).count()
    }

    /// Raw encoded bytes of `line`
    pub fn raw_line(&self, line: u64) -> Option<&[u8]> {
        let slot = usize::try_from(line).ok()?;
        self.lines.get(slot)?.as_deref()
    }

    pub fn index(&self) -> &FieldIndex {
        &self.index
    }

    pub fn schema(&self) -> Option<&SchemaCodec> {
        self.schema.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn next_line(&self) -> Result<u64> {
        u64::try_from(self.lines.len()).map_err(|_| {
            StoreError::InvalidInput("Collection has too many lines to number".to_string())
        })
    }

    fn encode_record(&mut self, record: &Value) -> Result<Vec<u8>> {
        let Some(schema) = self.schema.as_mut() else {
            return self.codec.encode(record);
        };

        if schema.schema().is_empty() {
            schema.auto_detect_schema(record)?;
        }

        // New fields extend the schema instead of being dropped
        if let Some(object) = record.as_object() {
            for name in object.keys() {
                schema.add_field(name);
            }
        }

        let row = schema.object_to_array(record).ok_or_else(|| {
            StoreError::InvalidInput("Only object records can be stored positionally".to_string())
        })?;

        self.codec.encode(&SchemaCodec::row_to_value(&row))
    }

    fn decode_record(&self, bytes: &[u8]) -> Result<Value> {
        let stored = self.codec.decode(bytes)?;
        let Some(schema) = &self.schema else {
            return Ok(stored);
        };

        // A row wider than the schema would lose its trailing values
        let width = stored.as_array().map_or(0, Vec::len);
        if width > schema.schema().len() {
            return Err(StoreError::Config(format!(
                "Positional row has {} values but the schema has {} fields; \
                 configure the schema before loading",
                width,
                schema.schema().len()
            )));
        }

        schema.value_to_object(&stored).ok_or_else(|| {
            StoreError::Framing("Expected a positional row, found a non-array line".to_string())
        })
    }
}
