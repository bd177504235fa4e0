//! Field index implementation
//!
//! Inverted index: field → value key → line numbers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::config::FieldKind;
use crate::error::{Result, StoreError};

use super::criteria::{scalar_key, Criterion};

/// How per-field results are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Intersect field results (AND)
    #[default]
    All,

    /// Union field results (OR)
    Any,
}

/// Index state for one tracked field
#[derive(Debug, Clone)]
struct TrackedField {
    kind: FieldKind,
    /// Value key → lines. Sets are never empty.
    values: HashMap<String, BTreeSet<u64>>,
}

/// In-memory inverted index over a fixed set of tracked fields
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    fields: BTreeMap<String, TrackedField>,
}

impl FieldIndex {
    /// Create an index tracking the given fields
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldKind)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, kind)| {
                (
                    name.into(),
                    TrackedField {
                        kind,
                        values: HashMap::new(),
                    },
                )
            })
            .collect();

        Self { fields }
    }

    /// Register `line` under every truthy tracked value of `record`.
    ///
    /// Array values index each truthy scalar element. Falsy values (`0`,
    /// `""`, `false`, `null`) are never indexed.
    pub fn add(&mut self, record: &Value, line: u64) -> Result<()> {
        let object = record.as_object().ok_or_else(|| {
            StoreError::InvalidInput(format!("Cannot index non-object record at line {}", line))
        })?;

        for (name, tracked) in self.fields.iter_mut() {
            let Some(value) = object.get(name) else {
                continue;
            };

            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(key) = indexable_key(item) {
                            tracked.values.entry(key).or_default().insert(line);
                        }
                    }
                }
                scalar => {
                    if let Some(key) = indexable_key(scalar) {
                        tracked.values.entry(key).or_default().insert(line);
                    }
                }
            }
        }

        tracing::trace!("Indexed line {}", line);
        Ok(())
    }

    /// Remove `line` everywhere
    pub fn remove(&mut self, line: u64) {
        let mut touched = 0usize;
        for tracked in self.fields.values_mut() {
            tracked.values.retain(|_, lines| {
                if lines.remove(&line) {
                    touched += 1;
                }
                !lines.is_empty()
            });
        }
        tracing::debug!("Removed line {} from {} value sets", line, touched);
    }

    /// Renumber lines after compaction.
    ///
    /// All replacements apply at once, so `1→5, 5→7` moves the old 5 to 7
    /// and the old 1 to 5.
    pub fn replace(&mut self, mapping: &HashMap<u64, u64>) {
        if mapping.is_empty() {
            return;
        }

        for tracked in self.fields.values_mut() {
            for lines in tracked.values.values_mut() {
                if lines.iter().any(|n| mapping.contains_key(n)) {
                    *lines = lines
                        .iter()
                        .map(|n| mapping.get(n).copied().unwrap_or(*n))
                        .collect();
                }
            }
        }
        tracing::debug!("Renumbered {} lines in field index", mapping.len());
    }

    /// Lines matching every field criterion
    pub fn query(&self, criteria: &Value) -> Result<BTreeSet<u64>> {
        self.query_with(criteria, MatchMode::All)
    }

    /// Lines matching any field criterion
    pub fn query_any(&self, criteria: &Value) -> Result<BTreeSet<u64>> {
        self.query_with(criteria, MatchMode::Any)
    }

    /// Evaluate `criteria` against the index.
    ///
    /// Criteria on untracked fields are skipped, not treated as "no match".
    /// If no tracked field is named the result is empty.
    pub fn query_with(&self, criteria: &Value, mode: MatchMode) -> Result<BTreeSet<u64>> {
        let criteria = criteria
            .as_object()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                StoreError::InvalidInput("Query criteria must be a non-empty object".to_string())
            })?;

        let mut result: Option<BTreeSet<u64>> = None;

        for (name, spec) in criteria {
            let Some(tracked) = self.fields.get(name) else {
                tracing::trace!("Skipping untracked query field {}", name);
                continue;
            };

            let criterion = Criterion::parse(name, tracked.kind, spec)?;
            let lines = tracked.matching_lines(&criterion);

            result = Some(match (mode, result) {
                (_, None) => lines,
                (MatchMode::All, Some(acc)) => acc.intersection(&lines).copied().collect(),
                (MatchMode::Any, Some(mut acc)) => {
                    acc.extend(lines);
                    acc
                }
            });

            if mode == MatchMode::All && result.as_ref().is_some_and(|r| r.is_empty()) {
                return Ok(BTreeSet::new());
            }
        }

        Ok(result.unwrap_or_default())
    }

    /// Clear and re-index from `(line, record)` pairs
    pub fn rebuild<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, &'a Value)>,
    {
        self.clear();
        let mut count = 0u64;
        for (line, record) in records {
            self.add(record, line)?;
            count += 1;
        }
        tracing::debug!("Rebuilt field index from {} records", count);
        Ok(())
    }

    /// Drop every indexed value, keeping the tracked fields
    pub fn clear(&mut self) {
        for tracked in self.fields.values_mut() {
            tracked.values.clear();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Names of the tracked fields
    pub fn tracked_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Kind of a tracked field
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).map(|t| t.kind)
    }

    /// Lines holding exactly `value` in `field`
    pub fn lines_for(&self, field: &str, value: &Value) -> Option<&BTreeSet<u64>> {
        let key = scalar_key(value)?;
        self.fields.get(field)?.values.get(&key)
    }

    /// Number of distinct indexed values in `field`
    pub fn value_count(&self, field: &str) -> usize {
        self.fields.get(field).map(|t| t.values.len()).unwrap_or(0)
    }

    /// Whether no value is indexed in any field
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|t| t.values.is_empty())
    }
}

impl TrackedField {
    fn matching_lines(&self, criterion: &Criterion) -> BTreeSet<u64> {
        let mut out = BTreeSet::new();
        match criterion {
            Criterion::Values(keys) => {
                for key in keys {
                    if let Some(lines) = self.values.get(key) {
                        out.extend(lines.iter().copied());
                    }
                }
            }
            Criterion::Operators(ops) => {
                for (key, lines) in &self.values {
                    if ops.iter().all(|op| op.matches(key)) {
                        out.extend(lines.iter().copied());
                    }
                }
            }
        }
        out
    }
}

/// Key for a value that should be indexed, or `None` for falsy and
/// non-scalar values
fn indexable_key(value: &Value) -> Option<String> {
    let truthy = match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    if truthy {
        scalar_key(value)
    } else {
        None
    }
}
