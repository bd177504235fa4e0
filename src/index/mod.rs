//! Field Index Module
//!
//! In-memory inverted index from field values to record line numbers.
//!
//! ## Responsibilities
//! - Track a fixed set of fields, each tagged Numeric or Text
//! - Register, remove and renumber line numbers as the store changes
//! - Answer membership, range, substring and pattern queries
//!
//! ## Layout
//! ```text
//! "category" ─┬─ "Electronics" → {0, 1, 7}
//!             └─ "Books"       → {2}
//! "age"      ─┬─ "25"          → {0}
//!             └─ "30"          → {1, 2}
//! ```
//!
//! Line numbers are opaque keys into the record store; the index never
//! checks that they exist. Callers must `remove`/`replace` on every change
//! to a backing line.
//!
//! ## Known limitations
//! - Falsy values (`0`, `""`, `false`, `null`) are not indexed, so they
//!   cannot be found by exact match.
//! - Query criteria on untracked fields are skipped rather than filtering
//!   the result.

mod criteria;
mod field_index;

pub use criteria::{scalar_key, Criterion, Operator};
pub use field_index::{FieldIndex, MatchMode};
