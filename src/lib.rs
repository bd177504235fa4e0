//! # linestore
//!
//! Encoding and indexing core for newline-delimited record stores:
//! - Record codecs that keep every record on exactly one line, with optional
//!   compression and a compact binary encoding
//! - Schema codec for positional (array) records
//! - In-memory field index with range, pattern and membership queries
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Collection                              │
//! │        (orchestrates writes, deletes, queries)               │
//! └───────────┬─────────────────────────────────┬───────────────┘
//!             │                                 │
//!             ▼                                 ▼
//!   ┌──────────────────┐               ┌──────────────────┐
//!   │   SchemaCodec    │               │    FieldIndex    │
//!   │ (object ⇄ row)   │               │ (value → lines)  │
//!   └────────┬─────────┘               └──────────────────┘
//!            │
//!            ▼
//!   ┌──────────────────┐
//!   │   RecordCodec    │
//!   │ Framed / Tagged  │
//!   │     / Plain      │
//!   └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod schema;
pub mod index;
pub mod collection;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{CodecConfig, CodecOptions, Config, FieldKind, Strategy};
pub use codec::{codec_for, RecordCodec};
pub use schema::{Schema, SchemaCodec};
pub use index::{FieldIndex, MatchMode};
pub use collection::Collection;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of linestore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
