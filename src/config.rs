//! Configuration for linestore
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

/// Main configuration for a linestore collection
#[derive(Debug, Clone, Default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Codec Configuration
    // -------------------------------------------------------------------------
    /// How records are turned into stored lines
    pub codec: CodecConfig,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Fields tracked by the field index, with their kind
    pub indexes: Vec<(String, FieldKind)>,

    // -------------------------------------------------------------------------
    // Schema Configuration
    // -------------------------------------------------------------------------
    /// Initial positional schema. `None` means records are stored as objects.
    pub schema: Option<Vec<String>>,
}

/// Record codec configuration
#[derive(Debug, Clone, Copy)]
pub struct CodecConfig {
    /// Framing strategy for every line in the store
    pub strategy: Strategy,

    /// Encoding and compression switches
    pub options: CodecOptions,

    /// Whether the backing store scans records by line terminator.
    /// Tagged framing refuses binary payloads when this is set.
    pub line_oriented: bool,

    /// Zstd compression level
    pub compression_level: i32,
}

/// Per-record encoding switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Encode with the native binary format instead of JSON text
    pub use_native_binary: bool,

    /// Compress the payload
    pub compress: bool,

    /// Append a trailing `\n` to every encoded line
    pub append_terminator: bool,
}

/// Line framing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Escapes embedded terminators; safe for any payload
    Framed,

    /// One header byte per line declaring the payload encoding
    Tagged,

    /// JSON text only
    Plain,
}

/// Kind of a tracked field, fixed when the index is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Values are compared as numbers (`>`, `>=`, `<`, `<=`, `!=`)
    Numeric,

    /// Values are compared as text (`contains`, `regex`, `!=`)
    Text,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Framed,
            options: CodecOptions::default(),
            line_oriented: true,
            compression_level: 3,
        }
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            use_native_binary: false,
            compress: false,
            append_terminator: true,
        }
    }
}

impl FromStr for Strategy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "framed" => Ok(Strategy::Framed),
            "tagged" => Ok(Strategy::Tagged),
            "plain" => Ok(Strategy::Plain),
            other => Err(StoreError::Config(format!("Unknown strategy: {}", other))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Framed => "framed",
            Strategy::Tagged => "tagged",
            Strategy::Plain => "plain",
        };
        f.write_str(name)
    }
}

impl FromStr for FieldKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "number" | "numeric" => Ok(FieldKind::Numeric),
            "string" | "text" => Ok(FieldKind::Text),
            other => Err(StoreError::Config(format!("Unknown field kind: {}", other))),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the framing strategy
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.codec.strategy = strategy;
        self
    }

    /// Use the native binary encoding instead of JSON text
    pub fn native_binary(mut self, enabled: bool) -> Self {
        self.config.codec.options.use_native_binary = enabled;
        self
    }

    /// Compress every record
    pub fn compress(mut self, enabled: bool) -> Self {
        self.config.codec.options.compress = enabled;
        self
    }

    /// Append a trailing terminator to encoded lines
    pub fn append_terminator(mut self, enabled: bool) -> Self {
        self.config.codec.options.append_terminator = enabled;
        self
    }

    /// Declare whether the backing store is scanned line by line
    pub fn line_oriented(mut self, enabled: bool) -> Self {
        self.config.codec.line_oriented = enabled;
        self
    }

    /// Set the zstd compression level
    pub fn compression_level(mut self, level: i32) -> Self {
        self.config.codec.compression_level = level;
        self
    }

    /// Track a field in the index
    pub fn index(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.config.indexes.push((field.into(), kind));
        self
    }

    /// Set the initial positional schema
    pub fn schema<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.schema = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
