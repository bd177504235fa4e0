//! Record Codec Module
//!
//! Turns records into bytes that can be stored as exactly one line of a
//! newline-delimited file, and back.
//!
//! ## Strategies
//!
//! ### Framed
//! ```text
//! JSON text (no compression):
//! ┌─────────────────────────────────────┬──────┐
//! │ {"id":1,"name":"a"}                 │ '\n' │
//! └─────────────────────────────────────┴──────┘
//!
//! Binary or compressed payload (escaped, see `escape`):
//! ┌──────────────────────┬──────────────┬───────────┬──────┐
//! │ Payload minus '\n'   │ Sentinel (4) │ [pos,...] │ '\n' │
//! └──────────────────────┴──────────────┴───────────┴──────┘
//! ```
//!
//! ### Tagged
//! ```text
//! ┌────────────┬─────────────────────────────┬──────┐
//! │ Header (1) │         Payload             │ '\n' │
//! └────────────┴─────────────────────────────┴──────┘
//! ```
//! - 0x01: payload is compressed
//! - 0x02: payload is native binary
//!
//! ### Plain
//! JSON text and the trailing terminator, nothing else.
//!
//! Framed is the only strategy that keeps binary payloads line-safe; Tagged
//! refuses binary payloads on line-oriented storage.

mod binary;
mod compression;
mod framed;
mod plain;
mod tagged;

pub mod escape;

use serde_json::Value;

use crate::config::{CodecConfig, Strategy};
use crate::error::{Result, StoreError};

pub use binary::BinaryValue;
pub use compression::{Compressor, ZstdCompressor};
pub use framed::FramedCodec;
pub use plain::PlainCodec;
pub use tagged::{TaggedCodec, FLAG_BINARY, FLAG_COMPRESSED};

/// Encodes records to stored lines and decodes them back
pub trait RecordCodec: Send + Sync {
    /// Which framing this codec writes
    fn strategy(&self) -> Strategy;

    /// Encode one record
    fn encode(&self, record: &Value) -> Result<Vec<u8>>;

    /// Decode one stored line
    fn decode(&self, line: &[u8]) -> Result<Value>;

    /// Decode one stored line, mapping any failure to `None`
    fn safe_decode(&self, line: &[u8]) -> Option<Value> {
        match self.decode(line) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Discarding undecodable {} line: {}", self.strategy(), e);
                None
            }
        }
    }
}

/// Build the codec selected by `config`
pub fn codec_for(config: &CodecConfig) -> Result<Box<dyn RecordCodec>> {
    let codec: Box<dyn RecordCodec> = match config.strategy {
        Strategy::Framed => Box::new(FramedCodec::new(
            config.options,
            ZstdCompressor::new(config.compression_level),
        )),
        Strategy::Tagged => Box::new(TaggedCodec::new(
            config.options,
            ZstdCompressor::new(config.compression_level),
            config.line_oriented,
        )?),
        Strategy::Plain => {
            if config.options.compress || config.options.use_native_binary {
                return Err(StoreError::Config(
                    "Plain strategy supports neither compression nor native binary".to_string(),
                ));
            }
            Box::new(PlainCodec::new(config.options.append_terminator))
        }
    };
    Ok(codec)
}

// =============================================================================
// Shared payload helpers
// =============================================================================

/// Serialize a record as JSON text
pub(crate) fn json_to_bytes(record: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|e| StoreError::Serialization(format!("JSON encode failed: {}", e)))
}

/// Parse JSON text
pub(crate) fn json_from_bytes(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Json(e.to_string()))
}

/// Encode with the configured payload format
pub(crate) fn payload_to_bytes(record: &Value, native_binary: bool) -> Result<Vec<u8>> {
    if native_binary {
        binary::to_bytes(record)
    } else {
        json_to_bytes(record)
    }
}

/// Decode with the configured payload format
pub(crate) fn payload_from_bytes(bytes: &[u8], native_binary: bool) -> Result<Value> {
    if native_binary {
        binary::from_bytes(bytes)
    } else {
        json_from_bytes(bytes)
    }
}
