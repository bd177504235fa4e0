//! Framed record codec
//!
//! Binary and compressed payloads go through the escaping transform so the
//! stored line never holds a raw terminator except the final one.

use serde_json::Value;

use crate::config::{CodecOptions, Strategy};
use crate::error::{Result, StoreError};

use super::compression::Compressor;
use super::escape::{self, TERMINATOR};
use super::{json_from_bytes, payload_from_bytes, payload_to_bytes, RecordCodec};

/// Codec for the Framed strategy
pub struct FramedCodec {
    options: CodecOptions,
    compressor: Box<dyn Compressor>,
}

impl FramedCodec {
    /// Create a codec with the given options and compressor
    pub fn new(options: CodecOptions, compressor: impl Compressor + 'static) -> Self {
        Self {
            options,
            compressor: Box::new(compressor),
        }
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    /// Whether lines written by this codec may carry an escaped payload
    fn expects_escaping(&self) -> bool {
        self.options.compress || self.options.use_native_binary
    }
}

impl RecordCodec for FramedCodec {
    fn strategy(&self) -> Strategy {
        Strategy::Framed
    }

    fn encode(&self, record: &Value) -> Result<Vec<u8>> {
        // Step 1: Produce the payload
        let mut payload = payload_to_bytes(record, self.options.use_native_binary)?;

        // Step 2: Compress (best-effort)
        let mut compressed = false;
        if self.options.compress {
            match self.compressor.compress(&payload) {
                Ok(bytes) => {
                    payload = bytes;
                    compressed = true;
                }
                Err(e) => {
                    tracing::warn!(
                        "{} compression failed, storing record uncompressed: {}",
                        self.compressor.name(),
                        e
                    );
                }
            }
        }

        // Step 3: Escape binary payloads, frame text payloads directly
        if compressed || self.options.use_native_binary {
            return Ok(escape::pack(&payload, self.options.append_terminator));
        }

        if self.options.append_terminator {
            payload.push(TERMINATOR);
        }
        Ok(payload)
    }

    fn decode(&self, line: &[u8]) -> Result<Value> {
        if !self.expects_escaping() {
            return json_from_bytes(escape::strip_terminator(line));
        }

        let body = escape::strip_terminator(line);

        // Compressed JSON whose compression fell back is stored as plain text
        let payload = if escape::find_sentinel(body).is_some() {
            escape::unpack(body)?
        } else if self.options.use_native_binary {
            return Err(StoreError::Framing(
                "Sentinel not found in binary record".to_string(),
            ));
        } else {
            body.to_vec()
        };

        let payload = if self.options.compress && self.compressor.is_compressed(&payload) {
            self.compressor.decompress(&payload)?
        } else {
            payload
        };

        tracing::trace!("Decoded framed payload of {} bytes", payload.len());

        payload_from_bytes(&payload, self.options.use_native_binary)
    }
}
