//! Tagged record codec
//!
//! Every line starts with a header byte whose flag bits declare how the
//! payload was encoded. Payloads are not escaped.

use serde_json::Value;

use crate::config::{CodecOptions, Strategy};
use crate::error::{Result, StoreError};

use super::compression::Compressor;
use super::escape::{self, TERMINATOR};
use super::{binary, json_to_bytes, RecordCodec};

/// Header bit: payload is compressed
pub const FLAG_COMPRESSED: u8 = 0x01;

/// Header bit: payload is native binary
pub const FLAG_BINARY: u8 = 0x02;

const KNOWN_FLAGS: u8 = FLAG_COMPRESSED | FLAG_BINARY;

/// Codec for the Tagged strategy
pub struct TaggedCodec {
    options: CodecOptions,
    compressor: Box<dyn Compressor>,
}

impl TaggedCodec {
    /// Create a tagged codec.
    ///
    /// Compressed or binary payloads may contain `\n`, so they are refused
    /// when the backing store is line-oriented.
    pub fn new(
        options: CodecOptions,
        compressor: impl Compressor + 'static,
        line_oriented: bool,
    ) -> Result<Self> {
        if line_oriented && (options.compress || options.use_native_binary) {
            return Err(StoreError::Config(
                "Tagged strategy cannot store compressed or binary payloads in a line-oriented store; use Framed"
                    .to_string(),
            ));
        }

        Ok(Self {
            options,
            compressor: Box::new(compressor),
        })
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }
}

impl RecordCodec for TaggedCodec {
    fn strategy(&self) -> Strategy {
        Strategy::Tagged
    }

    fn encode(&self, record: &Value) -> Result<Vec<u8>> {
        let mut header = 0u8;

        let mut payload = if self.options.use_native_binary {
            header |= FLAG_BINARY;
            binary::to_bytes(record)?
        } else {
            json_to_bytes(record)?
        };

        if self.options.compress {
            match self.compressor.compress(&payload) {
                Ok(bytes) => {
                    payload = bytes;
                    header |= FLAG_COMPRESSED;
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

        let mut line = Vec::with_capacity(1 + payload.len() + 1);
        line.push(header);
        line.extend_from_slice(&payload);
        if self.options.append_terminator {
            line.push(TERMINATOR);
        }

        Ok(line)
    }

    fn decode(&self, line: &[u8]) -> Result<Value> {
        // Binary payloads may end in '\n' themselves; only strip what we appended
        let body = if self.options.append_terminator {
            escape::strip_terminator(line)
        } else {
            line
        };

        let (&header, payload) = body
            .split_first()
            .ok_or_else(|| StoreError::Framing("Empty tagged record".to_string()))?;

        if header & !KNOWN_FLAGS != 0 {
            return Err(StoreError::Framing(format!(
                "Unknown tagged header: 0x{:02x}",
                header
            )));
        }

        let payload = if header & FLAG_COMPRESSED != 0 {
            self.compressor.decompress(payload)?
        } else {
            payload.to_vec()
        };

        if header & FLAG_BINARY != 0 {
            return binary::from_bytes(&payload);
        }

        serde_json::from_slice(&payload).map_err(|e| StoreError::TaggedJson {
            header,
            message: e.to_string(),
        })
    }
}
