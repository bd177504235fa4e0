//! Payload compression
//!
//! Compression is best-effort on encode and mandatory on decode: a failed
//! compress call means "store uncompressed", a failed decompress call is an
//! error.

use crate::error::{Result, StoreError};

/// Zstd frame magic number (little-endian 0xFD2FB528)
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Byte-stream compression used by the record codecs
pub trait Compressor: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &'static str;

    /// Compress a whole payload
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a payload produced by [`Compressor::compress`]
    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>>;

    /// Whether `data` starts with this compressor's frame header.
    ///
    /// JSON text and native binary payloads never start with it, which lets
    /// Framed decoding tell compressed lines from lines whose compression
    /// fell back to the raw payload.
    fn is_compressed(&self, data: &[u8]) -> bool;
}

/// Zstd-backed compressor
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Compressor for ZstdCompressor {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        zstd::bulk::compress(raw, self.level)
            .map_err(|e| StoreError::Compression(format!("zstd compress failed: {}", e)))
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        zstd::stream::decode_all(compressed)
            .map_err(|e| StoreError::Compression(format!("zstd decompress failed: {}", e)))
    }

    fn is_compressed(&self, data: &[u8]) -> bool {
        data.starts_with(&ZSTD_MAGIC)
    }
}
