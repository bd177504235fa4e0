//! Plain record codec
//!
//! Human-readable JSON lines.

use serde_json::Value;

use crate::config::Strategy;
use crate::error::Result;

use super::escape::{self, TERMINATOR};
use super::{json_from_bytes, json_to_bytes, RecordCodec};

/// Codec for the Plain strategy
#[derive(Debug, Clone, Copy)]
pub struct PlainCodec {
    append_terminator: bool,
}

impl PlainCodec {
    pub fn new(append_terminator: bool) -> Self {
        Self { append_terminator }
    }
}

impl Default for PlainCodec {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RecordCodec for PlainCodec {
    fn strategy(&self) -> Strategy {
        Strategy::Plain
    }

    fn encode(&self, record: &Value) -> Result<Vec<u8>> {
        let mut line = json_to_bytes(record)?;
        if self.append_terminator {
            line.push(TERMINATOR);
        }
        Ok(line)
    }

    fn decode(&self, line: &[u8]) -> Result<Value> {
        json_from_bytes(escape::strip_terminator(line))
    }
}
