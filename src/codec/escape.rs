//! Embedded-terminator escaping
//!
//! Makes arbitrary bytes safe to store as a single line.
//!
//! ## Escaped Layout
//! ```text
//! ┌──────────────────────────────┬──────────────┬────────────────────┬──────┐
//! │ Payload without '\n' bytes   │ Sentinel (4) │ Positions (JSON)   │ '\n' │
//! └──────────────────────────────┴──────────────┴────────────────────┴──────┘
//! ```
//!
//! The positions list holds the original index of every removed `\n`, in
//! ascending order, e.g. `[3,17,18]`. The trailing `\n` is optional.

use bytes::{BufMut, BytesMut};

use crate::error::{Result, StoreError};

/// Line terminator byte
pub const TERMINATOR: u8 = b'\n';

/// Marker separating the escaped payload from the positions list.
/// `0xFF` never occurs in UTF-8 text.
pub const SENTINEL: [u8; 4] = [0xFF, 0xFE, 0xFD, 0xFC];

/// Remove every terminator from `data` and append the sentinel and the
/// positions of the removed bytes.
pub fn pack(data: &[u8], append_terminator: bool) -> Vec<u8> {
    let mut positions: Vec<usize> = Vec::new();
    let mut out = BytesMut::with_capacity(data.len() + SENTINEL.len() + 3);

    for (i, &byte) in data.iter().enumerate() {
        if byte == TERMINATOR {
            positions.push(i);
        } else {
            out.put_u8(byte);
        }
    }

    out.put_slice(&SENTINEL);

    // A list of integers always serializes
    let list = serde_json::to_vec(&positions).unwrap_or_else(|_| b"[]".to_vec());
    out.put_slice(&list);

    if append_terminator {
        out.put_u8(TERMINATOR);
    }

    out.to_vec()
}

/// Inverse of [`pack`].
///
/// Accepts input with or without the trailing terminator.
pub fn unpack(framed: &[u8]) -> Result<Vec<u8>> {
    let framed = strip_terminator(framed);

    let sentinel_at = find_sentinel(framed).ok_or_else(|| {
        StoreError::Framing("Sentinel not found in escaped record".to_string())
    })?;

    let data = &framed[..sentinel_at];
    let list = &framed[sentinel_at + SENTINEL.len()..];

    let positions: Vec<usize> = serde_json::from_slice(list).map_err(|e| {
        StoreError::Framing(format!("Malformed terminator positions: {}", e))
    })?;

    let total = data.len() + positions.len();
    validate_positions(&positions, total)?;

    // Walk backward, re-inserting terminators as their recorded indices are reached
    let mut out = vec![0u8; total];
    let mut src = data.len();
    let mut pending = positions.len();

    for i in (0..total).rev() {
        if pending > 0 && positions[pending - 1] == i {
            out[i] = TERMINATOR;
            pending -= 1;
        } else {
            src -= 1;
            out[i] = data[src];
        }
    }

    Ok(out)
}

/// Offset of the last sentinel in `bytes`, if any
pub fn find_sentinel(bytes: &[u8]) -> Option<usize> {
    bytes.windows(SENTINEL.len()).rposition(|w| w == SENTINEL)
}

/// Drop one trailing terminator, if present
pub fn strip_terminator(bytes: &[u8]) -> &[u8] {
    match bytes.last() {
        Some(&TERMINATOR) => &bytes[..bytes.len() - 1],
        _ => bytes,
    }
}

/// Positions must be strictly ascending and inside the rebuilt payload
fn validate_positions(positions: &[usize], total: usize) -> Result<()> {
    let mut previous: Option<usize> = None;
    for &pos in positions {
        if pos >= total {
            return Err(StoreError::Framing(format!(
                "Terminator position {} outside record of {} bytes",
                pos, total
            )));
        }
        if let Some(prev) = previous {
            if pos <= prev {
                return Err(StoreError::Framing(format!(
                    "Terminator positions not ascending: {} after {}",
                    pos, prev
                )));
            }
        }
        previous = Some(pos);
    }
    Ok(())
}
