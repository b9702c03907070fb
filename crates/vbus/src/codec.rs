// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire codec between bus payload bytes and [`serde_json::Value`].
//!
//! `to_vbus` serializes a value to JSON bytes, treating `None` as an empty
//! payload; `from_vbus` treats an empty payload as JSON `null` rather than
//! failing to parse.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, VbusError};

/// Encode `value` to bus payload bytes. `Value::Null` encodes to an empty
/// payload, matching the original's `None` handling.
pub fn to_vbus<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_value(value).map_err(|e| VbusError::Internal(e.to_string()))?;
    encode_value(&json)
}

fn encode_value(value: &Value) -> Result<Vec<u8>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::to_vec(value).map_err(|e| VbusError::Internal(e.to_string()))
}

/// Decode bus payload bytes to a [`Value`]. An empty payload decodes to
/// `Value::Null` rather than a parse error.
pub fn from_vbus(payload: &[u8]) -> Result<Value> {
    if payload.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(payload).map_err(|e| VbusError::Validation(e.to_string()))
}

/// True for JSON arrays and objects whose keys are all decimal indices
/// `"0", "1", ...` in order — the original's `is_sequence` heuristic used to
/// decide whether a set of numbered children should render as a list.
pub fn is_sequence(value: &Value) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(map) => {
            !map.is_empty()
                && map
                    .keys()
                    .enumerate()
                    .all(|(i, k)| k == &i.to_string())
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
