//! JSON output
//!
//! Inventory results go to stdout as a pretty-printed JSON array with
//! two-space indentation, in the order they were produced.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;

/// Render records the way they are printed
pub fn to_pretty_json<T: Serialize>(records: &[T]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Write records followed by a newline
pub fn write_json<T: Serialize, W: Write>(out: &mut W, records: &[T]) -> Result<()> {
    let text = to_pretty_json(records).map_err(std::io::Error::from)?;
    writeln!(out, "{}", text)?;
    Ok(())
}
