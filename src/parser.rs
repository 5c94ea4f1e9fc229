//! JSON parser for the coffee dataset and outlier lists.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use crate::record::CoffeeRecord;

/// Decodes a JSON array of [`CoffeeRecord`]s from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON, the top level is not an
/// array, or any element is not an object. Missing or oddly typed fields
/// inside an object are tolerated. Each record keeps its input object in
/// [`CoffeeRecord::source`].
pub fn parse_records(bytes: &[u8]) -> Result<Vec<CoffeeRecord>> {
    let root: Value = serde_json::from_slice(bytes).context("parsing JSON")?;
    let Value::Array(rows) = root else {
        bail!("Expected top-level JSON array");
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| -> Result<CoffeeRecord> {
            if !row.is_object() {
                bail!("Row {i} is not a JSON object");
            }
            let mut record = CoffeeRecord::deserialize(&row)
                .with_context(|| format!("Row {i}: malformed record"))?;
            record.source = Some(row);
            Ok(record)
        })
        .collect()
}
