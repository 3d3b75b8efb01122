//! Tolerant CSV decoding into column-name→value row maps
//!
//! Processor files disagree about column sets, ordering, and even the
//! number of fields per row, so the decoder reads headers once and zips
//! each record against them: short rows lose their missing columns, long
//! rows drop the extras. Shape concerns stay here; the parsers downstream
//! only ever see name→value maps.

use crate::types::{RawRow, ReconError};
use csv::{ReaderBuilder, Trim};

/// Decode a downloaded settlement file into row maps
///
/// A failure here means the file itself is undecodable (bad header row,
/// broken quoting); the sweep skips such a file without marking it
/// processed so a corrected re-delivery is picked up.
pub fn decode_rows(bytes: &[u8], file_name: &str) -> Result<Vec<RawRow>, ReconError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ReconError::row_parse(file_name, e))?
        .clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            // Header line is 1, first data row is 2.
            ReconError::row_parse_at(file_name, index as u64 + 2, e)
        })?;

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
