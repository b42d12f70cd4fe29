//! CSV rendering of REDCap records
//!
//! Output matches a dictionary-based CSV writer: a header row, one row per
//! record, minimal quoting and CRLF line endings. Keys outside the field list
//! are ignored and missing keys become empty cells.

use crate::api::types::Record;
use crate::error::{ExtractError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::borrow::Cow;

/// Encode `records` as a UTF-8 CSV document
///
/// With `fields` unset the header is taken from the first record's keys, so
/// an empty `records` slice is an error; pass an explicit field list when the
/// export may be empty.
pub fn records_to_csv(records: &[Record], fields: Option<&[String]>) -> Result<Vec<u8>> {
    let header: Vec<String> = match fields {
        Some(fields) => fields.to_vec(),
        None => records
            .first()
            .ok_or(ExtractError::EmptyExtract)?
            .field_names()
            .map(str::to_owned)
            .collect(),
    };

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(&header)?;
    for record in records {
        let row: Vec<Cow<'_, str>> = header
            .iter()
            .map(|field| record.text(field).unwrap_or(Cow::Borrowed("")))
            .collect();
        writer.write_record(row.iter().map(|cell| cell.as_bytes()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExtractError::Io(e.into_error()))
}
