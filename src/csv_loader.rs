//! CSV input loading

use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;
use tracing::debug;

use crate::error::{AttestError, Result};
use crate::types::CsvRow;

/// Read `path` and split it into rows of string fields.
///
/// No header row is expected. Row widths are not checked here; see
/// [`crate::request_builder::validate_rows`].
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<CsvRow>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| AttestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = parse_csv(&content)?;
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse CSV text. Blank lines before the first row and after the last are
/// ignored; a blank line between rows becomes a row with one empty field so
/// that width validation rejects it.
///
/// Unquoted fields are trimmed. Quoted fields keep their inner whitespace.
pub fn parse_csv(content: &str) -> Result<Vec<CsvRow>> {
    let records = split_records(content);
    let Some(first) = records.iter().position(|r| !r.is_blank()) else {
        return Ok(Vec::new());
    };
    let last = records.iter().rposition(|r| !r.is_blank()).unwrap_or(first);

    records[first..=last]
        .iter()
        .map(|record| {
            if record.is_blank() {
                return Ok(CsvRow::new(record.line, vec![String::new()]));
            }
            Ok(CsvRow::new(record.line, tokenize(&record.normalized())?))
        })
        .collect()
}

/// One record as written in the source, before unquoting.
struct RawRecord<'a> {
    /// 1-based line where the record starts
    line: u64,
    fields: Vec<&'a str>,
}

impl RawRecord<'_> {
    fn is_blank(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].trim().is_empty()
    }

    /// Fields re-joined with the whitespace around each one removed.
    fn normalized(&self) -> String {
        self.fields
            .iter()
            .map(|field| field.trim())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Split `content` into records and raw fields. Newlines and commas inside
/// a quoted field do not split it; a quote only opens at the start of a field.
fn split_records(content: &str) -> Vec<RawRecord<'_>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field_begin = 0;
    let mut record_line = 1;
    let mut line = 1;

    let mut in_quotes = false;
    let mut field_start = true;
    let mut just_closed = false;

    for (i, c) in content.char_indices() {
        let reopen = std::mem::take(&mut just_closed);

        if in_quotes {
            match c {
                '"' => {
                    in_quotes = false;
                    just_closed = true;
                }
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match c {
            // opening quote, or the second half of an escaped `""`
            '"' if field_start || reopen => {
                in_quotes = true;
                field_start = false;
            }
            ',' => {
                fields.push(&content[field_begin..i]);
                field_begin = i + 1;
                field_start = true;
            }
            '\n' => {
                fields.push(&content[field_begin..i]);
                records.push(RawRecord {
                    line: record_line,
                    fields: std::mem::take(&mut fields),
                });
                field_begin = i + 1;
                field_start = true;
                line += 1;
                record_line = line;
            }
            c if c.is_whitespace() => {}
            _ => field_start = false,
        }
    }

    fields.push(&content[field_begin..]);
    records.push(RawRecord {
        line: record_line,
        fields,
    });
    records
}

/// Unquote one normalized record with the `csv` tokenizer.
fn tokenize(record: &str) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(record.as_bytes());

    let mut fields = StringRecord::new();
    reader.read_record(&mut fields)?;
    Ok(fields.iter().map(str::to_string).collect())
}
