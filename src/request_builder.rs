//! CSV rows to attestation requests

use alloy_primitives::Address;
use tracing::{debug, error};

use crate::error::{AttestError, Result};
use crate::schema::SchemaEncoder;
use crate::types::{AttestationRequest, CsvRow};

/// Every row must hold the recipient plus one value per schema field.
/// A single bad row rejects the whole input.
pub fn validate_rows(rows: &[CsvRow], encoder: &SchemaEncoder) -> Result<()> {
    let expected = encoder.len() + 1;
    let invalid: Vec<&CsvRow> = rows.iter().filter(|row| row.len() != expected).collect();

    match invalid.first() {
        None => Ok(()),
        Some(first) => {
            error!(
                "CSV has incorrect number of elements: {} of {} rows do not have {} fields",
                invalid.len(),
                rows.len(),
                expected
            );
            Err(AttestError::Validation {
                invalid_rows: invalid.len(),
                first_line: first.line,
                expected,
                found: first.len(),
            })
        }
    }
}

/// Validate `rows`, then encode each one into an [`AttestationRequest`],
/// preserving order.
pub fn build_requests(rows: &[CsvRow], encoder: &SchemaEncoder) -> Result<Vec<AttestationRequest>> {
    validate_rows(rows, encoder)?;

    rows.iter()
        .map(|row| build_request(row, encoder))
        .collect()
}

fn build_request(row: &CsvRow, encoder: &SchemaEncoder) -> Result<AttestationRequest> {
    let (recipient, values) = row
        .fields
        .split_first()
        .ok_or_else(|| AttestError::Encoding(format!("Line {} is empty", row.line)))?;

    let recipient: Address = recipient.parse().map_err(|e| {
        AttestError::Encoding(format!(
            "Invalid recipient address {:?} at line {}: {}",
            recipient, row.line, e
        ))
    })?;

    let data = encoder.encode(&encoder.items(values)).map_err(|e| match e {
        AttestError::Encoding(msg) => AttestError::Encoding(format!("line {}: {}", row.line, msg)),
        other => other,
    })?;

    debug!("Line {}: attestation for {} ({} bytes)", row.line, recipient, data.len());
    Ok(AttestationRequest::new(recipient, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};

    const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn row(line: u64, fields: &[&str]) -> CsvRow {
        CsvRow::new(line, fields.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_build_preserves_order_and_defaults() {
        let encoder = SchemaEncoder::new("bool isHuman").unwrap();
        let rows = vec![row(1, &[ALICE, "true"]), row(2, &[BOB, "false"])];

        let requests = build_requests(&rows, &encoder).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].recipient, ALICE.parse::<Address>().unwrap());
        assert_eq!(requests[1].recipient, BOB.parse::<Address>().unwrap());
        assert_eq!(requests[0].data, encoder.encode(&encoder.items(&["true"])).unwrap());
        assert_eq!(requests[1].data, encoder.encode(&encoder.items(&["false"])).unwrap());
        for request in &requests {
            assert_eq!(request.ref_uid, B256::ZERO);
            assert!(request.revocable);
            assert_eq!(request.expiration_time, 0);
            assert_eq!(request.value, U256::ZERO);
        }
    }

    #[test]
    fn test_single_bad_row_rejects_everything() {
        let encoder = SchemaEncoder::new("bool isHuman").unwrap();
        let rows = vec![
            row(1, &[ALICE, "true"]),
            row(2, &[BOB]),
            row(3, &[ALICE, "true", "extra"]),
        ];

        match build_requests(&rows, &encoder) {
            Err(AttestError::Validation { invalid_rows, first_line, expected, found }) => {
                assert_eq!(invalid_rows, 2);
                assert_eq!(first_line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_runs_before_encoding() {
        let encoder = SchemaEncoder::new("bool isHuman").unwrap();
        // line 1 would fail encoding, line 2 fails shape; shape wins
        let rows = vec![row(1, &["not-an-address", "maybe"]), row(2, &[BOB])];

        assert!(matches!(
            build_requests(&rows, &encoder),
            Err(AttestError::Validation { .. })
        ));
    }

    #[test]
    fn test_invalid_recipient() {
        let encoder = SchemaEncoder::new("bool isHuman").unwrap();
        let rows = vec![row(1, &["0x1234", "true"])];

        assert!(matches!(build_requests(&rows, &encoder), Err(AttestError::Encoding(_))));
    }

    #[test]
    fn test_invalid_value_reports_line() {
        let encoder = SchemaEncoder::new("bool isHuman").unwrap();
        let rows = vec![row(1, &[ALICE, "true"]), row(7, &[BOB, "yes please"])];

        match build_requests(&rows, &encoder) {
            Err(AttestError::Encoding(msg)) => assert!(msg.contains("line 7")),
            other => panic!("expected encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_builds_nothing() {
        let encoder = SchemaEncoder::new("bool isHuman").unwrap();
        assert!(build_requests(&[], &encoder).unwrap().is_empty());
    }

    #[test]
    fn test_blank_line_between_rows_rejects_input() {
        let text = format!("{},true\n\n{},false", ALICE, BOB);
        let rows = crate::csv_loader::parse_csv(&text).unwrap();
        let encoder = SchemaEncoder::new("bool isHuman").unwrap();

        match build_requests(&rows, &encoder) {
            Err(AttestError::Validation {
                invalid_rows,
                first_line,
                found,
                ..
            }) => {
                assert_eq!(invalid_rows, 1);
                assert_eq!(first_line, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(rows[2].line, 3);
    }
}
