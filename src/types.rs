use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// One parsed CSV record: recipient first, then one value per schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// 1-based line number in the source file
    pub line: u64,
    pub fields: Vec<String>,
}

impl CsvRow {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single attestation inside a `multiAttest` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRequest {
    pub recipient: Address,
    pub data: Bytes,
    pub ref_uid: B256,
    pub revocable: bool,
    /// Unix timestamp, 0 = never expires
    pub expiration_time: u64,
    /// Wei forwarded to the schema resolver
    pub value: U256,
}

impl AttestationRequest {
    /// Request with no reference attestation, revocable, no expiry and no value.
    pub fn new(recipient: Address, data: Bytes) -> Self {
        Self {
            recipient,
            data,
            ref_uid: B256::ZERO,
            revocable: true,
            expiration_time: 0,
            value: U256::ZERO,
        }
    }
}
