//! Fixed-size batching of attestation requests

use crate::error::{AttestError, Result};
use crate::types::AttestationRequest;

/// A contiguous run of requests sent in one `multiAttest` transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    pub index: usize,
    /// 1-based position of the first request in the input
    pub first_row: usize,
    pub requests: &'a [AttestationRequest],
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// 1-based position of the last request in the input
    pub fn last_row(&self) -> usize {
        self.first_row + self.requests.len().saturating_sub(1)
    }
}

/// Split `requests` into batches of `max_batch`; the last one holds the
/// remainder.
pub fn split_into_batches(requests: &[AttestationRequest], max_batch: usize) -> Result<Vec<Batch<'_>>> {
    if max_batch == 0 {
        return Err(AttestError::Configuration(
            "max_batch must be at least 1".to_string(),
        ));
    }

    Ok(requests
        .chunks(max_batch)
        .enumerate()
        .map(|(index, requests)| Batch {
            index,
            first_row: index * max_batch + 1,
            requests,
        })
        .collect())
}
