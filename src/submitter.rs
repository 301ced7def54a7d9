//! Sequential batch submission with manually sequenced nonces
//!
//! The account nonce is read once and every batch gets the next value, so
//! batches can be broadcast back to back without waiting for receipts. If the
//! node rejects one transaction, all later nonces are invalid; the loop stops
//! at the first failure and never retries.

use alloy_primitives::{TxHash, B256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::batcher::Batch;
use crate::config::GasStrategy;
use crate::error::{AttestError, Result};
use crate::registry::AttestationRegistry;

/// Gas limit derivation for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    pub margin_percent: u64,
    pub strategy: GasStrategy,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            margin_percent: crate::config::DEFAULT_GAS_MARGIN_PERCENT,
            strategy: GasStrategy::SharedFirstBatch,
        }
    }
}

/// `ceil(estimate * (100 + margin_percent) / 100)`, saturating at `u64::MAX`.
pub fn gas_limit_with_margin(estimate: u64, margin_percent: u64) -> u64 {
    let scaled = (estimate as u128 * (100 + margin_percent as u128)).div_ceil(100);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    NotStarted,
    /// Batch `i` was accepted by the node
    BatchSubmitted(usize),
    Done,
    /// Batch `i` failed; nothing after it was sent
    Failed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBatch {
    pub index: usize,
    pub nonce: u64,
    pub gas_limit: u64,
    pub size: usize,
    pub first_row: usize,
    pub last_row: usize,
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub schema_uid: B256,
    /// Nonce of the first batch, `None` when nothing was sent
    pub first_nonce: Option<u64>,
    pub batches: Vec<SubmittedBatch>,
}

impl SubmissionReport {
    pub fn tx_hashes(&self) -> Vec<TxHash> {
        self.batches.iter().map(|b| b.tx_hash).collect()
    }

    pub fn total_requests(&self) -> usize {
        self.batches.iter().map(|b| b.size).sum()
    }
}

pub struct Submitter<'a, R: AttestationRegistry + ?Sized> {
    registry: &'a R,
    schema_uid: B256,
    gas: GasPolicy,
    state: SubmissionState,
}

impl<'a, R: AttestationRegistry + ?Sized> Submitter<'a, R> {
    pub fn new(registry: &'a R, schema_uid: B256, gas: GasPolicy) -> Self {
        Self {
            registry,
            schema_uid,
            gas,
            state: SubmissionState::NotStarted,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Send every batch in order, one transaction each.
    pub async fn submit_batches(&mut self, batches: &[Batch<'_>]) -> Result<SubmissionReport> {
        let mut report = SubmissionReport {
            schema_uid: self.schema_uid,
            first_nonce: None,
            batches: Vec::with_capacity(batches.len()),
        };

        let Some(first) = batches.first() else {
            info!("No attestation requests to submit");
            self.state = SubmissionState::Done;
            return Ok(report);
        };

        let first_nonce = self.registry.account_nonce().await.map_err(|e| {
            self.state = SubmissionState::Failed(0);
            e
        })?;
        report.first_nonce = Some(first_nonce);
        debug!("Starting nonce {}", first_nonce);

        let shared_gas_limit = match self.gas.strategy {
            GasStrategy::SharedFirstBatch => {
                let estimate = self
                    .registry
                    .estimate_gas(self.schema_uid, first.requests)
                    .await
                    .map_err(|e| {
                        self.state = SubmissionState::Failed(0);
                        e
                    })?;
                let gas_limit = gas_limit_with_margin(estimate, self.gas.margin_percent);
                info!(
                    "First batch estimate: {} gas, limit {} (+{}%) for all batches",
                    estimate, gas_limit, self.gas.margin_percent
                );
                warn_on_uneven_payloads(batches);
                Some(gas_limit)
            }
            GasStrategy::PerBatch => None,
        };

        let total = batches.len();
        for (offset, batch) in batches.iter().enumerate() {
            let nonce = first_nonce + offset as u64;

            match self.submit_one(batch, total, nonce, shared_gas_limit).await {
                Ok(submitted) => {
                    self.state = SubmissionState::BatchSubmitted(batch.index);
                    report.batches.push(submitted);
                }
                Err(source) => {
                    self.state = SubmissionState::Failed(batch.index);
                    return Err(AttestError::Submission {
                        batch: batch.index,
                        nonce,
                        source: Box::new(source),
                    });
                }
            }
        }

        self.state = SubmissionState::Done;
        info!(
            "Submitted {} batches ({} attestations), nonces {}..={}",
            report.batches.len(),
            report.total_requests(),
            first_nonce,
            first_nonce + total as u64 - 1
        );
        Ok(report)
    }

    async fn submit_one(
        &self,
        batch: &Batch<'_>,
        total: usize,
        nonce: u64,
        shared_gas_limit: Option<u64>,
    ) -> Result<SubmittedBatch> {
        let gas_limit = match shared_gas_limit {
            Some(limit) => limit,
            None => {
                let estimate = self.registry.estimate_gas(self.schema_uid, batch.requests).await?;
                gas_limit_with_margin(estimate, self.gas.margin_percent)
            }
        };

        info!(
            "Making batch {} of {} line numbers {} to {} (nonce {}, gas limit {})",
            batch.index + 1,
            total,
            batch.first_row,
            batch.last_row(),
            nonce,
            gas_limit
        );

        let tx_hash = self
            .registry
            .submit(self.schema_uid, batch.requests, nonce, gas_limit)
            .await?;
        info!("Transaction hash: {}", tx_hash);

        Ok(SubmittedBatch {
            index: batch.index,
            nonce,
            gas_limit,
            size: batch.len(),
            first_row: batch.first_row,
            last_row: batch.last_row(),
            tx_hash,
        })
    }
}

fn warn_on_uneven_payloads(batches: &[Batch<'_>]) {
    let payload = |batch: &Batch<'_>| -> usize { batch.requests.iter().map(|r| r.data.len()).sum() };
    let Some(first) = batches.first().map(payload) else {
        return;
    };
    if batches.iter().skip(1).any(|batch| payload(batch) > first) {
        warn!("Some batches carry more data than the first; the shared gas limit may be too low for them");
    }
}
