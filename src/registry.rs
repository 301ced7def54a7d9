//! Network seam for the attestation registry

use alloy_primitives::{TxHash, B256};
use async_trait::async_trait;

use crate::error::Result;
use crate::types::AttestationRequest;

/// Operations the submitter needs from the registry contract and the signing
/// account. Each call is a single round trip; none of them retries.
#[async_trait]
pub trait AttestationRegistry: Send + Sync {
    /// Next nonce of the signing account.
    async fn account_nonce(&self) -> Result<u64>;

    /// Gas units for `multiAttest` carrying `requests` under `schema`.
    async fn estimate_gas(&self, schema: B256, requests: &[AttestationRequest]) -> Result<u64>;

    /// Broadcast `multiAttest` and return as soon as the node accepts it.
    async fn submit(
        &self,
        schema: B256,
        requests: &[AttestationRequest],
        nonce: u64,
        gas_limit: u64,
    ) -> Result<TxHash>;
}
