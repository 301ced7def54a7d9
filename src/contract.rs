//! EAS registry client built on Alloy

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{AttestError, Result};
use crate::registry::AttestationRegistry;
use crate::types::AttestationRequest;

sol! {
    /// Subset of the Ethereum Attestation Service contract used for batching
    #[sol(rpc)]
    interface IEAS {
        struct AttestationRequestData {
            address recipient;
            uint64 expirationTime;
            bool revocable;
            bytes32 refUID;
            bytes data;
            uint256 value;
        }

        struct MultiAttestationRequest {
            bytes32 schema;
            AttestationRequestData[] data;
        }

        function multiAttest(MultiAttestationRequest[] calldata multiRequests)
            external
            payable
            returns (bytes32[] memory);
    }
}

impl From<&AttestationRequest> for IEAS::AttestationRequestData {
    fn from(request: &AttestationRequest) -> Self {
        Self {
            recipient: request.recipient,
            expirationTime: request.expiration_time,
            revocable: request.revocable,
            refUID: request.ref_uid,
            data: request.data.clone(),
            value: request.value,
        }
    }
}

/// One `multiAttest` argument holding all `requests` under `schema`.
fn multi_request(schema: B256, requests: &[AttestationRequest]) -> Vec<IEAS::MultiAttestationRequest> {
    vec![IEAS::MultiAttestationRequest {
        schema,
        data: requests.iter().map(Into::into).collect(),
    }]
}

/// Wei to forward with the call; the contract expects the sum of request values.
fn total_value(requests: &[AttestationRequest]) -> U256 {
    requests
        .iter()
        .fold(U256::ZERO, |acc, request| acc.saturating_add(request.value))
}

/// Signing client for a deployed EAS contract
pub struct EasClient {
    provider: DynProvider,
    contract: IEAS::IEASInstance<DynProvider>,
    sender: Address,
}

impl EasClient {
    /// Connect to `rpc_url` and sign with `private_key`.
    ///
    /// Fails fast when the endpoint is unreachable or, if `expected_chain_id`
    /// is given, serves a different chain.
    pub async fn connect(
        rpc_url: &str,
        private_key: &str,
        contract_address: Address,
        expected_chain_id: Option<u64>,
    ) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| AttestError::Configuration(format!("Invalid private key: {}", e)))?;
        let sender = signer.address();
        let wallet = EthereumWallet::from(signer);

        let url: Url = rpc_url
            .parse()
            .map_err(|e| AttestError::Configuration(format!("Invalid RPC URL: {}", e)))?;

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

        let block_number = provider
            .get_block_number()
            .await
            .map_err(|e| AttestError::Provider(format!("Failed to get block number: {}", e)))?;
        info!("Connected to network at block {}", block_number);

        if let Some(expected) = expected_chain_id {
            let chain_id = provider
                .get_chain_id()
                .await
                .map_err(|e| AttestError::Provider(format!("Failed to get chain id: {}", e)))?;
            if chain_id != expected {
                return Err(AttestError::Configuration(format!(
                    "RPC endpoint serves chain {}, expected {}",
                    chain_id, expected
                )));
            }
        }

        let contract = IEAS::new(contract_address, provider.clone());
        info!("EAS client initialized: contract {}, sender {}", contract_address, sender);

        Ok(Self {
            provider,
            contract,
            sender,
        })
    }

    pub fn contract_address(&self) -> Address {
        *self.contract.address()
    }

    pub fn sender(&self) -> Address {
        self.sender
    }
}

#[async_trait]
impl AttestationRegistry for EasClient {
    async fn account_nonce(&self) -> Result<u64> {
        self.provider
            .get_transaction_count(self.sender)
            .pending()
            .await
            .map_err(|e| AttestError::Provider(format!("Failed to get nonce for {}: {}", self.sender, e)))
    }

    async fn estimate_gas(&self, schema: B256, requests: &[AttestationRequest]) -> Result<u64> {
        let gas = self
            .contract
            .multiAttest(multi_request(schema, requests))
            .value(total_value(requests))
            .estimate_gas()
            .await
            .map_err(|e| AttestError::Contract(format!("Gas estimation failed: {}", e)))?;

        debug!("Estimated {} gas for {} requests", gas, requests.len());
        Ok(gas)
    }

    async fn submit(
        &self,
        schema: B256,
        requests: &[AttestationRequest],
        nonce: u64,
        gas_limit: u64,
    ) -> Result<TxHash> {
        let pending_tx = self
            .contract
            .multiAttest(multi_request(schema, requests))
            .value(total_value(requests))
            .nonce(nonce)
            .gas(gas_limit)
            .send()
            .await
            .map_err(|e| AttestError::Contract(format!("Transaction failed: {}", e)))?;

        Ok(*pending_tx.tx_hash())
    }
}
