use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::batcher::split_into_batches;
use crate::config::AttestConfig;
use crate::csv_loader::load_csv;
use crate::error::Result;
use crate::registry::AttestationRegistry;
use crate::request_builder::build_requests;
use crate::schema::SchemaEncoder;
use crate::submitter::{gas_limit_with_margin, GasPolicy, SubmissionReport, Submitter};
use crate::types::AttestationRequest;

/// Gas estimate for the first batch of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub batch_size: usize,
    pub estimate: u64,
    /// Estimate plus the configured margin
    pub gas_limit: u64,
}

/// Load the configured CSV and build its requests without touching the network.
pub fn prepare_requests(config: &AttestConfig) -> Result<Vec<AttestationRequest>> {
    let encoder = SchemaEncoder::new(&config.registry.schema)?;
    load_requests(&config.input.csv_path, &encoder)
}

fn load_requests(csv_path: &Path, encoder: &SchemaEncoder) -> Result<Vec<AttestationRequest>> {
    info!("Processing CSV file: {}", csv_path.display());

    let rows = load_csv(csv_path)?;
    let requests = build_requests(&rows, encoder)?;

    info!(
        "Built {} attestation requests for schema \"{}\"",
        requests.len(),
        encoder.signature()
    );
    Ok(requests)
}

/// Ties the pipeline stages together for one schema and registry.
pub struct AttestationService<R: AttestationRegistry> {
    registry: R,
    encoder: SchemaEncoder,
    schema_uid: B256,
    max_batch: usize,
    gas: GasPolicy,
}

impl<R: AttestationRegistry> AttestationService<R> {
    pub fn new(config: &AttestConfig, registry: R) -> Result<Self> {
        config.validate()?;
        let encoder = SchemaEncoder::new(&config.registry.schema)?;

        Ok(Self {
            registry,
            encoder,
            schema_uid: config.registry.schema_uid,
            max_batch: config.batch.max_batch,
            gas: GasPolicy {
                margin_percent: config.batch.gas_margin_percent,
                strategy: config.batch.gas_strategy,
            },
        })
    }

    pub fn encoder(&self) -> &SchemaEncoder {
        &self.encoder
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Load and validate the CSV, then build every request. No network access.
    pub fn prepare<P: AsRef<Path>>(&self, csv_path: P) -> Result<Vec<AttestationRequest>> {
        load_requests(csv_path.as_ref(), &self.encoder)
    }

    pub async fn submit(&self, requests: &[AttestationRequest]) -> Result<SubmissionReport> {
        let batches = split_into_batches(requests, self.max_batch)?;
        info!(
            "Submitting {} requests in {} batches of up to {}",
            requests.len(),
            batches.len(),
            self.max_batch
        );

        let mut submitter = Submitter::new(&self.registry, self.schema_uid, self.gas);
        submitter.submit_batches(&batches).await
    }

    /// Estimate the first batch only; `None` when there is nothing to send.
    pub async fn estimate(&self, requests: &[AttestationRequest]) -> Result<Option<GasEstimate>> {
        let batches = split_into_batches(requests, self.max_batch)?;
        let Some(first) = batches.first() else {
            return Ok(None);
        };

        let estimate = self.registry.estimate_gas(self.schema_uid, first.requests).await?;
        let gas_limit = gas_limit_with_margin(estimate, self.gas.margin_percent);
        info!("First Batch Estimate: {} (limit with margin: {})", estimate, gas_limit);

        Ok(Some(GasEstimate {
            batch_size: first.len(),
            estimate,
            gas_limit,
        }))
    }
}
