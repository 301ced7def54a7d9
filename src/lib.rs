//! Batched EAS attestations from CSV input
//!
//! Rows are loaded from a CSV file, checked against the schema width,
//! ABI-encoded per the schema and grouped into fixed-size batches. Each batch
//! becomes one `multiAttest` transaction; nonces are assigned up front from a
//! single account nonce lookup so batches go out back to back.
//!
//! # Example
//!
//! ```rust,no_run
//! use eas_batch_attester::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AttestConfig::load(None)?;
//!     let client = EasClient::connect(
//!         "http://localhost:8545",
//!         "0x...",
//!         config.registry.contract_address,
//!         None,
//!     )
//!     .await?;
//!
//!     let service = AttestationService::new(&config, client)?;
//!     let requests = service.prepare(&config.input.csv_path)?;
//!     let report = service.submit(&requests).await?;
//!
//!     for hash in report.tx_hashes() {
//!         println!("{}", hash);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batcher;
pub mod cli;
pub mod config;
pub mod contract;
pub mod csv_loader;
pub mod error;
pub mod registry;
pub mod request_builder;
pub mod schema;
pub mod service;
pub mod submitter;
pub mod types;

pub use batcher::{split_into_batches, Batch};
pub use config::{AttestConfig, GasStrategy, Secrets};
pub use contract::EasClient;
pub use error::{AttestError, Result};
pub use registry::AttestationRegistry;
pub use schema::{SchemaEncoder, SchemaItem};
pub use service::{AttestationService, GasEstimate};
pub use submitter::{SubmissionReport, SubmissionState, Submitter};
pub use types::{AttestationRequest, CsvRow};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AttestConfig, GasStrategy, Secrets};
    pub use crate::contract::EasClient;
    pub use crate::error::{AttestError, Result};
    pub use crate::registry::AttestationRegistry;
    pub use crate::service::AttestationService;
    pub use crate::types::AttestationRequest;
}
