//! Configuration management
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `ATTEST_*` environment variables (`__` separates sections, e.g.
//! `ATTEST_BATCH__MAX_BATCH=5`), then command line overrides. Secrets are
//! never read from the file.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AttestError, Result};

pub const DEFAULT_MAX_BATCH: usize = 2;
pub const DEFAULT_GAS_MARGIN_PERCENT: u64 = 15;
/// `bool isHuman` on Sepolia
pub const DEFAULT_SCHEMA_UID: &str =
    "0x8af15e65888f2e3b487e536a4922e277dcfe85b4b18187b0cf9afdb802ba6bb6";
pub const DEFAULT_SCHEMA: &str = "bool isHuman";
/// EAS deployment on Sepolia
pub const DEFAULT_EAS_ADDRESS: &str = "0xC2679fBD37d54388Ce493F1DB75320D236e1815e";
pub const DEFAULT_NETWORK: &str = "sepolia";
pub const DEFAULT_CSV_PATH: &str = "./test.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestConfig {
    pub network: NetworkConfig,
    pub registry: RegistryConfig,
    pub batch: BatchConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Infura network name, used when `rpc_url` is not set
    pub name: String,
    pub rpc_url: Option<String>,
    /// When set, the endpoint must report this chain id
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub contract_address: Address,
    pub schema_uid: B256,
    /// Human-readable schema signature, e.g. `bool isHuman`
    pub schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub max_batch: usize,
    pub gas_margin_percent: u64,
    pub gas_strategy: GasStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub csv_path: PathBuf,
}

/// How gas limits are derived for the batches of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasStrategy {
    /// Estimate the first batch once and use it for every batch
    #[default]
    SharedFirstBatch,
    /// Estimate each batch right before sending it
    PerBatch,
}

/// Values that may come from the command line and take precedence over
/// everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub csv_path: Option<PathBuf>,
    pub max_batch: Option<usize>,
    pub rpc_url: Option<String>,
    pub network: Option<String>,
    pub gas_strategy: Option<GasStrategy>,
}

/// Credentials, supplied via environment or flags only.
#[derive(Clone, Default)]
pub struct Secrets {
    pub api_key: Option<String>,
    pub private_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    pub fn private_key(&self) -> Result<&str> {
        self.private_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AttestError::Configuration(
                    "WALLET_PRIVATE_KEY is not set (use --private-key or the environment)".to_string(),
                )
            })
    }
}

impl AttestConfig {
    /// Load defaults, `path` (or `attester.toml` if present) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("network.name", DEFAULT_NETWORK)?
            .set_default("registry.contract_address", DEFAULT_EAS_ADDRESS)?
            .set_default("registry.schema_uid", DEFAULT_SCHEMA_UID)?
            .set_default("registry.schema", DEFAULT_SCHEMA)?
            .set_default("batch.max_batch", DEFAULT_MAX_BATCH as u64)?
            .set_default("batch.gas_margin_percent", DEFAULT_GAS_MARGIN_PERCENT)?
            .set_default("batch.gas_strategy", "shared_first_batch")?
            .set_default("input.csv_path", DEFAULT_CSV_PATH)?;

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name("attester").required(false)),
        };

        let config: AttestConfig = builder
            .add_source(
                config::Environment::with_prefix("ATTEST")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(path) = &overrides.csv_path {
            self.input.csv_path = path.clone();
        }
        if let Some(max_batch) = overrides.max_batch {
            self.batch.max_batch = max_batch;
        }
        if let Some(rpc_url) = &overrides.rpc_url {
            self.network.rpc_url = Some(rpc_url.clone());
        }
        if let Some(network) = &overrides.network {
            self.network.name = network.clone();
        }
        if let Some(strategy) = overrides.gas_strategy {
            self.batch.gas_strategy = strategy;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.max_batch == 0 {
            return Err(AttestError::Configuration(
                "batch.max_batch must be at least 1".to_string(),
            ));
        }
        if self.registry.schema.trim().is_empty() {
            return Err(AttestError::Configuration(
                "registry.schema must not be empty".to_string(),
            ));
        }
        if self.network.rpc_url.is_none() && self.network.name.trim().is_empty() {
            return Err(AttestError::Configuration(
                "either network.rpc_url or network.name must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// RPC endpoint: the explicit URL, otherwise the Infura URL for the
    /// configured network and API key.
    pub fn rpc_endpoint(&self, secrets: &Secrets) -> Result<String> {
        if let Some(url) = &self.network.rpc_url {
            return Ok(url.clone());
        }

        let api_key = secrets
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AttestError::Configuration(
                    "INFURA_API_KEY is required when network.rpc_url is not set".to_string(),
                )
            })?;

        Ok(format!(
            "https://{}.infura.io/v3/{}",
            self.network.name.trim(),
            api_key.trim()
        ))
    }
}

impl Default for AttestConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                name: DEFAULT_NETWORK.to_string(),
                rpc_url: None,
                chain_id: None,
            },
            registry: RegistryConfig {
                contract_address: DEFAULT_EAS_ADDRESS
                    .parse()
                    .unwrap_or(Address::ZERO),
                schema_uid: DEFAULT_SCHEMA_UID.parse().unwrap_or(B256::ZERO),
                schema: DEFAULT_SCHEMA.to_string(),
            },
            batch: BatchConfig {
                max_batch: DEFAULT_MAX_BATCH,
                gas_margin_percent: DEFAULT_GAS_MARGIN_PERCENT,
                gas_strategy: GasStrategy::default(),
            },
            input: InputConfig {
                csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            },
        }
    }
}
