//! CLI argument parsing

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{ConfigOverrides, GasStrategy, Secrets};

#[derive(Parser, Debug)]
#[command(name = "eas-batch-attester")]
#[command(about = "Submit CSV rows as batched EAS attestations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./attester.toml if present)
    #[arg(short, long, env = "ATTEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Infura API key, used when no explicit RPC URL is configured
    #[arg(long, env = "INFURA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Private key for signing transactions
    #[arg(short = 'k', long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build requests from the CSV and send one multiAttest transaction per batch
    Submit {
        #[command(flatten)]
        run: RunArgs,

        /// Write the submission report as JSON
        #[arg(long)]
        save_report: Option<PathBuf>,
    },

    /// Build requests from the CSV and estimate gas for the first batch only
    Estimate {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// CSV file: recipient address followed by one column per schema field
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Maximum attestations per transaction
    #[arg(short = 'b', long)]
    pub max_batch: Option<usize>,

    /// RPC endpoint URL (overrides the Infura network)
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Infura network name
    #[arg(short, long)]
    pub network: Option<String>,

    /// How gas limits are derived
    #[arg(long, value_enum)]
    pub gas_strategy: Option<GasStrategyArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GasStrategyArg {
    /// Estimate the first batch once and reuse it
    Shared,
    /// Estimate every batch
    PerBatch,
}

impl From<GasStrategyArg> for GasStrategy {
    fn from(arg: GasStrategyArg) -> Self {
        match arg {
            GasStrategyArg::Shared => GasStrategy::SharedFirstBatch,
            GasStrategyArg::PerBatch => GasStrategy::PerBatch,
        }
    }
}

impl Cli {
    pub fn secrets(&self) -> Secrets {
        Secrets {
            api_key: self.api_key.clone(),
            private_key: self.private_key.clone(),
        }
    }

    pub fn run_args(&self) -> &RunArgs {
        match &self.command {
            Command::Submit { run, .. } | Command::Estimate { run } => run,
        }
    }
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            csv_path: self.csv.clone(),
            max_batch: self.max_batch,
            rpc_url: self.rpc_url.clone(),
            network: self.network.clone(),
            gas_strategy: self.gas_strategy.map(Into::into),
        }
    }
}
