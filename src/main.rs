use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eas_batch_attester::cli::{Cli, Command};
use eas_batch_attester::config::{AttestConfig, Secrets};
use eas_batch_attester::contract::EasClient;
use eas_batch_attester::service::{prepare_requests, AttestationService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env-backed flags
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        error!("{}", failure_message(&err));
        return Err(err);
    }
    Ok(())
}

/// Context and every underlying cause on one line.
fn failure_message(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AttestConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(&cli.run_args().overrides())?;
    let secrets = cli.secrets();

    info!(
        "Schema \"{}\" ({}) on {}, max {} per batch",
        config.registry.schema,
        config.registry.schema_uid,
        config.registry.contract_address,
        config.batch.max_batch
    );

    // bad rows abort here, before any network access
    let requests = prepare_requests(&config)?;

    let client = connect(&config, &secrets).await?;
    info!("Signing as {}", client.sender());

    let service = AttestationService::new(&config, client)?;

    match cli.command {
        Command::Submit { save_report, .. } => {
            let report = service.submit(&requests).await?;
            info!(
                "Done: {} attestations in {} transactions",
                report.total_requests(),
                report.batches.len()
            );

            if let Some(path) = save_report {
                let content = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, content)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                info!("Report saved to {}", path.display());
            }
        }
        Command::Estimate { .. } => match service.estimate(&requests).await? {
            Some(estimate) => println!(
                "First Batch Estimate: {} ({} requests, gas limit with margin {})",
                estimate.estimate, estimate.batch_size, estimate.gas_limit
            ),
            None => println!("No attestation requests in input"),
        },
    }

    Ok(())
}

async fn connect(config: &AttestConfig, secrets: &Secrets) -> Result<EasClient> {
    let rpc_url = config.rpc_endpoint(secrets)?;
    let private_key = secrets.private_key()?;

    info!("Connecting to {} network...", config.network.name);
    let client = EasClient::connect(
        &rpc_url,
        private_key,
        config.registry.contract_address,
        config.network.chain_id,
    )
    .await
    .context("Failed to initialize EAS client")?;

    Ok(client)
}
