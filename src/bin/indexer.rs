use anyhow::{Result, bail};
use clap::Parser;
use futures::future::join_all;
use ownership_indexer::OwnershipIndexer;
use ownership_indexer::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Bring NFT ownership checkpoints up to the chain head", long_about = None)]
struct Cli {
    /// Wallets to refresh; WATCH_WALLETS is used when none are given
    wallets: Vec<String>,

    /// Keep polling for new blocks
    #[arg(long)]
    watch: bool,

    #[arg(long, default_value = "12")]
    poll_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting NFT ownership indexer");

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("Contract address: {:?}", config.nft_contract_address);
    info!(
        "RPC URLs: {} endpoint(s) configured",
        config.json_rpc_urls.len()
    );

    let wallets = if cli.wallets.is_empty() {
        config.watch_wallets.clone()
    } else {
        cli.wallets
    };
    if wallets.is_empty() {
        bail!("No wallets given; pass them as arguments or set WATCH_WALLETS");
    }

    let indexer = Arc::new(OwnershipIndexer::from_config(&config)?);
    info!("Checkpoint store opened at {}", config.database_url);

    loop {
        let failures = refresh_all(&indexer, &wallets).await;

        if !cli.watch {
            if failures > 0 {
                bail!("{failures} of {} wallet refreshes failed", wallets.len());
            }
            return Ok(());
        }

        sleep(Duration::from_secs(cli.poll_interval_secs)).await;
    }
}

async fn refresh_all(indexer: &Arc<OwnershipIndexer>, wallets: &[String]) -> usize {
    let results = join_all(wallets.iter().map(|wallet| {
        let indexer = Arc::clone(indexer);
        async move { (wallet, indexer.refresh(wallet).await) }
    }))
    .await;

    let mut failures = 0;
    for (wallet, result) in results {
        match result {
            Ok(cp) => info!(
                "{} holds {} token(s) as of block {:?}",
                wallet,
                cp.token_ids.len(),
                cp.last_scanned_block
            ),
            Err(e) => {
                failures += 1;
                error!("Refresh failed for {}: {}", wallet, e);
            }
        }
    }
    failures
}
