use anyhow::Result;
use clap::{Parser, Subcommand};
use ownership_indexer::OwnershipIndexer;
use ownership_indexer::config::Config;
use ownership_indexer::query::OwnershipQuery;
use ownership_indexer::query::commands::{cmd_checkpoints, cmd_head, cmd_tokens};
use ownership_indexer::query::formatters::OutputFormat;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Query NFT ownership for a wallet", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Token ids held by a wallet
    Tokens {
        wallet: String,

        /// Answer from the stored checkpoint without scanning
        #[arg(long, default_value = "false")]
        cached: bool,
    },
    /// Every stored wallet checkpoint
    Checkpoints,
    /// Latest block reported by the provider pool
    Head,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;
    let indexer = Arc::new(OwnershipIndexer::from_config(&config)?);
    let query = OwnershipQuery::new(indexer);

    match cli.command {
        Commands::Tokens { wallet, cached } => {
            cmd_tokens(&query, &wallet, cached, &format).await?;
        }
        Commands::Checkpoints => {
            cmd_checkpoints(&query, &format).await?;
        }
        Commands::Head => {
            cmd_head(&query, config.json_rpc_urls.len(), &format).await?;
        }
    }

    Ok(())
}
