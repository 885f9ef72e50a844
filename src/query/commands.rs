use crate::query::formatters::{OutputFormat, format_checkpoints, format_head, format_owned_tokens};
use crate::query::{Freshness, OwnershipQuery};
use anyhow::{Context, Result};

pub async fn cmd_tokens(
    query: &OwnershipQuery,
    wallet: &str,
    cached: bool,
    format: &OutputFormat,
) -> Result<()> {
    let freshness = if cached {
        Freshness::Cached
    } else {
        Freshness::Refresh
    };

    let owned = query
        .owned_tokens(wallet, freshness)
        .await
        .with_context(|| format!("Failed to load tokens for {wallet}"))?;
    println!("{}", format_owned_tokens(&owned, format));

    Ok(())
}

pub async fn cmd_checkpoints(query: &OwnershipQuery, format: &OutputFormat) -> Result<()> {
    let checkpoints = query
        .checkpoints()
        .await
        .context("Failed to list checkpoints")?;
    println!("{}", format_checkpoints(&checkpoints, format));

    Ok(())
}

pub async fn cmd_head(
    query: &OwnershipQuery,
    endpoints: usize,
    format: &OutputFormat,
) -> Result<()> {
    let block = query.head().await.context("Failed to fetch latest block")?;
    println!("{}", format_head(block, endpoints, format));

    Ok(())
}
