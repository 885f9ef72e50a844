use anyhow::{Context, Result};
use ownership_indexer::repository::open_store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    dotenv::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./ownership.db".to_string());

    println!("Running migrations on checkpoint store: {database_url}");

    let store = open_store(&database_url).context("Failed to open checkpoint store")?;
    let wallets = store.list().await.context("Failed to read checkpoints")?;

    println!(
        "Migrations completed successfully! {} wallet checkpoint(s) present.",
        wallets.len()
    );

    Ok(())
}
