use alloy_primitives::Address;
use anyhow::{Context, Result, bail};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_urls: Vec<String>,
    pub nft_contract_address: Option<Address>,
    pub genesis_block: u64,
    pub chunk_size: u64,
    pub database_url: String,
    pub request_timeout: Duration,
    pub retry_attempts_per_endpoint: usize,
    pub retry_backoff: Duration,
    pub transient_error_patterns: Vec<String>,
    pub watch_wallets: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let urls_raw = var("JSON_RPC_URLS")
            .or_else(|| var("JSON_RPC_URL"))
            .context("JSON_RPC_URLS (or JSON_RPC_URL) must be set in .env")?;
        let json_rpc_urls = split_list(&urls_raw, ',');
        if json_rpc_urls.is_empty() {
            bail!("JSON_RPC_URLS must contain at least one URL");
        }

        let nft_contract_address = var("NFT_CONTRACT_ADDRESS")
            .map(|s| Address::from_str(s.trim()))
            .transpose()
            .context("Invalid NFT_CONTRACT_ADDRESS format")?;

        let genesis_block = parse_or(&var, "GENESIS_BLOCK", 0u64)?;

        let chunk_size = parse_or(&var, "CHUNK_SIZE", 1000u64)?;
        if chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than zero");
        }

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite:./ownership.db".to_string());

        let request_timeout = Duration::from_secs(parse_or(&var, "REQUEST_TIMEOUT_SECS", 30u64)?);
        let retry_attempts_per_endpoint = parse_or(&var, "RETRY_ATTEMPTS_PER_ENDPOINT", 2usize)?;
        let retry_backoff = Duration::from_millis(parse_or(&var, "RETRY_BACKOFF_MS", 250u64)?);

        let transient_error_patterns = var("TRANSIENT_ERROR_PATTERNS")
            .map(|s| split_list(&s, ';'))
            .unwrap_or_default();
        let watch_wallets = var("WATCH_WALLETS")
            .map(|s| split_list(&s, ','))
            .unwrap_or_default();

        Ok(Config {
            json_rpc_urls,
            nft_contract_address,
            genesis_block,
            chunk_size,
            database_url,
            request_timeout,
            retry_attempts_per_endpoint,
            retry_backoff,
            transient_error_patterns,
            watch_wallets,
        })
    }
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let cfg = config(&[("JSON_RPC_URL", "http://localhost:8545")]).unwrap();
        assert_eq!(cfg.json_rpc_urls, vec!["http://localhost:8545"]);
        assert_eq!(cfg.nft_contract_address, None);
        assert_eq!(cfg.genesis_block, 0);
        assert_eq!(cfg.chunk_size, 1000);
        assert_eq!(cfg.database_url, "sqlite:./ownership.db");
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.retry_attempts_per_endpoint, 2);
        assert_eq!(cfg.retry_backoff, Duration::from_millis(250));
        assert!(cfg.transient_error_patterns.is_empty());
        assert!(cfg.watch_wallets.is_empty());
    }

    #[test]
    fn reads_lists_and_overrides() {
        let cfg = config(&[
            ("JSON_RPC_URLS", " http://a , http://b ,"),
            ("JSON_RPC_URL", "http://ignored"),
            (
                "NFT_CONTRACT_ADDRESS",
                "0x00000000000000000000000000000000000000c0",
            ),
            ("GENESIS_BLOCK", "100"),
            ("CHUNK_SIZE", "50"),
            ("TRANSIENT_ERROR_PATTERNS", "(?i)overloaded; busy"),
            ("WATCH_WALLETS", "0xaa,0xbb"),
        ])
        .unwrap();

        assert_eq!(cfg.json_rpc_urls, vec!["http://a", "http://b"]);
        assert!(cfg.nft_contract_address.is_some());
        assert_eq!(cfg.genesis_block, 100);
        assert_eq!(cfg.chunk_size, 50);
        assert_eq!(cfg.transient_error_patterns, vec!["(?i)overloaded", "busy"]);
        assert_eq!(cfg.watch_wallets, vec!["0xaa", "0xbb"]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[]).is_err());
        assert!(config(&[("JSON_RPC_URLS", " , ")]).is_err());
        assert!(config(&[("JSON_RPC_URL", "http://a"), ("CHUNK_SIZE", "0")]).is_err());
        assert!(config(&[("JSON_RPC_URL", "http://a"), ("GENESIS_BLOCK", "-1")]).is_err());
        assert!(
            config(&[
                ("JSON_RPC_URL", "http://a"),
                ("NFT_CONTRACT_ADDRESS", "not-an-address")
            ])
            .is_err()
        );
    }
}
