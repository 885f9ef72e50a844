use crate::ownership::TokenSet;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Last known-good ownership state of one wallet.
///
/// `token_ids` is the fold of every transfer into and out of `wallet` from the
/// genesis block through `last_scanned_block`. `None` means never scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCheckpoint {
    pub wallet: Address,
    pub last_scanned_block: Option<u64>,
    #[serde(with = "decimal_token_ids")]
    pub token_ids: TokenSet,
}

impl WalletCheckpoint {
    pub fn new(wallet: Address) -> Self {
        WalletCheckpoint {
            wallet,
            last_scanned_block: None,
            token_ids: TokenSet::new(),
        }
    }

    /// Token ids in ascending numeric order.
    pub fn sorted_token_ids(&self) -> Vec<U256> {
        self.token_ids.iter().copied().collect()
    }
}

/// Storage key for a wallet: lowercase `0x` hex.
pub fn wallet_key(wallet: &Address) -> String {
    alloy_primitives::hex::encode_prefixed(wallet)
}

/// Token ids as decimal strings, zero-padded to 78 digits so that lexical
/// order matches numeric order. U256 max is below 10^78.
pub fn pad_token_id(id: &U256) -> String {
    let digits = id.to_string();
    format!("{digits:0>78}")
}

pub fn parse_token_id(padded: &str) -> Result<U256, String> {
    let trimmed = padded.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(trimmed, 10).map_err(|e| format!("invalid token id {padded:?}: {e}"))
}

mod decimal_token_ids {
    use crate::ownership::TokenSet;
    use alloy_primitives::U256;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ids: &TokenSet, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(ids.iter().map(|id| id.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TokenSet, D::Error> {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|s| U256::from_str_radix(s, 10).map_err(D::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn padded_ids_sort_numerically() {
        let small = pad_token_id(&U256::from(9u64));
        let large = pad_token_id(&U256::from(10u64));
        let max = pad_token_id(&U256::MAX);
        assert_eq!(small.len(), 78);
        assert_eq!(max.len(), 78);
        assert!(small < large && large < max);
        assert_eq!(parse_token_id(&max).unwrap(), U256::MAX);
        assert_eq!(parse_token_id(&pad_token_id(&U256::ZERO)).unwrap(), U256::ZERO);
    }

    #[test]
    fn json_uses_decimal_token_ids() {
        let mut cp = WalletCheckpoint::new(address!("0x00000000000000000000000000000000000000aa"));
        cp.last_scanned_block = Some(120);
        cp.token_ids.insert(U256::from(7u64));
        cp.token_ids.insert(U256::from(2u64).pow(U256::from(60u64)));

        let json = serde_json::to_value(&cp).unwrap();
        assert_eq!(json["lastScannedBlock"], 120);
        assert_eq!(json["tokenIds"][0], "7");
        assert_eq!(json["tokenIds"][1], "1152921504606846976");

        let back: WalletCheckpoint = serde_json::from_value(json).unwrap();
        assert_eq!(back, cp);
    }

    #[test]
    fn wallet_key_is_lowercase_hex() {
        let wallet: Address = "0x00000000000000000000000000000000000000AB".parse().unwrap();
        assert_eq!(wallet_key(&wallet), "0x00000000000000000000000000000000000000ab");
    }
}
