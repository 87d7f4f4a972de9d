use alloy::primitives::Address;
use std::collections::HashMap;
use std::str::FromStr;

use crate::tokens::types::TokenList;

pub const DEFAULT_SMOL_NOT_FOUND: &str = "https://assets.smold.app/not-found.png";
pub const DEFAULT_PARASWAP_NOT_FOUND: &str = "https://cdn.paraswap.io/token/token.png";
pub const DEFAULT_ETHERSCAN_NOT_FOUND: &str = "https://etherscan.io/images/main/empty-token.png";

/// Placeholder URIs that mean "no icon".
pub fn is_not_found(uri: &str) -> bool {
    uri.is_empty()
        || uri == DEFAULT_SMOL_NOT_FOUND
        || uri == DEFAULT_PARASWAP_NOT_FOUND
        || uri == DEFAULT_ETHERSCAN_NOT_FOUND
}

/// Picks the display icon of a token. Never fails.
pub trait IconResolver: Send + Sync {
    fn resolve(&self, chain_id: u64, label: &str, address: &Address, candidate: &str) -> String;
}

/// Resolves icons from the candidate URI, then from logos already published
/// in any persisted list, then falls back to the not-found sentinel.
#[derive(Debug, Default, Clone)]
pub struct AssetIconResolver {
    known: HashMap<(u64, Address), String>,
}

impl AssetIconResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a logo for a token unless a real one is already known.
    pub fn remember(&mut self, chain_id: u64, address: Address, uri: &str) {
        if is_not_found(uri) {
            return;
        }
        self.known
            .entry((chain_id, address))
            .or_insert_with(|| uri.to_string());
    }

    /// Index every logo published by the given lists.
    pub fn seed_from_lists<'a>(&mut self, lists: impl IntoIterator<Item = &'a TokenList>) {
        for list in lists {
            for token in &list.tokens {
                if let Ok(address) = Address::from_str(&token.address) {
                    self.remember(token.chain_id, address, &token.logo_uri);
                }
            }
        }
        tracing::debug!(logos = self.known.len(), "Known token logos indexed");
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl IconResolver for AssetIconResolver {
    fn resolve(&self, chain_id: u64, label: &str, address: &Address, candidate: &str) -> String {
        if !is_not_found(candidate) {
            return candidate.to_string();
        }
        if let Some(known) = self.known.get(&(chain_id, *address)) {
            return known.clone();
        }
        tracing::trace!(chain_id, token = %label, %address, "No icon found");
        DEFAULT_SMOL_NOT_FOUND.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::types::Token;
    use alloy::primitives::address;

    const DAI: Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");

    #[test]
    fn test_candidate_wins() {
        let mut icons = AssetIconResolver::new();
        icons.remember(1, DAI, "https://known/dai.png");
        assert_eq!(icons.resolve(1, "Dai - DAI", &DAI, "https://up/dai.png"), "https://up/dai.png");
    }

    #[test]
    fn test_known_logo_replaces_sentinel() {
        let mut icons = AssetIconResolver::new();
        icons.remember(1, DAI, "https://known/dai.png");
        assert_eq!(
            icons.resolve(1, "Dai - DAI", &DAI, DEFAULT_PARASWAP_NOT_FOUND),
            "https://known/dai.png"
        );
        assert_eq!(icons.resolve(1, "Dai - DAI", &DAI, ""), "https://known/dai.png");
        assert_eq!(icons.resolve(10, "Dai - DAI", &DAI, ""), DEFAULT_SMOL_NOT_FOUND);
    }

    #[test]
    fn test_seed_skips_sentinels() {
        let list = TokenList {
            tokens: vec![
                Token {
                    address: DAI.to_checksum(None),
                    chain_id: 1,
                    logo_uri: DEFAULT_ETHERSCAN_NOT_FOUND.to_string(),
                    ..Default::default()
                },
                Token {
                    address: DAI.to_checksum(None),
                    chain_id: 1,
                    logo_uri: "https://real/dai.png".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut icons = AssetIconResolver::new();
        icons.seed_from_lists([&list]);
        assert_eq!(icons.len(), 1);
        assert_eq!(icons.resolve(1, "", &DAI, ""), "https://real/dai.png");
    }
}
