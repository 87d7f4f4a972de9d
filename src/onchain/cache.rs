use alloy::primitives::Address;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::onchain::decoder::Erc20Metadata;
use crate::tokens::types::{Token, TokenList};
use crate::tokens::validate::parse_address;

/// Token metadata already known to this process, by chain then address.
///
/// Seeded from the persisted lists before any build and filled by on-chain
/// lookups as builds run, so each address is resolved at most once per run.
#[derive(Debug, Default)]
pub struct MetadataCache {
    inner: RwLock<HashMap<u64, HashMap<Address, Token>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every token of `lists`. The first complete record for an address wins.
    pub fn seed_from_lists<'a>(&mut self, lists: impl IntoIterator<Item = &'a TokenList>) {
        let chains = self.inner.get_mut();
        for list in lists {
            for token in &list.tokens {
                let Ok(address) = parse_address(&token.address) else {
                    continue;
                };
                let known = chains.entry(token.chain_id).or_default();
                match known.get(&address) {
                    Some(existing) if is_complete(existing) => {}
                    _ => {
                        let mut token = token.clone();
                        token.occurrence = None;
                        known.insert(address, token);
                    }
                }
            }
        }
    }

    pub async fn get(&self, chain_id: u64, address: &Address) -> Option<Token> {
        let chains = self.inner.read().await;
        chains.get(&chain_id).and_then(|known| known.get(address)).cloned()
    }

    /// Cached entries among `addresses`, plus the addresses with no entry.
    pub async fn lookup(&self, chain_id: u64, addresses: &[Address]) -> (HashMap<Address, Token>, Vec<Address>) {
        let chains = self.inner.read().await;
        let known = chains.get(&chain_id);
        let mut hits = HashMap::new();
        let mut misses = Vec::new();
        for address in addresses {
            match known.and_then(|k| k.get(address)) {
                Some(token) => {
                    hits.insert(*address, token.clone());
                }
                None => misses.push(*address),
            }
        }
        (hits, misses)
    }

    pub async fn insert(&self, metadata: &Erc20Metadata) {
        let token = Token {
            address: metadata.address.to_checksum(None),
            name: metadata.name.clone(),
            symbol: metadata.symbol.clone(),
            chain_id: metadata.chain_id,
            decimals: metadata.decimals,
            ..Default::default()
        };
        let mut chains = self.inner.write().await;
        chains.entry(metadata.chain_id).or_default().insert(metadata.address, token);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.values().map(HashMap::len).sum()
    }
}

fn is_complete(token: &Token) -> bool {
    !token.name.is_empty() && !token.symbol.is_empty() && token.decimals != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const DAI: Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");
    const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

    fn list(tokens: Vec<Token>) -> TokenList {
        TokenList {
            tokens,
            ..Default::default()
        }
    }

    fn dai(name: &str, decimals: u32) -> Token {
        Token {
            address: DAI.to_checksum(None).to_lowercase(),
            name: name.to_string(),
            symbol: "DAI".to_string(),
            chain_id: 1,
            decimals,
            occurrence: Some(4),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_seed_prefers_complete_records() {
        let mut cache = MetadataCache::new();
        cache.seed_from_lists(&[
            list(vec![dai("", 18)]),
            list(vec![dai("Dai Stablecoin", 18)]),
            list(vec![dai("Later", 18)]),
        ]);
        let token = cache.get(1, &DAI).await.unwrap();
        assert_eq!(token.name, "Dai Stablecoin");
        assert_eq!(token.occurrence, None);
        assert!(cache.get(10, &DAI).await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_splits_hits_and_misses() {
        let mut cache = MetadataCache::new();
        cache.seed_from_lists(&[list(vec![dai("Dai Stablecoin", 18)])]);
        cache
            .insert(&Erc20Metadata {
                address: USDC,
                chain_id: 10,
                name: "USD Coin".to_string(),
                symbol: "USDC".to_string(),
                decimals: 6,
            })
            .await;

        let (hits, misses) = cache.lookup(1, &[DAI, USDC]).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(misses, vec![USDC]);
        assert_eq!(cache.len().await, 2);
    }
}
