use alloy::primitives::Address;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use crate::config::ChainConfig;
use crate::tokens::types::Token;

/// Static data about one supported chain.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    pub chain_id: u64,
    pub name: String,
    pub rpc_http: String,
    pub multicall: Address,
    pub coin: Token,
    pub ignored_tokens: HashSet<Address>,
    pub extra_tokens: HashSet<Address>,
}

/// The set of supported chains and their per-chain token policies.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainEntry>,
}

impl ChainRegistry {
    /// Build the registry from config, applying `RPC_URI_FOR_<chain_id>` overrides.
    pub fn from_config(chains: &[ChainConfig]) -> eyre::Result<Self> {
        Self::from_config_with_env(chains, |key| std::env::var(key).ok())
    }

    pub fn from_config_with_env(
        chains: &[ChainConfig],
        env: impl Fn(&str) -> Option<String>,
    ) -> eyre::Result<Self> {
        let mut registry = Self::default();
        for chain in chains {
            let multicall = Address::from_str(&chain.multicall)
                .map_err(|e| eyre::eyre!("Invalid multicall address '{}': {}", chain.multicall, e))?;
            let coin_address = Address::from_str(&chain.coin.address)
                .map_err(|e| eyre::eyre!("Invalid coin address '{}': {}", chain.coin.address, e))?;

            let rpc_http = match env(&format!("RPC_URI_FOR_{}", chain.chain_id)) {
                Some(uri) if !uri.is_empty() => {
                    tracing::debug!(chain = %chain.name, "RPC endpoint overridden from environment");
                    uri
                }
                _ => chain.rpc_http.clone(),
            };

            registry.chains.insert(
                chain.chain_id,
                ChainEntry {
                    chain_id: chain.chain_id,
                    name: chain.name.clone(),
                    rpc_http,
                    multicall,
                    coin: Token {
                        address: coin_address.to_checksum(None),
                        name: chain.coin.name.clone(),
                        symbol: chain.coin.symbol.clone(),
                        logo_uri: chain.coin.logo_uri.clone(),
                        chain_id: chain.chain_id,
                        decimals: chain.coin.decimals,
                        occurrence: None,
                    },
                    ignored_tokens: parse_address_set(&chain.name, "ignored", &chain.ignored_tokens),
                    extra_tokens: parse_address_set(&chain.name, "extra", &chain.extra_tokens),
                },
            );
        }
        Ok(registry)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        chain_id != 0 && self.chains.contains_key(&chain_id)
    }

    pub fn is_ignored(&self, chain_id: u64, address: &Address) -> bool {
        self.chains
            .get(&chain_id)
            .map(|c| c.ignored_tokens.contains(address))
            .unwrap_or(false)
    }

    pub fn is_extra(&self, chain_id: u64, address: &Address) -> bool {
        self.chains
            .get(&chain_id)
            .map(|c| c.extra_tokens.contains(address))
            .unwrap_or(false)
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainEntry> {
        self.chains.get(&chain_id)
    }

    /// Supported chains in ascending chain id order.
    pub fn chains(&self) -> impl Iterator<Item = &ChainEntry> {
        self.chains.values()
    }

    pub fn coins(&self) -> impl Iterator<Item = &Token> {
        self.chains.values().map(|c| &c.coin)
    }
}

fn parse_address_set(chain: &str, kind: &str, addresses: &[String]) -> HashSet<Address> {
    let mut set = HashSet::new();
    for raw in addresses {
        match Address::from_str(raw) {
            Ok(address) => {
                set.insert(address);
            }
            Err(e) => {
                tracing::error!(
                    chain = %chain,
                    kind,
                    address = %raw,
                    error = %e,
                    "Invalid token address in config, skipping"
                );
            }
        }
    }
    set
}
