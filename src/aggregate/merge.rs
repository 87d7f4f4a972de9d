use std::collections::{BTreeMap, BTreeSet};

use crate::tokens::registry::ChainRegistry;
use crate::tokens::types::{Token, TokenKey};
use crate::tokens::validate::parse_address;

/// Occurrence given to a chain's curated extra tokens so they always reach quorum.
pub const EXTRA_TOKEN_OCCURRENCE: u32 = 10;

/// A field that can be left unset by a source.
pub trait MergeField {
    fn is_unset(&self) -> bool;
}

impl MergeField for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl MergeField for u32 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}

/// First non-empty value wins; the existing value beats the incoming one.
pub fn merge_field<T: MergeField>(existing: T, incoming: T) -> T {
    if existing.is_unset() {
        incoming
    } else {
        existing
    }
}

#[derive(Debug, Clone)]
struct AggregatedToken {
    token: Token,
    sources: BTreeSet<String>,
}

/// Folds tokens from many named sources into one map keyed by (chain, address),
/// counting how many distinct sources list each token.
pub struct Aggregator<'a> {
    registry: &'a ChainRegistry,
    tokens: BTreeMap<TokenKey, AggregatedToken>,
    sources_per_chain: BTreeMap<u64, BTreeSet<String>>,
}

impl<'a> Aggregator<'a> {
    pub fn new(registry: &'a ChainRegistry) -> Self {
        Self {
            registry,
            tokens: BTreeMap::new(),
            sources_per_chain: BTreeMap::new(),
        }
    }

    /// Merge every token of one source. Returns how many tokens were accepted.
    pub fn add_source(&mut self, source: &str, tokens: &[Token]) -> usize {
        let mut accepted = 0;
        for token in tokens {
            if !self.registry.is_supported(token.chain_id) {
                continue;
            }
            self.sources_per_chain
                .entry(token.chain_id)
                .or_default()
                .insert(source.to_string());

            let address = match parse_address(&token.address) {
                Ok(address) => address,
                Err(e) => {
                    tracing::debug!(source, chain_id = token.chain_id, error = %e, "Skipping token");
                    continue;
                }
            };
            let key = TokenKey::new(token.chain_id, address);

            match self.tokens.get_mut(&key) {
                Some(existing) => {
                    let current = std::mem::take(&mut existing.token);
                    let corroborated = existing.sources.insert(source.to_string());
                    existing.token = Token {
                        address: current.address,
                        name: merge_field(current.name, token.name.clone()),
                        symbol: merge_field(current.symbol, token.symbol.clone()),
                        logo_uri: merge_field(current.logo_uri, token.logo_uri.clone()),
                        decimals: merge_field(current.decimals, token.decimals),
                        chain_id: current.chain_id,
                        occurrence: current
                            .occurrence
                            .map(|n| if corroborated { n + 1 } else { n }),
                    };
                }
                None => {
                    let occurrence = if self.registry.is_extra(token.chain_id, &address) {
                        EXTRA_TOKEN_OCCURRENCE
                    } else {
                        1
                    };
                    self.tokens.insert(
                        key,
                        AggregatedToken {
                            token: Token {
                                address: address.to_checksum(None),
                                name: token.name.clone(),
                                symbol: token.symbol.clone(),
                                logo_uri: token.logo_uri.clone(),
                                chain_id: token.chain_id,
                                decimals: token.decimals,
                                occurrence: Some(occurrence),
                            },
                            sources: BTreeSet::from([source.to_string()]),
                        },
                    );
                }
            }
            accepted += 1;
        }

        tracing::debug!(source, accepted, total = self.tokens.len(), "Source merged");
        accepted
    }

    pub fn get(&self, key: &TokenKey) -> Option<&Token> {
        self.tokens.get(key).map(|t| &t.token)
    }

    /// Aggregated tokens in key order.
    pub fn tokens(&self) -> impl Iterator<Item = (&TokenKey, &Token)> {
        self.tokens.iter().map(|(k, t)| (k, &t.token))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of distinct sources that listed at least one token on the chain.
    pub fn source_count(&self, chain_id: u64) -> usize {
        self.sources_per_chain
            .get(&chain_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub fn registry(&self) -> &ChainRegistry {
        self.registry
    }
}
