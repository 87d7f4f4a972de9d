use alloy::primitives::Address;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};

use crate::context::Context;
use crate::onchain::multicall::Erc20Resolver;
use crate::tokens::types::Token;
use crate::tokens::validate::parse_address;

/// Which metadata fields are missing from a record, if any.
pub fn missing_fields(token: &Token) -> Option<&'static str> {
    match (token.name.is_empty(), token.symbol.is_empty(), token.decimals == 0) {
        (false, false, false) => None,
        (true, true, true) => Some("name, symbol and decimals"),
        (true, true, false) => Some("name and symbol"),
        (true, false, true) => Some("name and decimals"),
        (false, true, true) => Some("symbol and decimals"),
        (true, false, false) => Some("name"),
        (false, true, false) => Some("symbol"),
        (false, false, true) => Some("decimals"),
    }
}

/// Replace the metadata of `requests` with what the chain reports.
///
/// Address, chain, logo and occurrence come from the request; name, symbol and
/// decimals from the cache or the resolver. Native coins are passed through.
/// Requests that cannot be resolved are dropped. Output keeps input order.
pub async fn resolve_metadata(ctx: &Context, resolver: &dyn Erc20Resolver, requests: &[Token]) -> Vec<Token> {
    let mut by_chain: BTreeMap<u64, Vec<Address>> = BTreeMap::new();
    for request in requests {
        let Some(chain) = ctx.registry.get(request.chain_id) else {
            continue;
        };
        let Ok(address) = parse_address(&request.address) else {
            continue;
        };
        if request.address.eq_ignore_ascii_case(&chain.coin.address) {
            continue;
        }
        by_chain.entry(request.chain_id).or_default().push(address);
    }

    let lookups = by_chain
        .into_iter()
        .map(|(chain_id, addresses)| async move { (chain_id, resolve_chain(ctx, resolver, chain_id, addresses).await) });
    let resolved: HashMap<u64, HashMap<Address, Token>> = join_all(lookups).await.into_iter().collect();

    let mut tokens = Vec::with_capacity(requests.len());
    for request in requests {
        let Some(chain) = ctx.registry.get(request.chain_id) else {
            continue;
        };
        if request.address.eq_ignore_ascii_case(&chain.coin.address) {
            tokens.push(request.clone());
            continue;
        }
        let Ok(address) = parse_address(&request.address) else {
            tracing::debug!(address = %request.address, "Unparseable address, skipping");
            continue;
        };
        match resolved.get(&request.chain_id).and_then(|r| r.get(&address)) {
            Some(metadata) => tokens.push(Token {
                address: address.to_checksum(None),
                name: metadata.name.clone(),
                symbol: metadata.symbol.clone(),
                logo_uri: request.logo_uri.clone(),
                chain_id: request.chain_id,
                decimals: metadata.decimals,
                occurrence: request.occurrence,
            }),
            None => {
                tracing::debug!(chain_id = request.chain_id, address = %address, "No on-chain metadata, skipping");
            }
        }
    }
    tokens
}

async fn resolve_chain(
    ctx: &Context,
    resolver: &dyn Erc20Resolver,
    chain_id: u64,
    mut addresses: Vec<Address>,
) -> HashMap<Address, Token> {
    addresses.sort();
    addresses.dedup();

    let (cached, mut misses) = ctx.cache.lookup(chain_id, &addresses).await;
    let mut known = HashMap::with_capacity(addresses.len());
    for (address, token) in cached {
        match missing_fields(&token) {
            None => {
                known.insert(address, token);
            }
            Some(missing) => {
                tracing::warn!(chain_id, address = %address, missing, "[ALL_EXISTING_TOKENS] Incomplete cached metadata, reading from chain");
                misses.push(address);
            }
        }
    }
    let from_cache = known.len();

    if !misses.is_empty() {
        for (address, metadata) in resolver.resolve(chain_id, &misses).await {
            ctx.cache.insert(&metadata).await;
            let token = Token {
                address: address.to_checksum(None),
                name: metadata.name,
                symbol: metadata.symbol,
                chain_id,
                decimals: metadata.decimals,
                ..Default::default()
            };
            if let Some(missing) = missing_fields(&token) {
                tracing::warn!(chain_id, address = %address, missing, "[FETCHED_TOKEN] Incomplete on-chain metadata");
            }
            known.insert(address, token);
        }
    }

    tracing::info!(
        chain_id,
        requested = addresses.len(),
        from_cache,
        from_chain = known.len() - from_cache,
        "Token metadata resolved"
    );
    known
}
