use alloy::primitives::{address, Address};
use std::str::FromStr;

use crate::error::TokenError;
use crate::icons::IconResolver;
use crate::tokens::registry::ChainRegistry;
use crate::tokens::types::{Token, TokenKey};

/// Bridged USDC on Polygon. Upstream lists disagree on its name, so it is pinned.
const POLYGON_BRIDGED_USDC: Address = address!("0x2791bca1f2de4661ed88a30c99a7a9449aa84174");
const POLYGON_CHAIN_ID: u64 = 137;

/// Raw token fields as they arrive from a source, before validation.
#[derive(Debug, Clone, Default)]
pub struct TokenCandidate {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub logo_uri: String,
    pub chain_id: u64,
    pub decimals: u32,
    pub occurrence: Option<u32>,
}

impl TokenCandidate {
    /// Parse the address of a loosely-typed list entry.
    pub fn from_token(token: &Token) -> Result<Self, TokenError> {
        let address = parse_address(&token.address)?;
        Ok(Self {
            address,
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            logo_uri: token.logo_uri.clone(),
            chain_id: token.chain_id,
            decimals: token.decimals,
            occurrence: token.occurrence,
        })
    }

    pub fn key(&self) -> TokenKey {
        TokenKey::new(self.chain_id, self.address)
    }
}

pub fn parse_address(raw: &str) -> Result<Address, TokenError> {
    Address::from_str(raw.trim()).map_err(|_| TokenError::InvalidAddress(raw.to_string()))
}

/// Turn a candidate into a publishable token, or explain why it cannot be one.
pub fn build_token(
    registry: &ChainRegistry,
    icons: &dyn IconResolver,
    candidate: TokenCandidate,
) -> Result<Token, TokenError> {
    let TokenCandidate {
        address,
        mut name,
        mut symbol,
        logo_uri,
        chain_id,
        decimals,
        occurrence,
    } = candidate;

    if address == POLYGON_BRIDGED_USDC && chain_id == POLYGON_CHAIN_ID {
        name = "Bridged USD Coin (PoS)".to_string();
        symbol = "USDC.e".to_string();
    }

    if name.is_empty() {
        return Err(TokenError::EmptyName);
    }
    if symbol.is_empty() {
        return Err(TokenError::EmptySymbol);
    }
    if decimals == 0 {
        return Err(TokenError::ZeroDecimals);
    }
    if !registry.is_supported(chain_id) {
        return Err(TokenError::UnsupportedChain(chain_id));
    }
    if registry.is_ignored(chain_id, &address) {
        return Err(TokenError::Ignored {
            chain_id,
            address: address.to_checksum(None),
        });
    }

    let label = format!("{} - {}", name, symbol);
    let logo_uri = icons.resolve(chain_id, &label, &address, &logo_uri);

    Ok(Token {
        address: address.to_checksum(None),
        name,
        symbol,
        logo_uri,
        chain_id,
        decimals,
        occurrence,
    })
}

/// Whether an already built token may appear in a written list.
pub fn is_publishable(registry: &ChainRegistry, token: &Token) -> bool {
    if token.name.is_empty() || token.symbol.is_empty() || token.decimals == 0 {
        return false;
    }
    if !registry.is_supported(token.chain_id) {
        return false;
    }
    match parse_address(&token.address) {
        Ok(address) => !registry.is_ignored(token.chain_id, &address),
        Err(_) => false,
    }
}
