use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, DefaultOnNull, DisplayFromStr, PickFirst};
use std::collections::BTreeMap;
use std::fmt;

/// A single entry of a token list, as persisted.
///
/// Upstream lists are loosely typed: `null` reads as the empty value and
/// numbers may come quoted.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Token {
    #[serde_as(as = "DefaultOnNull")]
    pub address: String,
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub symbol: String,
    #[serde(rename = "logoURI")]
    #[serde_as(as = "DefaultOnNull")]
    pub logo_uri: String,
    #[serde_as(as = "DefaultOnNull<PickFirst<(_, DisplayFromStr)>>")]
    pub chain_id: u64,
    #[serde_as(as = "DefaultOnNull<PickFirst<(_, DisplayFromStr)>>")]
    pub decimals: u32,
    /// Number of distinct sources listing this token. Only aggregated lists carry it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<u32>,
}

/// Identity of a token: chain id plus address. Nothing else participates.
///
/// Ordering is `(chain_id, address bytes)`, which is the same ordering as the
/// zero-padded string form produced by `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenKey {
    pub chain_id: u64,
    pub address: Address,
}

impl TokenKey {
    pub fn new(chain_id: u64, address: Address) -> Self {
        Self { chain_id, address }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:018}_0x{}", self.chain_id, hex::encode(self.address.as_slice()))
    }
}

/// Semantic version of a published list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A token list document plus the transient maps used while rebuilding it.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenList {
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub description: String,
    #[serde_as(as = "DefaultOnNull")]
    pub timestamp: String,
    #[serde(rename = "logoURI")]
    #[serde_as(as = "DefaultOnNull")]
    pub logo_uri: String,
    #[serde_as(as = "DefaultOnNull")]
    pub keywords: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    pub version: Version,
    /// Entries that do not parse are dropped one by one.
    #[serde(deserialize_with = "lenient_tokens")]
    pub tokens: Vec<Token>,
    /// Tokens of the file as it was on disk when loaded.
    #[serde(skip)]
    pub previous_tokens: BTreeMap<TokenKey, Token>,
    /// Tokens being assembled by the current build.
    #[serde(skip)]
    pub next_tokens: BTreeMap<TokenKey, Token>,
}

fn lenient_tokens<'de, D>(deserializer: D) -> Result<Vec<Token>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    let mut tokens = Vec::new();
    for entry in raw.unwrap_or_default() {
        match serde_json::from_value::<Token>(entry) {
            Ok(token) => tokens.push(token),
            Err(e) => tracing::debug!(error = %e, "Dropping malformed token entry"),
        }
    }
    Ok(tokens)
}
