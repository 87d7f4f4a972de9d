use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::BuildError;
use crate::tokens::registry::ChainRegistry;
use crate::tokens::types::{Token, TokenList, Version};
use crate::tokens::validate::is_publishable;

/// Serialized shape of a list: the header of `list` with a chosen token slice.
#[derive(Debug, Serialize)]
pub struct ListDocument<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub timestamp: &'a str,
    #[serde(rename = "logoURI")]
    pub logo_uri: &'a str,
    pub keywords: &'a [String],
    pub version: Version,
    pub tokens: &'a [Token],
}

impl<'a> ListDocument<'a> {
    pub fn new(list: &'a TokenList, tokens: &'a [Token]) -> Self {
        Self {
            name: &list.name,
            description: &list.description,
            timestamp: &list.timestamp,
            logo_uri: &list.logo_uri,
            keywords: &list.keywords,
            version: list.version,
            tokens,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistSummary {
    pub tokens: usize,
    pub chains: usize,
}

/// Pretty-print `value` to `path` through a temporary file and a rename.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<(), BuildError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| BuildError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| BuildError::io(path, e))?;
    Ok(())
}

/// Flatten `next_tokens` into `tokens`, write the unified list, then one shard
/// per chain under `<lists_dir>/<chain_id>/<file_name>`.
pub fn persist(
    registry: &ChainRegistry,
    list: &mut TokenList,
    lists_dir: &Path,
    file_name: &str,
) -> Result<PersistSummary, BuildError> {
    list.tokens = list
        .next_tokens
        .values()
        .filter(|t| is_publishable(registry, t))
        .cloned()
        .collect();

    write_json(&lists_dir.join(file_name), &ListDocument::new(list, &list.tokens))?;

    let mut per_chain: BTreeMap<u64, Vec<Token>> = BTreeMap::new();
    for token in &list.tokens {
        per_chain.entry(token.chain_id).or_default().push(token.clone());
    }

    for (chain_id, tokens) in &per_chain {
        let path = lists_dir.join(chain_id.to_string()).join(file_name);
        write_json(&path, &ListDocument::new(list, tokens))?;
        tracing::debug!(chain_id, tokens = tokens.len(), path = %path.display(), "Chain shard written");
    }

    Ok(PersistSummary {
        tokens: list.tokens.len(),
        chains: per_chain.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::registry::tests::registry;
    use crate::tokens::types::TokenKey;
    use alloy::primitives::Address;

    fn token(chain_id: u64, n: u8, decimals: u32) -> (TokenKey, Token) {
        let address = Address::with_last_byte(n);
        (
            TokenKey::new(chain_id, address),
            Token {
                address: address.to_checksum(None),
                name: format!("Token {}", n),
                symbol: format!("T{}", n),
                chain_id,
                decimals,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_unified_and_shards() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = TokenList {
            name: "Test".to_string(),
            version: Version { major: 1, minor: 2, patch: 0 },
            next_tokens: [token(10, 1, 18), token(1, 2, 6), token(1, 3, 0), token(56, 4, 18)]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let summary = persist(&registry(), &mut list, dir.path(), "test.json").unwrap();
        assert_eq!(summary, PersistSummary { tokens: 2, chains: 2 });

        let unified: TokenList =
            serde_json::from_str(&fs::read_to_string(dir.path().join("test.json")).unwrap()).unwrap();
        let chains: Vec<u64> = unified.tokens.iter().map(|t| t.chain_id).collect();
        assert_eq!(chains, vec![1, 10]);
        assert_eq!(unified.version, Version { major: 1, minor: 2, patch: 0 });

        let shard: TokenList =
            serde_json::from_str(&fs::read_to_string(dir.path().join("1/test.json")).unwrap()).unwrap();
        assert_eq!(shard.name, "Test");
        assert_eq!(shard.tokens.len(), 1);
        assert_eq!(shard.tokens[0].decimals, 6);
        assert!(dir.path().join("10/test.json").exists());
        assert!(!dir.path().join("56").exists());
        assert!(!dir.path().join("test.json.tmp").exists());
    }

    #[test]
    fn test_pretty_printed_with_two_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        write_json(&path, &serde_json::json!({"a": [1]})).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{\n  \"a\": [\n    1\n  ]\n}");
    }
}
