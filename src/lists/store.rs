use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::context::Context;
use crate::error::BuildError;
use crate::lists::diff::{diff_tokens, Bump};
use crate::lists::partition::persist;
use crate::tokens::registry::ChainRegistry;
use crate::tokens::types::{Token, TokenKey, TokenList, Version};
use crate::tokens::validate::{build_token, is_publishable, TokenCandidate};

/// How the rebuilt list relates to the persisted one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingMethod {
    /// The new list is exactly the candidates.
    #[default]
    Standard,
    /// Previously published tokens are kept; candidates add to or patch them.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed, the file on disk was left alone.
    Unchanged,
    Written {
        version: Version,
        bump: Bump,
        tokens: usize,
        chains: usize,
    },
}

/// Load a persisted list and index its tokens as the previous state.
///
/// A missing file yields an empty list and a `{}` placeholder on disk; an
/// unreadable or malformed file yields an empty list.
pub fn load_token_list(lists_dir: &Path, file_name: &str, registry: &ChainRegistry) -> TokenList {
    let path = lists_dir.join(file_name);
    let mut list = match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<TokenList>(&content) {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to parse token list");
                TokenList::default()
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No token list yet, starting empty");
            let placeholder = fs::create_dir_all(lists_dir).and_then(|_| fs::write(&path, "{}"));
            if let Err(e) = placeholder {
                tracing::error!(path = %path.display(), error = %e, "Failed to create placeholder list");
            }
            TokenList::default()
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read token list");
            TokenList::default()
        }
    };

    for token in &list.tokens {
        if !registry.is_supported(token.chain_id) {
            continue;
        }
        match TokenCandidate::from_token(token) {
            Ok(candidate) => {
                list.previous_tokens.insert(candidate.key(), token.clone());
            }
            Err(e) => {
                tracing::debug!(file = file_name, error = %e, "Skipping persisted token");
            }
        }
    }
    list.next_tokens.clear();
    list
}

/// Read a persisted list without touching the filesystem otherwise. Used to
/// seed start-up indexes; anything unreadable is skipped.
pub fn read_persisted(lists_dir: &Path, file_name: &str) -> Option<TokenList> {
    let path = lists_dir.join(file_name);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(list) => Some(list),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable token list");
            None
        }
    }
}

/// Validate `candidates` into the list, decide the version bump against the
/// previous state and persist the result if anything changed.
pub fn save_token_list(
    ctx: &Context,
    list: &mut TokenList,
    candidates: &[Token],
    file_name: &str,
    method: SavingMethod,
) -> Result<SaveOutcome, BuildError> {
    if method == SavingMethod::Append {
        for (key, token) in &list.previous_tokens {
            if !is_publishable(&ctx.registry, token) {
                continue;
            }
            if let Ok(token) = TokenCandidate::from_token(token)
                .and_then(|c| build_token(&ctx.registry, &ctx.icons, c))
            {
                list.next_tokens.insert(*key, token);
            }
        }
    }

    let mut seen: HashSet<TokenKey> = HashSet::new();
    let mut rejected = 0usize;
    for token in candidates {
        if !ctx.registry.is_supported(token.chain_id) {
            continue;
        }
        let built = TokenCandidate::from_token(token).and_then(|candidate| {
            let key = candidate.key();
            build_token(&ctx.registry, &ctx.icons, candidate).map(|t| (key, t))
        });
        match built {
            Ok((key, token)) => {
                if seen.insert(key) {
                    list.next_tokens.insert(key, token);
                }
            }
            Err(e) => {
                rejected += 1;
                tracing::debug!(
                    file = file_name,
                    chain_id = token.chain_id,
                    address = %token.address,
                    error = %e,
                    "Token rejected"
                );
            }
        }
    }

    if list.next_tokens.is_empty() {
        return Err(BuildError::EmptyDataset {
            file: file_name.to_string(),
        });
    }

    let diff = diff_tokens(&list.previous_tokens, &list.next_tokens);
    let Some(bump) = diff.bump() else {
        tracing::info!(file = file_name, version = %list.version, rejected, "Token list unchanged");
        return Ok(SaveOutcome::Unchanged);
    };

    list.version = list.version.bumped(bump);
    list.timestamp = chrono::Utc::now().format("%d/%m/%Y %H:%M:%S").to_string();

    let summary = persist(&ctx.registry, list, &ctx.lists_dir, file_name)?;

    tracing::info!(
        file = file_name,
        version = %list.version,
        bump = bump.as_str(),
        added = diff.additions.len(),
        removed = diff.removals.len(),
        modified = diff.modifications.len(),
        rejected,
        tokens = summary.tokens,
        chains = summary.chains,
        "Token list written"
    );

    Ok(SaveOutcome::Written {
        version: list.version,
        bump,
        tokens: summary.tokens,
        chains: summary.chains,
    })
}
