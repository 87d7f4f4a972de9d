pub mod list;
pub mod onchain;
pub mod popular;

use crate::config::{Config, GeneratorConfig, GeneratorKind};
use crate::context::Context;
use crate::error::BuildError;
use crate::fetch::ListFetcher;
use crate::lists::store::SaveOutcome;
use crate::onchain::multicall::Erc20Resolver;
use crate::tokens::types::TokenList;

/// Run one configured generator to completion.
pub async fn build(
    ctx: &Context,
    fetcher: &dyn ListFetcher,
    resolver: &dyn Erc20Resolver,
    config: &Config,
    generator: &GeneratorConfig,
) -> Result<SaveOutcome, BuildError> {
    match generator.kind {
        GeneratorKind::List => list::build(ctx, fetcher, generator).await,
        GeneratorKind::Onchain => onchain::build(ctx, fetcher, resolver, generator).await,
        GeneratorKind::Popular => popular::build(ctx, resolver, config, generator).await,
    }
}

fn upstream_uri(generator: &GeneratorConfig) -> Result<&str, BuildError> {
    generator
        .uri
        .as_deref()
        .ok_or_else(|| BuildError::MissingUri(generator.name.clone()))
}

/// Take the list header from config, falling back to the upstream list and
/// then to what was persisted before.
fn adopt_header(list: &mut TokenList, upstream: &TokenList, generator: &GeneratorConfig) {
    fn pick(configured: &Option<String>, upstream: &str, current: &mut String) {
        if let Some(value) = configured {
            *current = value.clone();
        } else if !upstream.is_empty() {
            *current = upstream.to_string();
        }
    }

    pick(&generator.title, &upstream.name, &mut list.name);
    pick(&generator.description, &upstream.description, &mut list.description);
    pick(&generator.logo_uri, &upstream.logo_uri, &mut list.logo_uri);
    if !upstream.keywords.is_empty() {
        list.keywords = upstream.keywords.clone();
    }
    if list.name.is_empty() {
        list.name = generator.name.clone();
    }
}
