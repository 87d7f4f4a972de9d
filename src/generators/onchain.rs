use crate::config::GeneratorConfig;
use crate::context::Context;
use crate::error::BuildError;
use crate::fetch::ListFetcher;
use crate::generators::{adopt_header, upstream_uri};
use crate::lists::store::{load_token_list, save_token_list, SaveOutcome};
use crate::onchain::enrich::resolve_metadata;
use crate::onchain::multicall::Erc20Resolver;
use crate::tokens::types::Token;

/// Take the addresses and logos of an upstream list, but the name, symbol and
/// decimals the token contracts report.
pub async fn build(
    ctx: &Context,
    fetcher: &dyn ListFetcher,
    resolver: &dyn Erc20Resolver,
    generator: &GeneratorConfig,
) -> Result<SaveOutcome, BuildError> {
    let uri = upstream_uri(generator)?;
    let file_name = generator.file_name();
    let mut list = load_token_list(&ctx.lists_dir, &file_name, &ctx.registry);

    let upstream = fetcher.fetch(uri).await;
    adopt_header(&mut list, &upstream, generator);

    let requests: Vec<Token> = upstream
        .tokens
        .iter()
        .filter(|t| ctx.registry.is_supported(t.chain_id))
        .map(|t| Token {
            occurrence: None,
            ..t.clone()
        })
        .collect();
    let candidates = resolve_metadata(ctx, resolver, &requests).await;
    tracing::info!(
        generator = %generator.name,
        upstream = upstream.tokens.len(),
        resolved = candidates.len(),
        "On-chain metadata collected"
    );

    save_token_list(ctx, &mut list, &candidates, &file_name, generator.method)
}
