use crate::config::GeneratorConfig;
use crate::context::Context;
use crate::error::BuildError;
use crate::fetch::ListFetcher;
use crate::generators::{adopt_header, upstream_uri};
use crate::lists::store::{load_token_list, save_token_list, SaveOutcome};
use crate::tokens::types::Token;

/// Republish an upstream list after validation.
pub async fn build(
    ctx: &Context,
    fetcher: &dyn ListFetcher,
    generator: &GeneratorConfig,
) -> Result<SaveOutcome, BuildError> {
    let uri = upstream_uri(generator)?;
    let file_name = generator.file_name();
    let mut list = load_token_list(&ctx.lists_dir, &file_name, &ctx.registry);

    let upstream = fetcher.fetch(uri).await;
    tracing::info!(generator = %generator.name, tokens = upstream.tokens.len(), "Upstream list fetched");
    adopt_header(&mut list, &upstream, generator);

    // occurrence only means something in aggregated lists
    let candidates: Vec<Token> = upstream
        .tokens
        .into_iter()
        .map(|token| Token {
            occurrence: None,
            ..token
        })
        .collect();

    save_token_list(ctx, &mut list, &candidates, &file_name, generator.method)
}
