use crate::aggregate::merge::Aggregator;
use crate::aggregate::popularity::select_popular;
use crate::config::{Config, GeneratorConfig, GeneratorKind};
use crate::context::Context;
use crate::error::BuildError;
use crate::lists::store::{load_token_list, save_token_list, SaveOutcome};
use crate::onchain::enrich::resolve_metadata;
use crate::onchain::multicall::Erc20Resolver;

const DEFAULT_NAME: &str = "Popular tokens";
const DEFAULT_DESCRIPTION: &str = "A curated list of popular tokens from all the token lists.";

/// Generators whose published lists vote in the popularity quorum.
pub fn quorum_sources<'a>(config: &'a Config, generator: &GeneratorConfig) -> Vec<&'a GeneratorConfig> {
    config
        .generators
        .iter()
        .filter(|g| g.name != generator.name && !g.pool && g.kind != GeneratorKind::Popular)
        .collect()
}

/// Aggregate every other list and keep the tokens enough of them agree on.
pub async fn build(
    ctx: &Context,
    resolver: &dyn Erc20Resolver,
    config: &Config,
    generator: &GeneratorConfig,
) -> Result<SaveOutcome, BuildError> {
    let file_name = generator.file_name();
    let mut list = load_token_list(&ctx.lists_dir, &file_name, &ctx.registry);
    list.name = generator.title.clone().unwrap_or_else(|| DEFAULT_NAME.to_string());
    list.description = generator
        .description
        .clone()
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
    if let Some(logo_uri) = &generator.logo_uri {
        list.logo_uri = logo_uri.clone();
    }

    let mut aggregator = Aggregator::new(&ctx.registry);
    for source in quorum_sources(config, generator) {
        let source_list = load_token_list(&ctx.lists_dir, &source.file_name(), &ctx.registry);
        let added = aggregator.add_source(&source.name, &source_list.tokens);
        tracing::debug!(generator = %generator.name, source = %source.name, added, "Source aggregated");
    }

    let mut candidates = select_popular(&aggregator, config.popularity.quorum);
    if generator.verify_onchain {
        candidates = resolve_metadata(ctx, resolver, &candidates).await;
    }

    save_token_list(ctx, &mut list, &candidates, &file_name, generator.method)
}
