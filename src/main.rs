use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tokenlist_generator::config::Config;
use tokenlist_generator::context::Context;
use tokenlist_generator::fetch::HttpListFetcher;
use tokenlist_generator::onchain::multicall::MulticallResolver;
use tokenlist_generator::pipeline::Pipeline;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=debug for per-token output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Usage: tokenlist-generator [config.toml] [generator...]
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "config.toml".to_string());
    let selection: Vec<String> = args.collect();

    let config = Config::load(&config_path)?;
    tracing::info!(
        chains = config.chains.len(),
        generators = config.generators.len(),
        "Configuration loaded from {}",
        config_path
    );

    let ctx = Context::from_config(&config)?;
    let fetcher = Arc::new(HttpListFetcher::new()?);
    let resolver = Arc::new(MulticallResolver::new(&ctx.registry, config.onchain.batch_size));

    let pipeline = Pipeline::new(ctx, config, fetcher, resolver);
    let summary = pipeline.run(&selection).await;

    if !summary.failed.is_empty() {
        tracing::warn!(failed = ?summary.failed, "Some token lists were not built");
    }
    Ok(())
}
