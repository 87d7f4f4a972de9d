use std::path::PathBuf;

use crate::config::Config;
use crate::icons::AssetIconResolver;
use crate::lists::store::read_persisted;
use crate::onchain::cache::MetadataCache;
use crate::tokens::registry::ChainRegistry;
use crate::tokens::types::TokenList;

/// Everything a build needs that outlives a single list: built once at
/// start-up and passed down explicitly.
pub struct Context {
    pub registry: ChainRegistry,
    pub icons: AssetIconResolver,
    pub cache: MetadataCache,
    pub lists_dir: PathBuf,
}

impl Context {
    pub fn new(registry: ChainRegistry, lists_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            icons: AssetIconResolver::new(),
            cache: MetadataCache::default(),
            lists_dir: lists_dir.into(),
        }
    }

    /// Build the registry from config and index the logos and metadata of every
    /// list already published by a configured generator.
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        let registry = ChainRegistry::from_config(&config.chains)?;
        let mut ctx = Self::new(registry, &config.lists_dir);

        let published: Vec<TokenList> = config
            .generators
            .iter()
            .filter_map(|g| read_persisted(&ctx.lists_dir, &g.file_name()))
            .collect();
        ctx.seed(&published);

        tracing::info!(
            lists = published.len(),
            logos = ctx.icons.len(),
            "Published lists indexed"
        );
        Ok(ctx)
    }

    pub fn seed(&mut self, lists: &[TokenList]) {
        self.icons.seed_from_lists(lists);
        self.cache.seed_from_lists(lists);
    }
}
