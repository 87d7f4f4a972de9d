use std::sync::Arc;

use crate::config::{Config, GeneratorConfig, GeneratorKind};
use crate::context::Context;
use crate::fetch::ListFetcher;
use crate::generators;
use crate::lists::store::SaveOutcome;
use crate::onchain::multicall::Erc20Resolver;

/// Result of running a set of generators.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub failed: Vec<String>,
}

/// Runs generators one after the other:
/// 1. Upstream lists (`list`, `onchain`) in config order
/// 2. Aggregates (`popular`), which read what step 1 wrote
///
/// A failing generator is logged and skipped; the others still run.
pub struct Pipeline {
    pub ctx: Context,
    pub config: Config,
    fetcher: Arc<dyn ListFetcher>,
    resolver: Arc<dyn Erc20Resolver>,
}

impl Pipeline {
    pub fn new(
        ctx: Context,
        config: Config,
        fetcher: Arc<dyn ListFetcher>,
        resolver: Arc<dyn Erc20Resolver>,
    ) -> Self {
        Self {
            ctx,
            config,
            fetcher,
            resolver,
        }
    }

    /// Generators to run for `selection`, upstream lists first. An empty
    /// selection means every configured generator.
    pub fn plan(&self, selection: &[String]) -> (Vec<&GeneratorConfig>, Vec<String>) {
        let unknown: Vec<String> = selection
            .iter()
            .filter(|name| self.config.generator(name).is_none())
            .cloned()
            .collect();

        let mut planned: Vec<&GeneratorConfig> = self
            .config
            .generators
            .iter()
            .filter(|g| selection.is_empty() || selection.contains(&g.name))
            .collect();
        // stable: config order is kept within each group
        planned.sort_by_key(|g| g.kind == GeneratorKind::Popular);
        (planned, unknown)
    }

    pub async fn run(&self, selection: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        let (planned, unknown) = self.plan(selection);

        for name in unknown {
            tracing::error!(generator = %name, "Unknown generator, skipping");
            summary.failed.push(name);
        }

        for generator in planned {
            tracing::info!(generator = %generator.name, kind = ?generator.kind, "Building token list");
            let outcome = generators::build(
                &self.ctx,
                self.fetcher.as_ref(),
                self.resolver.as_ref(),
                &self.config,
                generator,
            )
            .await;

            match outcome {
                Ok(SaveOutcome::Written { .. }) => summary.written.push(generator.name.clone()),
                Ok(SaveOutcome::Unchanged) => summary.unchanged.push(generator.name.clone()),
                Err(e) => {
                    tracing::error!(generator = %generator.name, error = %e, "Token list build failed");
                    summary.failed.push(generator.name.clone());
                }
            }
        }

        tracing::info!(
            written = summary.written.len(),
            unchanged = summary.unchanged.len(),
            failed = summary.failed.len(),
            "Run complete"
        );
        summary
    }
}
