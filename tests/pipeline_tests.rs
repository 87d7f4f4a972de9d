use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use tokenlist_generator::config::Config;
use tokenlist_generator::context::Context;
use tokenlist_generator::fetch::ListFetcher;
use tokenlist_generator::onchain::decoder::Erc20Metadata;
use tokenlist_generator::onchain::multicall::Erc20Resolver;
use tokenlist_generator::pipeline::{Pipeline, RunSummary};
use tokenlist_generator::tokens::types::{Token, TokenList, Version};

const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
const AJNA: &str = "0x9a96ec9B57Fb64FbC60B423d1f4da7691Bd35079";
const COIN: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// Serves upstream lists from memory; unknown URIs give an empty list.
struct StubFetcher {
    lists: HashMap<String, TokenList>,
}

#[async_trait]
impl ListFetcher for StubFetcher {
    async fn fetch(&self, uri: &str) -> TokenList {
        self.lists.get(uri).cloned().unwrap_or_default()
    }
}

/// Answers on-chain lookups from a fixed table.
struct StubResolver {
    known: HashMap<Address, (&'static str, &'static str, u32)>,
}

#[async_trait]
impl Erc20Resolver for StubResolver {
    async fn resolve(&self, chain_id: u64, addresses: &[Address]) -> HashMap<Address, Erc20Metadata> {
        addresses
            .iter()
            .filter_map(|address| {
                self.known.get(address).map(|(name, symbol, decimals)| {
                    (
                        *address,
                        Erc20Metadata {
                            address: *address,
                            chain_id,
                            name: name.to_string(),
                            symbol: symbol.to_string(),
                            decimals: *decimals,
                        },
                    )
                })
            })
            .collect()
    }
}

fn token(address: &str, symbol: &str, decimals: u32) -> Token {
    Token {
        address: address.to_string(),
        name: format!("{} upstream", symbol),
        symbol: symbol.to_string(),
        logo_uri: format!("https://logos.example/{}.png", symbol),
        chain_id: 1,
        decimals,
        occurrence: None,
    }
}

fn upstream(name: &str, tokens: Vec<Token>) -> TokenList {
    TokenList {
        name: name.to_string(),
        logo_uri: format!("https://{}.example/logo.svg", name),
        keywords: vec![name.to_lowercase()],
        tokens,
        ..Default::default()
    }
}

fn config(lists_dir: &Path) -> Config {
    let raw = format!(
        r#"
lists_dir = "{lists_dir}"

[[chains]]
name = "ethereum"
chain_id = 1
rpc_http = "http://localhost:8545"
extra_tokens = ["{AJNA}"]

[chains.coin]
name = "Ether"
symbol = "ETH"
decimals = 18

[[chains]]
name = "optimism"
chain_id = 10
rpc_http = "http://localhost:9545"

[chains.coin]
name = "Ether"
symbol = "ETH"
decimals = 18

[[generators]]
name = "popular"
kind = "popular"

[[generators]]
name = "alpha"
kind = "list"
uri = "mem://alpha"

[[generators]]
name = "beta"
kind = "list"
uri = "mem://beta"

[[generators]]
name = "gamma"
kind = "list"
uri = "mem://gamma"

[[generators]]
name = "pool"
kind = "list"
uri = "mem://pool"
pool = true

[[generators]]
name = "contracts"
kind = "onchain"
uri = "mem://contracts"
"#,
        lists_dir = lists_dir.display()
    );
    toml::from_str(&raw).unwrap()
}

fn pipeline(lists_dir: &Path) -> Pipeline {
    let config = config(lists_dir);

    let mut lists = HashMap::new();
    lists.insert(
        "mem://alpha".to_string(),
        upstream("Alpha", vec![token(DAI, "DAI", 18), token(USDC, "USDC", 6)]),
    );
    lists.insert(
        "mem://beta".to_string(),
        upstream("Beta", vec![token(DAI, "DAI", 18), token(WETH, "WETH", 18), token(USDC, "", 6)]),
    );
    lists.insert(
        "mem://gamma".to_string(),
        upstream("Gamma", vec![token(&DAI.to_lowercase(), "DAI", 18), token(AJNA, "AJNA", 18)]),
    );
    lists.insert(
        "mem://pool".to_string(),
        upstream("Pool", vec![token(USDC, "USDC", 6), token(WETH, "WETH", 18)]),
    );
    lists.insert(
        "mem://contracts".to_string(),
        upstream("Contracts", vec![token(DAI, "wrong", 1), token(WETH, "unknown", 18)]),
    );

    let mut known: HashMap<Address, (&str, &str, u32)> = HashMap::new();
    known.insert(DAI.parse().unwrap(), ("Dai Stablecoin", "DAI", 18));

    let ctx = Context::from_config(&config).unwrap();
    Pipeline::new(
        ctx,
        config,
        Arc::new(StubFetcher { lists }),
        Arc::new(StubResolver { known }),
    )
}

fn read(lists_dir: &Path, file: &str) -> TokenList {
    serde_json::from_str(&std::fs::read_to_string(lists_dir.join(file)).unwrap()).unwrap()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_list_generator_writes_unified_and_shards() {
    let dir = tempfile::tempdir().unwrap();
    let summary = pipeline(dir.path()).run(&names(&["beta"])).await;
    assert_eq!(summary.written, names(&["beta"]));

    let beta = read(dir.path(), "beta.json");
    assert_eq!(beta.name, "Beta");
    assert_eq!(beta.keywords, names(&["beta"]));
    assert_eq!(beta.version, Version { major: 0, minor: 1, patch: 0 });
    // USDC has no symbol upstream
    let symbols: Vec<&str> = beta.tokens.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["DAI", "WETH"]);
    assert!(beta.tokens.iter().all(|t| t.occurrence.is_none()));

    let shard = read(dir.path(), "1/beta.json");
    assert_eq!(shard.tokens.len(), 2);
    assert!(!dir.path().join("10/beta.json").exists());
}

#[tokio::test]
async fn test_second_run_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    pipeline(dir.path()).run(&names(&["alpha"])).await;
    let before = std::fs::read(dir.path().join("alpha.json")).unwrap();

    let summary = pipeline(dir.path()).run(&names(&["alpha"])).await;
    assert_eq!(summary.unchanged, names(&["alpha"]));
    assert_eq!(std::fs::read(dir.path().join("alpha.json")).unwrap(), before);
}

#[tokio::test]
async fn test_popular_runs_last_and_applies_quorum() {
    let dir = tempfile::tempdir().unwrap();
    let summary = pipeline(dir.path()).run(&[]).await;
    assert_eq!(
        summary,
        RunSummary {
            written: names(&["alpha", "beta", "gamma", "pool", "contracts", "popular"]),
            unchanged: Vec::new(),
            failed: Vec::new(),
        }
    );

    // chain 1 voters: alpha, beta, gamma, contracts; threshold ceil(4 * 0.5) = 2
    let popular = read(dir.path(), "popular.json");
    assert_eq!(popular.name, "Popular tokens");
    let by_symbol: HashMap<&str, &Token> = popular
        .tokens
        .iter()
        .filter(|t| t.chain_id == 1)
        .map(|t| (t.symbol.as_str(), t))
        .collect();

    assert_eq!(by_symbol["DAI"].occurrence, Some(4));
    assert_eq!(by_symbol["DAI"].name, "DAI upstream");
    assert_eq!(by_symbol["AJNA"].occurrence, Some(10));
    assert!(!by_symbol.contains_key("USDC"));
    assert!(!by_symbol.contains_key("WETH"));
    assert_eq!(by_symbol["ETH"].address, COIN);

    // native coins of every chain are always there
    let coins = popular.tokens.iter().filter(|t| t.address == COIN).count();
    assert_eq!(coins, 2);
    assert!(dir.path().join("10/popular.json").exists());
}

#[tokio::test]
async fn test_onchain_generator_uses_contract_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let summary = pipeline(dir.path()).run(&names(&["contracts"])).await;
    assert_eq!(summary.written, names(&["contracts"]));

    let list = read(dir.path(), "contracts.json");
    assert_eq!(list.tokens.len(), 1);
    assert_eq!(list.tokens[0].name, "Dai Stablecoin");
    assert_eq!(list.tokens[0].decimals, 18);
    assert_eq!(list.tokens[0].logo_uri, "https://logos.example/wrong.png");
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline(dir.path());
    pipeline.config.generators[1].uri = Some("mem://nowhere".to_string());

    let summary = pipeline.run(&names(&["alpha", "beta", "missing"])).await;
    assert_eq!(summary.written, names(&["beta"]));
    assert_eq!(summary.failed, names(&["missing", "alpha"]));
    // the empty upstream never overwrote the placeholder
    assert_eq!(std::fs::read_to_string(dir.path().join("alpha.json")).unwrap(), "{}");
}

#[tokio::test]
async fn test_write_failure_fails_only_that_list() {
    let dir = tempfile::tempdir().unwrap();
    // the alpha shard path is taken by a directory, so its rename fails
    std::fs::create_dir_all(dir.path().join("1/alpha.json")).unwrap();

    let summary = pipeline(dir.path()).run(&names(&["alpha", "beta"])).await;
    assert_eq!(summary.failed, names(&["alpha"]));
    assert_eq!(summary.written, names(&["beta"]));
    assert_eq!(read(dir.path(), "1/beta.json").tokens.len(), 2);
}
