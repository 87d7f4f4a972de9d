use serde::Deserialize;
use std::collections::HashSet;

use crate::lists::store::SavingMethod;

/// Multicall3 is deployed at the same address on nearly every EVM chain.
pub const DEFAULT_MULTICALL3: &str = "0xca11bde05977b3631167028862be2a173976ca11";

/// Sentinel address used for a chain's native coin.
pub const NATIVE_COIN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_lists_dir")]
    pub lists_dir: String,
    pub chains: Vec<ChainConfig>,
    #[serde(default)]
    pub generators: Vec<GeneratorConfig>,
    #[serde(default)]
    pub popularity: PopularityConfig,
    #[serde(default)]
    pub onchain: OnchainConfig,
}

fn default_lists_dir() -> String {
    "lists".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_http: String,
    #[serde(default = "default_multicall")]
    pub multicall: String,
    pub coin: CoinConfig,
    #[serde(default)]
    pub ignored_tokens: Vec<String>,
    #[serde(default)]
    pub extra_tokens: Vec<String>,
}

fn default_multicall() -> String {
    DEFAULT_MULTICALL3.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CoinConfig {
    #[serde(default = "default_coin_address")]
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    #[serde(default)]
    pub logo_uri: String,
}

fn default_coin_address() -> String {
    NATIVE_COIN_ADDRESS.to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Upstream list taken as-is, after validation.
    List,
    /// Upstream list whose metadata is re-read from chain.
    Onchain,
    /// Quorum-based aggregate of every other list.
    Popular,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    pub name: String,
    pub kind: GeneratorKind,
    pub uri: Option<String>,
    /// List name; `list` and `onchain` generators default to the upstream one.
    pub title: Option<String>,
    pub description: Option<String>,
    pub logo_uri: Option<String>,
    /// Pool-type sources do not count toward the popularity quorum.
    #[serde(default)]
    pub pool: bool,
    #[serde(default)]
    pub method: SavingMethod,
    /// Re-read metadata of the selected tokens from chain (popular lists only).
    #[serde(default)]
    pub verify_onchain: bool,
}

impl GeneratorConfig {
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PopularityConfig {
    #[serde(default = "default_quorum")]
    pub quorum: f64,
}

impl Default for PopularityConfig {
    fn default() -> Self {
        Self { quorum: 0.5 }
    }
}

fn default_quorum() -> f64 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
pub struct OnchainConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for OnchainConfig {
    fn default() -> Self {
        Self { batch_size: 300 }
    }
}

fn default_batch_size() -> usize {
    300
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.chains.is_empty() {
            return Err(eyre::eyre!("At least one chain must be configured"));
        }
        if !(self.popularity.quorum > 0.0 && self.popularity.quorum <= 1.0) {
            return Err(eyre::eyre!(
                "Popularity quorum must be in (0, 1], got {}",
                self.popularity.quorum
            ));
        }
        if self.onchain.batch_size == 0 {
            return Err(eyre::eyre!("On-chain batch size must be positive"));
        }

        let mut chain_ids = HashSet::new();
        for chain in &self.chains {
            if chain.chain_id == 0 {
                return Err(eyre::eyre!("Chain '{}' has chain_id 0", chain.name));
            }
            if !chain_ids.insert(chain.chain_id) {
                return Err(eyre::eyre!("Chain id {} is configured twice", chain.chain_id));
            }
            // ignore/extra entries are checked per entry when the registry is built
            for address in [&chain.multicall, &chain.coin.address] {
                if !is_hex_address(address) {
                    return Err(eyre::eyre!(
                        "Invalid address '{}' on chain '{}'",
                        address,
                        chain.name
                    ));
                }
            }
        }

        let mut names = HashSet::new();
        for generator in &self.generators {
            if !names.insert(generator.name.as_str()) {
                return Err(eyre::eyre!("Generator '{}' is configured twice", generator.name));
            }
            match generator.kind {
                GeneratorKind::List | GeneratorKind::Onchain if generator.uri.is_none() => {
                    return Err(eyre::eyre!(
                        "Generator '{}' needs a uri",
                        generator.name
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn generator(&self, name: &str) -> Option<&GeneratorConfig> {
        self.generators.iter().find(|g| g.name == name)
    }
}

fn is_hex_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}
