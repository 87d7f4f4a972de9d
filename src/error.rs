use std::path::PathBuf;

/// Reasons a candidate token is rejected. Always recoverable: the record is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token address '{0}' is not a valid address")]
    InvalidAddress(String),
    #[error("token name is empty")]
    EmptyName,
    #[error("token symbol is empty")]
    EmptySymbol,
    #[error("token decimals is 0")]
    ZeroDecimals,
    #[error("token {address} is ignored on chain {chain_id}")]
    Ignored { chain_id: u64, address: String },
    #[error("chain {0} is not supported")]
    UnsupportedChain(u64),
}

/// Failures of a single list build. Fatal for that build only.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("token list '{file}' is empty after validation, refusing to overwrite it")]
    EmptyDataset { file: String },
    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize token list: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("generator '{0}' has no uri configured")]
    MissingUri(String),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
