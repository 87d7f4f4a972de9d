use alloy::primitives::{Address, Bytes};
use alloy::providers::ProviderBuilder;
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::onchain::decoder::{AbiDecoder, Erc20Decoder, Erc20Metadata, IERC20Metadata, RawErc20};
use crate::tokens::registry::ChainRegistry;

sol! {
    #[sol(rpc)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}

/// Calls issued per token: name, symbol, decimals.
const CALLS_PER_TOKEN: usize = 3;

/// Reads ERC-20 metadata from chain.
#[async_trait]
pub trait Erc20Resolver: Send + Sync {
    /// Metadata keyed by address. Addresses that cannot be resolved are absent.
    async fn resolve(&self, chain_id: u64, addresses: &[Address]) -> HashMap<Address, Erc20Metadata>;
}

#[derive(Debug, Clone)]
struct Endpoint {
    rpc_http: String,
    multicall: Address,
}

/// Resolves metadata with batched Multicall3 `aggregate3` calls.
pub struct MulticallResolver {
    endpoints: HashMap<u64, Endpoint>,
    batch_size: usize,
    decoder: Box<dyn Erc20Decoder>,
}

impl MulticallResolver {
    pub fn new(registry: &ChainRegistry, batch_size: usize) -> Self {
        let endpoints = registry
            .chains()
            .map(|c| {
                (
                    c.chain_id,
                    Endpoint {
                        rpc_http: c.rpc_http.clone(),
                        multicall: c.multicall,
                    },
                )
            })
            .collect();
        Self {
            endpoints,
            batch_size: batch_size.max(1),
            decoder: Box::new(AbiDecoder),
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn Erc20Decoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

fn metadata_calls(address: Address) -> [IMulticall3::Call3; CALLS_PER_TOKEN] {
    let call = |data: Vec<u8>| IMulticall3::Call3 {
        target: address,
        allowFailure: true,
        callData: data.into(),
    };
    [
        call(IERC20Metadata::nameCall {}.abi_encode()),
        call(IERC20Metadata::symbolCall {}.abi_encode()),
        call(IERC20Metadata::decimalsCall {}.abi_encode()),
    ]
}

fn return_data(result: &IMulticall3::Result) -> Option<Bytes> {
    (result.success && !result.returnData.is_empty()).then(|| result.returnData.clone())
}

#[async_trait]
impl Erc20Resolver for MulticallResolver {
    async fn resolve(&self, chain_id: u64, addresses: &[Address]) -> HashMap<Address, Erc20Metadata> {
        let mut resolved = HashMap::new();
        if addresses.is_empty() {
            return resolved;
        }
        let Some(endpoint) = self.endpoints.get(&chain_id) else {
            tracing::warn!(chain_id, "No RPC endpoint for chain, skipping on-chain lookup");
            return resolved;
        };
        let url: reqwest::Url = match endpoint.rpc_http.parse() {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(chain_id, rpc = %endpoint.rpc_http, error = %e, "Invalid RPC URL");
                return resolved;
            }
        };

        let provider = ProviderBuilder::new().connect_http(url);
        let multicall = IMulticall3::new(endpoint.multicall, provider);

        for batch in addresses.chunks(self.batch_size) {
            let calls: Vec<IMulticall3::Call3> =
                batch.iter().flat_map(|a| metadata_calls(*a)).collect();

            let multicall = &multicall;
            let calls = &calls;
            let results = match retry_rpc(move || async move {
                multicall.aggregate3(calls.clone()).call().await
            })
            .await
            {
                Ok(results) => results,
                Err(e) => {
                    tracing::error!(chain_id, batch = batch.len(), error = %e, "Multicall batch failed");
                    continue;
                }
            };

            for (address, chunk) in batch.iter().zip(results.chunks(CALLS_PER_TOKEN)) {
                if chunk.len() < CALLS_PER_TOKEN {
                    continue;
                }
                let raw = RawErc20 {
                    address: *address,
                    chain_id,
                    name: return_data(&chunk[0]),
                    symbol: return_data(&chunk[1]),
                    decimals: return_data(&chunk[2]),
                };
                match self.decoder.decode(&raw) {
                    Ok(metadata) => {
                        resolved.insert(*address, metadata);
                    }
                    Err(e) => tracing::debug!(chain_id, error = %e, "Token metadata unavailable"),
                }
            }
        }

        tracing::debug!(chain_id, requested = addresses.len(), resolved = resolved.len(), "On-chain lookup done");
        resolved
    }
}

/// Retry an async operation with exponential backoff.
/// Handles transient RPC errors (rate limits, network issues).
pub async fn retry_rpc<F, Fut, T, E>(mut f: F) -> eyre::Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = Duration::from_millis(500);
    let max_retries = 5;

    for attempt in 0..max_retries {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "RPC call failed, retrying..."
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }
        }
    }

    f().await.map_err(|e| eyre::eyre!("RPC call failed after {} retries: {}", max_retries, e))
}
