use alloy::primitives::{Address, Bytes, FixedBytes};
use alloy::sol;
use alloy::sol_types::SolCall;

// ERC-20 metadata getters. Legacy tokens (MKR, SAI) return bytes32 instead of string.
sol! {
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }

    interface IERC20Bytes32 {
        function name() external view returns (bytes32);
        function symbol() external view returns (bytes32);
    }
}

/// Token metadata as read from chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Metadata {
    pub address: Address,
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Return data of the three metadata calls for one token; `None` when the call failed.
#[derive(Debug, Clone, Default)]
pub struct RawErc20 {
    pub address: Address,
    pub chain_id: u64,
    pub name: Option<Bytes>,
    pub symbol: Option<Bytes>,
    pub decimals: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("no ERC-20 metadata could be decoded for {0}")]
    NoMetadata(Address),
}

/// Turns raw call results into typed metadata.
pub trait Erc20Decoder: Send + Sync {
    fn decode(&self, raw: &RawErc20) -> Result<Erc20Metadata, DecodeError>;
}

/// ABI decoder with the bytes32 fallback for name and symbol.
///
/// Fields that cannot be decoded are left empty (or zero); only a token with
/// no decodable field at all is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbiDecoder;

impl Erc20Decoder for AbiDecoder {
    fn decode(&self, raw: &RawErc20) -> Result<Erc20Metadata, DecodeError> {
        let name = raw
            .name
            .as_ref()
            .and_then(|data| decode_text::<IERC20Metadata::nameCall, IERC20Bytes32::nameCall>(data));
        let symbol = raw
            .symbol
            .as_ref()
            .and_then(|data| decode_text::<IERC20Metadata::symbolCall, IERC20Bytes32::symbolCall>(data));
        let decimals = raw
            .decimals
            .as_ref()
            .and_then(|data| IERC20Metadata::decimalsCall::abi_decode_returns(data).ok());

        if name.is_none() && symbol.is_none() && decimals.is_none() {
            return Err(DecodeError::NoMetadata(raw.address));
        }

        Ok(Erc20Metadata {
            address: raw.address,
            chain_id: raw.chain_id,
            name: name.unwrap_or_default(),
            symbol: symbol.unwrap_or_default(),
            decimals: decimals.map(u32::from).unwrap_or(0),
        })
    }
}

fn decode_text<S, B>(data: &[u8]) -> Option<String>
where
    S: SolCall<Return = String>,
    B: SolCall<Return = FixedBytes<32>>,
{
    if data.is_empty() {
        return None;
    }
    if let Ok(text) = S::abi_decode_returns(data) {
        return Some(text);
    }
    B::abi_decode_returns(data).ok().and_then(bytes32_to_string)
}

/// NUL-terminated bytes32 to string.
fn bytes32_to_string(word: FixedBytes<32>) -> Option<String> {
    let end = word.iter().position(|b| *b == 0).unwrap_or(32);
    String::from_utf8(word[..end].to_vec()).ok()
}
