pub mod cache;
pub mod decoder;
pub mod enrich;
pub mod multicall;
