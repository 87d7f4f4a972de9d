pub mod aggregate;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod generators;
pub mod icons;
pub mod lists;
pub mod onchain;
pub mod pipeline;
pub mod tokens;
