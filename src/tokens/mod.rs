pub mod registry;
pub mod types;
pub mod validate;
