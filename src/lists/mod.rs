pub mod diff;
pub mod partition;
pub mod store;
