pub mod merge;
pub mod popularity;
