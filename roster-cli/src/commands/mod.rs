//! CLI command implementations

pub mod serve;

pub use serve::ServeArgs;
