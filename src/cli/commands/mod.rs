//! CLI command implementations

pub mod completions;
pub mod config;
pub mod rollup;
pub mod sim;
pub mod tree;
pub mod validate;
