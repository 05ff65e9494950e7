//! Shared utilities: error taxonomy, configuration loading and resource management.

pub mod config;
pub mod error;
pub mod resources;

pub use config::Config;
