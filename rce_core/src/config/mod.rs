//! Configuration module for the contract engine
//!
//! Compile-time limits live in [`constants`]; user preferences that may change per
//! process live in [`runtime`] and are read from `RCE_*` environment variables or TOML.

pub mod constants;
pub mod runtime;

pub use constants::compile_time;
pub use runtime::{EngineConfig, LogLevel, LoggingPreferences, RuntimeConfig};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("RCE_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the crate version the engine was built from
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("rce_core {} ({} profile)", version(), profile())
    }
}
