//! Typed configuration for Archimedes route introspection.
//!
//! This crate provides strongly-typed configuration with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//! - A bundled default router list used when no routers are registered
//!
//! # Example
//!
//! ```no_run
//! use archimedes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), archimedes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("introspection.toml")?
//!     .with_env_prefix("ARCHIMEDES")
//!     .load()?;
//!
//! println!("pattern cache limit: {}", config.introspection.pattern_cache_limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [introspection]
//! default_routers = ["handler-name", "path-pattern"]
//! pattern_cache_limit = 1024
//! suppress_probe_logging = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. For example:
//!
//! - `ARCHIMEDES__INTROSPECTION__DEFAULT_ROUTERS=handler-name,path-pattern`
//! - `ARCHIMEDES__INTROSPECTION__PATTERN_CACHE_LIMIT=2048`
//! - `ARCHIMEDES__INTROSPECTION__SUPPRESS_PROBE_LOGGING=false`

#![warn(missing_docs)]

mod config;
mod defaults;
mod error;
mod loader;
mod schema;

pub use config::ArchimedesConfig;
pub use defaults::bundled_default_routers;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::IntrospectionConfig;
