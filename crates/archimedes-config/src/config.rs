//! Main configuration type.
//!
//! This module provides the top-level [`ArchimedesConfig`] struct.

use serde::{Deserialize, Serialize};

use crate::IntrospectionConfig;

/// Complete Archimedes introspection configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use archimedes_config::ArchimedesConfig;
///
/// let config = ArchimedesConfig::default();
/// assert_eq!(config.introspection.pattern_cache_limit, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ArchimedesConfig {
    /// Route introspection configuration.
    #[serde(default)]
    pub introspection: IntrospectionConfig,
}

impl ArchimedesConfig {
    /// Creates a configuration with the given introspection section.
    #[must_use]
    pub fn with_introspection(introspection: IntrospectionConfig) -> Self {
        Self { introspection }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The pattern cache limit is zero
    /// - A configured default router kind is blank
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        self.introspection.validate()
    }
}
