//! Configuration schema types.
//!
//! This module defines the structure of the configuration sections.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Route introspection configuration section.
///
/// # Example
///
/// ```
/// use archimedes_config::IntrospectionConfig;
///
/// let config = IntrospectionConfig {
///     default_routers: Some(vec!["path-pattern".to_string()]),
///     ..Default::default()
/// };
///
/// assert_eq!(config.pattern_cache_limit, 1024);
/// assert_eq!(config.default_router_kinds().unwrap(), vec!["path-pattern"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IntrospectionConfig {
    /// Router kinds to instantiate when no routers are registered.
    ///
    /// `None` uses the bundled list.
    #[serde(default)]
    pub default_routers: Option<Vec<String>>,

    /// Maximum number of parsed patterns cached per parsed-path router.
    #[serde(default = "default_pattern_cache_limit")]
    pub pattern_cache_limit: usize,

    /// Mark probe requests so routers skip their per-request mapping logs.
    #[serde(default = "default_true")]
    pub suppress_probe_logging: bool,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            default_routers: None,
            pattern_cache_limit: default_pattern_cache_limit(),
            suppress_probe_logging: true,
        }
    }
}

impl IntrospectionConfig {
    /// Returns the fallback router kinds, reading the bundled list if none are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefaults`] if the bundled list is unusable.
    pub fn default_router_kinds(&self) -> Result<Vec<String>, ConfigError> {
        match &self.default_routers {
            Some(kinds) => Ok(kinds.clone()),
            None => crate::bundled_default_routers(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.pattern_cache_limit == 0 {
            return Err(ConfigError::invalid_value(
                "introspection.pattern_cache_limit",
                "must be greater than zero",
            ));
        }

        if let Some(kinds) = &self.default_routers {
            if kinds.iter().any(|kind| kind.trim().is_empty()) {
                return Err(ConfigError::invalid_value(
                    "introspection.default_routers",
                    "router kinds must not be blank",
                ));
            }
        }

        Ok(())
    }
}

fn default_pattern_cache_limit() -> usize {
    1024
}

fn default_true() -> bool {
    true
}
