//! Errors raised while assembling the introspection configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration layer could not be applied.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The named configuration file does not exist.
    #[error("configuration file {} does not exist", path.display())]
    Missing {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read configuration file {}", path.display())]
    Unreadable {
        /// Path that was read.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A TOML layer did not deserialize.
    #[error("malformed TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON layer did not deserialize.
    #[error("malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format `{format}`")]
    UnsupportedFormat {
        /// The format name or file extension that was given.
        format: String,
    },

    /// The default router list shipped with the crate is unusable.
    #[error("bundled default router list rejected: {reason}")]
    InvalidDefaults {
        /// What is wrong with the bundled list.
        reason: String,
    },

    /// A loaded value breaks a configuration rule.
    #[error("`{field}` {reason}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: String,
        /// The rule that was broken.
        reason: String,
    },

    /// An environment override could not be applied.
    #[error("environment override {var} rejected: {reason}")]
    EnvOverride {
        /// Name of the variable.
        var: String,
        /// What was expected instead.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub(crate) fn invalid_defaults(reason: impl Into<String>) -> Self {
        Self::InvalidDefaults {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error comes from a file that could not be
    /// found or read, as opposed to content that was rejected.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Missing { .. } | Self::Unreadable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_names_path() {
        let err = ConfigError::missing("/etc/archimedes/introspection.toml");
        assert_eq!(
            err.to_string(),
            "configuration file /etc/archimedes/introspection.toml does not exist"
        );
        assert!(err.is_io());
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigError::invalid_value("introspection.pattern_cache_limit", "must be greater than zero");
        assert_eq!(err.to_string(), "`introspection.pattern_cache_limit` must be greater than zero");
        assert!(!err.is_io());
    }

    #[test]
    fn test_env_override_message() {
        let err = ConfigError::env_override("ARCHIMEDES__INTROSPECTION__PATTERN_CACHE_LIMIT", "expected integer");
        let message = err.to_string();
        assert!(message.contains("ARCHIMEDES__INTROSPECTION__PATTERN_CACHE_LIMIT"));
        assert!(message.ends_with("expected integer"));
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = ConfigError::unsupported_format("yaml");
        assert_eq!(err.to_string(), "unsupported configuration format `yaml`");
    }

    #[test]
    fn test_invalid_defaults_message() {
        let err = ConfigError::invalid_defaults("router list is empty");
        assert!(err.to_string().starts_with("bundled default router list rejected"));
    }
}
