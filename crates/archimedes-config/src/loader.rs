//! Layered loading of [`ArchimedesConfig`].
//!
//! Layers apply in call order and each one replaces what came before:
//! built-in defaults, then a TOML or JSON document, then environment
//! overrides, which are applied last inside [`ConfigLoader::load`].

use std::env;
use std::fs;
use std::path::Path;

use crate::{ArchimedesConfig, ConfigError};

/// Document formats a configuration layer may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if name.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    fn of_path(path: &Path) -> Result<Self, ConfigError> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_name)
            .ok_or_else(|| ConfigError::unsupported_format(path.display().to_string()))
    }

    fn parse(self, content: &str) -> Result<ArchimedesConfig, ConfigError> {
        Ok(match self {
            Self::Toml => toml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
        })
    }
}

/// Builds an [`ArchimedesConfig`] from defaults, a document and the environment.
///
/// # Example
///
/// ```no_run
/// use archimedes_config::ConfigLoader;
///
/// # fn main() -> Result<(), archimedes_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("introspection.toml")?
///     .with_env_prefix("ARCHIMEDES")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: ArchimedesConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Starts from the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every layer applied so far.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ArchimedesConfig::default();
        self
    }

    /// Replaces the configuration with the contents of `path`.
    ///
    /// The format follows the extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or unreadable, if the extension names no
    /// supported format, or if the document does not deserialize. Unknown
    /// sections and keys are rejected.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::missing(path));
        }

        let format = Format::of_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::unreadable(path, source))?;
        self.config = format.parse(&content)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Fails if the file exists and cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the configuration with `content`, written in `format`
    /// (`"toml"` or `"json"`, any case).
    ///
    /// # Errors
    ///
    /// Fails on an unknown format name or a document that does not deserialize.
    ///
    /// # Example
    ///
    /// ```
    /// use archimedes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[introspection]\npattern_cache_limit = 256", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.introspection.pattern_cache_limit, 256);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let format = Format::from_name(format).ok_or_else(|| ConfigError::unsupported_format(format))?;
        self.config = format.parse(content)?;
        Ok(self)
    }

    /// Reads overrides from variables named `PREFIX__INTROSPECTION__KEY` when
    /// the configuration is loaded.
    ///
    /// Recognized keys are `DEFAULT_ROUTERS` (comma separated, empty clears),
    /// `PATTERN_CACHE_LIMIT` and `SUPPRESS_PROBE_LOGGING`. Other variables
    /// under the prefix are left for other components.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file into the process environment if there is one.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        self
    }

    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Fails if an override does not parse or a value breaks a rule, such as
    /// a zero pattern cache limit.
    pub fn load(mut self) -> Result<ArchimedesConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            for (var, value) in env::vars() {
                self.apply_override(&prefix, &var, &value)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the layered configuration as is, skipping environment
    /// overrides and validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ArchimedesConfig {
        self.config
    }

    fn apply_override(&mut self, prefix: &str, var: &str, value: &str) -> Result<(), ConfigError> {
        let Some(key) = var
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix("__INTROSPECTION__"))
        else {
            return Ok(());
        };

        let introspection = &mut self.config.introspection;
        match key {
            "DEFAULT_ROUTERS" => {
                let kinds: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|kind| !kind.is_empty())
                    .map(String::from)
                    .collect();
                introspection.default_routers = (!kinds.is_empty()).then_some(kinds);
            }
            "PATTERN_CACHE_LIMIT" => {
                introspection.pattern_cache_limit = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::env_override(var, "expected a non-negative integer"))?;
            }
            "SUPPRESS_PROBE_LOGGING" => {
                introspection.suppress_probe_logging =
                    flag(value).ok_or_else(|| ConfigError::env_override(var, "expected true or false"))?;
            }
            _ => tracing::debug!(var, "Ignoring unknown introspection override"),
        }
        Ok(())
    }
}

fn flag(value: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSE: [&str; 4] = ["false", "0", "no", "off"];

    let value = value.trim();
    if TRUE.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}
