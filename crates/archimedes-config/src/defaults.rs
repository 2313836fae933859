//! The bundled default router list.
//!
//! When no routers are registered, the introspector instantiates the router
//! kinds listed in `resources/default-routers.toml`, which is compiled into the
//! crate.

use serde::Deserialize;

use crate::ConfigError;

const BUNDLED_DEFAULT_ROUTERS: &str = include_str!("../resources/default-routers.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefaultRoutersFile {
    routers: Vec<String>,
}

/// Returns the bundled default router kinds, in instantiation order.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDefaults`] if the bundled file does not parse
/// or lists no routers.
///
/// # Example
///
/// ```
/// let kinds = archimedes_config::bundled_default_routers().unwrap();
/// assert_eq!(kinds, vec!["handler-name", "path-pattern"]);
/// ```
pub fn bundled_default_routers() -> Result<Vec<String>, ConfigError> {
    parse_default_routers(BUNDLED_DEFAULT_ROUTERS)
}

fn parse_default_routers(content: &str) -> Result<Vec<String>, ConfigError> {
    let file: DefaultRoutersFile =
        toml::from_str(content).map_err(|e| ConfigError::invalid_defaults(e.to_string()))?;

    if file.routers.is_empty() {
        return Err(ConfigError::invalid_defaults("router list is empty"));
    }
    if file.routers.iter().any(|kind| kind.trim().is_empty()) {
        return Err(ConfigError::invalid_defaults("router kinds must not be blank"));
    }

    Ok(file.routers)
}
