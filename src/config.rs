use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::interpreter::evaluator::{
    core::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_SUGGESTIONS},
    function::core::FunctionRegistry,
};

/// Failure to load an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}'", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Engine limits, loaded from TOML.
///
/// Every field has a default, so an empty file is a valid config.
///
/// ```toml
/// # Resolver hops an evaluation may take, nested evaluations included.
/// max_depth = 64
/// # "Did you mean" suggestions attached to an error.
/// max_suggestions = 3
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_depth:       usize,
    pub max_suggestions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_depth:       DEFAULT_MAX_DEPTH,
               max_suggestions: DEFAULT_MAX_SUGGESTIONS, }
    }
}

impl EngineConfig {
    /// Returns the default config file content with comments.
    #[must_use]
    pub const fn default_toml() -> &'static str {
        r"# computed-props engine configuration
#
# Resolver hops an evaluation may take, nested evaluations included.
max_depth = 64

# Number of 'did you mean' suggestions attached to an error.
max_suggestions = 3
"
    }

    /// Parses a config from TOML text.
    ///
    /// # Example
    /// ```
    /// use computed_props::config::EngineConfig;
    ///
    /// let config = EngineConfig::from_toml_str("max_depth = 8").unwrap();
    /// assert_eq!(config.max_depth, 8);
    /// assert_eq!(config.max_suggestions, 3);
    ///
    /// assert!(EngineConfig::from_toml_str("max_dept = 8").is_err());
    /// assert!(EngineConfig::from_toml_str("max_depth = 0").is_err());
    /// ```
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// [`ConfigError::Invalid`] for a zero `max_depth`.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    /// [`ConfigError::Io`] when the file cannot be read, otherwise the errors
    /// of [`EngineConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(),
                                                                                   source })?;
        Self::from_toml_str(&text)
    }

    /// Checks that the limits are usable.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] for a zero `max_depth`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// A registry of the builtin functions honoring `max_suggestions`.
    #[must_use]
    pub fn registry(&self) -> FunctionRegistry {
        FunctionRegistry::with_builtins().with_suggestion_limit(self.max_suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_matches_default_config() {
        let parsed = EngineConfig::from_toml_str(EngineConfig::default_toml()).unwrap();
        assert_eq!(parsed, EngineConfig::default());
    }

    #[test]
    fn empty_text_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn registry_uses_suggestion_limit() {
        let config = EngineConfig { max_suggestions: 1,
                                    ..EngineConfig::default() };
        let registry = config.registry();
        assert!(registry.suggest("C").len() <= 1);
        assert!(registry.contains("sum"));
    }
}
