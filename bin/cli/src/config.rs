//! Configuration for the `zed-typegen` binary.
//!
//! Loaded via the `config` crate from environment variables prefixed with
//! `ZED_TYPEGEN_`, using `__` to separate nested keys, e.g.
//! `ZED_TYPEGEN_LOG__FILTER=debug`.

use serde::Deserialize;

/// Environment variable prefix for all settings.
pub const ENV_PREFIX: &str = "ZED_TYPEGEN";

/// Top-level tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TypegenConfig {
    /// Diagnostic logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Logging configuration.
///
/// Logs always go to stderr; stdout only carries the generated definitions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when neither `RUST_LOG` nor `-v` is given.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Whether to colorize log output.
    #[serde(default = "default_log_ansi")]
    pub ansi: bool,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_log_ansi() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            ansi: default_log_ansi(),
        }
    }
}

impl TypegenConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be deserialized.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_from(vars: &[(&str, &str)]) -> Result<TypegenConfig, config::ConfigError> {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        TypegenConfig::load(config::Environment::with_prefix(ENV_PREFIX).source(Some(source)))
    }

    #[test]
    fn log_config_has_correct_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.filter, "warn");
        assert!(config.ansi);
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load_from(&[]).expect("should load");
        assert_eq!(config, TypegenConfig::default());
    }

    #[test]
    fn nested_keys_are_read() {
        let config = load_from(&[
            ("ZED_TYPEGEN_LOG__FILTER", "zed_typegen_schema=debug"),
            ("ZED_TYPEGEN_LOG__ANSI", "false"),
        ])
        .expect("should load");
        assert_eq!(config.log.filter, "zed_typegen_schema=debug");
        assert!(!config.log.ansi);
    }

    #[test]
    fn unrelated_variables_are_ignored() {
        let config = load_from(&[("OTHER_LOG__FILTER", "trace")]).expect("should load");
        assert_eq!(config.log.filter, "warn");
    }

    #[test]
    fn invalid_value_is_an_error() {
        assert!(load_from(&[("ZED_TYPEGEN_LOG__ANSI", "sometimes")]).is_err());
    }
}
