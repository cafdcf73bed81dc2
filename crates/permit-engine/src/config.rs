//! Engine configuration

use serde::Deserialize;

use permit_core::{PermitError, Result};

/// Default location of the optional settings file, without extension
pub const DEFAULT_CONFIG_PATH: &str = "config/permit";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheSettings {
    /// Memoize decisions until the cache is reset
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Maximum number of cached decisions
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_capacity() -> u64 {
    10_000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_capacity: default_max_capacity(),
        }
    }
}

impl EngineSettings {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load settings from an optional file at `path` and `PERMIT__` environment variables
    pub fn load_from(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .set_default("cache.enabled", true)
            .map_err(config_error)?
            .set_default("cache.max_capacity", 10_000_i64)
            .map_err(config_error)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PERMIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?;

        config.try_deserialize().map_err(config_error)
    }
}

fn config_error(err: config::ConfigError) -> PermitError {
    PermitError::config_error(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.max_capacity, 10_000);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = EngineSettings::load_from("config/does-not-exist").unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("permit-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("permit.toml");
        std::fs::write(&file, "[cache]\nenabled = false\nmax_capacity = 250\n").unwrap();

        let path = dir.join("permit");
        let settings = EngineSettings::load_from(path.to_str().unwrap()).unwrap();
        assert!(!settings.cache.enabled);
        assert_eq!(settings.cache.max_capacity, 250);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = std::env::temp_dir().join(format!("permit-config-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("permit.toml"), "[cache]\nmax_capacity = \"lots\"\n").unwrap();

        let path = dir.join("permit");
        let result = EngineSettings::load_from(path.to_str().unwrap());
        assert!(matches!(result, Err(PermitError::Config { .. })));

        std::fs::remove_dir_all(&dir).ok();
    }
}
