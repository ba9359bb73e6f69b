//! Container configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! ```toml
//! detect_cycles = true
//! collect_stats = false
//! ```

use crate::errors::{invalid_value, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_DETECT_CYCLES: &str = "IOC_DETECT_CYCLES";
pub const ENV_COLLECT_STATS: &str = "IOC_COLLECT_STATS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// Report a name that is requested again while still under construction
    /// as a cyclic dependency. When off, such graphs recurse without bound.
    pub detect_cycles: bool,
    /// Maintain the resolution counters behind [`Container::stats`](crate::Container::stats).
    pub collect_stats: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            collect_stats: true,
        }
    }
}

impl ContainerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Self::parse("<inline>", source)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let source =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead(label.clone(), e))?;
        Self::parse(&label, &source)
    }

    /// File (or defaults when `path` is `None`) with process environment overrides applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(std::env::vars())
    }

    /// Applies `IOC_*` overrides found in `vars`; other keys are ignored.
    pub fn apply_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                ENV_DETECT_CYCLES => self.detect_cycles = parse_bool(key, value)?,
                ENV_COLLECT_STATS => self.collect_stats = parse_bool(key, value)?,
                _ => {}
            }
        }
        Ok(self)
    }

    fn parse(label: &str, source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::TomlParse(label.to_string(), e))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_value(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::default();
        assert!(config.detect_cycles);
        assert!(config.collect_stats);
        assert_eq!(ContainerConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ContainerConfig::from_toml_str("collect_stats = false").unwrap();
        assert!(config.detect_cycles);
        assert!(!config.collect_stats);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = ContainerConfig::from_toml_str("detect_cycle = false").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(label, _) if label == "<inline>"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "detect_cycles = false").unwrap();

        let config = ContainerConfig::from_file(file.path()).unwrap();
        assert!(!config.detect_cycles);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            ContainerConfig::from_file(&missing),
            Err(ConfigError::FileRead(..))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = ContainerConfig::default()
            .apply_overrides([(ENV_DETECT_CYCLES, "off"), ("PATH", "/usr/bin"), (ENV_COLLECT_STATS, "0")])
            .unwrap();
        assert!(!config.detect_cycles);
        assert!(!config.collect_stats);

        let err = ContainerConfig::default()
            .apply_overrides([(ENV_DETECT_CYCLES, "sometimes")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
