//! Configuration file (.taprc) parsing and handling
//!
//! The .taprc file uses INI format with a [DEFAULT] section. Every option
//! is optional; a missing file means the defaults.

use crate::error::{Error, Result};
use regex::Regex;
use serde::de::value::{self, MapDeserializer};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the base directory
pub const CONFIG_FILE: &str = ".taprc";

const DEFAULT_TEST_DIR: &str = "t";
const DEFAULT_TEST_PATTERN: &str = r"\.t$";

/// Configuration loaded from .taprc
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaprConfig {
    /// Directory searched when no test files are given
    pub test_dir: String,

    /// Regular expression matched against file names during discovery
    pub test_pattern: String,

    /// File the `run` command appends its TAP stream to, besides stdout
    #[serde(deserialize_with = "non_empty")]
    pub tap_log: Option<String>,
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let path = String::deserialize(deserializer)?;
    Ok(Some(path).filter(|p| !p.is_empty()))
}

impl Default for TaprConfig {
    fn default() -> Self {
        TaprConfig {
            test_dir: DEFAULT_TEST_DIR.to_string(),
            test_pattern: DEFAULT_TEST_PATTERN.to_string(),
            tap_log: None,
        }
    }
}

impl TaprConfig {
    /// Load .taprc from `dir`, falling back to the defaults when absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::load_from_file(&path)
    }

    /// Load configuration from a .taprc file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read .taprc: {}", e)))?;

        Self::parse(&contents)
    }

    /// Parse configuration from a string
    pub fn parse(contents: &str) -> Result<Self> {
        let ini: HashMap<String, HashMap<String, String>> = serde_ini::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse .taprc: {}", e)))?;

        let Some(default) = ini.get("DEFAULT") else {
            return Err(Error::Config("No [DEFAULT] section in .taprc".to_string()));
        };

        let entries = MapDeserializer::<_, value::Error>::new(default.clone().into_iter());
        let config = TaprConfig::deserialize(entries)
            .map_err(|e| Error::Config(format!("Invalid .taprc: {}", e)))?;

        if config.test_dir.is_empty() {
            return Err(Error::Config("test_dir cannot be empty".to_string()));
        }

        // Reject a bad pattern now rather than at discovery time
        config.test_regex()?;

        Ok(config)
    }

    /// The compiled `test_pattern`
    pub fn test_regex(&self) -> Result<Regex> {
        Regex::new(&self.test_pattern)
            .map_err(|e| Error::Config(format!("Invalid test_pattern: {}", e)))
    }

    /// `tap_log` resolved against `base`
    pub fn tap_log_path(&self, base: &Path) -> Option<PathBuf> {
        self.tap_log.as_ref().map(|log| base.join(log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_basic_config() {
        let config_str = r#"
[DEFAULT]
test_dir=tests/tap
"#;

        let config = TaprConfig::parse(config_str).unwrap();
        assert_eq!(config.test_dir, "tests/tap");
        assert_eq!(config.test_pattern, r"\.t$");
        assert!(config.tap_log.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[DEFAULT]
test_dir=t
test_pattern=_test\.tap$
tap_log=results.tap
"#;

        let config = TaprConfig::parse(config_str).unwrap();
        assert_eq!(config.test_pattern, r"_test\.tap$");
        assert_eq!(config.tap_log, Some("results.tap".to_string()));
        assert_eq!(
            config.tap_log_path(Path::new("/work")),
            Some(PathBuf::from("/work/results.tap"))
        );
        assert!(config.test_regex().unwrap().is_match("parser_test.tap"));
    }

    #[test]
    fn test_parse_missing_default_section() {
        let config_str = r#"
[other]
test_dir=t
"#;

        let result = TaprConfig::parse(config_str);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No [DEFAULT] section"));
    }

    #[test]
    fn test_parse_unknown_option() {
        let config_str = r#"
[DEFAULT]
test_dirs=t
"#;

        let result = TaprConfig::parse(config_str);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_empty_tap_log() {
        let config = TaprConfig::parse("[DEFAULT]\ntap_log=\n").unwrap();
        assert!(config.tap_log.is_none());
    }

    #[test]
    fn test_parse_invalid_pattern() {
        let config_str = r#"
[DEFAULT]
test_pattern=([
"#;

        let result = TaprConfig::parse(config_str);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = TaprConfig::load(temp.path()).unwrap();
        assert_eq!(config.test_dir, "t");
        assert!(config.tap_log.is_none());
    }

    #[test]
    fn test_load_from_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[DEFAULT]\ntest_dir=checks\n").unwrap();
        let config = TaprConfig::load(temp.path()).unwrap();
        assert_eq!(config.test_dir, "checks");
    }
}
