//! Configuration file loading

use super::schema::Config;
use crate::error::{PolicyError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        // Priority order:
        // 1. $RULEGATE_CONFIG
        // 2. $XDG_CONFIG_HOME/rulegate/rules.toml
        // 3. ~/.config/rulegate/rules.toml

        if let Ok(path) = env::var("RULEGATE_CONFIG") {
            return PathBuf::from(path);
        }

        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("rulegate/rules.toml");
        }

        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(".config/rulegate/rules.toml");
        }

        PathBuf::from("rules.toml")
    }

    /// Load config from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| PolicyError::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::load_from_str(&contents)
    }

    /// Parse config from TOML text
    pub fn load_from_str(contents: &str) -> Result<Config> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load config from the default path, falling back to an empty config
    pub fn load() -> Result<Config> {
        let path = Self::default_config_path();

        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Load config from an explicit path if given, otherwise as [`ConfigLoader::load`]
    pub fn load_or_default(path: Option<PathBuf>) -> Result<Config> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Self::load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::DefineProvider;
    use std::io::Write;

    const SAMPLE: &str = r#"
[defines.rules]
max_ip_entries = 16

[rules.ssh]
description = "SSH from the office"
allow_ips = ["10.0.0.0/24"]
time = "8 am - 6 pm"
days = "weekdays"

[rules.backup]
allow_ips = ["192.168.1.7"]

[rules.backup.schedule]
interval = 604800
scan_day = "sunday"
scan_time = "02:30"
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.rules.is_empty());
        assert!(config.defines.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE).unwrap();

        let names: Vec<&str> = config.rules.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, ["ssh", "backup"]);

        let ssh = &config.rules["ssh"];
        assert_eq!(ssh.time.as_deref(), Some("8 am - 6 pm"));
        assert!(ssh.deny_ips.is_empty());

        let schedule = config.rules["backup"].schedule.as_ref().unwrap();
        assert_eq!(schedule.interval, 604800);
        assert_eq!(schedule.scan_day.as_deref(), Some("sunday"));

        assert_eq!(
            config.defines.get_define_int("rules", "max_ip_entries", 1, 100).unwrap(),
            16
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::load_from_str(
            r#"
[rules.ssh]
allow = ["10.0.0.1"]
"#,
        );
        assert!(matches!(result, Err(PolicyError::ConfigParse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ConfigLoader::load_or_default(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.rules.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let result = ConfigLoader::load_from_file(&path);
        assert!(matches!(result, Err(PolicyError::ConfigLoad { .. })));
    }
}
