use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "MODHEAD_CONFIG";
/// Environment variable overriding the storage file location
pub const STORAGE_ENV: &str = "MODHEAD_STORAGE";

const APP_DIR: &str = "modhead";

/// User configuration; every field is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Local storage file (pause flag, profiles, selection)
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    /// File the compiled override rules are installed to
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set (e.g. "info", "modhead_core=debug")
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    /// Loads the config from `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Loads the config from its default location
    pub fn load_default() -> Result<Self> {
        Self::load(get_config_path()?)
    }

    /// Storage file: MODHEAD_STORAGE, then the config value, then the data dir
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(STORAGE_ENV) {
            return Ok(PathBuf::from(path));
        }
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_data_dir()?.join("storage.json")),
        }
    }

    /// Rules file: the config value, or next to the default storage file
    pub fn rules_path(&self) -> Result<PathBuf> {
        match &self.rules_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_data_dir()?.join("rules.json")),
        }
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(config_dir.join(APP_DIR).join("config.yaml"))
}

/// Gets the directory holding storage and rules files
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("Failed to determine data directory")?;
    Ok(data_dir.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            "storage_path: /tmp/modhead/storage.json\nlog_level: debug\n",
        )
        .unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(
            loaded.storage_path,
            Some(PathBuf::from("/tmp/modhead/storage.json"))
        );
        assert_eq!(loaded.log_level.as_deref(), Some("debug"));
        assert_eq!(loaded.rules_path, None);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "log_level: [unterminated").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.yaml"));
    }

    #[test]
    fn test_rules_path_from_config() {
        let config = Config {
            rules_path: Some(PathBuf::from("/srv/rules.json")),
            ..Config::default()
        };
        assert_eq!(config.rules_path().unwrap(), PathBuf::from("/srv/rules.json"));
    }
}
