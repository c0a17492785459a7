use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for gitwrap
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Path to the git binary; `None` resolves it on PATH
    pub binary: Option<PathBuf>,
    /// Command timeout in seconds
    pub timeout_secs: u64,
    /// Environment variables overlaid on every command
    pub env: HashMap<String, String>,
    /// Stream subprocess output to stdout/stderr in real time
    pub stream_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            binary: None,
            timeout_secs: 60,
            env: HashMap::new(),
            stream_output: false,
        }
    }
}

impl Config {
    /// Get the default configuration file path
    /// Returns ~/.config/gitwrap/config.yaml on Unix-like systems
    /// Returns %APPDATA%\gitwrap\config.yaml on Windows
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("gitwrap");

        Ok(config_dir.join("config.yaml"))
    }

    /// Load configuration from a YAML file
    /// If the file doesn't exist, returns the default configuration
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from_file(path)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to_file(path)
    }

    /// Create a new default configuration file at the default path
    /// Only creates the file if it doesn't already exist
    pub fn init_default() -> Result<PathBuf> {
        let path = Self::default_path()?;

        if path.exists() {
            return Ok(path);
        }

        let config = Config::default();
        config.save_to_file(&path)?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.binary.is_none());
        assert_eq!(config.timeout_secs, 60);
        assert!(config.env.is_empty());
        assert!(!config.stream_output);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let original = Config::default();
        original.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_custom_binary_and_timeout() {
        let mut config = Config::default();
        config.binary = Some(PathBuf::from("/opt/git/bin/git"));
        config.timeout_secs = 120;

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        config.save_to_file(&config_path).unwrap();
        let loaded = Config::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.binary, Some(PathBuf::from("/opt/git/bin/git")));
        assert_eq!(loaded.timeout_secs, 120);
    }

    #[test]
    fn test_custom_env_vars() {
        let mut config = Config::default();
        config
            .env
            .insert("GIT_TERMINAL_PROMPT".to_string(), "0".to_string());

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        config.save_to_file(&config_path).unwrap();
        let loaded = Config::load_from_file(&config_path).unwrap();

        assert_eq!(
            loaded.env.get("GIT_TERMINAL_PROMPT"),
            Some(&"0".to_string())
        );
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "timeout_secs: [not a number]").unwrap();

        assert!(Config::load_from_file(&config_path).is_err());
    }
}
