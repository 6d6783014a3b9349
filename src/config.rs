use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,
    #[serde(default = "default_times_to_show")]
    pub default_times_to_show: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kanadr")
        .to_string_lossy()
        .to_string()
}
fn default_advance_delay_ms() -> u64 {
    700
}
fn default_times_to_show() -> u32 {
    1
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            advance_delay_ms: default_advance_delay_ms(),
            default_times_to_show: default_times_to_show(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read a config file, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kanadr")
            .join("config.toml")
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Clamp hand-edited values back into usable ranges.
    pub fn validate(&mut self) {
        self.advance_delay_ms = self.advance_delay_ms.clamp(100, 5000);
        self.default_times_to_show = self.default_times_to_show.clamp(1, 10);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        if self.log_level.trim().is_empty() {
            self.log_level = default_log_level();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.advance_delay_ms, 700);
        assert_eq!(config.default_times_to_show, 1);
        assert_eq!(config.log_level, "warn");
        assert!(config.data_dir.contains("kanadr"));
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
advance_delay_ms = 1000
log_level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.advance_delay(), Duration::from_millis(1000));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.default_times_to_show, 1);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.data_dir, deserialized.data_dir);
        assert_eq!(config.advance_delay_ms, deserialized.advance_delay_ms);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.advance_delay_ms = 0;
        config.default_times_to_show = 99;
        config.data_dir = "  ".to_string();
        config.log_level = String::new();
        config.validate();

        assert_eq!(config.advance_delay_ms, 100);
        assert_eq!(config.default_times_to_show, 10);
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_save_then_load_validates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(Config::load_from(&path).unwrap().advance_delay_ms, 700);

        let mut config = Config::default();
        config.advance_delay_ms = 60_000;
        config.default_times_to_show = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.advance_delay_ms, 5000);
        assert_eq!(loaded.default_times_to_show, 3);
    }
}
