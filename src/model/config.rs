use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub github: GitHubConfig,
    pub themes: ThemesConfig,
    pub indicator: IndicatorConfig,
    pub pull_request: PullRequestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub settings_file: String,
    pub history_display_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    pub api_base_url: String,
    pub user_agent: String,
    /// Repository path of the key-value file the theme is written to.
    pub config_path: String,
    pub commit_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemesConfig {
    pub catalog_url: String,
    pub raw_base_url: String,
    pub stylesheet_file: String,
    pub default_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub interval_ms: u64,
    pub frames: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestConfig {
    #[serde(default)]
    pub command: Vec<String>,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user = match config_dir() {
            Some(dir) => {
                let path = dir.join("config.toml");
                if path.exists() {
                    Some(
                        fs::read_to_string(&path)
                            .with_context(|| format!("read {}", path.display()))?,
                    )
                } else {
                    None
                }
            }
            None => None,
        };

        Self::from_layers(DEFAULTS, user.as_deref())
    }

    /// Parse `defaults` and deep-merge `user` on top of it, table by table.
    pub fn from_layers(defaults: &str, user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(defaults).context("parse default config")?;
        if let Some(user) = user {
            let overlay: toml::Table = toml::from_str(user).context("parse user config")?;
            merge_tables(&mut merged, overlay);
        }

        let config: AppConfig = toml::Value::Table(merged)
            .try_into()
            .context("invalid configuration")?;

        if config.indicator.frames.is_empty() {
            return Err(anyhow!("indicator.frames must not be empty"));
        }
        if config.indicator.interval_ms == 0 {
            return Err(anyhow!("indicator.interval_ms must be positive"));
        }

        Ok(config)
    }

    pub fn defaults() -> Result<Self> {
        Self::from_layers(DEFAULTS, None)
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        let dir = config_dir().ok_or_else(|| anyhow!("cannot determine config directory"))?;
        Ok(dir.join(&self.general.settings_file))
    }

    pub fn indicator_interval(&self) -> Duration {
        Duration::from_millis(self.indicator.interval_ms)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gardensync").map(|d| d.config_dir().to_path_buf())
}

pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gardensync").map(|d| d.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let config = AppConfig::defaults().unwrap();
        assert_eq!(config.github.config_path, ".env");
        assert_eq!(config.github.commit_message, "Update theme");
        assert_eq!(config.indicator.interval_ms, 400);
        assert_eq!(config.indicator.frames.len(), 4);
        assert!(config.pull_request.command.is_empty());
    }

    #[test]
    fn user_layer_overrides_single_keys() {
        let user = r#"
[github]
api_base_url = "https://ghe.example.com/api/v3"

[pull_request]
command = ["garden-pr"]
"#;
        let config = AppConfig::from_layers(DEFAULTS, Some(user)).unwrap();
        assert_eq!(config.github.api_base_url, "https://ghe.example.com/api/v3");
        // untouched keys in the same table survive the merge
        assert_eq!(config.github.user_agent, "gardensync");
        assert_eq!(config.pull_request.command, vec!["garden-pr".to_string()]);
    }

    #[test]
    fn empty_frame_ring_is_rejected() {
        let user = "[indicator]\nframes = []\n";
        assert!(AppConfig::from_layers(DEFAULTS, Some(user)).is_err());
    }
}
