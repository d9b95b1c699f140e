use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::history::PullRequestHistory;
use crate::model::theme::{BaseMode, ThemeDescriptor};

/// Persisted panel settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github_repo: String,
    pub github_user_name: String,
    pub github_token: String,
    pub garden_base_url: String,
    pub base_theme: BaseMode,
    pub theme: Option<ThemeDescriptor>,
    pub pull_request_history: PullRequestHistory,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("github_repo", &self.github_repo)
            .field("github_user_name", &self.github_user_name)
            .field("github_token", &redacted(&self.github_token))
            .field("garden_base_url", &self.garden_base_url)
            .field("base_theme", &self.base_theme)
            .field("theme", &self.theme.as_ref().map(|t| &t.name))
            .field("pull_request_history", &self.pull_request_history.len())
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON file backing [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file yields defaults.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(settings).map_err(|source| {
            SettingsError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

/// Owner of the live [`Settings`]. Every field has one setter; nothing is
/// written to disk until [`SettingsContext::persist`] is called.
#[derive(Debug)]
pub struct SettingsContext {
    settings: Settings,
    store: SettingsStore,
}

impl SettingsContext {
    pub fn new(settings: Settings, store: SettingsStore) -> Self {
        Self { settings, store }
    }

    pub fn open(store: SettingsStore) -> Result<Self, SettingsError> {
        let settings = store.load()?;
        Ok(Self::new(settings, store))
    }

    /// Like [`SettingsContext::open`], but an unreadable file never blocks
    /// startup. The panel starts from defaults and the load error is handed
    /// back for display. A file that failed to parse is moved aside to
    /// `<name>.json.bak` so the next save does not destroy it.
    pub fn open_or_default(store: SettingsStore) -> (Self, Option<SettingsError>) {
        match store.load() {
            Ok(settings) => (Self::new(settings, store), None),
            Err(err) => {
                tracing::warn!("{err}; starting from default settings");
                if matches!(err, SettingsError::Parse { .. }) {
                    let backup = store.path().with_extension("json.bak");
                    if let Err(rename) = fs::rename(store.path(), &backup) {
                        tracing::warn!("could not move {} aside: {rename}", store.path().display());
                    }
                }
                (Self::new(Settings::default(), store), Some(err))
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_repository(&mut self, value: String) {
        self.settings.github_repo = value;
    }

    pub fn set_account(&mut self, value: String) {
        self.settings.github_user_name = value;
    }

    pub fn set_token(&mut self, value: String) {
        self.settings.github_token = value;
    }

    pub fn set_base_url(&mut self, value: String) {
        self.settings.garden_base_url = value;
    }

    pub fn set_base_mode(&mut self, mode: BaseMode) {
        self.settings.base_theme = mode;
    }

    pub fn select_theme(&mut self, theme: ThemeDescriptor) {
        self.settings.theme = Some(theme);
    }

    pub fn history_mut(&mut self) -> &mut PullRequestHistory {
        &mut self.settings.pull_request_history
    }

    pub fn persist(&self) -> Result<(), SettingsError> {
        self.store.save(&self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = store.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.base_theme, BaseMode::Dark);
    }

    #[test]
    fn setters_only_reach_disk_on_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested/settings.json"));
        let mut ctx = SettingsContext::open(store.clone()).unwrap();

        ctx.set_repository("garden".to_string());
        ctx.set_account("octo".to_string());
        ctx.set_base_mode(BaseMode::Light);
        assert!(!store.path().exists());

        ctx.persist().unwrap();
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.github_repo, "garden");
        assert_eq!(reloaded.github_user_name, "octo");
        assert_eq!(reloaded.base_theme, BaseMode::Light);
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"github_repo": "garden", "base_theme": "light"}"#).unwrap();

        let settings = SettingsStore::new(&path).load().unwrap();
        assert_eq!(settings.github_repo, "garden");
        assert_eq!(settings.base_theme, BaseMode::Light);
        assert!(settings.theme.is_none());
        assert!(settings.pull_request_history.is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let err = SettingsStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        // persisted theme missing its stylesheet URL
        let stored = concat!(
            r#"{"github_repo": "garden", "#,
            r#""theme": {"name": "Sample", "repo": "o/sample"}}"#
        );
        fs::write(&path, stored).unwrap();

        let (ctx, err) = SettingsContext::open_or_default(SettingsStore::new(&path));
        assert!(matches!(err, Some(SettingsError::Parse { .. })));
        assert_eq!(ctx.settings(), &Settings::default());

        assert!(!path.exists());
        let backup = dir.path().join("settings.json.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), stored);

        ctx.persist().unwrap();
        assert_eq!(SettingsStore::new(&path).load().unwrap(), Settings::default());
    }

    #[test]
    fn readable_file_opens_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"github_user_name": "octo"}"#).unwrap();

        let (ctx, err) = SettingsContext::open_or_default(SettingsStore::new(&path));
        assert!(err.is_none());
        assert_eq!(ctx.settings().github_user_name, "octo");
    }

    #[test]
    fn debug_output_hides_token() {
        let settings = Settings {
            github_token: "ghp_secret".to_string(),
            ..Settings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
