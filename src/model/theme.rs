use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::config::ThemesConfig;

/// Light/dark appearance variant, chosen independently of the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseMode {
    #[default]
    Dark,
    Light,
}

impl BaseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseMode::Dark => "dark",
            BaseMode::Light => "light",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BaseMode::Dark => "Dark",
            BaseMode::Light => "Light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BaseMode::Dark => BaseMode::Light,
            BaseMode::Light => BaseMode::Dark,
        }
    }
}

impl fmt::Display for BaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable key for a catalog theme. The source repository is unique per entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThemeId(pub String);

impl ThemeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

/// One row of the community theme list as published upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub repo: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub modes: Vec<String>,
}

/// A selectable appearance package with its derived stylesheet URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDescriptor {
    pub name: String,
    pub repo: String,
    pub branch: Option<String>,
    /// Modes as listed upstream. Unknown strings are kept and simply never match.
    pub modes: Vec<String>,
    pub css_url: String,
}

impl ThemeDescriptor {
    pub fn from_entry(entry: CatalogEntry, themes: &ThemesConfig) -> Self {
        let css_url = stylesheet_url(&entry.repo, entry.branch.as_deref(), themes);
        Self {
            name: entry.name,
            repo: entry.repo,
            branch: entry.branch,
            modes: entry.modes,
            css_url,
        }
    }

    pub fn id(&self) -> ThemeId {
        ThemeId::new(self.repo.clone())
    }

    pub fn supports(&self, mode: BaseMode) -> bool {
        self.modes.iter().any(|m| m == mode.as_str())
    }
}

/// `<raw-host>/<repo>/<branch|default>/<stylesheet-file>`
pub fn stylesheet_url(repo: &str, branch: Option<&str>, themes: &ThemesConfig) -> String {
    let branch = branch
        .filter(|b| !b.is_empty())
        .unwrap_or(themes.default_branch.as_str());
    format!(
        "{}/{}/{}/{}",
        themes.raw_base_url.trim_end_matches('/'),
        repo,
        branch,
        themes.stylesheet_file
    )
}

/// Lookup table from [`ThemeId`] to descriptor, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct ThemeCatalog {
    order: Vec<ThemeId>,
    themes: HashMap<ThemeId, ThemeDescriptor>,
}

impl ThemeCatalog {
    pub fn new(descriptors: impl IntoIterator<Item = ThemeDescriptor>) -> Self {
        let mut catalog = Self::default();
        for descriptor in descriptors {
            let id = descriptor.id();
            if catalog.themes.contains_key(&id) {
                tracing::debug!("duplicate catalog entry skipped: {}", id.0);
                continue;
            }
            catalog.order.push(id.clone());
            catalog.themes.insert(id, descriptor);
        }
        catalog
    }

    pub fn from_entries(entries: Vec<CatalogEntry>, themes: &ThemesConfig) -> Self {
        Self::new(
            entries
                .into_iter()
                .map(|entry| ThemeDescriptor::from_entry(entry, themes)),
        )
    }

    pub fn get(&self, id: &ThemeId) -> Option<&ThemeDescriptor> {
        self.themes.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn position(&self, id: &ThemeId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    /// Step through the catalog from `current`, wrapping at both ends.
    pub fn cycle(&self, current: Option<&ThemeId>, step: isize) -> Option<&ThemeDescriptor> {
        if self.order.is_empty() {
            return None;
        }

        let len = self.order.len() as isize;
        let next = match current.and_then(|id| self.position(id)) {
            Some(index) => (index as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };

        self.themes.get(&self.order[next as usize])
    }
}
