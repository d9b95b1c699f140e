use crossterm::event::KeyEvent;

use crate::model::theme::{BaseMode, ThemeCatalog, ThemeId};
use crate::sync::apply::{ApplyError, ApplyReport};
use crate::sync::catalog::CatalogError;
use crate::workflow::pull_request::{AttemptId, PullRequestResult};

/// Field edits, one variant per settings field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsCommand {
    SetRepository(String),
    SetAccount(String),
    SetToken(String),
    SetBaseUrl(String),
    SetBaseMode(BaseMode),
    SelectTheme(ThemeId),
}

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Settings
    Settings(SettingsCommand),
    CatalogLoaded(Result<ThemeCatalog, CatalogError>),

    // -- Apply theme
    ApplyTheme,
    ApplyFinished(Result<ApplyReport, ApplyError>),

    // -- Pull request workflow
    CreatePullRequest,
    PullRequestFinished {
        attempt: AttemptId,
        result: PullRequestResult,
    },

    // -- System
    Tick,
    Quit,
}
