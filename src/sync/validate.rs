use thiserror::Error;

use crate::model::theme::{BaseMode, ThemeDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("This theme doesn't support {mode} mode.")]
pub struct UnsupportedModeError {
    pub theme: String,
    pub mode: BaseMode,
}

/// Check the selected base mode against the theme's own mode list.
pub fn validate_selection(
    theme: &ThemeDescriptor,
    mode: BaseMode,
) -> Result<(), UnsupportedModeError> {
    if theme.supports(mode) {
        return Ok(());
    }

    Err(UnsupportedModeError {
        theme: theme.name.clone(),
        mode,
    })
}
