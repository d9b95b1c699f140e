/// Panel interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Normal mode: row navigation and actions.
    #[default]
    Normal,
    /// Editing a text field in place.
    Editing,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Editing => "EDIT",
        }
    }
}
