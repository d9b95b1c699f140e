pub mod config;
pub mod history;
pub mod mode;
pub mod settings;
pub mod theme;
