//! Settings panel for a GitHub-hosted digital garden.
//!
//! The panel writes the site's theme selection into a key-value file in the
//! garden repository and runs the "update template" pull request workflow.

pub mod app;
pub mod model;
pub mod msg;
pub mod sync;
pub mod workflow;
