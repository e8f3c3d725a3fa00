//! Command implementations for the xmerge CLI
//!
//! Each command module handles the CLI interface and delegates to
//! xmerge-workspace for the actual work.

use std::path::Path;

use anyhow::Result;
use xmerge_workspace::Settings;

pub mod check;
pub mod inverse;
pub mod merge;

/// Settings from the optional settings file, with environment overrides.
fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let mut settings = match config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply_env()?;
    Ok(settings)
}
