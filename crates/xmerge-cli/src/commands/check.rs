//! Check command - find templates and workspaces without merge markup

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;
use xmerge_workspace::find_outdated;

/// Execute the check command.
///
/// Every outdated file is printed on its own line.
pub fn execute(paths: &[PathBuf], config: Option<&Path>) -> Result<()> {
    let settings = super::load_settings(config)?;
    let vocabulary = settings.merge_options().vocabulary;
    let outdated = find_outdated(paths, &vocabulary)?;
    for path in &outdated {
        println!("{}", path.display());
    }
    info!(outdated = outdated.len(), "Check finished");
    Ok(())
}
