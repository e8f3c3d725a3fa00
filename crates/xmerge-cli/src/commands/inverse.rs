//! Inverse command - write workspace edits back into the update templates

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::info;
use xmerge_workspace::DirectoryMerger;

/// Arguments for the inverse command.
pub struct InverseArgs {
    pub workspace: PathBuf,
    pub update: PathBuf,
    pub config: Option<PathBuf>,
    pub defines: Vec<(String, String)>,
    pub add_new_properties: bool,
}

/// Execute the inverse command.
///
/// Fails when any file could not be written back.
pub fn execute(args: InverseArgs) -> Result<()> {
    let settings = super::load_settings(args.config.as_deref())?;
    let mut variables = settings.variables();
    variables.extend(args.defines);

    info!(
        workspace = %args.workspace.display(),
        update = %args.update.display(),
        "Writing workspace changes back"
    );
    let summary = DirectoryMerger::new(&settings).inverse_merge(
        &args.workspace,
        &variables,
        args.add_new_properties,
        &args.update,
    )?;

    if !summary.is_success() {
        bail!(
            "{} of {} files failed to merge back",
            summary.errors,
            summary.files
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_execute_writes_properties_back() {
        let temp = TempDir::new().unwrap();
        let update = temp.path().join("update");
        let workspace = temp.path().join("workspace");
        fs::create_dir_all(&update).unwrap();
        fs::create_dir_all(&workspace).unwrap();
        fs::write(update.join("ide.properties"), "home=${IDE_HOME}\n").unwrap();
        fs::write(
            workspace.join("ide.properties"),
            "extra=1\nhome=/projects/main/tools\n",
        )
        .unwrap();

        execute(InverseArgs {
            workspace: workspace.clone(),
            update: update.clone(),
            config: None,
            defines: vec![("IDE_HOME".to_string(), "/projects/main".to_string())],
            add_new_properties: true,
        })
        .unwrap();

        assert_eq!(
            fs::read_to_string(update.join("ide.properties")).unwrap(),
            "extra=1\nhome=${IDE_HOME}/tools\n"
        );
    }
}
