//! Plain copying for files no structural merger understands.

use std::path::Path;

use anyhow::{Context, Result};
use xmerge::MergeReport;

use crate::FileMerger;
use crate::variables::Variables;

/// Copies the update over the workspace file, or seeds a missing workspace
/// file from the setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMerger;

impl FileMerger for FallbackMerger {
    fn merge(
        &self,
        setup: Option<&Path>,
        update: &Path,
        _variables: &Variables,
        workspace: &Path,
    ) -> Result<MergeReport> {
        let source = match setup {
            _ if update.exists() => update,
            Some(setup) if setup.exists() && !workspace.exists() => setup,
            _ => return Ok(MergeReport::default()),
        };
        if let Some(parent) = workspace.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::copy(source, workspace).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                workspace.display()
            )
        })?;
        tracing::debug!(from = %source.display(), to = %workspace.display(), "Copied file");
        Ok(MergeReport::default())
    }

    /// Unstructured files are never written back.
    fn inverse_merge(
        &self,
        workspace: &Path,
        _variables: &Variables,
        _add_new_properties: bool,
        _update: &Path,
    ) -> Result<bool> {
        tracing::trace!(workspace = %workspace.display(), "No inverse merge for file");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_update_overwrites_workspace() {
        let temp = TempDir::new().unwrap();
        let update = temp.path().join("update.txt");
        let workspace = temp.path().join("out/workspace.txt");
        fs::write(&update, "new").unwrap();
        FallbackMerger
            .merge(None, &update, &Variables::new(), &workspace)
            .unwrap();
        assert_eq!(fs::read_to_string(&workspace).unwrap(), "new");
    }

    #[test]
    fn test_setup_only_seeds_missing_workspace() {
        let temp = TempDir::new().unwrap();
        let setup = temp.path().join("setup.txt");
        let update = temp.path().join("update.txt");
        let workspace = temp.path().join("workspace.txt");
        fs::write(&setup, "seed").unwrap();

        FallbackMerger
            .merge(Some(setup.as_path()), &update, &Variables::new(), &workspace)
            .unwrap();
        assert_eq!(fs::read_to_string(&workspace).unwrap(), "seed");

        fs::write(&workspace, "edited").unwrap();
        FallbackMerger
            .merge(Some(setup.as_path()), &update, &Variables::new(), &workspace)
            .unwrap();
        assert_eq!(fs::read_to_string(&workspace).unwrap(), "edited");
    }

    #[test]
    fn test_inverse_merge_leaves_update_alone() {
        let temp = TempDir::new().unwrap();
        let update = temp.path().join("update.txt");
        let workspace = temp.path().join("workspace.txt");
        fs::write(&update, "template").unwrap();
        fs::write(&workspace, "edited").unwrap();
        let updated = FallbackMerger
            .inverse_merge(&workspace, &Variables::new(), true, &update)
            .unwrap();
        assert!(!updated);
        assert_eq!(fs::read_to_string(&update).unwrap(), "template");
    }
}
