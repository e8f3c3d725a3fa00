//! Recursive merging of setup and update directories into a workspace.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;
use xmerge::{MergeReport, MergeVocabulary};

use crate::FileMerger;
use crate::fallback::FallbackMerger;
use crate::properties::PropertiesMerger;
use crate::settings::Settings;
use crate::variables::Variables;
use crate::xml::{XmlFileMerger, check_namespace};

/// File extensions handled by the XML merger.
const XML_EXTENSIONS: &[&str] = &["xml", "xmi", "launch"];

/// File extensions handled by the properties merger.
const PROPERTIES_EXTENSIONS: &[&str] = &["properties", "prefs"];

/// Totals of one directory merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Files a merger was run for.
    pub files: usize,

    /// Files whose merge failed.
    pub errors: usize,

    pub warnings: usize,
}

impl MergeSummary {
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    fn record(&mut self, result: &Result<MergeReport>) {
        self.files += 1;
        match result {
            Ok(report) => self.warnings += report.warnings.len(),
            Err(_) => self.errors += 1,
        }
    }

    fn record_inverse(&mut self, result: &Result<bool>) {
        self.files += 1;
        if result.is_err() {
            self.errors += 1;
        }
    }
}

/// Merges a setup tree and an update tree into a workspace tree, choosing
/// a file merger by extension.
#[derive(Debug, Clone, Default)]
pub struct DirectoryMerger {
    xml: XmlFileMerger,
    properties: PropertiesMerger,
    fallback: FallbackMerger,
}

impl DirectoryMerger {
    pub fn new(settings: &Settings) -> Self {
        Self {
            xml: XmlFileMerger::new(settings),
            properties: PropertiesMerger,
            fallback: FallbackMerger,
        }
    }

    pub fn merge(
        &self,
        setup: Option<&Path>,
        update: &Path,
        variables: &Variables,
        workspace: &Path,
    ) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();
        self.merge_into(setup, update, variables, workspace, &mut summary)?;
        tracing::info!(
            files = summary.files,
            errors = summary.errors,
            warnings = summary.warnings,
            workspace = %workspace.display(),
            "Merge finished"
        );
        Ok(summary)
    }

    fn merge_into(
        &self,
        setup: Option<&Path>,
        update: &Path,
        variables: &Variables,
        workspace: &Path,
        summary: &mut MergeSummary,
    ) -> Result<()> {
        if !setup.is_some_and(Path::is_dir) && !update.is_dir() {
            let merger = self.merger_for(workspace);
            let result = merger.merge(setup, update, variables, workspace);
            if let Err(err) = &result {
                tracing::error!(workspace = %workspace.display(), "{:#}", err);
            }
            summary.record(&result);
            return Ok(());
        }

        let mut children = BTreeSet::new();
        if let Some(setup) = setup {
            add_children(setup, &mut children)?;
        }
        add_children(update, &mut children)?;
        for name in children {
            let setup = setup.map(|setup| setup.join(&name));
            self.merge_into(
                setup.as_deref(),
                &update.join(&name),
                variables,
                &workspace.join(&name),
                summary,
            )?;
        }
        Ok(())
    }

    /// Write workspace changes back into the update tree.
    ///
    /// Walks the update tree; files without a workspace counterpart are
    /// skipped with a warning.
    pub fn inverse_merge(
        &self,
        workspace: &Path,
        variables: &Variables,
        add_new_properties: bool,
        update: &Path,
    ) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();
        self.inverse_merge_into(workspace, variables, add_new_properties, update, &mut summary)?;
        tracing::info!(
            files = summary.files,
            errors = summary.errors,
            update = %update.display(),
            "Inverse merge finished"
        );
        Ok(summary)
    }

    fn inverse_merge_into(
        &self,
        workspace: &Path,
        variables: &Variables,
        add_new_properties: bool,
        update: &Path,
        summary: &mut MergeSummary,
    ) -> Result<()> {
        if update.is_dir() {
            if !workspace.is_dir() {
                tracing::warn!(workspace = %workspace.display(), "Workspace is missing directory");
                return Ok(());
            }
            tracing::trace!(update = %update.display(), "Traversing directory");
            let mut children = BTreeSet::new();
            add_children(update, &mut children)?;
            for name in children {
                self.inverse_merge_into(
                    &workspace.join(&name),
                    variables,
                    add_new_properties,
                    &update.join(&name),
                    summary,
                )?;
            }
        } else if workspace.exists() {
            tracing::debug!(update = %update.display(), "Merging workspace changes back");
            let result = self
                .merger_for(workspace)
                .inverse_merge(workspace, variables, add_new_properties, update);
            if let Err(err) = &result {
                tracing::error!(update = %update.display(), "{:#}", err);
            }
            summary.record_inverse(&result);
        } else {
            tracing::warn!(workspace = %workspace.display(), "No such file or directory");
        }
        Ok(())
    }

    fn merger_for(&self, file: &Path) -> &dyn FileMerger {
        match file.extension().and_then(|e| e.to_str()) {
            Some(extension) if XML_EXTENSIONS.contains(&extension) => &self.xml,
            Some(extension) if PROPERTIES_EXTENSIONS.contains(&extension) => &self.properties,
            Some(extension) => {
                tracing::trace!(extension, "No structural merger for extension");
                &self.fallback
            }
            None => {
                tracing::debug!(file = %file.display(), "No extension");
                &self.fallback
            }
        }
    }
}

fn add_children(folder: &Path, children: &mut BTreeSet<OsString>) -> Result<()> {
    if !folder.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to list children of folder {}", folder.display()))?;
        children.insert(entry.file_name().to_os_string());
    }
    Ok(())
}

/// Run [`check_namespace`] on every XML file under `paths`.
///
/// Returns the files that lack the merge namespace.
pub fn find_outdated(paths: &[PathBuf], vocabulary: &MergeVocabulary) -> Result<Vec<PathBuf>> {
    let mut outdated = Vec::new();
    for path in paths {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            let is_xml = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| XML_EXTENSIONS.contains(&e));
            if entry.file_type().is_file() && is_xml && !check_namespace(entry.path(), vocabulary)? {
                outdated.push(entry.into_path());
            }
        }
    }
    Ok(outdated)
}
