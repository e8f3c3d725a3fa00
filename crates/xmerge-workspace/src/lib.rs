//! Applying configuration templates to a workspace.
//!
//! A workspace file is produced from up to three sources: a *setup* file
//! that seeds it once, an *update* file merged into it on every run, and the
//! workspace file itself. XML files are merged structurally with
//! [`xmerge`], properties files key by key; other files are copied.
//!
//! Both template sources may reference `${NAME}` variables, which are
//! resolved before merging. An inverse merge goes the other way and writes
//! changes made in the workspace back into the update templates.

use std::path::Path;

use xmerge::MergeReport;

pub mod directory;
pub mod fallback;
pub mod properties;
pub mod settings;
pub mod variables;
pub mod xml;

pub use directory::{DirectoryMerger, MergeSummary, find_outdated};
pub use fallback::FallbackMerger;
pub use properties::{Properties, PropertiesMerger};
pub use settings::{FAIL_ON_AMBIGUOUS_MERGE_ENV, LEGACY_SUPPORT_ENV, Settings, SettingsError};
pub use variables::{VariableError, Variables, inverse_resolve_document, resolve_document};
pub use xml::{XmlFileMerger, check_namespace};

/// Produces one workspace file from its setup and update files.
///
/// Any of the three files may be missing.
pub trait FileMerger {
    fn merge(
        &self,
        setup: Option<&Path>,
        update: &Path,
        variables: &Variables,
        workspace: &Path,
    ) -> anyhow::Result<MergeReport>;

    /// Write changes made in `workspace` back into `update`, turning
    /// variable values into `${NAME}` references again.
    ///
    /// Does nothing when either file is missing. `add_new_properties` lets
    /// key/value formats add keys the update does not have yet. Returns
    /// whether `update` was written.
    fn inverse_merge(
        &self,
        workspace: &Path,
        variables: &Variables,
        add_new_properties: bool,
        update: &Path,
    ) -> anyhow::Result<bool>;
}
