//! Merging of XML configuration files.

use std::path::Path;

use anyhow::{Context, Result};
use xmerge::{
    MergeError, MergeOptions, MergeReport, MergeStrategy, MergeVocabulary, MergeWarning,
    merge_documents, merge_documents_with, strip_reserved,
};
use xmerge_xml::{Document, WriteOptions, parse, write_document};

use crate::FileMerger;
use crate::settings::{LEGACY_SUPPORT_ENV, Settings};
use crate::variables::{Variables, inverse_resolve_document, resolve_document};

/// Merges an XML template into an XML workspace file.
#[derive(Debug, Clone)]
pub struct XmlFileMerger {
    options: MergeOptions,
    legacy_support: bool,
    indent: usize,
}

impl XmlFileMerger {
    pub fn new(settings: &Settings) -> Self {
        Self {
            options: settings.merge_options(),
            legacy_support: settings.legacy_support,
            indent: settings.indent,
        }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Read and parse `path`, resolving variables when given.
    pub fn load(&self, path: &Path, variables: Option<&Variables>) -> Result<Document> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read XML from {}", path.display()))?;
        let mut document = parse(&content, &path.display().to_string())
            .with_context(|| format!("Failed to load XML from {}", path.display()))?;
        if let Some(variables) = variables {
            resolve_document(&mut document, variables)?;
        }
        Ok(document)
    }

    /// Strip merge markup and blank text, then write `document` indented.
    pub fn save(&self, document: &mut Document, path: &Path) -> Result<()> {
        let root = document.root();
        strip_reserved(document, root, &self.options.vocabulary)
            .with_context(|| format!("Failed to clean XML for {}", path.display()))?;
        document.remove_blank_text(root);
        let content = write_document(document, &WriteOptions::pretty(self.indent))
            .with_context(|| format!("Failed to serialize XML for {}", path.display()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to save XML to {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Saved XML");
        Ok(())
    }

    /// Merge `template` into `target`, handling templates written before
    /// merge markup existed.
    fn merge_template(
        &self,
        template: &Document,
        target: &mut Document,
        workspace_existed: bool,
    ) -> Result<MergeReport, MergeError> {
        let mut legacy_warning = None;
        let strategy = match template.document_element() {
            Some(root) if !declares_namespace(template, root, &self.options.vocabulary) => {
                if self.legacy_support {
                    // Existing workspaces take the template as is, fresh ones keep the setup.
                    Some(if workspace_existed {
                        MergeStrategy::Override
                    } else {
                        MergeStrategy::Keep
                    })
                } else {
                    legacy_warning = Some(MergeWarning {
                        message: format!(
                            "XML merge namespace not found in {}. If you are working in a legacy project, please set {}=true",
                            template.origin(),
                            LEGACY_SUPPORT_ENV
                        ),
                        template_path: root_path(template),
                        target_path: root_path(target),
                        query: None,
                    });
                    None
                }
            }
            _ => None,
        };

        let mut report = match strategy {
            Some(strategy) => {
                tracing::debug!(template = template.origin(), strategy = %strategy, "Merging legacy template");
                merge_documents_with(strategy, template, target, &self.options)?
            }
            None => merge_documents(template, target, &self.options)?,
        };
        if let Some(warning) = legacy_warning {
            tracing::warn!("{}", warning.message);
            report.warnings.insert(0, warning);
        }
        Ok(report)
    }
}

impl Default for XmlFileMerger {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl FileMerger for XmlFileMerger {
    fn merge(
        &self,
        setup: Option<&Path>,
        update: &Path,
        variables: &Variables,
        workspace: &Path,
    ) -> Result<MergeReport> {
        let workspace_exists = workspace.exists();
        let update_exists = update.exists();
        if workspace_exists && !update_exists {
            return Ok(MergeReport::default());
        }

        let seed = match setup {
            _ if workspace_exists => Some(self.load(workspace, None)?),
            Some(setup) if setup.exists() => Some(self.load(setup, Some(variables))?),
            _ => None,
        };

        let mut report = MergeReport::default();
        let mut document = match (seed, update_exists) {
            (None, false) => return Ok(report),
            (Some(seed), false) => seed,
            (None, true) => self.load(update, Some(variables))?,
            (Some(mut target), true) => {
                let template = self.load(update, Some(variables))?;
                match self.merge_template(&template, &mut target, workspace_exists) {
                    Ok(merged) => {
                        report = merged;
                        target
                    }
                    Err(err) => {
                        if matches!(err, MergeError::RootMismatch { .. }) && !workspace_exists {
                            self.save(&mut target, workspace)?;
                        }
                        return Err(err).with_context(|| {
                            format!(
                                "Failed to merge {} into {}",
                                update.display(),
                                workspace.display()
                            )
                        });
                    }
                }
            }
        };

        self.save(&mut document, workspace)?;
        Ok(report)
    }

    /// Override the update document with the workspace document.
    fn inverse_merge(
        &self,
        workspace: &Path,
        variables: &Variables,
        _add_new_properties: bool,
        update: &Path,
    ) -> Result<bool> {
        if !workspace.exists() || !update.exists() {
            return Ok(false);
        }
        let mut template = self.load(update, None)?;
        let changes = self.load(workspace, None)?;
        merge_documents_with(MergeStrategy::Override, &changes, &mut template, &self.options)
            .with_context(|| {
                format!(
                    "Failed to merge {} back into {}",
                    workspace.display(),
                    update.display()
                )
            })?;
        inverse_resolve_document(&mut template, variables);
        self.save(&mut template, update)?;
        tracing::debug!(workspace = %workspace.display(), update = %update.display(), "Saved changes");
        Ok(true)
    }
}

/// Whether the document element binds a prefix to the merge namespace.
fn declares_namespace(
    document: &Document,
    root: xmerge_xml::NodeId,
    vocabulary: &MergeVocabulary,
) -> bool {
    document.lookup_prefix(root, &vocabulary.namespace).is_some()
}

fn root_path(document: &Document) -> String {
    document
        .document_element()
        .and_then(|root| document.element(root))
        .map(|element| format!("/{}", element.tag_name()))
        .unwrap_or_else(|| "/".to_string())
}

/// Check that the XML file at `path` declares the merge namespace.
///
/// Returns `false` and logs a warning for files written before merge markup
/// existed.
pub fn check_namespace(path: &Path, vocabulary: &MergeVocabulary) -> Result<bool> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read XML from {}", path.display()))?;
    let document = parse(&content, &path.display().to_string())
        .with_context(|| format!("Failed to load XML from {}", path.display()))?;
    let declared = document
        .document_element()
        .is_some_and(|root| declares_namespace(&document, root, vocabulary));
    if !declared {
        tracing::warn!(
            "The XML file {} does not contain the XML merge namespace and seems outdated. \
             Consider declaring xmlns:merge=\"{}\"",
            path.display(),
            vocabulary.namespace
        );
    }
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const NS: &str = r#"xmlns:merge="https://github.com/devonfw/IDEasy/merge""#;

    struct Layout {
        _temp: TempDir,
        setup: std::path::PathBuf,
        update: std::path::PathBuf,
        workspace: std::path::PathBuf,
    }

    fn layout() -> Layout {
        let temp = TempDir::new().unwrap();
        let setup = temp.path().join("setup/settings.xml");
        let update = temp.path().join("update/settings.xml");
        let workspace = temp.path().join("workspace/settings.xml");
        Layout {
            _temp: temp,
            setup,
            update,
            workspace,
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn merger(legacy_support: bool) -> XmlFileMerger {
        XmlFileMerger::new(&Settings {
            legacy_support,
            ..Settings::default()
        })
    }

    fn variables() -> Variables {
        [("HOME", "/home/dev")].into_iter().collect()
    }

    #[test]
    fn test_update_seeds_missing_workspace() {
        let files = layout();
        write(
            &files.update,
            &format!(r#"<settings {NS}><path merge:strategy="keep">${{HOME}}</path></settings>"#),
        );
        merger(false)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap();
        assert_eq!(
            fs::read_to_string(&files.workspace).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<settings>\n  <path>/home/dev</path>\n</settings>\n"
        );
    }

    #[test]
    fn test_setup_then_update() {
        let files = layout();
        write(&files.setup, r#"<settings><entry id="a" v="1"/></settings>"#);
        write(
            &files.update,
            &format!(r#"<settings {NS}><entry id="a" w="2"/><entry id="b"/></settings>"#),
        );
        let report = merger(false)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(
            fs::read_to_string(&files.workspace).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<settings>\n  <entry id=\"a\" v=\"1\" w=\"2\"/>\n  <entry id=\"b\"/>\n</settings>\n"
        );
    }

    #[test]
    fn test_existing_workspace_without_update_is_untouched() {
        let files = layout();
        write(&files.setup, "<settings><a/></settings>");
        write(&files.workspace, "<settings>  <b/></settings>");
        merger(false)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap();
        assert_eq!(
            fs::read_to_string(&files.workspace).unwrap(),
            "<settings>  <b/></settings>"
        );
    }

    #[test]
    fn test_nothing_to_do() {
        let files = layout();
        merger(false)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap();
        assert!(!files.workspace.exists());
    }

    #[test]
    fn test_root_mismatch_still_writes_setup() {
        let files = layout();
        write(&files.setup, "<settings><a/></settings>");
        write(&files.update, &format!("<other {NS}/>"));
        let err = merger(false)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MergeError>(),
            Some(MergeError::RootMismatch { .. })
        ));
        assert!(
            fs::read_to_string(&files.workspace)
                .unwrap()
                .contains("<a/>")
        );
    }

    #[test]
    fn test_legacy_template_overrides_existing_workspace() {
        let files = layout();
        write(&files.workspace, r#"<settings><old/></settings>"#);
        write(&files.update, r#"<settings><new/></settings>"#);
        merger(true)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap();
        let output = fs::read_to_string(&files.workspace).unwrap();
        assert!(output.contains("<new/>"));
        assert!(!output.contains("<old/>"));
    }

    #[test]
    fn test_legacy_template_keeps_fresh_setup() {
        let files = layout();
        write(&files.setup, r#"<settings><old/></settings>"#);
        write(&files.update, r#"<settings><new/></settings>"#);
        merger(true)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap();
        let output = fs::read_to_string(&files.workspace).unwrap();
        assert!(output.contains("<old/>"));
        assert!(!output.contains("<new/>"));
    }

    #[test]
    fn test_legacy_template_without_support_warns() {
        let files = layout();
        write(&files.workspace, r#"<settings><old/></settings>"#);
        write(&files.update, r#"<settings><new/></settings>"#);
        let report = merger(false)
            .merge(Some(files.setup.as_path()), &files.update, &variables(), &files.workspace)
            .unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains(LEGACY_SUPPORT_ENV));
        let output = fs::read_to_string(&files.workspace).unwrap();
        assert!(output.contains("<old/>"));
        assert!(output.contains("<new/>"));
    }

    #[test]
    fn test_inverse_merge_writes_workspace_back() {
        let files = layout();
        write(
            &files.update,
            &format!(r#"<settings {NS}><path merge:id="name()">${{HOME}}/old</path></settings>"#),
        );
        write(
            &files.workspace,
            r#"<settings><path>/home/dev/new</path><added/></settings>"#,
        );
        let updated = merger(false)
            .inverse_merge(&files.workspace, &variables(), false, &files.update)
            .unwrap();
        assert!(updated);
        assert_eq!(
            fs::read_to_string(&files.update).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<settings>\n  <path>${HOME}/new</path>\n  <added/>\n</settings>\n"
        );
    }

    #[test]
    fn test_inverse_merge_needs_both_files() {
        let files = layout();
        write(&files.workspace, "<settings/>");
        let updated = merger(false)
            .inverse_merge(&files.workspace, &variables(), false, &files.update)
            .unwrap();
        assert!(!updated);
        assert!(!files.update.exists());
    }

    #[test]
    fn test_inverse_merge_root_mismatch() {
        let files = layout();
        write(&files.update, "<settings/>");
        write(&files.workspace, "<other/>");
        let err = merger(false)
            .inverse_merge(&files.workspace, &variables(), false, &files.update)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MergeError>(),
            Some(MergeError::RootMismatch { .. })
        ));
        assert_eq!(fs::read_to_string(&files.update).unwrap(), "<settings/>");
    }

    #[test]
    fn test_check_namespace() {
        let temp = TempDir::new().unwrap();
        let current = temp.path().join("current.xml");
        let outdated = temp.path().join("outdated.xml");
        write(&current, &format!("<a {NS}/>"));
        write(&outdated, "<a/>");
        let vocabulary = MergeVocabulary::default();
        assert!(check_namespace(&current, &vocabulary).unwrap());
        assert!(!check_namespace(&outdated, &vocabulary).unwrap());
        assert!(check_namespace(&temp.path().join("missing.xml"), &vocabulary).is_err());
    }
}
