//! Diagnostics collected during a merge run.

use std::fmt;

/// A non-fatal problem found while merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    pub message: String,

    /// Diagnostic path of the template element involved.
    pub template_path: String,

    /// Diagnostic path of the target element involved.
    pub target_path: String,

    /// The identity query, when the warning comes from matching.
    pub query: Option<String>,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for warnings of one merge run.
#[derive(Debug, Default)]
pub struct MergeContext {
    warnings: Vec<MergeWarning>,
}

impl MergeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn warn(&mut self, warning: MergeWarning) {
        tracing::warn!(
            template = %warning.template_path,
            target = %warning.target_path,
            "{}",
            warning.message
        );
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[MergeWarning] {
        &self.warnings
    }

    pub fn into_report(self) -> MergeReport {
        MergeReport {
            warnings: self.warnings,
        }
    }
}

/// Outcome of a successful merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub warnings: Vec<MergeWarning>,
}

impl MergeReport {
    /// Whether the run finished without warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
