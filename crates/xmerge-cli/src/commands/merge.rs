//! Merge command - apply setup and update templates to a workspace

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::info;
use xmerge_workspace::DirectoryMerger;

/// Arguments for the merge command.
pub struct MergeArgs {
    pub update: PathBuf,
    pub workspace: PathBuf,
    pub setup: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub defines: Vec<(String, String)>,
    pub fail_on_ambiguous: bool,
    pub legacy: bool,
}

/// Parse a `NAME=VALUE` variable definition.
pub fn parse_define(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid variable definition '{}', expected NAME=VALUE", value)),
    }
}

/// Execute the merge command.
///
/// Flags override the settings file and the environment. Fails when any
/// file could not be merged.
pub fn execute(args: MergeArgs) -> Result<()> {
    let mut settings = super::load_settings(args.config.as_deref())?;
    if args.fail_on_ambiguous {
        settings.fail_on_ambiguous_merge = true;
    }
    if args.legacy {
        settings.legacy_support = true;
    }

    let mut variables = settings.variables();
    variables.extend(args.defines);

    info!(
        update = %args.update.display(),
        workspace = %args.workspace.display(),
        "Merging templates"
    );
    let summary = DirectoryMerger::new(&settings).merge(
        args.setup.as_deref(),
        &args.update,
        &variables,
        &args.workspace,
    )?;

    if !summary.is_success() {
        bail!(
            "{} of {} files failed to merge",
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

    #[test]
    fn test_parse_define() {
        assert_eq!(
            parse_define("IDE_HOME=/projects/a=b").unwrap(),
            ("IDE_HOME".to_string(), "/projects/a=b".to_string())
        );
        assert_eq!(
            parse_define("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert!(parse_define("NOVALUE").is_err());
        assert!(parse_define("=value").is_err());
    }
}
