//! Settings file and environment overrides.
//!
//! ```toml
//! fail-on-ambiguous-merge = true
//! legacy-support = false
//! indent = 4
//!
//! [variables]
//! IDE_HOME = "/projects/demo"
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xmerge::{AmbiguityPolicy, MERGE_NAMESPACE, MergeOptions, MergeVocabulary};

use crate::variables::Variables;

/// Environment variable enabling the fail-fast ambiguity policy.
pub const FAIL_ON_AMBIGUOUS_MERGE_ENV: &str = "XMERGE_FAIL_ON_AMBIGUOUS_MERGE";

/// Environment variable enabling legacy template handling.
pub const LEGACY_SUPPORT_ENV: &str = "XMERGE_LEGACY_SUPPORT";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {name}, expected true or false")]
    InvalidFlag { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Abort a file merge when an identity query matches several elements.
    pub fail_on_ambiguous_merge: bool,

    /// Treat templates without the merge namespace as legacy templates.
    pub legacy_support: bool,

    pub merge_namespace: String,

    /// Spaces per level in written XML files.
    pub indent: usize,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fail_on_ambiguous_merge: false,
            legacy_support: false,
            merge_namespace: MERGE_NAMESPACE.to_string(),
            indent: 2,
            variables: IndexMap::new(),
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|source| SettingsError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps an environment variable
    /// name to its value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        if let Some(value) = lookup(FAIL_ON_AMBIGUOUS_MERGE_ENV) {
            self.fail_on_ambiguous_merge = parse_flag(FAIL_ON_AMBIGUOUS_MERGE_ENV, &value)?;
        }
        if let Some(value) = lookup(LEGACY_SUPPORT_ENV) {
            self.legacy_support = parse_flag(LEGACY_SUPPORT_ENV, &value)?;
        }
        Ok(())
    }

    pub fn variables(&self) -> Variables {
        self.variables.iter().collect()
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions::default()
            .with_ambiguity(AmbiguityPolicy::from_fail_fast(self.fail_on_ambiguous_merge))
            .with_vocabulary(MergeVocabulary::new(self.merge_namespace.clone()))
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(SettingsError::InvalidFlag {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
