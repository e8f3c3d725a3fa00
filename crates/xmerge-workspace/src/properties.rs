//! Merging of Java-style `.properties` and Eclipse `.prefs` files.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use xmerge::MergeReport;

use crate::FileMerger;
use crate::variables::Variables;

/// The key/value pairs of a properties file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: IndexMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `java.util.Properties` line format.
    ///
    /// Comment lines start with `#` or `!`. A key ends at the first unescaped
    /// `=`, `:` or whitespace, and a line ending in an unescaped backslash
    /// continues on the next line. Later keys replace earlier ones.
    pub fn parse(content: &str) -> Self {
        let mut properties = Self::new();
        let mut lines = content.lines();
        while let Some(line) = lines.next() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let mut logical = line.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }
            let (key, value) = split_entry(&logical);
            properties.set(unescape(key), unescape(value));
        }
        properties
    }

    pub fn load(path: &Path) -> Result<Self> {
        tracing::trace!(path = %path.display(), "Loading properties");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not load properties from file: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Write the properties sorted by key.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(path, self.to_sorted_string())
            .with_context(|| format!("Could not write properties to file: {}", path.display()))?;
        tracing::trace!(path = %path.display(), "Saved properties");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Define a key, keeping its position if it exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Add every entry of `other`, replacing existing values.
    pub fn extend_from(&mut self, other: &Properties) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// One `key=value` line per entry, sorted by key.
    pub fn to_sorted_string(&self) -> String {
        let mut entries: Vec<(&str, &str)> = self.iter().collect();
        entries.sort_unstable_by_key(|(key, _)| *key);
        let mut output = String::new();
        for (key, value) in entries {
            let _ = writeln!(output, "{}={}", escape(key, true), escape(value, false));
        }
        output
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split a logical line into its raw key and raw value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if matches!(c, '=' | ':') || c.is_whitespace() {
            key_end = index;
            break;
        }
    }
    let key = &line[..key_end];
    let rest = line[key_end..].trim_start();
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .map_or(rest, str::trim_start);
    (key, rest)
}

fn unescape(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => value.push('\t'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('f') => value.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => value.push(decoded),
                    None => {
                        value.push_str("\\u");
                        value.push_str(&hex);
                    }
                }
            }
            Some(other) => value.push(other),
            None => {}
        }
    }
    value
}

fn escape(text: &str, is_key: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for (index, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || index == 0 => escaped.push_str("\\ "),
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{c}' => escaped.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Merges properties files key by key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesMerger;

impl PropertiesMerger {
    fn resolve(properties: &Properties, variables: &Variables, source: &Path) -> Result<Properties> {
        let source = source.display().to_string();
        let mut resolved = Properties::new();
        for (key, value) in properties.iter() {
            resolved.set(key, variables.resolve(value, &source)?);
        }
        Ok(resolved)
    }
}

impl FileMerger for PropertiesMerger {
    /// Start from the workspace, or from the setup when the workspace is
    /// missing, and put every update entry on top.
    fn merge(
        &self,
        setup: Option<&Path>,
        update: &Path,
        variables: &Variables,
        workspace: &Path,
    ) -> Result<MergeReport> {
        let update_exists = update.exists();
        let mut properties = Properties::new();
        let mut template = None;
        if workspace.exists() {
            if !update_exists {
                tracing::trace!(update = %update.display(), "Nothing to do as update file does not exist");
                return Ok(MergeReport::default());
            }
            properties = Properties::load(workspace)?;
        } else if let Some(setup) = setup.filter(|setup| setup.exists()) {
            properties = Properties::load(setup)?;
            template = Some(setup);
        }
        if update_exists {
            properties.extend_from(&Properties::load(update)?);
            template = Some(update);
        }
        let Some(template) = template else {
            return Ok(MergeReport::default());
        };

        Self::resolve(&properties, variables, template)?.save(workspace)?;
        tracing::trace!(workspace = %workspace.display(), "Saved merged properties");
        Ok(MergeReport::default())
    }

    /// Copy workspace values that differ from the resolved update values back
    /// into the update, with variable values turned back into references.
    fn inverse_merge(
        &self,
        workspace: &Path,
        variables: &Variables,
        add_new_properties: bool,
        update: &Path,
    ) -> Result<bool> {
        if !workspace.exists() {
            tracing::trace!(workspace = %workspace.display(), "Workspace file does not exist");
            return Ok(false);
        }
        if !update.exists() {
            tracing::trace!(update = %update.display(), "Update file does not exist");
            return Ok(false);
        }
        let source = workspace
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let update_properties = Properties::load(update)?;
        let workspace_properties = Properties::load(workspace)?;

        let mut merged = update_properties.clone();
        let mut updated = false;
        for (key, workspace_value) in workspace_properties.iter() {
            let update_value = match update_properties.get(key) {
                Some(value) => Some(variables.resolve(value, &source)?),
                None if add_new_properties => None,
                None => continue,
            };
            if update_value.as_deref() != Some(workspace_value) {
                merged.set(key, variables.inverse_resolve(workspace_value, &source));
                updated = true;
            }
        }

        if updated {
            merged.save(update)?;
            tracing::debug!(workspace = %workspace.display(), update = %update.display(), "Saved changes");
        } else {
            tracing::trace!(update = %update.display(), "No changes");
        }
        Ok(updated)
    }
}
