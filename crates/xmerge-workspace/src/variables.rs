//! `${NAME}` substitution in template files.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use xmerge_xml::{Document, NodeKind};

static VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Nesting depth at which resolution gives up.
const MAX_RECURSION: usize = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariableError {
    #[error("Reached maximum recursion resolving {value} for root variable {source_name} with value '{root}'")]
    RecursionLimit {
        value: String,
        source_name: String,
        root: String,
    },
}

/// Variables available to templates, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: IndexMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
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

    /// Replace every `${NAME}` in `value`, resolving variable values in turn.
    ///
    /// Undefined variables are left as written. `source` names where the
    /// value comes from in log messages.
    pub fn resolve(&self, value: &str, source: &str) -> Result<String, VariableError> {
        self.resolve_at(value, source, 0, value)
    }

    fn resolve_at(
        &self,
        value: &str,
        source: &str,
        depth: usize,
        root: &str,
    ) -> Result<String, VariableError> {
        if depth > MAX_RECURSION {
            return Err(VariableError::RecursionLimit {
                value: value.to_string(),
                source_name: source.to_string(),
                root: root.to_string(),
            });
        }
        let mut resolved = String::with_capacity(value.len());
        let mut last = 0;
        for captures in VARIABLE.captures_iter(value) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Some(replacement) = self.get(name.as_str()) else {
                tracing::warn!(
                    variable = name.as_str(),
                    source,
                    value,
                    "Undefined variable"
                );
                continue;
            };
            resolved.push_str(&value[last..whole.start()]);
            resolved.push_str(&self.resolve_at(replacement, name.as_str(), depth + 1, root)?);
            last = whole.end();
        }
        resolved.push_str(&value[last..]);
        Ok(resolved)
    }
}

impl Variables {
    /// Replace occurrences of variable values in `value` by `${NAME}`.
    ///
    /// Values are taken resolved. Longer values are replaced first, so the
    /// most specific variable wins; empty values and values that fail to
    /// resolve are skipped.
    pub fn inverse_resolve(&self, value: &str, source: &str) -> String {
        let mut candidates: Vec<(&str, String)> = self
            .iter()
            .filter_map(|(name, raw)| Some((name, self.resolve(raw, name).ok()?)))
            .filter(|(_, resolved)| !resolved.is_empty())
            .collect();
        candidates.sort_by(|(_, a), (_, b)| b.len().cmp(&a.len()));

        let mut result = value.to_string();
        for (name, resolved) in candidates {
            result = result.replace(&resolved, &format!("${{{}}}", name));
        }
        if result != value {
            tracing::trace!(value, resolved = %result, source, "Inverse resolved variables");
        }
        result
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Variables::new();
        variables.extend(iter);
        variables
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Variables {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

/// Resolve variables in every attribute value and every text or CDATA node.
pub fn resolve_document(document: &mut Document, variables: &Variables) -> Result<(), VariableError> {
    let origin = document.origin().to_string();
    for id in document.descendants(document.root()) {
        let resolved = match document.kind(id) {
            NodeKind::Element(element) => {
                let mut values = Vec::with_capacity(element.attributes.len());
                for attribute in &element.attributes {
                    values.push(variables.resolve(&attribute.value, &origin)?);
                }
                if let Some(element) = document.element_mut(id) {
                    for (attribute, value) in element.attributes.iter_mut().zip(values) {
                        attribute.value = value;
                    }
                }
                continue;
            }
            NodeKind::Text(text) | NodeKind::CData(text) => variables.resolve(text, &origin)?,
            _ => continue,
        };
        // textual node, checked above
        let _ = document.set_text(id, resolved);
    }
    Ok(())
}

/// Turn variable values back into `${NAME}` references in every attribute
/// value and every text or CDATA node.
pub fn inverse_resolve_document(document: &mut Document, variables: &Variables) {
    let origin = document.origin().to_string();
    for id in document.descendants(document.root()) {
        if let Some(element) = document.element_mut(id) {
            for attribute in element
                .attributes
                .iter_mut()
                .filter(|a| !a.is_namespace_declaration())
            {
                attribute.value = variables.inverse_resolve(&attribute.value, &origin);
            }
            continue;
        }
        let resolved = match document.kind(id) {
            NodeKind::Text(text) | NodeKind::CData(text) => variables.inverse_resolve(text, &origin),
            _ => continue,
        };
        let _ = document.set_text(id, resolved);
    }
}
