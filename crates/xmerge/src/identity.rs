//! Identity rules and the structural queries they expand to.

use std::fmt;

use crate::node::MergeNode;

/// How a template element finds its counterpart in the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityRule {
    /// `@attr`: same tag with an equal attribute value.
    Attribute(String),

    /// `name()`: same namespace and local name.
    Name,

    /// `text()`: same tag with an equal text child.
    Text,

    /// Any other string, used verbatim as a relative query.
    Query(String),
}

impl IdentityRule {
    /// Parse a rule as written in a `merge:id` attribute.
    ///
    /// Returns `None` for an empty or blank rule.
    pub fn parse(rule: &str) -> Option<Self> {
        let rule = rule.trim();
        if rule.is_empty() {
            return None;
        }
        Some(match rule {
            "name()" => IdentityRule::Name,
            "text()" => IdentityRule::Text,
            _ => match rule.strip_prefix('@') {
                Some(name) if is_attribute_name(name) => IdentityRule::Attribute(name.to_string()),
                _ => IdentityRule::Query(rule.to_string()),
            },
        })
    }

    /// The query locating the counterpart of `node` below a target element.
    pub fn build_query(&self, node: &MergeNode<'_>) -> String {
        let tag = node.tag_name();
        match self {
            IdentityRule::Attribute(name) => {
                let value = node
                    .element()
                    .attribute_by_qualified_name(name)
                    .map(|a| a.value.as_str())
                    .unwrap_or_default();
                format!("{}[@{}={}]", tag, name, xpath_literal(value))
            }
            IdentityRule::Name => {
                let element = node.element();
                let mut query = format!(
                    "{}[local-name()={}",
                    tag,
                    xpath_literal(&element.local_name)
                );
                if let Some(namespace) = element.namespace.as_deref().filter(|ns| !ns.is_empty()) {
                    query.push_str(" and namespace-uri()=");
                    query.push_str(&xpath_literal(namespace));
                }
                query.push(']');
                query
            }
            IdentityRule::Text => {
                format!("{}[text()={}]", tag, xpath_literal(&node.text_content()))
            }
            IdentityRule::Query(query) => query.clone(),
        }
    }
}

impl fmt::Display for IdentityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityRule::Attribute(name) => write!(f, "@{}", name),
            IdentityRule::Name => f.write_str("name()"),
            IdentityRule::Text => f.write_str("text()"),
            IdentityRule::Query(query) => f.write_str(query),
        }
    }
}

/// `name` or `prefix:name` with XML name characters only.
fn is_attribute_name(name: &str) -> bool {
    let is_ncname = |part: &str| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    };
    match name.split_once(':') {
        Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
        None => is_ncname(name),
    }
}

/// Quote `value` as an XPath 1.0 string literal.
///
/// XPath 1.0 has no escape syntax, so a value containing both quote
/// characters is assembled with `concat`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
