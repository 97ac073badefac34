//! XML namespace handling
//!
//! This module provides qualified names (QNames), namespace prefix
//! mappings, and the name-matching rules used by schema lookups.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Namespace URI, treating the empty string as "no namespace"
    pub fn namespace_or_none(&self) -> Option<&str> {
        match self.namespace.as_deref() {
            Some("") | None => None,
            Some(ns) => Some(ns),
        }
    }

    /// Check whether this name matches a query name.
    ///
    /// A `None` namespace and an empty-string namespace are equivalent.
    /// When the query leaves the namespace unspecified, a local-name-only
    /// match is accepted.
    pub fn matches(&self, query: &QName) -> bool {
        if self.local_name != query.local_name {
            return false;
        }
        match (self.namespace_or_none(), query.namespace_or_none()) {
            (_, None) => true,
            (Some(a), Some(b)) => a == b,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => write!(f, "{{{}}}{}", ns, self.local_name),
            _ => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace context for resolving prefixes
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Resolve a prefixed name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }

    /// Resolve an element name against this context, falling back to the
    /// default namespace for unprefixed names
    pub fn resolve_element(&self, raw_name: &str) -> Result<QName> {
        self.resolve(raw_name)
    }

    /// Resolve an attribute name; unprefixed attributes are in no namespace
    pub fn resolve_attribute(&self, raw_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = raw_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::local(raw_name))
        }
    }
}

/// A stack of namespace scopes, one per open element.
///
/// Each element pushes a scope derived from its parent; prefix lookups
/// search innermost-out.
#[derive(Debug, Default)]
pub struct NamespaceStack {
    scopes: Vec<NamespaceContext>,
}

impl NamespaceStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a scope derived from the current innermost scope
    pub fn push(&mut self) {
        let derived = self.scopes.last().cloned().unwrap_or_default();
        self.scopes.push(derived);
    }

    /// Pop the innermost scope
    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// The innermost scope, if any element is open
    pub fn current(&self) -> Option<&NamespaceContext> {
        self.scopes.last()
    }

    /// The innermost scope for mutation (declaring xmlns attributes)
    pub fn current_mut(&mut self) -> Option<&mut NamespaceContext> {
        self.scopes.last_mut()
    }
}
