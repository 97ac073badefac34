//! Schema location resolution and cached loading
//!
//! [`SchemaLocator`] turns (namespace, location) pairs into parsed
//! schemas. Each location is parsed at most once per locator; concurrent
//! requests for the same location block on a compute-once cell instead of
//! racing on a hand-rolled double-checked lock.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};

use super::index::{Schema, SchemaSet};
use super::reader::read_schema;

/// Resolves a schema location to its XSD text
pub trait SchemaResolver: Send + Sync {
    /// Fetch the schema text for a (namespace, location) pair
    fn resolve(&self, namespace: Option<&str>, location: &str) -> Result<String>;
}

/// Resolves locations as paths relative to a base directory
#[derive(Debug)]
pub struct FileResolver {
    base_dir: PathBuf,
}

impl FileResolver {
    /// Create a resolver rooted at a directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl SchemaResolver for FileResolver {
    fn resolve(&self, _namespace: Option<&str>, location: &str) -> Result<String> {
        let path = self.base_dir.join(location);
        std::fs::read_to_string(&path).map_err(|e| {
            Error::Schema(format!("cannot read schema '{}': {}", path.display(), e))
        })
    }
}

/// Resolves locations from an in-memory table (tests, embedded schemas)
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    documents: HashMap<String, String>,
}

impl InMemoryResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register schema text under a location key
    pub fn add(mut self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(location.into(), text.into());
        self
    }
}

impl SchemaResolver for InMemoryResolver {
    fn resolve(&self, _namespace: Option<&str>, location: &str) -> Result<String> {
        self.documents
            .get(location)
            .cloned()
            .ok_or_else(|| Error::Schema(format!("no schema registered for '{}'", location)))
    }
}

/// Cached, override-aware schema loading
pub struct SchemaLocator {
    resolver: Box<dyn SchemaResolver>,
    /// Location redirects applied before resolution
    overrides: HashMap<String, String>,
    /// Compute-once cell per location
    cache: Mutex<HashMap<String, Arc<OnceCell<Arc<Schema>>>>>,
}

impl SchemaLocator {
    /// Create a locator over a resolver
    pub fn new(resolver: impl SchemaResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
            overrides: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Redirect a schema location to another before resolution
    pub fn add_override(
        &mut self,
        location: impl Into<String>,
        redirect: impl Into<String>,
    ) -> &mut Self {
        self.overrides.insert(location.into(), redirect.into());
        self
    }

    /// Load (or fetch from cache) the schema at a location.
    ///
    /// Include/import locations inside the document are not followed;
    /// use [`SchemaLocator::load_set`] for transitive loading.
    pub fn load(&self, namespace: Option<&str>, location: &str) -> Result<Arc<Schema>> {
        let location = self
            .overrides
            .get(location)
            .map(String::as_str)
            .unwrap_or(location);

        let cell = {
            let mut cache = self.cache.lock().expect("schema cache poisoned");
            Arc::clone(
                cache
                    .entry(location.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        cell.get_or_try_init(|| {
            tracing::debug!(location, "loading schema");
            let text = self.resolver.resolve(namespace, location)?;
            let doc = read_schema(&text)?;
            Ok(Arc::new(doc.schema))
        })
        .map(Arc::clone)
    }

    /// Load a root schema and everything it includes/imports, iteratively.
    ///
    /// Uses a worklist with a seen-set, so circular includes terminate.
    pub fn load_set(&self, root_location: &str) -> Result<SchemaSet> {
        let mut set = SchemaSet::new();
        let mut pending: VecDeque<String> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        pending.push_back(root_location.to_string());

        while let Some(location) = pending.pop_front() {
            let location = self
                .overrides
                .get(&location)
                .cloned()
                .unwrap_or(location);
            if !seen.insert(location.clone()) {
                continue;
            }

            let text = self.resolver.resolve(None, &location)?;
            let doc = read_schema(&text)?;
            for include in doc.includes {
                pending.push_back(include);
            }
            set.add_schema(doc.schema);
        }

        Ok(set)
    }
}

impl std::fmt::Debug for SchemaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaLocator")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}
