//! Parse context
//!
//! A nested, element-scoped injection container. Each element derives a
//! child context from its parent before its children are parsed; bindings
//! that fire on descendants resolve collaborator objects (factories,
//! accumulators) out of it by type. A child context never outlives its
//! owning element.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Typed key-value injection container scoped to one element
#[derive(Clone, Default)]
pub struct ParseContext {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ParseContext {
    /// Create an empty root context
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a child context seeing every entry of this one.
    ///
    /// Entries added to the child are invisible to the parent; shared
    /// handles (`Arc`) still point at the same underlying objects.
    pub fn derive(&self) -> ParseContext {
        self.clone()
    }

    /// Register a value under its type
    pub fn put<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Register an already-shared handle under its type
    pub fn put_shared<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), value);
    }

    /// Look up the value registered under `T`
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// Whether a value is registered under `T`
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }
}
