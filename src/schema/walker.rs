//! Type hierarchy traversal
//!
//! Walks a type's base-type chain, most-derived first, invoking a visitor
//! per level. Binding execution order and inherited attribute/element
//! accumulation both depend on this direction.

use crate::namespaces::QName;

use super::components::TypeDef;
use super::index::SchemaIndex;

/// Visitor-driven traversal of a base-type chain
pub struct TypeWalker<'a> {
    index: &'a SchemaIndex,
}

impl<'a> TypeWalker<'a> {
    /// Create a walker resolving base types against the given index
    pub fn new(index: &'a SchemaIndex) -> Self {
        Self { index }
    }

    /// Visit `start` and then each base type in turn, most-derived first.
    ///
    /// The walk stops when the visitor returns `false`, at the hierarchy
    /// root (a type whose base is itself), or on any revisit.
    pub fn walk<F>(&self, start: &TypeDef, mut visitor: F)
    where
        F: FnMut(&TypeDef) -> bool,
    {
        let mut visited: Vec<QName> = start.name().cloned().into_iter().collect();
        let mut current = start.clone();
        loop {
            if !visitor(&current) {
                return;
            }
            let base_name = match current.base() {
                Some(name) => name.clone(),
                None => return,
            };
            if current.name() == Some(&base_name) || visited.contains(&base_name) {
                return;
            }
            match self.index.type_def(&base_name) {
                Some(base) => {
                    visited.push(base_name);
                    current = base;
                }
                None => return,
            }
        }
    }

    /// Collect the full chain, most-derived first
    pub fn chain(&self, start: &TypeDef) -> Vec<TypeDef> {
        let mut chain = Vec::new();
        self.walk(start, |def| {
            chain.push(def.clone());
            true
        });
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::index::{xs, SchemaSet};

    #[test]
    fn test_walk_most_derived_first() {
        let index = SchemaIndex::new(&SchemaSet::new());
        let start = index.type_def(&xs("short")).unwrap();

        let walker = TypeWalker::new(&index);
        let names: Vec<String> = walker
            .chain(&start)
            .iter()
            .map(|t| t.name().unwrap().local_name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["short", "int", "long", "integer", "decimal", "anySimpleType", "anyType"]
        );
    }

    #[test]
    fn test_walk_stops_on_false() {
        let index = SchemaIndex::new(&SchemaSet::new());
        let start = index.type_def(&xs("short")).unwrap();

        let walker = TypeWalker::new(&index);
        let mut seen = Vec::new();
        walker.walk(&start, |def| {
            seen.push(def.name().unwrap().local_name.clone());
            // stop once the integer level is reached
            def.name().unwrap().local_name != "integer"
        });
        assert_eq!(seen, vec!["short", "int", "long", "integer"]);
    }

    #[test]
    fn test_walk_terminates_at_self_referential_root() {
        let index = SchemaIndex::new(&SchemaSet::new());
        let any = index.type_def(&xs("anyType")).unwrap();

        let walker = TypeWalker::new(&index);
        assert_eq!(walker.chain(&any).len(), 1);
    }
}
