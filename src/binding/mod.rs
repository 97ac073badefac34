//! Binding strategies and registration
//!
//! A binding converts between an XML Schema type and an in-memory value.
//! Bindings are stateless strategy objects registered by type name;
//! the chain a type's hierarchy produces is executed by an explicit fold
//! (see [`chain`]).

pub mod builtins;
pub mod chain;
pub mod context;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::instance::{BoundValue, ElementInstance, InstanceComponent, Node};
use crate::namespaces::QName;

pub use chain::BindingChain;
pub use context::ParseContext;

/// How a binding's output combines with the other bindings in a type's
/// hierarchy chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Runs before the ancestor chain
    Before,
    /// Runs after the ancestor chain, refining the value it produced
    After,
    /// Replaces the ancestor chain's result; only the most-derived
    /// OVERRIDE in a chain executes
    Override,
}

/// Binding for a simple (scalar text) type
pub trait SimpleBinding: Send + Sync {
    /// Qualified name of the type this binding handles
    fn target(&self) -> QName;

    /// Execution mode; simple bindings default to AFTER
    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::After
    }

    /// Produce a value from the component's text, optionally refining the
    /// value the ancestor chain produced
    fn parse(
        &self,
        component: &dyn InstanceComponent,
        value: Option<BoundValue>,
    ) -> Result<Option<BoundValue>>;
}

/// Binding for a complex (structured) type
pub trait ComplexBinding: Send + Sync {
    /// Qualified name of the type this binding handles
    fn target(&self) -> QName;

    /// Execution mode; complex bindings default to OVERRIDE
    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::Override
    }

    /// Called on element-start, after attributes are populated and before
    /// any child elements are read. Seeds the context the element's
    /// descendants will parse under.
    fn initialize(
        &self,
        _instance: &ElementInstance,
        _node: &Node,
        _context: &mut ParseContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Called on element-end with the element's bound children
    fn parse(
        &self,
        instance: &ElementInstance,
        node: &mut Node,
        value: Option<BoundValue>,
        context: &ParseContext,
    ) -> Result<Option<BoundValue>>;
}

/// A registered binding strategy, simple or complex
#[derive(Clone)]
pub enum Binding {
    /// Simple-type strategy
    Simple(Arc<dyn SimpleBinding>),
    /// Complex-type strategy
    Complex(Arc<dyn ComplexBinding>),
}

impl Binding {
    /// The type name this binding is registered for
    pub fn target(&self) -> QName {
        match self {
            Self::Simple(b) => b.target(),
            Self::Complex(b) => b.target(),
        }
    }

    /// The binding's execution mode
    pub fn execution_mode(&self) -> ExecutionMode {
        match self {
            Self::Simple(b) => b.execution_mode(),
            Self::Complex(b) => b.execution_mode(),
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple(b) => write!(f, "Simple({})", b.target()),
            Self::Complex(b) => write!(f, "Complex({})", b.target()),
        }
    }
}

/// Registry of binding strategies keyed by type name
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: IndexMap<QName, Binding>,
}

impl BindingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the XSD built-in simple-type
    /// bindings
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register(&mut registry);
        registry
    }

    /// Register a simple-type binding under its target type name
    pub fn register_simple(&mut self, binding: impl SimpleBinding + 'static) -> &mut Self {
        let binding: Arc<dyn SimpleBinding> = Arc::new(binding);
        self.bindings
            .insert(binding.target(), Binding::Simple(binding));
        self
    }

    /// Register a complex-type binding under its target type name
    pub fn register_complex(&mut self, binding: impl ComplexBinding + 'static) -> &mut Self {
        let binding: Arc<dyn ComplexBinding> = Arc::new(binding);
        self.bindings
            .insert(binding.target(), Binding::Complex(binding));
        self
    }

    /// Look up the binding registered for a type name
    pub fn get(&self, type_name: &QName) -> Option<&Binding> {
        if let Some(binding) = self.bindings.get(type_name) {
            return Some(binding);
        }
        self.bindings
            .iter()
            .find(|(registered, _)| registered.matches(type_name))
            .map(|(_, binding)| binding)
    }

    /// Number of registered bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::xs;

    struct StubBinding;

    impl SimpleBinding for StubBinding {
        fn target(&self) -> QName {
            xs("string")
        }

        fn parse(
            &self,
            component: &dyn InstanceComponent,
            _value: Option<BoundValue>,
        ) -> Result<Option<BoundValue>> {
            Ok(Some(Box::new(component.text().to_string())))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = BindingRegistry::new();
        registry.register_simple(StubBinding);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&xs("string")).is_some());
        assert!(registry.get(&xs("int")).is_none());
    }

    #[test]
    fn test_local_only_lookup() {
        let mut registry = BindingRegistry::new();
        registry.register_simple(StubBinding);
        assert!(registry.get(&QName::local("string")).is_some());
    }

    #[test]
    fn test_default_modes() {
        let mut registry = BindingRegistry::new();
        registry.register_simple(StubBinding);
        let binding = registry.get(&xs("string")).unwrap();
        assert_eq!(binding.execution_mode(), ExecutionMode::After);
    }
}
