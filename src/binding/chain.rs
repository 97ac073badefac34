//! Binding chain resolution and execution
//!
//! A type's hierarchy yields an ordered chain of bindings, one per level
//! with a registered strategy, most-derived first. Execution is an
//! explicit fold over that chain: BEFORE bindings run root-ward first,
//! exactly one OVERRIDE (the most derived) replaces the running value,
//! and AFTER bindings layer on top in ancestor-to-descendant order.

use crate::error::Result;
use crate::instance::{AttributeInstance, BoundValue, ElementInstance, Node};
use crate::schema::{SchemaIndex, TypeDef, TypeWalker};

use super::{Binding, BindingRegistry, ExecutionMode, ParseContext};

/// The ordered bindings for one type's hierarchy, most-derived first
#[derive(Debug, Default)]
pub struct BindingChain {
    bindings: Vec<Binding>,
}

impl BindingChain {
    /// Resolve the chain for a type by walking its hierarchy and looking
    /// up a binding per level
    pub fn resolve(registry: &BindingRegistry, index: &SchemaIndex, type_def: &TypeDef) -> Self {
        let mut bindings = Vec::new();
        TypeWalker::new(index).walk(type_def, |def| {
            if let Some(name) = def.name() {
                if let Some(binding) = registry.get(name) {
                    bindings.push(binding.clone());
                }
            }
            true
        });
        Self { bindings }
    }

    /// Whether any binding was found for the hierarchy
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The chain members, most-derived first
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Run the initialize phase: every complex binding in the chain, in
    /// ancestor-to-descendant order, seeds the element's child context.
    pub fn initialize(
        &self,
        instance: &ElementInstance,
        node: &Node,
        context: &mut ParseContext,
    ) -> Result<()> {
        for binding in self.bindings.iter().rev() {
            if let Binding::Complex(complex) = binding {
                complex.initialize(instance, node, context)?;
            }
        }
        Ok(())
    }

    /// Run the parse phase for an element, folding the value through the
    /// chain according to each binding's execution mode
    pub fn parse_element(
        &self,
        instance: &ElementInstance,
        node: &mut Node,
        context: &ParseContext,
    ) -> Result<Option<BoundValue>> {
        self.fold(|binding, value| match binding {
            Binding::Simple(simple) => simple.parse(instance, value),
            Binding::Complex(complex) => complex.parse(instance, node, value, context),
        })
    }

    /// Run the parse phase for an attribute; only simple bindings
    /// participate
    pub fn parse_attribute(&self, attribute: &AttributeInstance) -> Result<Option<BoundValue>> {
        self.fold(|binding, value| match binding {
            Binding::Simple(simple) => simple.parse(attribute, value),
            Binding::Complex(_) => Ok(value),
        })
    }

    /// The fold itself.
    ///
    /// `apply` is invoked per executing binding with the running value and
    /// returns the new running value.
    fn fold<F>(&self, mut apply: F) -> Result<Option<BoundValue>>
    where
        F: FnMut(&Binding, Option<BoundValue>) -> Result<Option<BoundValue>>,
    {
        let mut value = None;

        // BEFORE bindings, ancestors first
        for binding in self.bindings.iter().rev() {
            if binding.execution_mode() == ExecutionMode::Before {
                value = apply(binding, value)?;
            }
        }

        // Exactly one OVERRIDE executes: the most derived in the chain
        if let Some(binding) = self
            .bindings
            .iter()
            .find(|b| b.execution_mode() == ExecutionMode::Override)
        {
            value = apply(binding, value)?;
        }

        // AFTER bindings layer on top, ancestors first
        for binding in self.bindings.iter().rev() {
            if binding.execution_mode() == ExecutionMode::After {
                value = apply(binding, value)?;
            }
        }

        Ok(value)
    }
}
