//! Instance model
//!
//! Lightweight nodes representing the current parse position: an element
//! or attribute with its raw text and a link to its schema declaration,
//! plus the [`Node`] of already-bound children handed to complex bindings.

use std::any::Any;
use std::sync::Arc;

use crate::namespaces::QName;
use crate::schema::{AttributeDecl, ElementDecl};

/// A value produced by a binding.
///
/// The engine is generic over the object model bindings construct, so
/// bound values travel as type-erased boxes; bindings and callers downcast
/// at the points where they know the concrete type.
pub type BoundValue = Box<dyn Any + Send>;

/// Common view over element and attribute instances
pub trait InstanceComponent {
    /// Qualified name of the component
    fn qname(&self) -> &QName;

    /// Accumulated raw text content
    fn text(&self) -> &str;

    /// Name of the component's resolved type
    fn type_name(&self) -> &QName;

    /// Namespace URI of the component
    fn namespace(&self) -> Option<&str> {
        self.qname().namespace.as_deref()
    }

    /// Local name of the component
    fn local_name(&self) -> &str {
        &self.qname().local_name
    }
}

/// One element currently being parsed
#[derive(Debug)]
pub struct ElementInstance {
    name: QName,
    text: String,
    decl: Arc<ElementDecl>,
}

impl ElementInstance {
    /// Create an instance for an element with its resolved declaration
    pub fn new(name: QName, decl: Arc<ElementDecl>) -> Self {
        Self {
            name,
            text: String::new(),
            decl,
        }
    }

    /// Append character data.
    ///
    /// Multiple character events for one element merge in event order.
    pub fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// The element's schema declaration
    pub fn declaration(&self) -> &Arc<ElementDecl> {
        &self.decl
    }
}

impl InstanceComponent for ElementInstance {
    fn qname(&self) -> &QName {
        &self.name
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn type_name(&self) -> &QName {
        &self.decl.type_name
    }
}

/// One attribute of the element currently being parsed
#[derive(Debug)]
pub struct AttributeInstance {
    name: QName,
    text: String,
    decl: Arc<AttributeDecl>,
}

impl AttributeInstance {
    /// Create an instance for an attribute with its resolved declaration
    pub fn new(name: QName, text: impl Into<String>, decl: Arc<AttributeDecl>) -> Self {
        Self {
            name,
            text: text.into(),
            decl,
        }
    }

    /// The attribute's schema declaration
    pub fn declaration(&self) -> &Arc<AttributeDecl> {
        &self.decl
    }
}

impl InstanceComponent for AttributeInstance {
    fn qname(&self) -> &QName {
        &self.name
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn type_name(&self) -> &QName {
        &self.decl.type_name
    }
}

/// A bound child of a node
pub struct NodeChild {
    /// The child element's qualified name
    pub name: QName,
    /// The child's bound value (None when its bindings produced nothing)
    pub value: Option<BoundValue>,
}

impl std::fmt::Debug for NodeChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // bound values are type-erased; report presence only
        write!(f, "NodeChild({}, bound: {})", self.name, self.value.is_some())
    }
}

/// A bound attribute of a node
pub struct NodeAttribute {
    /// The attribute's qualified name
    pub name: QName,
    /// The attribute's bound value
    pub value: Option<BoundValue>,
}

impl std::fmt::Debug for NodeAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NodeAttribute({}, bound: {})",
            self.name,
            self.value.is_some()
        )
    }
}

/// The parsed representation of an element handed to complex bindings:
/// its children's bound values and its attributes' bound values, in
/// document order.
#[derive(Debug, Default)]
pub struct Node {
    children: Vec<NodeChild>,
    attributes: Vec<NodeAttribute>,
}

impl Node {
    /// Create an empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bound child
    pub fn push_child(&mut self, name: QName, value: Option<BoundValue>) {
        self.children.push(NodeChild { name, value });
    }

    /// Append a bound attribute
    pub fn push_attribute(&mut self, name: QName, value: Option<BoundValue>) {
        self.attributes.push(NodeAttribute { name, value });
    }

    /// All children in document order
    pub fn children(&self) -> &[NodeChild] {
        &self.children
    }

    /// All attributes in document order
    pub fn attributes(&self) -> &[NodeAttribute] {
        &self.attributes
    }

    /// First child with the given local name
    pub fn child(&self, local_name: &str) -> Option<&NodeChild> {
        self.children
            .iter()
            .find(|c| c.name.local_name == local_name)
    }

    /// First child value downcastable to `T`
    pub fn child_value<T: Any>(&self) -> Option<&T> {
        self.children
            .iter()
            .filter_map(|c| c.value.as_ref())
            .find_map(|v| v.downcast_ref::<T>())
    }

    /// Value of the first child with the given local name, downcast to `T`
    pub fn child_value_named<T: Any>(&self, local_name: &str) -> Option<&T> {
        self.child(local_name)
            .and_then(|c| c.value.as_ref())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Remove and return every child value downcastable to `T`, in
    /// document order. Children of other types are left in place.
    pub fn take_children<T: Any>(&mut self) -> Vec<T> {
        let mut taken = Vec::new();
        let mut rest = Vec::with_capacity(self.children.len());
        for mut child in self.children.drain(..) {
            match child.value.take() {
                Some(value) => match value.downcast::<T>() {
                    Ok(boxed) => taken.push(*boxed),
                    Err(value) => {
                        child.value = Some(value);
                        rest.push(child);
                    }
                },
                None => rest.push(child),
            }
        }
        self.children = rest;
        taken
    }

    /// Value of the attribute with the given local name, downcast to `T`
    pub fn attribute_value<T: Any>(&self, local_name: &str) -> Option<&T> {
        self.attributes
            .iter()
            .find(|a| a.name.local_name == local_name)
            .and_then(|a| a.value.as_ref())
            .and_then(|v| v.downcast_ref::<T>())
    }
}
