//! Schema set and index
//!
//! [`SchemaSet`] collects the schemas in play for a parse; [`SchemaIndex`]
//! is the read-only lookup the parser and bindings resolve declarations
//! against. Lookup misses are `None`, never errors; only malformed queries
//! (an element that is not a child of the queried type) fail.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::namespaces::QName;

use super::components::{
    AttributeDecl, ComplexTypeDef, ElementDecl, Occurs, Particle, SimpleTypeDef, TypeDef,
    XSD_NAMESPACE,
};

/// Built-in simple type table: (local name, base local name).
///
/// The base of "anySimpleType" is the root complex anyType; every other
/// entry chains to another entry in this table.
const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("anySimpleType", "anyType"),
    ("string", "anySimpleType"),
    ("boolean", "anySimpleType"),
    ("decimal", "anySimpleType"),
    ("float", "anySimpleType"),
    ("double", "anySimpleType"),
    ("duration", "anySimpleType"),
    ("dateTime", "anySimpleType"),
    ("time", "anySimpleType"),
    ("date", "anySimpleType"),
    ("hexBinary", "anySimpleType"),
    ("base64Binary", "anySimpleType"),
    ("anyURI", "anySimpleType"),
    ("QName", "anySimpleType"),
    ("normalizedString", "string"),
    ("token", "normalizedString"),
    ("language", "token"),
    ("Name", "token"),
    ("NMTOKEN", "token"),
    ("NCName", "Name"),
    ("ID", "NCName"),
    ("IDREF", "NCName"),
    ("ENTITY", "NCName"),
    ("integer", "decimal"),
    ("nonPositiveInteger", "integer"),
    ("negativeInteger", "nonPositiveInteger"),
    ("long", "integer"),
    ("int", "long"),
    ("short", "int"),
    ("byte", "short"),
    ("nonNegativeInteger", "integer"),
    ("unsignedLong", "nonNegativeInteger"),
    ("unsignedInt", "unsignedLong"),
    ("unsignedShort", "unsignedInt"),
    ("unsignedByte", "unsignedShort"),
    ("positiveInteger", "nonNegativeInteger"),
];

/// QName in the XSD namespace
pub fn xs(local: &str) -> QName {
    QName::namespaced(XSD_NAMESPACE, local)
}

/// A single schema: declarations for one target namespace
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Target namespace (None for no-namespace schemas)
    pub target_namespace: Option<String>,
    /// Global element declarations
    pub elements: IndexMap<QName, Arc<ElementDecl>>,
    /// Global attribute declarations
    pub attributes: IndexMap<QName, Arc<AttributeDecl>>,
    /// Named type definitions
    pub types: IndexMap<QName, TypeDef>,
}

impl Schema {
    /// Create an empty schema for a target namespace
    pub fn new(target_namespace: Option<impl Into<String>>) -> Self {
        Self {
            target_namespace: target_namespace.map(|s| s.into()),
            ..Default::default()
        }
    }

    /// Register a global element declaration
    pub fn add_element(&mut self, decl: ElementDecl) -> &mut Self {
        self.elements.insert(decl.name.clone(), Arc::new(decl));
        self
    }

    /// Register a global attribute declaration
    pub fn add_attribute(&mut self, decl: AttributeDecl) -> &mut Self {
        self.attributes.insert(decl.name.clone(), Arc::new(decl));
        self
    }

    /// Register a named complex type
    pub fn add_complex_type(&mut self, def: ComplexTypeDef) -> &mut Self {
        let name = def
            .name
            .clone()
            .expect("complex type registered in a schema must be named");
        self.types.insert(name, TypeDef::Complex(Arc::new(def)));
        self
    }

    /// Register a named simple type
    pub fn add_simple_type(&mut self, def: SimpleTypeDef) -> &mut Self {
        let name = def
            .name
            .clone()
            .expect("simple type registered in a schema must be named");
        self.types.insert(name, TypeDef::Simple(Arc::new(def)));
        self
    }
}

/// The schemas in play for one parse session
#[derive(Debug, Clone)]
pub struct SchemaSet {
    schemas: Vec<Schema>,
}

impl SchemaSet {
    /// Create a schema set holding only the XSD built-in types
    pub fn new() -> Self {
        Self {
            schemas: vec![builtin_schema()],
        }
    }

    /// Add a schema to the set
    pub fn add_schema(&mut self, schema: Schema) -> &mut Self {
        self.schemas.push(schema);
        self
    }

    /// The schemas in registration order (built-ins first)
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }
}

impl Default for SchemaSet {
    fn default() -> Self {
        Self::new()
    }
}

/// The XSD namespace schema holding the built-in type hierarchy
fn builtin_schema() -> Schema {
    let mut schema = Schema::new(Some(XSD_NAMESPACE));

    // anyType roots the hierarchy; its base is itself.
    let mut any_type = ComplexTypeDef::named(xs("anyType"));
    any_type.base = Some(xs("anyType"));
    any_type.mixed = true;
    schema.add_complex_type(any_type);

    for (name, base) in BUILTIN_TYPES {
        schema.add_simple_type(SimpleTypeDef::derived(xs(name), xs(base)));
    }

    schema
}

/// Read-only typed lookup over a schema set
///
/// Merges the set's declaration tables. Built once per parse session and
/// shared behind an `Arc`.
#[derive(Debug)]
pub struct SchemaIndex {
    elements: IndexMap<QName, Arc<ElementDecl>>,
    attributes: IndexMap<QName, Arc<AttributeDecl>>,
    types: IndexMap<QName, TypeDef>,
}

impl SchemaIndex {
    /// Build an index over a schema set
    pub fn new(set: &SchemaSet) -> Self {
        let mut elements = IndexMap::new();
        let mut attributes = IndexMap::new();
        let mut types = IndexMap::new();
        for schema in set.schemas() {
            for (name, decl) in &schema.elements {
                elements.insert(name.clone(), Arc::clone(decl));
            }
            for (name, decl) in &schema.attributes {
                attributes.insert(name.clone(), Arc::clone(decl));
            }
            for (name, def) in &schema.types {
                types.insert(name.clone(), def.clone());
            }
        }
        Self {
            elements,
            attributes,
            types,
        }
    }

    /// Look up a global element declaration
    pub fn element(&self, name: &QName) -> Option<Arc<ElementDecl>> {
        if let Some(decl) = self.elements.get(name) {
            return Some(Arc::clone(decl));
        }
        self.elements
            .iter()
            .find(|(declared, _)| declared.matches(name))
            .map(|(_, decl)| Arc::clone(decl))
    }

    /// Look up a global attribute declaration
    pub fn attribute(&self, name: &QName) -> Option<Arc<AttributeDecl>> {
        if let Some(decl) = self.attributes.get(name) {
            return Some(Arc::clone(decl));
        }
        self.attributes
            .iter()
            .find(|(declared, _)| declared.matches(name))
            .map(|(_, decl)| Arc::clone(decl))
    }

    /// Look up a type definition
    pub fn type_def(&self, name: &QName) -> Option<TypeDef> {
        if let Some(def) = self.types.get(name) {
            return Some(def.clone());
        }
        self.types
            .iter()
            .find(|(declared, _)| declared.matches(name))
            .map(|(_, def)| def.clone())
    }

    /// Resolve the type of an element declaration
    pub fn element_type(&self, decl: &ElementDecl) -> Option<TypeDef> {
        self.type_def(&decl.type_name)
    }

    /// Collect the child element declarations a complex type permits.
    ///
    /// With `include_parents`, the base-type chain is walked outward-in and
    /// each ancestor's own particle content is visited once. Nested
    /// sequence/choice/all groups are flattened breadth-first with an
    /// explicit queue; element references are resolved to their concrete
    /// declarations before collection.
    pub fn child_element_declarations(
        &self,
        type_def: &TypeDef,
        include_parents: bool,
    ) -> Result<Vec<Arc<ElementDecl>>> {
        let mut result = Vec::new();
        for def in self.chain(type_def, include_parents) {
            if let TypeDef::Complex(complex) = def {
                self.collect_particle_elements(&complex, &mut result)?;
            }
        }
        Ok(result)
    }

    /// Collect the attribute declarations a complex type carries.
    ///
    /// With `include_parents`, inherited attributes from the base-type
    /// chain are included, most-derived first.
    pub fn attribute_declarations(
        &self,
        type_def: &TypeDef,
        include_parents: bool,
    ) -> Vec<Arc<AttributeDecl>> {
        let mut result = Vec::new();
        for def in self.chain(type_def, include_parents) {
            if let TypeDef::Complex(complex) = def {
                for decl in complex.attributes.values() {
                    result.push(Arc::clone(decl));
                }
            }
        }
        result
    }

    /// Minimum occurrences of `element` within `type_def`'s immediate
    /// particle tree.
    ///
    /// The element must actually be a child of the type; asking about an
    /// unrelated pair is a caller error.
    pub fn min_occurs(&self, type_def: &TypeDef, element: &QName) -> Result<u32> {
        self.find_occurs(type_def, element).map(|o| o.min)
    }

    /// Maximum occurrences of `element` within `type_def`'s immediate
    /// particle tree (None = unbounded).
    pub fn max_occurs(&self, type_def: &TypeDef, element: &QName) -> Result<Option<u32>> {
        self.find_occurs(type_def, element).map(|o| o.max)
    }

    fn find_occurs(&self, type_def: &TypeDef, element: &QName) -> Result<Occurs> {
        let complex = type_def.as_complex().ok_or_else(|| {
            Error::Argument(format!("type of element '{}' is not complex", element))
        })?;
        let mut queue: VecDeque<&Particle> = VecDeque::new();
        if let Some(group) = &complex.particle {
            queue.extend(group.particles.iter());
        }
        while let Some(particle) = queue.pop_front() {
            match particle {
                Particle::Element { decl, occurs } => {
                    if decl.name.matches(element) {
                        return Ok(*occurs);
                    }
                }
                Particle::ElementRef { reference, occurs } => {
                    let decl = self.element(reference).ok_or_else(|| {
                        Error::Schema(format!("unresolved element reference '{}'", reference))
                    })?;
                    if decl.name.matches(element) {
                        return Ok(*occurs);
                    }
                }
                Particle::Group(nested) => queue.extend(nested.particles.iter()),
            }
        }
        Err(Error::Argument(format!(
            "element '{}' is not a child of type '{}'",
            element,
            complex
                .name
                .as_ref()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "<anonymous>".to_string()),
        )))
    }

    /// Flatten one type's own particle tree breadth-first, resolving refs
    fn collect_particle_elements(
        &self,
        complex: &ComplexTypeDef,
        result: &mut Vec<Arc<ElementDecl>>,
    ) -> Result<()> {
        let mut queue: VecDeque<&Particle> = VecDeque::new();
        if let Some(group) = &complex.particle {
            queue.extend(group.particles.iter());
        }
        while let Some(particle) = queue.pop_front() {
            match particle {
                Particle::Element { decl, .. } => result.push(Arc::clone(decl)),
                Particle::ElementRef { reference, .. } => {
                    let decl = self.element(reference).ok_or_else(|| {
                        Error::Schema(format!("unresolved element reference '{}'", reference))
                    })?;
                    result.push(decl);
                }
                Particle::Group(nested) => queue.extend(nested.particles.iter()),
            }
        }
        Ok(())
    }

    /// The base-type chain starting at `type_def`, most-derived first.
    ///
    /// Stops at the hierarchy root (a type whose base is itself), so
    /// malformed cycles cannot loop.
    pub fn chain(&self, type_def: &TypeDef, include_parents: bool) -> Vec<TypeDef> {
        if !include_parents {
            return vec![type_def.clone()];
        }
        super::walker::TypeWalker::new(self).chain(type_def)
    }
}
