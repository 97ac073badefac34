//! Schema components
//!
//! Declarations and type definitions read from XSD schemas: elements,
//! attributes, simple and complex types, and the particle model that
//! describes complex content (sequence, choice, all).

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ParseFailure, Result};
use crate::namespaces::QName;

/// XSD namespace, home of the built-in types
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
///
/// `None` for `max` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if particle has maxOccurs == 1
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// Check if particle can have multiple occurrences
    pub fn is_multiple(&self) -> bool {
        match self.max {
            Some(max) => max > 1,
            None => true,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.parse::<u32>().map_err(|_| {
            ParseFailure::new("minOccurs value is not a valid non-negative integer")
        })?;
    }

    match max_occurs {
        Some("unbounded") => occurs.max = None,
        Some(max_str) => {
            let max = max_str.parse::<u32>().map_err(|_| {
                ParseFailure::new("maxOccurs value must be a non-negative integer or 'unbounded'")
            })?;
            if occurs.min > max {
                return Err(
                    ParseFailure::new("maxOccurs must be 'unbounded' or >= minOccurs").into(),
                );
            }
            occurs.max = Some(max);
        }
        None => {
            if occurs.min > 1 {
                return Err(
                    ParseFailure::new("minOccurs must be lesser or equal than maxOccurs").into(),
                );
            }
        }
    }

    Ok(occurs)
}

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles
    All,
}

impl ModelType {
    /// Parse from the XSD element local name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A particle in a model group: a local element, a reference to a global
/// element, or a nested group
#[derive(Debug, Clone)]
pub enum Particle {
    /// Local element declaration with its occurrence bounds
    Element {
        /// The declaration
        decl: Arc<ElementDecl>,
        /// Occurrence bounds at this position
        occurs: Occurs,
    },
    /// Reference to a globally declared element
    ElementRef {
        /// Name of the referenced global element
        reference: QName,
        /// Occurrence bounds at this position
        occurs: Occurs,
    },
    /// Nested model group
    Group(Arc<ParticleGroup>),
}

impl Particle {
    /// Get the occurrence bounds of this particle
    pub fn occurs(&self) -> Occurs {
        match self {
            Self::Element { occurs, .. } => *occurs,
            Self::ElementRef { occurs, .. } => *occurs,
            Self::Group(g) => g.occurs,
        }
    }
}

/// A model group (sequence, choice, all) with its nested particles
#[derive(Debug, Clone, Default)]
pub struct ParticleGroup {
    /// Compositor type
    pub model: ModelType,
    /// Particles in document order
    pub particles: Vec<Particle>,
    /// Occurrence bounds of the group itself
    pub occurs: Occurs,
}

impl ParticleGroup {
    /// Create an empty group of the given compositor type
    pub fn new(model: ModelType) -> Self {
        Self {
            model,
            particles: Vec::new(),
            occurs: Occurs::once(),
        }
    }

    /// Add a particle
    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Check whether the group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Element declaration
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Element name
    pub name: QName,
    /// Name of the element's type
    pub type_name: QName,
    /// Whether the element accepts xsi:nil
    pub nillable: bool,
    /// Default value for absent simple content
    pub default: Option<String>,
}

impl ElementDecl {
    /// Create a new element declaration
    pub fn new(name: QName, type_name: QName) -> Self {
        Self {
            name,
            type_name,
            nillable: false,
            default: None,
        }
    }

    /// Create a declaration typed as xs:anyType
    pub fn any_type(name: QName) -> Self {
        Self::new(name, QName::namespaced(XSD_NAMESPACE, "anyType"))
    }
}

/// Attribute declaration
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    /// Attribute name
    pub name: QName,
    /// Name of the attribute's (simple) type
    pub type_name: QName,
    /// Whether the attribute is required
    pub required: bool,
    /// Default value when absent
    pub default: Option<String>,
}

impl AttributeDecl {
    /// Create a new attribute declaration
    pub fn new(name: QName, type_name: QName) -> Self {
        Self {
            name,
            type_name,
            required: false,
            default: None,
        }
    }
}

/// Simple type definition
#[derive(Debug, Clone)]
pub struct SimpleTypeDef {
    /// Type name (None for anonymous types; the schema reader synthesizes
    /// names before registration)
    pub name: Option<QName>,
    /// Base type for derived types
    pub base: Option<QName>,
}

impl SimpleTypeDef {
    /// Create a named simple type with a base
    pub fn derived(name: QName, base: QName) -> Self {
        Self {
            name: Some(name),
            base: Some(base),
        }
    }
}

/// Complex type definition
#[derive(Debug, Clone, Default)]
pub struct ComplexTypeDef {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Base type for derived types
    pub base: Option<QName>,
    /// Content model; None for empty or simple content
    pub particle: Option<ParticleGroup>,
    /// Attribute declarations, in schema order
    pub attributes: IndexMap<QName, Arc<AttributeDecl>>,
    /// Whether text may be interleaved with child elements
    pub mixed: bool,
    /// Whether the type extends a simple type (simpleContent)
    pub simple_content: bool,
}

impl ComplexTypeDef {
    /// Create an empty named complex type
    pub fn named(name: QName) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }
}

/// A type definition, simple or complex
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// Simple type (scalar text content)
    Simple(Arc<SimpleTypeDef>),
    /// Complex type (child elements and/or attributes)
    Complex(Arc<ComplexTypeDef>),
}

impl TypeDef {
    /// Type name, if the type is named
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::Simple(s) => s.name.as_ref(),
            Self::Complex(c) => c.name.as_ref(),
        }
    }

    /// Name of the base type, if the type is derived
    pub fn base(&self) -> Option<&QName> {
        match self {
            Self::Simple(s) => s.base.as_ref(),
            Self::Complex(c) => c.base.as_ref(),
        }
    }

    /// Check if this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple(_))
    }

    /// Check if this is a complex type
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    /// The complex definition, if complex
    pub fn as_complex(&self) -> Option<&Arc<ComplexTypeDef>> {
        match self {
            Self::Complex(c) => Some(c),
            Self::Simple(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_presets() {
        assert_eq!(Occurs::once(), Occurs::new(1, Some(1)));
        assert_eq!(Occurs::optional(), Occurs::new(0, Some(1)));
        assert_eq!(Occurs::zero_or_more(), Occurs::new(0, None));
        assert_eq!(Occurs::one_or_more(), Occurs::new(1, None));
    }

    #[test]
    fn test_occurs_predicates() {
        let optional = Occurs::optional();
        assert!(optional.is_emptiable());
        assert!(optional.is_single());
        assert!(!optional.is_multiple());

        let unbounded = Occurs::zero_or_more();
        assert!(unbounded.is_emptiable());
        assert!(!unbounded.is_single());
        assert!(unbounded.is_multiple());
    }

    #[test]
    fn test_parse_occurs_default() {
        let occurs = parse_occurs(None, None).unwrap();
        assert_eq!(occurs, Occurs::once());
    }

    #[test]
    fn test_parse_occurs_values() {
        let occurs = parse_occurs(Some("0"), Some("5")).unwrap();
        assert_eq!(occurs, Occurs::new(0, Some(5)));

        let occurs = parse_occurs(Some("1"), Some("unbounded")).unwrap();
        assert_eq!(occurs, Occurs::new(1, None));
    }

    #[test]
    fn test_parse_occurs_errors() {
        assert!(parse_occurs(Some("abc"), None).is_err());
        assert!(parse_occurs(None, Some("abc")).is_err());
        assert!(parse_occurs(Some("5"), Some("3")).is_err());
        assert!(parse_occurs(Some("5"), None).is_err());
    }

    #[test]
    fn test_model_type_from_tag() {
        assert_eq!(ModelType::from_tag("sequence"), Some(ModelType::Sequence));
        assert_eq!(ModelType::from_tag("choice"), Some(ModelType::Choice));
        assert_eq!(ModelType::from_tag("all"), Some(ModelType::All));
        assert_eq!(ModelType::from_tag("element"), None);
    }

    #[test]
    fn test_particle_occurs() {
        let decl = Arc::new(ElementDecl::new(
            QName::local("child"),
            QName::namespaced(XSD_NAMESPACE, "int"),
        ));
        let particle = Particle::Element {
            decl,
            occurs: Occurs::zero_or_more(),
        };
        assert_eq!(particle.occurs(), Occurs::zero_or_more());
    }
}
