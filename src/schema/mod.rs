//! Schema model and resolution
//!
//! The components read from XSD schemas, the indexed lookup the binding
//! engine resolves against, the base-type chain walker, and cached
//! schema loading.

pub mod components;
pub mod index;
pub mod locator;
pub mod reader;
pub mod walker;

pub use components::{
    AttributeDecl, ComplexTypeDef, ElementDecl, ModelType, Occurs, Particle, ParticleGroup,
    SimpleTypeDef, TypeDef, XSD_NAMESPACE,
};
pub use index::{xs, Schema, SchemaIndex, SchemaSet};
pub use locator::{FileResolver, InMemoryResolver, SchemaLocator, SchemaResolver};
pub use reader::{read_schema, SchemaDocument};
pub use walker::TypeWalker;
