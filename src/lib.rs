//! # geobind
//!
//! A schema-driven XML binding engine paired with a coordinate reference
//! transformation pipeline.
//!
//! The binding engine parses XML instance documents against XML Schema
//! definitions, dispatching per-type strategy objects ("bindings") that
//! assemble a typed object graph while the document streams by. The
//! transform pipeline provides composable N-dimensional coordinate
//! transforms (linear, affine, datum shifts) with derivatives, typed
//! inversion, and well-known-text output.
//!
//! ## Example
//!
//! ```rust,ignore
//! use geobind::binding::BindingRegistry;
//! use geobind::parser::Parser;
//! use geobind::schema::{read_schema, SchemaSet};
//!
//! let doc = read_schema(include_str!("geo.xsd"))?;
//! let mut schemas = SchemaSet::new();
//! schemas.add_schema(doc.schema);
//!
//! let registry = BindingRegistry::with_builtins();
//! let parser = Parser::new(&schemas, registry);
//! let value = parser.parse_str("<point><coord>1.5</coord></point>")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;
pub mod namespaces;

// Schema model and resolution
pub mod schema;

// Instance model and binding dispatch
pub mod binding;
pub mod instance;

// Document parsing
pub mod parser;

// Coordinate transformation pipeline
pub mod datum;
pub mod transform;

// Re-exports for convenience
pub use error::{Error, Result};
pub use parser::{Parser, StreamingParser};

/// Version of the geobind library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
