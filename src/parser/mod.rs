//! Instance document parsing
//!
//! The synchronous [`Parser`] drives the handler state machine over a
//! quick-xml event stream and returns the root element's bound value.
//! [`StreamingParser`](streaming::StreamingParser) runs the same machine
//! on a worker thread and yields filtered values one at a time.

pub mod filter;
pub mod handler;
pub mod streaming;

use std::io::BufRead;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::binding::{BindingRegistry, ParseContext};
use crate::error::{Error, Result};
use crate::instance::BoundValue;
use crate::namespaces::{NamespaceStack, QName};
use crate::schema::{SchemaIndex, SchemaSet};

use handler::{DocumentHandler, EndOutcome};

pub use filter::PathFilter;
pub use streaming::StreamingParser;

/// How unresolvable element declarations are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// An element with no matching declaration fails the parse
    #[default]
    Strict,
    /// Undeclared elements continue as xs:anyType
    Lax,
}

impl ResolutionMode {
    /// Parse from a configuration string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            _ => Err(Error::Value(format!(
                "invalid resolution mode: '{}'. Must be 'strict' or 'lax'",
                s
            ))),
        }
    }
}

/// Parser behavior configuration
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Declaration resolution mode
    pub mode: ResolutionMode,
    /// Trim surrounding whitespace from character data
    pub trim_text: bool,
    /// Maximum element nesting depth
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            mode: ResolutionMode::Strict,
            trim_text: true,
            max_depth: 1000,
        }
    }
}

/// Synchronous, single-use instance document parser
pub struct Parser {
    index: Arc<SchemaIndex>,
    registry: Arc<BindingRegistry>,
    config: ParserConfig,
    root_context: ParseContext,
}

impl Parser {
    /// Create a parser over a schema set and binding registry
    pub fn new(schemas: &SchemaSet, registry: BindingRegistry) -> Self {
        Self {
            index: Arc::new(SchemaIndex::new(schemas)),
            registry: Arc::new(registry),
            config: ParserConfig::default(),
            root_context: ParseContext::new(),
        }
    }

    /// Replace the parser configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// The root parse context, for seeding shared collaborator objects
    /// before the parse
    pub fn context_mut(&mut self) -> &mut ParseContext {
        &mut self.root_context
    }

    /// Parse a document from a string, consuming the parser.
    ///
    /// Returns the root element's bound value (None when no binding in
    /// the root's chain produced one).
    pub fn parse_str(self, xml: &str) -> Result<Option<BoundValue>> {
        self.parse_reader(xml.as_bytes())
    }

    /// Parse a document from a buffered reader, consuming the parser
    pub fn parse_reader<R: BufRead>(self, input: R) -> Result<Option<BoundValue>> {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(self.config.trim_text);

        let mut handler = DocumentHandler::new(
            Arc::clone(&self.index),
            Arc::clone(&self.registry),
            self.config.clone(),
            self.root_context.clone(),
        );
        drive_events(&mut reader, &mut handler, &mut |_| true)
    }
}

/// Drive quick-xml events through a handler.
///
/// `emit` receives stream-filter matches; returning false cancels the
/// parse. The return value is the document result for unfiltered parses.
pub(crate) fn drive_events<R: BufRead>(
    reader: &mut Reader<R>,
    handler: &mut DocumentHandler,
    emit: &mut dyn FnMut(Option<BoundValue>) -> bool,
) -> Result<Option<BoundValue>> {
    let mut scopes = NamespaceStack::new();
    let mut result = None;
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                scopes.push();
                let (name, attributes) = read_start(&e, &mut scopes)?;
                handler.start_element(name, attributes, position)?;
            }
            Ok(Event::Empty(e)) => {
                scopes.push();
                let (name, attributes) = read_start(&e, &mut scopes)?;
                handler.start_element(name, attributes, position)?;
                let outcome = handler.end_element(position)?;
                scopes.pop();
                handle_outcome(outcome, &mut result, emit)?;
            }
            Ok(Event::End(_)) => {
                let outcome = handler.end_element(position)?;
                scopes.pop();
                handle_outcome(outcome, &mut result, emit)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::Xml(format!("failed to unescape text: {}", e)))?;
                handler.characters(&text);
            }
            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| Error::Xml(format!("invalid CDATA: {}", e)))?;
                handler.characters(text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Xml(format!(
                    "error parsing document at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    Ok(result)
}

fn handle_outcome(
    outcome: EndOutcome,
    result: &mut Option<BoundValue>,
    emit: &mut dyn FnMut(Option<BoundValue>) -> bool,
) -> Result<()> {
    match outcome {
        EndOutcome::Attached => Ok(()),
        EndOutcome::Document(value) => {
            *result = value;
            Ok(())
        }
        EndOutcome::Emit(value) => {
            if emit(value) {
                Ok(())
            } else {
                Err(Error::Cancelled)
            }
        }
    }
}

/// Extract the resolved element name and attributes from a start event,
/// recording xmlns declarations into the current scope
fn read_start(start: &BytesStart, scopes: &mut NamespaceStack) -> Result<(QName, Vec<(QName, String)>)> {
    let raw_name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::Xml(format!("invalid element name: {}", e)))?
        .to_string();

    let mut raw_attrs = Vec::new();
    for attr_result in start.attributes() {
        let attr =
            attr_result.map_err(|e| Error::Xml(format!("failed to parse attribute: {}", e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::Xml(format!("invalid attribute name: {}", e)))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("failed to unescape attribute value: {}", e)))?
            .to_string();

        if key == "xmlns" {
            if let Some(scope) = scopes.current_mut() {
                scope.set_default_namespace(&value);
            }
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            if let Some(scope) = scopes.current_mut() {
                scope.add_prefix(prefix, &value);
            }
        } else {
            raw_attrs.push((key, value));
        }
    }

    let scope = scopes.current().cloned().unwrap_or_default();
    let name = scope.resolve_element(&raw_name)?;
    let mut attributes = Vec::with_capacity(raw_attrs.len());
    for (key, value) in raw_attrs {
        attributes.push((scope.resolve_attribute(&key)?, value));
    }
    Ok((name, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ComplexBinding, ParseContext};
    use crate::instance::{ElementInstance, Node};
    use crate::schema::{
        xs, ComplexTypeDef, ElementDecl, ModelType, Occurs, Particle, ParticleGroup, Schema,
    };

    const NS: &str = "http://example.com/test";

    struct CollectBinding;

    impl ComplexBinding for CollectBinding {
        fn target(&self) -> QName {
            QName::namespaced(NS, "RootType")
        }

        fn parse(
            &self,
            _instance: &ElementInstance,
            node: &mut Node,
            _value: Option<BoundValue>,
            _context: &ParseContext,
        ) -> Result<Option<BoundValue>> {
            Ok(Some(Box::new(node.take_children::<i64>())))
        }
    }

    fn schema_set() -> SchemaSet {
        let mut schema = Schema::new(Some(NS));
        let mut root_type = ComplexTypeDef::named(QName::namespaced(NS, "RootType"));
        let mut group = ParticleGroup::new(ModelType::Sequence);
        group.push(Particle::Element {
            decl: std::sync::Arc::new(ElementDecl::new(
                QName::namespaced(NS, "child"),
                xs("integer"),
            )),
            occurs: Occurs::zero_or_more(),
        });
        root_type.particle = Some(group);
        schema.add_complex_type(root_type);
        schema.add_element(ElementDecl::new(
            QName::namespaced(NS, "root"),
            QName::namespaced(NS, "RootType"),
        ));
        let mut set = SchemaSet::new();
        set.add_schema(schema);
        set
    }

    fn registry() -> BindingRegistry {
        let mut registry = BindingRegistry::with_builtins();
        registry.register_complex(CollectBinding);
        registry
    }

    #[test]
    fn test_parse_two_element_document() {
        let xml = format!(r#"<root xmlns="{}"><child>5</child></root>"#, NS);
        let parser = Parser::new(&schema_set(), registry());
        let value = parser.parse_str(&xml).unwrap().unwrap();
        assert_eq!(*value.downcast::<Vec<i64>>().unwrap(), vec![5]);
    }

    #[test]
    fn test_parse_multiple_children() {
        let xml = format!(
            r#"<root xmlns="{}"><child>1</child><child>2</child><child>3</child></root>"#,
            NS
        );
        let parser = Parser::new(&schema_set(), registry());
        let value = parser.parse_str(&xml).unwrap().unwrap();
        assert_eq!(*value.downcast::<Vec<i64>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_prefixed_document() {
        let xml = format!(
            r#"<t:root xmlns:t="{}"><t:child>7</t:child></t:root>"#,
            NS
        );
        let parser = Parser::new(&schema_set(), registry());
        let value = parser.parse_str(&xml).unwrap().unwrap();
        assert_eq!(*value.downcast::<Vec<i64>>().unwrap(), vec![7]);
    }

    #[test]
    fn test_malformed_document_fails() {
        let xml = format!(r#"<root xmlns="{}"><child>5</root>"#, NS);
        let parser = Parser::new(&schema_set(), registry());
        assert!(parser.parse_str(&xml).is_err());
    }

    #[test]
    fn test_strict_mode_unknown_root_fails() {
        let parser = Parser::new(&schema_set(), registry());
        let err = parser.parse_str("<unknown/>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_resolution_mode_from_str() {
        assert_eq!(
            ResolutionMode::from_str("strict").unwrap(),
            ResolutionMode::Strict
        );
        assert_eq!(ResolutionMode::from_str("lax").unwrap(), ResolutionMode::Lax);
        assert!(ResolutionMode::from_str("other").is_err());
    }
}
