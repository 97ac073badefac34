//! Document handler state machine
//!
//! The event-driven interpreter at the heart of the parser. Consumes
//! element-start / characters / element-end events, maintains the stack
//! of in-progress instances with their contexts, and on element-end runs
//! the binding chain for the element's type, handing the bound value to
//! the parent frame (or out, for the root and for stream-filter matches).

use std::sync::Arc;

use tracing::{debug, trace};

use crate::binding::{BindingChain, BindingRegistry, ParseContext};
use crate::error::{Error, ParseFailure, Result};
use crate::instance::{AttributeInstance, BoundValue, ElementInstance, InstanceComponent, Node};
use crate::namespaces::QName;
use crate::schema::{AttributeDecl, ElementDecl, SchemaIndex, TypeDef};

use super::filter::PathFilter;
use super::{ParserConfig, ResolutionMode};

/// Handler states: idle until the first start-event, in-document while
/// the stack is non-empty, done once the root element closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// No event received yet
    Idle,
    /// Root element open, stack non-empty
    InDocument,
    /// Root element closed
    Done,
}

/// What an element-end produced
pub enum EndOutcome {
    /// Value handed to the parent frame
    Attached,
    /// Value matched the stream filter; hand it to the consumer instead
    /// of the parent
    Emit(Option<BoundValue>),
    /// The root element closed; this is the document result
    Document(Option<BoundValue>),
}

impl std::fmt::Debug for EndOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attached => write!(f, "Attached"),
            Self::Emit(value) => write!(f, "Emit(bound: {})", value.is_some()),
            Self::Document(value) => write!(f, "Document(bound: {})", value.is_some()),
        }
    }
}

/// One in-progress element
struct ElementFrame {
    instance: ElementInstance,
    node: Node,
    context: ParseContext,
    chain: BindingChain,
}

/// The streaming state machine
pub struct DocumentHandler {
    index: Arc<SchemaIndex>,
    registry: Arc<BindingRegistry>,
    config: ParserConfig,
    filter: Option<PathFilter>,
    root_context: ParseContext,
    stack: Vec<ElementFrame>,
    path: Vec<String>,
    state: HandlerState,
}

impl DocumentHandler {
    /// Create a handler over a schema index and binding registry
    pub fn new(
        index: Arc<SchemaIndex>,
        registry: Arc<BindingRegistry>,
        config: ParserConfig,
        root_context: ParseContext,
    ) -> Self {
        Self {
            index,
            registry,
            config,
            filter: None,
            root_context,
            stack: Vec::new(),
            path: Vec::new(),
            state: HandlerState::Idle,
        }
    }

    /// Restrict emission to elements matching a path filter
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Current state
    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// Handle an element-start event
    pub fn start_element(
        &mut self,
        name: QName,
        attributes: Vec<(QName, String)>,
        position: u64,
    ) -> Result<()> {
        if self.state == HandlerState::Done {
            return Err(ParseFailure::new("content after document root")
                .with_element(name)
                .with_position(position)
                .into());
        }
        if self.stack.len() >= self.config.max_depth {
            return Err(Error::LimitExceeded(format!(
                "element depth {} exceeds maximum {}",
                self.stack.len() + 1,
                self.config.max_depth
            )));
        }

        trace!(element = %name, position, "start element");

        let decl = self.resolve_element(&name, position)?;
        let instance = ElementInstance::new(name.clone(), Arc::clone(&decl));
        let type_def = self.index.element_type(&decl);

        let chain = match &type_def {
            Some(def) => BindingChain::resolve(&self.registry, &self.index, def),
            None => BindingChain::default(),
        };

        // Attribute instances are populated (and bound) before the
        // initialize phase runs.
        let mut node = Node::new();
        for (attr_name, text) in attributes {
            let value = self
                .bind_attribute(&attr_name, &text, type_def.as_ref())
                .map_err(|e| self.failure(e, &name, position))?;
            node.push_attribute(attr_name, value);
        }

        let mut context = match self.stack.last() {
            Some(parent) => parent.context.derive(),
            None => self.root_context.derive(),
        };
        chain
            .initialize(&instance, &node, &mut context)
            .map_err(|e| self.failure(e, &name, position))?;

        self.path.push(name.local_name.clone());
        self.stack.push(ElementFrame {
            instance,
            node,
            context,
            chain,
        });
        self.state = HandlerState::InDocument;
        Ok(())
    }

    /// Handle a character-data event.
    ///
    /// Multiple events for one element merge in event order.
    pub fn characters(&mut self, text: &str) {
        if let Some(frame) = self.stack.last_mut() {
            frame.instance.append_text(text);
        }
    }

    /// Handle an element-end event: run the parse phase and route the
    /// bound value
    pub fn end_element(&mut self, position: u64) -> Result<EndOutcome> {
        let mut frame = match self.stack.pop() {
            Some(frame) => frame,
            None => {
                return Err(ParseFailure::new("element end without matching start")
                    .with_position(position)
                    .into())
            }
        };

        let name = frame.instance.qname().clone();
        trace!(element = %name, position, "end element");

        let value = frame
            .chain
            .parse_element(&frame.instance, &mut frame.node, &frame.context)
            .map_err(|e| self.failure(e, &name, position))?;

        let matched = self
            .filter
            .as_ref()
            .map(|f| f.matches(&self.path))
            .unwrap_or(false);
        self.path.pop();

        if self.stack.is_empty() {
            self.state = HandlerState::Done;
            debug!(element = %name, "document root closed");
            if matched {
                return Ok(EndOutcome::Emit(value));
            }
            if self.filter.is_some() {
                // Streamed parses surface values only through the filter
                return Ok(EndOutcome::Attached);
            }
            return Ok(EndOutcome::Document(value));
        }

        if matched {
            // Streamed values bypass the parent so the document does not
            // accumulate in memory
            return Ok(EndOutcome::Emit(value));
        }

        let parent = self.stack.last_mut().expect("parent frame present");
        parent.node.push_child(name, value);
        Ok(EndOutcome::Attached)
    }

    /// Resolve the declaration for an element: a global declaration, a
    /// local child declaration of the enclosing type, or (lax mode only)
    /// a synthesized anyType declaration
    fn resolve_element(&self, name: &QName, position: u64) -> Result<Arc<ElementDecl>> {
        if let Some(decl) = self.index.element(name) {
            return Ok(decl);
        }

        if let Some(parent) = self.stack.last() {
            if let Some(parent_type) = self.index.element_type(parent.instance.declaration()) {
                let children = self
                    .index
                    .child_element_declarations(&parent_type, true)?;
                if let Some(decl) = children.iter().find(|d| d.name.matches(name)) {
                    return Ok(Arc::clone(decl));
                }
            }
        }

        match self.config.mode {
            ResolutionMode::Strict => Err(ParseFailure::new(format!(
                "no declaration found for element '{}'",
                name
            ))
            .with_element(name.clone())
            .with_position(position)
            .into()),
            ResolutionMode::Lax => {
                debug!(element = %name, "no declaration found, continuing as anyType");
                Ok(Arc::new(ElementDecl::any_type(name.clone())))
            }
        }
    }

    /// Bind one attribute's text through its type's simple-binding chain
    fn bind_attribute(
        &self,
        name: &QName,
        text: &str,
        element_type: Option<&TypeDef>,
    ) -> Result<Option<BoundValue>> {
        let decl = self
            .resolve_attribute(name, element_type)
            .unwrap_or_else(|| {
                Arc::new(AttributeDecl::new(
                    name.clone(),
                    QName::namespaced(crate::schema::XSD_NAMESPACE, "anySimpleType"),
                ))
            });

        let instance = AttributeInstance::new(name.clone(), text, decl.clone());
        let chain = match self.index.type_def(&decl.type_name) {
            Some(def) => BindingChain::resolve(&self.registry, &self.index, &def),
            None => BindingChain::default(),
        };
        chain.parse_attribute(&instance)
    }

    /// An attribute declaration from the enclosing type (inherited levels
    /// included) or the global attribute table
    fn resolve_attribute(
        &self,
        name: &QName,
        element_type: Option<&TypeDef>,
    ) -> Option<Arc<AttributeDecl>> {
        if let Some(def) = element_type {
            let declared = self.index.attribute_declarations(def, true);
            if let Some(decl) = declared.iter().find(|d| d.name.matches(name)) {
                return Some(Arc::clone(decl));
            }
        }
        self.index.attribute(name)
    }

    fn failure(&self, error: Error, element: &QName, position: u64) -> Error {
        match error {
            Error::Parse(_) => error,
            other => ParseFailure::new(format!("processing of element '{}' failed", element))
                .with_element(element.clone())
                .with_position(position)
                .with_cause(other)
                .into(),
        }
    }
}
