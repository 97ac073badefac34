//! XSD document reader
//!
//! Reads the subset of XML Schema the binding engine consumes: global
//! elements and attributes, complex and simple type definitions with
//! extension/restriction bases, sequence/choice/all content models,
//! element references and occurrence bounds.

use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::namespaces::{NamespaceContext, NamespaceStack, QName};

use super::components::{
    parse_occurs, AttributeDecl, ComplexTypeDef, ElementDecl, ModelType, Particle, ParticleGroup,
    SimpleTypeDef, XSD_NAMESPACE,
};
use super::index::Schema;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANNOTATION: &str = "annotation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const BASE: &str = "base";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
    pub const DEFAULT: &str = "default";
    pub const NILLABLE: &str = "nillable";
    pub const MIXED: &str = "mixed";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
}

/// A schema document read into components plus its include/import locations
#[derive(Debug)]
pub struct SchemaDocument {
    /// The schema's component declarations
    pub schema: Schema,
    /// schemaLocation values of xsd:include / xsd:import children
    pub includes: Vec<String>,
}

/// Read a schema document from XSD text
pub fn read_schema(xml: &str) -> Result<SchemaDocument> {
    let root = parse_tree(xml)?;
    if root.local_name() != xsd_elements::SCHEMA {
        return Err(Error::Schema(format!(
            "expected root element 'schema', found '{}'",
            root.local_name()
        )));
    }
    SchemaBuilder::new(&root).build(&root)
}

/// Raw XML node used while interpreting the schema document
#[derive(Debug)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
    namespaces: NamespaceContext,
}

impl XmlNode {
    fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn children_named<'s, 'n>(&'s self, local: &'n str) -> impl Iterator<Item = &'s XmlNode> + 'n
    where
        's: 'n,
    {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    fn first_child<'s>(&'s self, local: &str) -> Option<&'s XmlNode> {
        self.children_named(local).next()
    }
}

/// Build the raw node tree for a schema document
fn parse_tree(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut scopes = NamespaceStack::new();
    let mut root: Option<XmlNode> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                scopes.push();
                let node = start_node(&e, &mut scopes)?;
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                scopes.push();
                let node = start_node(&e, &mut scopes)?;
                scopes.pop();
                attach(node, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                scopes.pop();
                if let Some(node) = stack.pop() {
                    attach(node, &mut stack, &mut root);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Xml(format!(
                    "error parsing schema at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    root.ok_or_else(|| Error::Schema("schema document has no root element".to_string()))
}

fn attach(node: XmlNode, stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else {
        *root = Some(node);
    }
}

fn start_node(start: &BytesStart, scopes: &mut NamespaceStack) -> Result<XmlNode> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::Xml(format!("invalid element name: {}", e)))?
        .to_string();

    let mut attrs = Vec::new();
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
            attrs.push((key, value));
        }
    }

    let namespaces = scopes.current().cloned().unwrap_or_default();
    Ok(XmlNode {
        name,
        attrs,
        children: Vec::new(),
        namespaces,
    })
}

/// Interprets a raw schema tree into components
struct SchemaBuilder {
    target_namespace: Option<String>,
}

impl SchemaBuilder {
    fn new(root: &XmlNode) -> Self {
        Self {
            target_namespace: root.attr(xsd_attrs::TARGET_NAMESPACE).map(String::from),
        }
    }

    fn build(&self, root: &XmlNode) -> Result<SchemaDocument> {
        let mut schema = Schema::new(self.target_namespace.clone());
        let mut includes = Vec::new();

        for child in &root.children {
            match child.local_name() {
                xsd_elements::ELEMENT => {
                    let decl = self.read_global_element(child, &mut schema)?;
                    schema.add_element(decl);
                }
                xsd_elements::COMPLEX_TYPE => {
                    let name = self.required_name(child, "complexType")?;
                    let def = self.read_complex_type(child, name, &mut schema)?;
                    schema.add_complex_type(def);
                }
                xsd_elements::SIMPLE_TYPE => {
                    let name = self.required_name(child, "simpleType")?;
                    let def = self.read_simple_type(child, name)?;
                    schema.add_simple_type(def);
                }
                xsd_elements::ATTRIBUTE => {
                    let decl = self.read_attribute(child)?;
                    schema.add_attribute(decl);
                }
                xsd_elements::IMPORT | xsd_elements::INCLUDE => {
                    if let Some(location) = child.attr(xsd_attrs::SCHEMA_LOCATION) {
                        includes.push(location.to_string());
                    }
                }
                xsd_elements::ANNOTATION => {}
                other => {
                    tracing::debug!(element = other, "skipping unsupported schema construct");
                }
            }
        }

        Ok(SchemaDocument { schema, includes })
    }

    fn required_name(&self, node: &XmlNode, what: &str) -> Result<QName> {
        let name = node
            .attr(xsd_attrs::NAME)
            .ok_or_else(|| Error::Schema(format!("global {} is missing 'name'", what)))?;
        Ok(QName::new(self.target_namespace.clone(), name))
    }

    fn read_global_element(&self, node: &XmlNode, schema: &mut Schema) -> Result<ElementDecl> {
        let name = self.required_name(node, "element")?;
        let type_name = self.element_type_name(node, &name, schema)?;
        let mut decl = ElementDecl::new(name, type_name);
        decl.nillable = node.attr(xsd_attrs::NILLABLE) == Some("true");
        decl.default = node.attr(xsd_attrs::DEFAULT).map(String::from);
        Ok(decl)
    }

    /// The type of an element: a `type` attribute, an inline anonymous
    /// type (registered under a synthetic "_elementName" name), or
    /// xs:anyType when neither is present.
    fn element_type_name(
        &self,
        node: &XmlNode,
        element_name: &QName,
        schema: &mut Schema,
    ) -> Result<QName> {
        if let Some(type_attr) = node.attr(xsd_attrs::TYPE) {
            return self.resolve_type_name(node, type_attr);
        }
        if let Some(inline) = node.first_child(xsd_elements::COMPLEX_TYPE) {
            let synthetic = QName::new(
                self.target_namespace.clone(),
                format!("_{}", element_name.local_name),
            );
            let def = self.read_complex_type(inline, synthetic.clone(), schema)?;
            schema.add_complex_type(def);
            return Ok(synthetic);
        }
        if let Some(inline) = node.first_child(xsd_elements::SIMPLE_TYPE) {
            let synthetic = QName::new(
                self.target_namespace.clone(),
                format!("_{}", element_name.local_name),
            );
            let def = self.read_simple_type(inline, synthetic.clone())?;
            schema.add_simple_type(def);
            return Ok(synthetic);
        }
        Ok(QName::namespaced(XSD_NAMESPACE, "anyType"))
    }

    fn read_complex_type(
        &self,
        node: &XmlNode,
        name: QName,
        schema: &mut Schema,
    ) -> Result<ComplexTypeDef> {
        let mut def = ComplexTypeDef::named(name.clone());
        def.mixed = node.attr(xsd_attrs::MIXED) == Some("true");

        // complexContent/simpleContent wrap a derivation step; otherwise the
        // content model and attributes sit directly on the type.
        let (content_node, simple_content) =
            if let Some(cc) = node.first_child(xsd_elements::COMPLEX_CONTENT) {
                (self.derivation_child(cc)?, false)
            } else if let Some(sc) = node.first_child(xsd_elements::SIMPLE_CONTENT) {
                (self.derivation_child(sc)?, true)
            } else {
                (None, false)
            };
        def.simple_content = simple_content;

        let body = match content_node {
            Some(derivation) => {
                let base_attr = derivation.attr(xsd_attrs::BASE).ok_or_else(|| {
                    Error::Schema(format!("derivation of '{}' is missing 'base'", name))
                })?;
                def.base = Some(self.resolve_type_name(derivation, base_attr)?);
                derivation
            }
            None => node,
        };

        for child in &body.children {
            if let Some(model) = ModelType::from_tag(child.local_name()) {
                let mut group = self.read_group(child, model, &name, schema)?;
                group.occurs = parse_occurs(
                    child.attr(xsd_attrs::MIN_OCCURS),
                    child.attr(xsd_attrs::MAX_OCCURS),
                )?;
                def.particle = Some(group);
            } else if child.local_name() == xsd_elements::ATTRIBUTE {
                let decl = self.read_attribute(child)?;
                def.attributes.insert(decl.name.clone(), Arc::new(decl));
            }
        }

        Ok(def)
    }

    fn derivation_child<'a>(&self, content: &'a XmlNode) -> Result<Option<&'a XmlNode>> {
        Ok(content
            .first_child(xsd_elements::EXTENSION)
            .or_else(|| content.first_child(xsd_elements::RESTRICTION)))
    }

    fn read_group(
        &self,
        node: &XmlNode,
        model: ModelType,
        type_name: &QName,
        schema: &mut Schema,
    ) -> Result<ParticleGroup> {
        let mut group = ParticleGroup::new(model);
        for child in &node.children {
            match child.local_name() {
                xsd_elements::ELEMENT => {
                    let occurs = parse_occurs(
                        child.attr(xsd_attrs::MIN_OCCURS),
                        child.attr(xsd_attrs::MAX_OCCURS),
                    )?;
                    if let Some(reference) = child.attr(xsd_attrs::REF) {
                        group.push(Particle::ElementRef {
                            reference: self.resolve_type_name(child, reference)?,
                            occurs,
                        });
                    } else {
                        let local_name = child.attr(xsd_attrs::NAME).ok_or_else(|| {
                            Error::Schema(format!(
                                "local element in '{}' is missing both 'name' and 'ref'",
                                type_name
                            ))
                        })?;
                        let element_name = QName::new(self.target_namespace.clone(), local_name);
                        let element_type =
                            self.element_type_name(child, &element_name, schema)?;
                        let mut decl = ElementDecl::new(element_name, element_type);
                        decl.nillable = child.attr(xsd_attrs::NILLABLE) == Some("true");
                        group.push(Particle::Element {
                            decl: Arc::new(decl),
                            occurs,
                        });
                    }
                }
                tag if ModelType::from_tag(tag).is_some() => {
                    let nested_model = ModelType::from_tag(tag).unwrap();
                    let mut nested = self.read_group(child, nested_model, type_name, schema)?;
                    nested.occurs = parse_occurs(
                        child.attr(xsd_attrs::MIN_OCCURS),
                        child.attr(xsd_attrs::MAX_OCCURS),
                    )?;
                    group.push(Particle::Group(Arc::new(nested)));
                }
                xsd_elements::ANNOTATION => {}
                other => {
                    tracing::debug!(element = other, "skipping unsupported particle construct");
                }
            }
        }
        Ok(group)
    }

    fn read_simple_type(&self, node: &XmlNode, name: QName) -> Result<SimpleTypeDef> {
        let base = match node.first_child(xsd_elements::RESTRICTION) {
            Some(restriction) => {
                let base_attr = restriction.attr(xsd_attrs::BASE).ok_or_else(|| {
                    Error::Schema(format!("restriction of '{}' is missing 'base'", name))
                })?;
                Some(self.resolve_type_name(restriction, base_attr)?)
            }
            None => Some(QName::namespaced(XSD_NAMESPACE, "anySimpleType")),
        };
        Ok(SimpleTypeDef {
            name: Some(name),
            base,
        })
    }

    fn read_attribute(&self, node: &XmlNode) -> Result<AttributeDecl> {
        let name = node
            .attr(xsd_attrs::NAME)
            .ok_or_else(|| Error::Schema("attribute is missing 'name'".to_string()))?;
        let type_name = match node.attr(xsd_attrs::TYPE) {
            Some(type_attr) => self.resolve_type_name(node, type_attr)?,
            None => QName::namespaced(XSD_NAMESPACE, "anySimpleType"),
        };
        // Attribute names are unqualified unless the schema says otherwise
        let mut decl = AttributeDecl::new(QName::local(name), type_name);
        decl.required = node.attr(xsd_attrs::USE) == Some("required");
        decl.default = node.attr(xsd_attrs::DEFAULT).map(String::from);
        Ok(decl)
    }

    /// Resolve a QName-valued attribute (type=, base=, ref=) against the
    /// node's in-scope namespaces. Unprefixed names with no default
    /// namespace fall back to the target namespace.
    fn resolve_type_name(&self, node: &XmlNode, raw: &str) -> Result<QName> {
        let resolved = node.namespaces.resolve(raw)?;
        if resolved.namespace.is_none() {
            if let Some(tns) = &self.target_namespace {
                return Ok(QName::namespaced(tns.clone(), resolved.local_name));
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::components::TypeDef;
    use crate::schema::index::{xs, SchemaIndex, SchemaSet};

    const SAMPLE: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                    xmlns:geo="http://example.com/geo"
                    targetNamespace="http://example.com/geo">
          <xsd:element name="point" type="geo:PointType"/>
          <xsd:complexType name="PointType">
            <xsd:sequence>
              <xsd:element name="coord" type="xsd:double"
                           minOccurs="2" maxOccurs="3"/>
            </xsd:sequence>
            <xsd:attribute name="srsName" type="xsd:string"/>
          </xsd:complexType>
        </xsd:schema>
    "#;

    #[test]
    fn test_read_elements_and_types() {
        let doc = read_schema(SAMPLE).unwrap();
        assert_eq!(
            doc.schema.target_namespace.as_deref(),
            Some("http://example.com/geo")
        );
        assert_eq!(doc.schema.elements.len(), 1);
        assert_eq!(doc.schema.types.len(), 1);
        assert!(doc.includes.is_empty());

        let point = doc
            .schema
            .elements
            .get(&QName::namespaced("http://example.com/geo", "point"))
            .unwrap();
        assert_eq!(point.type_name.local_name, "PointType");
    }

    #[test]
    fn test_occurs_carried_into_index() {
        let doc = read_schema(SAMPLE).unwrap();
        let mut set = SchemaSet::new();
        set.add_schema(doc.schema);
        let index = SchemaIndex::new(&set);

        let point_type = index.type_def(&QName::local("PointType")).unwrap();
        assert_eq!(
            index.min_occurs(&point_type, &QName::local("coord")).unwrap(),
            2
        );
        assert_eq!(
            index.max_occurs(&point_type, &QName::local("coord")).unwrap(),
            Some(3)
        );
    }

    #[test]
    fn test_inline_anonymous_type_is_synthesized() {
        let xml = r#"
            <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
              <xsd:element name="box">
                <xsd:complexType>
                  <xsd:sequence>
                    <xsd:element name="width" type="xsd:int"/>
                  </xsd:sequence>
                </xsd:complexType>
              </xsd:element>
            </xsd:schema>
        "#;
        let doc = read_schema(xml).unwrap();
        let decl = doc.schema.elements.get(&QName::local("box")).unwrap();
        assert_eq!(decl.type_name.local_name, "_box");
        assert!(doc.schema.types.contains_key(&QName::local("_box")));
    }

    #[test]
    fn test_extension_base_recorded() {
        let xml = r#"
            <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                        xmlns:geo="http://example.com/geo"
                        targetNamespace="http://example.com/geo">
              <xsd:complexType name="NamedPlaceType">
                <xsd:complexContent>
                  <xsd:extension base="geo:PlaceType">
                    <xsd:sequence>
                      <xsd:element name="name" type="xsd:string"/>
                    </xsd:sequence>
                  </xsd:extension>
                </xsd:complexContent>
              </xsd:complexType>
              <xsd:complexType name="PlaceType"/>
            </xsd:schema>
        "#;
        let doc = read_schema(xml).unwrap();
        let named = doc
            .schema
            .types
            .get(&QName::namespaced("http://example.com/geo", "NamedPlaceType"))
            .unwrap();
        match named {
            TypeDef::Complex(c) => {
                assert_eq!(c.base.as_ref().unwrap().local_name, "PlaceType");
                assert!(c.particle.is_some());
            }
            TypeDef::Simple(_) => panic!("expected complex type"),
        }
    }

    #[test]
    fn test_simple_type_restriction() {
        let xml = r#"
            <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
              <xsd:simpleType name="Angle">
                <xsd:restriction base="xsd:double"/>
              </xsd:simpleType>
            </xsd:schema>
        "#;
        let doc = read_schema(xml).unwrap();
        let angle = doc.schema.types.get(&QName::local("Angle")).unwrap();
        assert_eq!(angle.base(), Some(&xs("double")));
    }

    #[test]
    fn test_includes_collected() {
        let xml = r#"
            <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
              <xsd:include schemaLocation="base.xsd"/>
              <xsd:import namespace="http://other" schemaLocation="other.xsd"/>
            </xsd:schema>
        "#;
        let doc = read_schema(xml).unwrap();
        assert_eq!(doc.includes, vec!["base.xsd", "other.xsd"]);
    }

    #[test]
    fn test_non_schema_root_rejected() {
        assert!(read_schema("<notaschema/>").is_err());
    }
}
