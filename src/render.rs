//! Rendering and transformation of representations.
//!
//! Rendering turns a subject's description into an XML document; each
//! `semp:transformation` step then turns one document into the next. Both
//! are trait seams so the builder can be exercised without external tools.
//!
//! [`DescriptionRenderer`] emits the subject's properties directly:
//!
//! ```xml
//! <resource about="http://example.org/hello">
//!   <property predicate="http://purl.org/dc/terms/title">
//!     <literal lang="en">Hello</literal>
//!   </property>
//!   <property predicate="http://example.org/author">
//!     <resource about="http://example.org/me"/>
//!   </property>
//! </resource>
//! ```
//!
//! Blank node objects are rendered inline as nested `resource` elements.
//! [`CommandTransformer`] pipes a document through an external command such
//! as `xsltproc`.

use crate::exec::{Cmd, ExecError};
use crate::graph::{Term, TripleSource};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::HashSet;
use std::io::Cursor;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("XML write error: {0}")]
    Xml(String),
    #[error("transformation {step} failed: {source}")]
    Transform { step: String, source: ExecError },
    #[error("transformation command is empty")]
    EmptyCommand,
}

/// A serialized document passed between pipeline steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document(Vec<u8>);

impl Document {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn to_document(&self) -> Result<Document, RenderError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| RenderError::Xml(e.to_string()))?;
        write_element(&mut writer, self)?;
        let mut bytes = writer.into_inner().into_inner();
        bytes.push(b'\n');
        Ok(Document(bytes))
    }
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, element: &Element) -> Result<(), RenderError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| RenderError::Xml(e.to_string()));
    }
    writer
        .write_event(Event::Start(start))
        .map_err(|e| RenderError::Xml(e.to_string()))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| RenderError::Xml(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| RenderError::Xml(e.to_string()))
}

/// Produces the initial document of a `semp:Render` representation.
pub trait Renderer: Sync {
    fn render(&self, subject: &Term, graph: &dyn TripleSource) -> Result<Document, RenderError>;
}

/// Applies one `semp:transformation` step.
pub trait Transformer: Sync {
    fn transform(&self, document: &Document, step: &Term) -> Result<Document, RenderError>;
}

/// Renders the subject's description as XML.
pub struct DescriptionRenderer;

impl DescriptionRenderer {
    pub fn describe(subject: &Term, graph: &dyn TripleSource) -> Element {
        let mut path = HashSet::new();
        describe_node(subject, graph, &mut path)
    }
}

impl Renderer for DescriptionRenderer {
    fn render(&self, subject: &Term, graph: &dyn TripleSource) -> Result<Document, RenderError> {
        Self::describe(subject, graph).to_document()
    }
}

fn describe_node(subject: &Term, graph: &dyn TripleSource, path: &mut HashSet<Term>) -> Element {
    let mut element = Element::new("resource");
    if let Some(iri) = subject.as_iri() {
        element = element.attr("about", iri);
    }
    path.insert(subject.clone());
    for (predicate, object) in graph.description(subject) {
        let mut property = Element::new("property").attr("predicate", predicate);
        property.push(match &object {
            Term::Iri(iri) => Element::new("resource").attr("about", iri.as_str()),
            // Cycles through blank nodes are cut off.
            Term::Blank(_) if path.contains(&object) => Element::new("resource"),
            Term::Blank(_) => describe_node(&object, graph, path),
            Term::Literal(lit) => {
                let mut literal = Element::new("literal");
                if let Some(lang) = &lit.language {
                    literal = literal.attr("lang", lang.as_str());
                } else if let Some(datatype) = &lit.datatype {
                    literal = literal.attr("datatype", datatype.as_str());
                }
                literal.text(lit.lexical.as_str())
            }
        });
        element.push(property);
    }
    path.remove(subject);
    element
}

/// Default transformation command.
pub fn default_transform_command() -> Vec<String> {
    ["xsltproc", "{stylesheet}", "-"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Pipes documents through an external command.
///
/// `{stylesheet}` in the command is replaced by the step: a local path for
/// `file:` IRIs, the IRI itself otherwise. The document goes to stdin and
/// the result is read from stdout.
pub struct CommandTransformer {
    command: Vec<String>,
}

impl CommandTransformer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn invocation(&self, step: &Term) -> Vec<String> {
        let stylesheet = stylesheet_location(step);
        self.command
            .iter()
            .map(|part| part.replace("{stylesheet}", &stylesheet))
            .collect()
    }
}

impl Default for CommandTransformer {
    fn default() -> Self {
        Self::new(default_transform_command())
    }
}

impl Transformer for CommandTransformer {
    fn transform(&self, document: &Document, step: &Term) -> Result<Document, RenderError> {
        let invocation = self.invocation(step);
        if invocation.is_empty() {
            return Err(RenderError::EmptyCommand);
        }
        let output = Cmd::from_slice(invocation.as_slice())
            .stdin(document.as_bytes())
            .run()
            .map_err(|source| RenderError::Transform {
                step: step.value().to_string(),
                source,
            })?;
        Ok(Document(output.stdout))
    }
}

fn stylesheet_location(step: &Term) -> String {
    let value = step.value();
    Url::parse(value)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| value.to_string())
}
