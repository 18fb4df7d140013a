//! In-memory triples and the exact-pattern queries the pipeline needs.
//!
//! This is deliberately not a query engine. A [`Graph`] is a named,
//! set-semantics list of triples kept in insertion order (declaration order
//! matters for update instructions). Anything that can hand out a list of
//! graphs implements [`TripleSource`] and gets the pattern queries for free,
//! evaluated over the union of its graphs:
//!
//! | Query | Pattern |
//! |---|---|
//! | [`objects`](TripleSource::objects) | `s p ?o` |
//! | [`value`](TripleSource::value) | first `s p ?o` |
//! | [`subjects`](TripleSource::subjects) | `?s p o` |
//! | [`list`](TripleSource::list) | RDF collection starting at a node |
//! | [`description`](TripleSource::description) | `s ?p ?o`, sorted |

pub mod serialize;
pub mod turtle;

use crate::vocab::rdf;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Name of the data graph that update instructions write to when they do not
/// name a graph themselves.
pub const DEFAULT_GRAPH: &str = "urn:x-sempipe:default";

/// An RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    /// Blank node label, already scoped to the document it came from.
    Blank(String),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::Blank(label.into())
    }

    /// Plain string literal.
    pub fn literal(lexical: impl Into<String>) -> Self {
        Term::Literal(Literal {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        })
    }

    pub fn lang_literal(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        })
    }

    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        })
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    /// The IRI of a named node, the label of a blank node, or the lexical
    /// form of a literal.
    pub fn value(&self) -> &str {
        match self {
            Term::Iri(v) | Term::Blank(v) => v,
            Term::Literal(lit) => &lit.lexical,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(label) => write!(f, "_:{label}"),
            Term::Literal(lit) => {
                write!(f, "\"{}\"", serialize::escape_literal(&lit.lexical))?;
                if let Some(lang) = &lit.language {
                    write!(f, "@{lang}")
                } else if let Some(dt) = &lit.datatype {
                    write!(f, "^^<{dt}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    fn has_predicate(&self, predicate: &str) -> bool {
        self.predicate.as_iri() == Some(predicate)
    }
}

/// A named set of triples.
///
/// Insertion order is preserved; inserting a triple that is already present
/// is a no-op, so merging the same content twice leaves the graph unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredGraph", into = "StoredGraph")]
pub struct Graph {
    name: String,
    triples: Vec<Triple>,
    index: HashSet<Triple>,
}

/// Serialized shape of a [`Graph`]; the lookup index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct StoredGraph {
    name: String,
    triples: Vec<Triple>,
}

impl From<StoredGraph> for Graph {
    fn from(stored: StoredGraph) -> Self {
        let mut graph = Graph::new(stored.name);
        for triple in stored.triples {
            graph.insert(triple);
        }
        graph
    }
}

impl From<Graph> for StoredGraph {
    fn from(graph: Graph) -> Self {
        Self {
            name: graph.name,
            triples: graph.triples,
        }
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.index == other.index
    }
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            triples: Vec::new(),
            index: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.index.insert(triple.clone()) {
            self.triples.push(triple);
            true
        } else {
            false
        }
    }

    pub fn add(&mut self, subject: Term, predicate: Term, object: Term) -> bool {
        self.insert(Triple::new(subject, predicate, object))
    }

    /// Remove a triple. Returns `false` if it was not present.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        if self.index.remove(triple) {
            self.triples.retain(|t| t != triple);
            true
        } else {
            false
        }
    }

    /// Merge all triples of `other` into this graph.
    pub fn extend(&mut self, other: &Graph) {
        for triple in other.iter() {
            self.insert(triple.clone());
        }
    }

    pub fn contains_triple(&self, triple: &Triple) -> bool {
        self.index.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }
}

/// Pattern queries over the union of one or more graphs.
pub trait TripleSource {
    /// The graphs whose union is queried, in precedence order.
    fn fragments(&self) -> Vec<&Graph>;

    /// All objects of `subject predicate ?o`, first occurrence order, no duplicates.
    fn objects(&self, subject: &Term, predicate: &str) -> Vec<Term> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for graph in self.fragments() {
            for t in graph.iter() {
                if t.has_predicate(predicate) && &t.subject == subject && seen.insert(&t.object) {
                    out.push(t.object.clone());
                }
            }
        }
        out
    }

    /// First object of `subject predicate ?o`, if any.
    fn value(&self, subject: &Term, predicate: &str) -> Option<Term> {
        self.fragments().into_iter().find_map(|graph| {
            graph
                .iter()
                .find(|t| t.has_predicate(predicate) && &t.subject == subject)
                .map(|t| t.object.clone())
        })
    }

    /// All subjects of `?s predicate object`, first occurrence order, no duplicates.
    fn subjects(&self, predicate: &str, object: &Term) -> Vec<Term> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for graph in self.fragments() {
            for t in graph.iter() {
                if t.has_predicate(predicate) && &t.object == object && seen.insert(&t.subject) {
                    out.push(t.subject.clone());
                }
            }
        }
        out
    }

    fn contains(&self, subject: &Term, predicate: &str, object: &Term) -> bool {
        self.fragments().into_iter().any(|graph| {
            graph.iter().any(|t| {
                t.has_predicate(predicate) && &t.subject == subject && &t.object == object
            })
        })
    }

    /// Items of the RDF collection starting at `head`.
    ///
    /// Walking stops at `rdf:nil`, at a node without `rdf:first`, or when a
    /// node repeats.
    fn list(&self, head: &Term) -> Vec<Term> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut node = head.clone();
        while node.as_iri() != Some(rdf::NIL) && visited.insert(node.clone()) {
            let Some(first) = self.value(&node, rdf::FIRST) else {
                break;
            };
            items.push(first);
            match self.value(&node, rdf::REST) {
                Some(rest) => node = rest,
                None => break,
            }
        }
        items
    }

    /// Every `(predicate, object)` pair of `subject`, sorted and deduplicated.
    fn description(&self, subject: &Term) -> Vec<(String, Term)> {
        let mut pairs: Vec<(String, Term)> = self
            .fragments()
            .into_iter()
            .flat_map(|graph| graph.iter())
            .filter(|t| &t.subject == subject)
            .filter_map(|t| {
                t.predicate
                    .as_iri()
                    .map(|p| (p.to_string(), t.object.clone()))
            })
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }
}

impl TripleSource for Graph {
    fn fragments(&self) -> Vec<&Graph> {
        vec![self]
    }
}

/// A borrowed, read-only union of graphs.
#[derive(Debug, Clone, Default)]
pub struct GraphUnion<'a> {
    parts: Vec<&'a Graph>,
}

impl<'a> GraphUnion<'a> {
    pub fn new(parts: Vec<&'a Graph>) -> Self {
        Self { parts }
    }

    pub fn push(&mut self, graph: &'a Graph) {
        self.parts.push(graph);
    }
}

impl TripleSource for GraphUnion<'_> {
    fn fragments(&self) -> Vec<&Graph> {
        self.parts.clone()
    }
}

/// A set of named graphs; the project's data graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    graphs: Vec<Graph>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self, name: &str) -> Option<&Graph> {
        self.graphs.iter().find(|g| g.name() == name)
    }

    /// The graph called `name`, created empty if it does not exist yet.
    pub fn graph_mut(&mut self, name: &str) -> &mut Graph {
        let pos = match self.graphs.iter().position(|g| g.name() == name) {
            Some(pos) => pos,
            None => {
                self.graphs.push(Graph::new(name));
                self.graphs.len() - 1
            }
        };
        &mut self.graphs[pos]
    }

    /// Merge `graph` into the graph of the same name.
    pub fn merge_graph(&mut self, graph: &Graph) {
        self.graph_mut(graph.name()).extend(graph);
    }

    pub fn contains_graph(&self, name: &str) -> bool {
        self.graph(name).is_some()
    }

    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.graphs.iter()
    }

    /// Total number of triples over all graphs.
    pub fn len(&self) -> usize {
        self.graphs.iter().map(Graph::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.iter().all(Graph::is_empty)
    }
}

impl TripleSource for Dataset {
    fn fragments(&self) -> Vec<&Graph> {
        self.graphs.iter().collect()
    }
}
