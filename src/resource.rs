//! Typed view of resource descriptions.
//!
//! ```turtle
//! <http://example.org/hello> a semp:Resource ;
//!     semp:source <hello.txt> ;
//!     semp:representation [
//!         semp:content-type "text/plain" ;
//!         semp:language "en" ;
//!         semp:quality 0.8 ;
//!         semp:buildCommand semp:Raw
//!     ] .
//! ```
//!
//! Reading a resource validates what can be checked without building
//! (qualities); the build command is checked when the representation is
//! dispatched, so that the error names the failing representation.

use crate::graph::{Term, TripleSource};
use crate::vocab::{self, rdf};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ResourceError {
    #[error("{resource}: representation {representation} has invalid quality {value:?} (expected a number between 0 and 1)")]
    InvalidQuality {
        resource: String,
        representation: String,
        value: String,
    },
    #[error("{resource}: representation {representation} has no build command")]
    MissingCommand {
        resource: String,
        representation: String,
    },
    #[error("{resource}: representation {representation} has unknown build command {command}")]
    UnknownCommand {
        resource: String,
        representation: String,
        command: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildCommand {
    /// Copy the source bytes.
    Raw,
    /// Render the subject and apply the transformation steps.
    Render,
    /// Serialize the resource's data graph.
    Serialize,
}

impl BuildCommand {
    pub fn from_iri(iri: &str) -> Option<Self> {
        match iri {
            vocab::RAW => Some(Self::Raw),
            vocab::RENDER => Some(Self::Render),
            vocab::SERIALIZE => Some(Self::Serialize),
            _ => None,
        }
    }
}

/// A content-negotiation quality in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f64);

impl Quality {
    pub fn parse(lexical: &str) -> Option<Self> {
        let value: f64 = lexical.trim().parse().ok()?;
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    pub id: Term,
    pub content_type: Option<String>,
    pub language: Option<String>,
    pub quality: Option<Quality>,
    pub command: Option<Term>,
    /// The representation's own source; see [`Resource::source_for`].
    pub source: Option<Term>,
    pub transformations: Vec<Term>,
}

impl Representation {
    /// Short identifier for messages.
    pub fn label(&self) -> String {
        match &self.id {
            Term::Blank(_) => "[]".to_string(),
            other => other.value().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub uri: String,
    /// Root node for rendering, when it differs from the resource.
    pub subject: Option<Term>,
    pub source: Option<Term>,
    /// Sorted by identifier.
    pub representations: Vec<Representation>,
}

impl Resource {
    pub fn read(graph: &dyn TripleSource, uri: &str) -> Result<Self, ResourceError> {
        let node = Term::iri(uri);
        let mut ids = graph.objects(&node, vocab::REPRESENTATION);
        ids.sort();

        let mut representations = Vec::with_capacity(ids.len());
        for id in ids {
            let text = |predicate: &str| graph.value(&id, predicate).map(|t| t.value().to_string());
            let quality = match text(vocab::QUALITY) {
                Some(value) => Some(Quality::parse(&value).ok_or_else(|| {
                    ResourceError::InvalidQuality {
                        resource: uri.to_string(),
                        representation: id.value().to_string(),
                        value,
                    }
                })?),
                None => None,
            };
            let transformations = graph
                .value(&id, vocab::TRANSFORMATION)
                .map(|head| graph.list(&head))
                .unwrap_or_default();
            representations.push(Representation {
                content_type: text(vocab::CONTENT_TYPE),
                language: text(vocab::LANGUAGE),
                quality,
                command: graph.value(&id, vocab::BUILD_COMMAND),
                source: graph.value(&id, vocab::SOURCE),
                transformations,
                id,
            });
        }

        Ok(Self {
            uri: uri.to_string(),
            subject: graph.value(&node, vocab::SUBJECT),
            source: graph.value(&node, vocab::SOURCE),
            representations,
        })
    }

    /// The node rendered for this resource.
    pub fn render_subject(&self) -> Term {
        self.subject
            .clone()
            .unwrap_or_else(|| Term::iri(self.uri.as_str()))
    }

    /// Source of `rep`, falling back to the resource's.
    pub fn source_for<'a>(&'a self, rep: &'a Representation) -> Option<&'a Term> {
        rep.source.as_ref().or(self.source.as_ref())
    }

    pub fn build_command(&self, rep: &Representation) -> Result<BuildCommand, ResourceError> {
        let command = rep.command.as_ref().ok_or_else(|| ResourceError::MissingCommand {
            resource: self.uri.clone(),
            representation: rep.label(),
        })?;
        command
            .as_iri()
            .and_then(BuildCommand::from_iri)
            .ok_or_else(|| ResourceError::UnknownCommand {
                resource: self.uri.clone(),
                representation: rep.label(),
                command: command.to_string(),
            })
    }

    /// Whether a type-map is produced for this resource.
    pub fn has_quality(&self) -> bool {
        self.representations.iter().any(|r| r.quality.is_some())
    }
}

/// URIs of every `semp:Resource`, sorted.
pub fn resources(graph: &dyn TripleSource) -> Vec<String> {
    let mut uris: Vec<String> = graph
        .subjects(rdf::TYPE, &Term::iri(vocab::RESOURCE))
        .into_iter()
        .filter_map(|t| t.as_iri().map(str::to_string))
        .collect();
    uris.sort();
    uris
}
