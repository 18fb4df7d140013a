//! Configuration and data loading.
//!
//! Configuration starts at the root document and follows `semp:confGraph`
//! links, both those a document declares for itself and those declared for
//! the project, until every reachable document is merged. Traversal uses an
//! explicit worklist and the set of merged documents, so import cycles and
//! repeated imports load each document once and loading is idempotent.
//!
//! Data documents (`<project> semp:dataGraph <d>`) become named graphs of the
//! project dataset; `<project> semp:update "…"` instructions then run in
//! declaration order. Any fetch, parse or update failure aborts the load.

use crate::graph::turtle::{self, TurtleError};
use crate::graph::{Dataset, Graph, Term, TripleSource};
use crate::store::Snapshot;
use crate::update::{self, UpdateError, UpdateSummary};
use crate::vocab;
use std::io;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot fetch {uri}: {source}")]
    Fetch { uri: String, source: io::Error },
    #[error("cannot fetch {0}: only file: URIs are supported")]
    UnsupportedScheme(String),
    #[error("malformed document URI {uri}: {message}")]
    InvalidUri { uri: String, message: String },
    #[error("cannot parse {uri}: {source}")]
    Parse { uri: String, source: TurtleError },
    #[error("update instruction failed: {source}\n{instruction}")]
    Update {
        instruction: String,
        source: UpdateError,
    },
}

/// Retrieves document text by URI.
pub trait Fetcher: Sync {
    fn fetch(&self, uri: &str) -> Result<String, LoadError>;
}

/// Reads `file:` URIs from the local file system.
pub struct FileFetcher;

impl Fetcher for FileFetcher {
    fn fetch(&self, uri: &str) -> Result<String, LoadError> {
        let url = Url::parse(uri).map_err(|e| LoadError::InvalidUri {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;
        if url.scheme() != "file" {
            return Err(LoadError::UnsupportedScheme(uri.to_string()));
        }
        let path = url.to_file_path().map_err(|_| LoadError::InvalidUri {
            uri: uri.to_string(),
            message: "not a local path".into(),
        })?;
        std::fs::read_to_string(&path).map_err(|source| LoadError::Fetch {
            uri: uri.to_string(),
            source,
        })
    }
}

/// The merged configuration: one immutable fragment per loaded document,
/// queried as their union.
#[derive(Debug, Clone, Default)]
pub struct ConfGraph {
    fragments: Vec<Graph>,
}

impl ConfGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_document(&self, uri: &str) -> bool {
        self.fragments.iter().any(|g| g.name() == uri)
    }

    /// Add a document's graph. A document that is already merged is left
    /// untouched and `false` is returned.
    pub fn add_fragment(&mut self, graph: Graph) -> bool {
        if self.contains_document(graph.name()) {
            return false;
        }
        self.fragments.push(graph);
        true
    }

    /// Loaded document URIs in load order.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(Graph::name)
    }

    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.fragments.iter()
    }

    /// Total triples over all fragments.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(Graph::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl TripleSource for ConfGraph {
    fn fragments(&self) -> Vec<&Graph> {
        self.fragments.iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Conf,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Fetched,
    /// Taken from the persisted snapshot.
    Stored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStep {
    pub uri: String,
    pub kind: DocumentKind,
    pub origin: Origin,
}

/// What a load did, for display.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub steps: Vec<LoadStep>,
    pub updates: Vec<UpdateSummary>,
}

/// Shared state of one load run.
pub struct Loader<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub snapshot: &'a mut Snapshot,
    pub report: LoadReport,
}

impl<'a> Loader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, snapshot: &'a mut Snapshot) -> Self {
        Self {
            fetcher,
            snapshot,
            report: LoadReport::default(),
        }
    }

    /// Merge `root` and everything it imports into `conf`.
    pub fn load_config(
        &mut self,
        conf: &mut ConfGraph,
        root: &str,
        project_uri: &str,
    ) -> Result<(), LoadError> {
        let project = Term::iri(project_uri);
        let mut worklist = vec![root.to_string()];
        while let Some(uri) = worklist.pop() {
            if conf.contains_document(&uri) {
                continue;
            }
            let graph = self.document(&uri, DocumentKind::Conf)?;
            let mut imports = graph.objects(&Term::iri(uri.as_str()), vocab::CONF_GRAPH);
            conf.add_fragment(graph);
            for import in conf.objects(&project, vocab::CONF_GRAPH) {
                if !imports.contains(&import) {
                    imports.push(import);
                }
            }
            // Reverse so the first declared import is visited first.
            for import in imports.into_iter().rev() {
                if let Some(iri) = import.as_iri()
                    && !conf.contains_document(iri)
                {
                    worklist.push(iri.to_string());
                }
            }
        }
        Ok(())
    }

    /// Load declared data documents into `dataset`, then run update
    /// instructions in declaration order.
    pub fn load_data(
        &mut self,
        dataset: &mut Dataset,
        conf: &ConfGraph,
        project_uri: &str,
    ) -> Result<(), LoadError> {
        let project = Term::iri(project_uri);
        for data in conf.objects(&project, vocab::DATA_GRAPH) {
            let Some(uri) = data.as_iri() else { continue };
            if dataset.contains_graph(uri) {
                continue;
            }
            let graph = self.document(uri, DocumentKind::Data)?;
            dataset.merge_graph(&graph);
        }
        for (i, instruction) in conf.objects(&project, vocab::UPDATE).iter().enumerate() {
            let text = instruction.value();
            let scope = format!("{project_uri}#update-{i}");
            let summary = update::apply_update(dataset, text, Some(project_uri), &scope)
                .map_err(|source| LoadError::Update {
                    instruction: text.to_string(),
                    source,
                })?;
            self.report.updates.push(summary);
        }
        Ok(())
    }

    fn document(&mut self, uri: &str, kind: DocumentKind) -> Result<Graph, LoadError> {
        let stored = match kind {
            DocumentKind::Conf => self.snapshot.conf_document(uri),
            DocumentKind::Data => self.snapshot.data_document(uri),
        };
        let (graph, origin) = match stored {
            Some(graph) => (graph.clone(), Origin::Stored),
            None => {
                let text = self.fetcher.fetch(uri)?;
                let graph = turtle::parse_document(&text, uri).map_err(|source| {
                    LoadError::Parse {
                        uri: uri.to_string(),
                        source,
                    }
                })?;
                match kind {
                    DocumentKind::Conf => self.snapshot.record_conf(graph.clone()),
                    DocumentKind::Data => self.snapshot.record_data(graph.clone()),
                }
                (graph, Origin::Fetched)
            }
        };
        self.report.steps.push(LoadStep {
            uri: uri.to_string(),
            kind,
            origin,
        });
        Ok(graph)
    }
}
