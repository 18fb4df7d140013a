//! Persisted snapshot of loaded documents.
//!
//! Fetching and parsing every configuration and data document on each run
//! is the slow part of a load. With `--store DIR` the parsed documents are
//! kept in `DIR/snapshot.json`; the loader takes documents from the snapshot
//! ("found in store") instead of fetching them again.
//!
//! The snapshot holds documents as they were parsed, before any update
//! instruction ran, so updates are applied fresh on every load.
//!
//! A missing, unreadable or version-mismatched snapshot loads as empty, which
//! simply means a full reload. Delete the store directory to force one.

use crate::graph::Graph;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the snapshot file within the store directory.
const SNAPSHOT_FILENAME: &str = "snapshot.json";

/// Bump to invalidate existing snapshots when the format changes.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot write snapshot {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("cannot encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    pub version: u32,
    conf: Vec<Graph>,
    data: Vec<Graph>,
    /// Runtime lookup: document URI → position in `conf`. Never serialized.
    #[serde(skip)]
    conf_index: HashMap<String, usize>,
    #[serde(skip)]
    data_index: HashMap<String, usize>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            conf: Vec::new(),
            data: Vec::new(),
            conf_index: HashMap::new(),
            data_index: HashMap::new(),
        }
    }

    /// Load from the store directory, or an empty snapshot if there is none
    /// usable.
    pub fn load(store_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(snapshot_path(store_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let mut snapshot: Self = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(_) => return Self::empty(),
        };
        if snapshot.version != SNAPSHOT_VERSION {
            return Self::empty();
        }
        snapshot.conf_index = build_index(&snapshot.conf);
        snapshot.data_index = build_index(&snapshot.data);
        snapshot
    }

    /// Save to the store directory, creating it if needed.
    pub fn save(&self, store_dir: &Path) -> Result<(), SnapshotError> {
        let path = snapshot_path(store_dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::create_dir_all(store_dir)
            .and_then(|_| std::fs::write(&path, json))
            .map_err(|source| SnapshotError::Io { path, source })
    }

    pub fn conf_document(&self, uri: &str) -> Option<&Graph> {
        self.conf_index.get(uri).map(|&i| &self.conf[i])
    }

    pub fn data_document(&self, uri: &str) -> Option<&Graph> {
        self.data_index.get(uri).map(|&i| &self.data[i])
    }

    /// Record a parsed configuration document, replacing any earlier copy.
    pub fn record_conf(&mut self, graph: Graph) {
        record(&mut self.conf, &mut self.conf_index, graph);
    }

    pub fn record_data(&mut self, graph: Graph) {
        record(&mut self.data, &mut self.data_index, graph);
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.conf.len() + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn record(graphs: &mut Vec<Graph>, index: &mut HashMap<String, usize>, graph: Graph) {
    match index.get(graph.name()) {
        Some(&i) => graphs[i] = graph,
        None => {
            index.insert(graph.name().to_string(), graphs.len());
            graphs.push(graph);
        }
    }
}

fn build_index(graphs: &[Graph]) -> HashMap<String, usize> {
    graphs
        .iter()
        .enumerate()
        .map(|(i, g)| (g.name().to_string(), i))
        .collect()
}

pub fn snapshot_path(store_dir: &Path) -> PathBuf {
    store_dir.join(SNAPSHOT_FILENAME)
}
