//! Shared test utilities.
//!
//! Provides an in-memory [`Fetcher`] and a fixture project writer for tests
//! that need a project directory on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = write_project(&[
//!     ("sempipeconf.n3", &conf_doc("<./> semp:buildDir <build/> .")),
//!     ("hello.txt", "hello"),
//! ]);
//! let uri = project_uri(tmp.path());
//! ```

use crate::loader::{Fetcher, LoadError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use url::Url;

/// Prefix declaration for configuration documents.
pub const SEMP_PREFIX: &str = "@prefix semp: <http://www.andonyar.com/rec/2012/sempipe/voc#> .\n";

/// Configuration document text with the `semp:` prefix declared.
pub fn conf_doc(body: &str) -> String {
    format!("{SEMP_PREFIX}{body}")
}

// =========================================================================
// Fetching
// =========================================================================

/// Serves documents from a fixed table and records every fetch.
pub struct MockFetcher {
    documents: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new(documents: &[(&str, &str)]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|(uri, text)| (uri.to_string(), text.to_string()))
                .collect(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// URIs fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, uri: &str) -> Result<String, LoadError> {
        self.fetched.lock().unwrap().push(uri.to_string());
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| LoadError::Fetch {
                uri: uri.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
            })
    }
}

// =========================================================================
// Fixture projects
// =========================================================================

/// Write `files` (relative path, contents) into a fresh temp directory.
pub fn write_project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, contents) in files {
        let path = tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
    tmp
}

/// `file:` URI of a project directory, with the trailing slash.
pub fn project_uri(dir: &Path) -> String {
    Url::from_directory_path(dir).unwrap().to_string()
}
