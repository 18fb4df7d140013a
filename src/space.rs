//! Hosted spaces: mapping between resource URIs and build paths.
//!
//! A hosted space says "URIs under `baseURI` are built into
//! `buildDir + mapTo`". Mapping is textual: the space whose base (or build
//! prefix, for the reverse direction) is the longest prefix of the input
//! wins, and the remainder is appended unchanged.
//!
//! ```text
//! baseURI  http://example.org/docs/   mapTo "docs/"   buildDir "/out/"
//! http://example.org/docs/a/b.html  <->  /out/docs/a/b.html
//! ```

use crate::graph::{Term, TripleSource};
use crate::vocab::{self, rdf};
use thiserror::Error;

pub const DEFAULT_INDEX_NAME: &str = "index";
pub const DEFAULT_HTACCESS_NAME: &str = ".htaccess";

#[derive(Debug, Error, PartialEq)]
pub enum ResolutionError {
    #[error("no hosted space for URI {0}")]
    NoSpaceForUri(String),
    #[error("no hosted space for path {0}")]
    NoSpaceForPath(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostedSpace {
    pub base_uri: String,
    /// Sub-path of the build directory, `""` for the build directory itself.
    pub map_to: String,
    pub index_name: String,
    pub htaccess_name: String,
    pub publish_method: Option<Term>,
}

impl HostedSpace {
    pub fn new(base_uri: impl Into<String>, map_to: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            map_to: map_to.into(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            htaccess_name: DEFAULT_HTACCESS_NAME.to_string(),
            publish_method: None,
        }
    }

    /// Read every `semp:HostedSpace` node of the configuration.
    pub fn all_from(conf: &dyn TripleSource) -> Vec<HostedSpace> {
        conf.subjects(rdf::TYPE, &Term::iri(vocab::HOSTED_SPACE))
            .into_iter()
            .filter_map(|node| {
                let base_uri = node.as_iri()?.to_string();
                let literal = |predicate: &str, default: &str| {
                    conf.value(&node, predicate)
                        .map(|t| t.value().to_string())
                        .unwrap_or_else(|| default.to_string())
                };
                Some(HostedSpace {
                    map_to: literal(vocab::MAP_TO, ""),
                    index_name: literal(vocab::MAP_INDEX_TO, DEFAULT_INDEX_NAME),
                    htaccess_name: literal(vocab::MAP_HTACCESS_TO, DEFAULT_HTACCESS_NAME),
                    publish_method: conf.value(&node, vocab::PUBLISH_METHOD),
                    base_uri,
                })
            })
            .collect()
    }

    /// File location for `base` with extension `ext`; a directory-like base
    /// gets the index name.
    pub fn content_location(&self, base: &str, ext: &str) -> String {
        if base.ends_with('/') {
            format!("{base}{}{ext}", self.index_name)
        } else {
            format!("{base}{ext}")
        }
    }
}

/// The project's hosted spaces together with its build directory.
#[derive(Debug, Clone)]
pub struct SpaceTable {
    build_dir: String,
    spaces: Vec<HostedSpace>,
}

impl SpaceTable {
    pub fn new(build_dir: impl Into<String>, spaces: Vec<HostedSpace>) -> Self {
        Self {
            build_dir: build_dir.into(),
            spaces,
        }
    }

    pub fn build_dir(&self) -> &str {
        &self.build_dir
    }

    pub fn spaces(&self) -> &[HostedSpace] {
        &self.spaces
    }

    /// Build-directory prefix of `space`.
    pub fn local_path(&self, space: &HostedSpace) -> String {
        format!("{}{}", self.build_dir, space.map_to)
    }

    /// The space with the longest `baseURI` that prefixes `uri`.
    pub fn resolve(&self, uri: &str) -> Result<&HostedSpace, ResolutionError> {
        self.spaces
            .iter()
            .filter(|s| uri.starts_with(&s.base_uri))
            .max_by_key(|s| s.base_uri.len())
            .ok_or_else(|| ResolutionError::NoSpaceForUri(uri.to_string()))
    }

    /// The space with the longest build prefix that prefixes `path`.
    pub fn resolve_by_path(&self, path: &str) -> Result<&HostedSpace, ResolutionError> {
        self.spaces
            .iter()
            .map(|s| (s, self.local_path(s)))
            .filter(|(_, prefix)| path.starts_with(prefix.as_str()))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(s, _)| s)
            .ok_or_else(|| ResolutionError::NoSpaceForPath(path.to_string()))
    }

    /// `buildDir + mapTo + uri[len(baseURI):]`.
    pub fn build_location(&self, uri: &str) -> Result<String, ResolutionError> {
        let space = self.resolve(uri)?;
        Ok(format!(
            "{}{}",
            self.local_path(space),
            &uri[space.base_uri.len()..]
        ))
    }

    /// Inverse of [`build_location`](Self::build_location).
    pub fn uri_for_path(&self, path: &str) -> Result<String, ResolutionError> {
        let space = self.resolve_by_path(path)?;
        let prefix = self.local_path(space);
        Ok(format!("{}{}", space.base_uri, &path[prefix.len()..]))
    }
}
