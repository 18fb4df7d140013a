//! Content-negotiation artifacts.
//!
//! A resource with several representations is served through a type-map
//! written at its extensionless location:
//!
//! ```text
//! URI: hello
//!
//! URI: hello.en.html
//! Content-type: text/html; q=0.8
//! Content-language: en
//!
//! URI: hello.de.html
//! Content-type: text/html; q=0.2
//! Content-language: de
//! ```
//!
//! and each directory holding type-maps gets an access-control file that
//! hands them to the type-map handler:
//!
//! ```text
//! <Files "hello">
//!     SetHandler type-map
//! </Files>
//! ```
//!
//! Type-maps are only produced when at least one representation declares a
//! quality; without one there is nothing to negotiate on.

use crate::resource::Quality;
use crate::space::SpaceTable;
use std::collections::BTreeMap;
use std::path::Path;

/// A built representation as listed in a type-map.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapEntry {
    /// Location of the built file.
    pub path: String,
    pub content_type: String,
    pub language: Option<String>,
    pub quality: Option<Quality>,
}

/// Last path segment of a build location.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Type-map text for a resource whose extensionless location is `location`.
///
/// Only resources with a quality on some representation get one; see
/// [`Resource::has_quality`](crate::resource::Resource::has_quality).
pub fn typemap(location: &str, entries: &[TypeMapEntry]) -> String {
    let mut blocks = vec![format!("URI: {}\n", file_name(location))];
    for entry in entries {
        let mut block = format!("URI: {}\n", file_name(&entry.path));
        match entry.quality {
            Some(q) => block.push_str(&format!("Content-type: {}; q={q}\n", entry.content_type)),
            None => block.push_str(&format!("Content-type: {}\n", entry.content_type)),
        }
        if let Some(lang) = &entry.language {
            block.push_str(&format!("Content-language: {lang}\n"));
        }
        blocks.push(block);
    }
    blocks.join("\n")
}

/// Access-control files for the given type-map locations, as
/// `(file location, contents)`, one per directory.
pub fn access_control_files(
    spaces: &SpaceTable,
    typemaps: &[String],
) -> Vec<(String, String)> {
    let mut by_dir: BTreeMap<String, (String, Vec<&str>)> = BTreeMap::new();
    for location in typemaps {
        let name = file_name(location);
        let dir = &location[..location.len() - name.len()];
        let handler_name = spaces
            .resolve_by_path(location)
            .map(|s| s.htaccess_name.clone())
            .unwrap_or_else(|_| crate::space::DEFAULT_HTACCESS_NAME.to_string());
        by_dir
            .entry(dir.to_string())
            .or_insert_with(|| (handler_name, Vec::new()))
            .1
            .push(name);
    }
    by_dir
        .into_iter()
        .map(|(dir, (handler_name, mut names))| {
            names.sort_unstable();
            names.dedup();
            let body: String = names
                .iter()
                .map(|n| format!("<Files \"{n}\">\n    SetHandler type-map\n</Files>\n"))
                .collect();
            (format!("{dir}{handler_name}"), body)
        })
        .collect()
}

/// Write the access-control files and return their locations.
pub fn write_access_control(
    spaces: &SpaceTable,
    typemaps: &[String],
) -> std::io::Result<Vec<String>> {
    let mut written = Vec::new();
    for (location, body) in access_control_files(spaces, typemaps) {
        if let Some(parent) = Path::new(&location).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&location, body)?;
        written.push(location);
    }
    Ok(written)
}
