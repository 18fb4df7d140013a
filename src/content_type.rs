//! File extensions for content types, as declared in the configuration.
//!
//! ```turtle
//! [] semp:content-type "text/html" ; semp:defaultExtension "html" .
//! ```
//!
//! There is no built-in table: a content type needs exactly one declared
//! extension.

use crate::graph::{Term, TripleSource};
use crate::vocab;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExtensionError {
    #[error("no default extension configured for content type {0}")]
    Missing(String),
    #[error("content type {content_type} has several default extensions: {}", .candidates.join(", "))]
    Ambiguous {
        content_type: String,
        candidates: Vec<String>,
    },
}

/// Extension for a representation, including the leading dot:
/// `.en.html`, `.html`, `.en` or `""`.
pub fn extension_for(
    conf: &dyn TripleSource,
    content_type: Option<&str>,
    language: Option<&str>,
) -> Result<String, ExtensionError> {
    let lang = language.map(|l| format!(".{l}")).unwrap_or_default();
    let Some(content_type) = content_type else {
        return Ok(lang);
    };

    let mut candidates: Vec<String> = Vec::new();
    for node in conf.subjects(vocab::CONTENT_TYPE, &Term::literal(content_type)) {
        for ext in conf.objects(&node, vocab::DEFAULT_EXTENSION) {
            let ext = ext.value().trim_start_matches('.').to_string();
            if !candidates.contains(&ext) {
                candidates.push(ext);
            }
        }
    }

    match candidates.len() {
        0 => Err(ExtensionError::Missing(content_type.to_string())),
        1 => Ok(format!("{lang}.{}", candidates[0])),
        _ => {
            candidates.sort();
            Err(ExtensionError::Ambiguous {
                content_type: content_type.to_string(),
                candidates,
            })
        }
    }
}
