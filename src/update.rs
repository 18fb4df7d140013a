//! Update instructions against the data graph.
//!
//! Supports the data forms of the update language:
//!
//! ```text
//! PREFIX ex: <http://example.org/>
//! INSERT DATA { ex:a ex:b "c" . GRAPH <http://example.org/g> { ex:a ex:b ex:d } } ;
//! DELETE DATA { ex:a ex:b "c" }
//! ```
//!
//! Triple blocks are read with the Turtle reader. Triples outside a `GRAPH`
//! block address the default graph. Pattern-based forms (`DELETE WHERE`,
//! `INSERT { } WHERE { }`, `LOAD`, ...) are rejected.

use crate::graph::{DEFAULT_GRAPH, Dataset, Graph, turtle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("unsupported update operation '{0}'")]
    Unsupported(String),
    #[error("blank nodes are not allowed in DELETE DATA")]
    BlankInDelete,
    #[error(transparent)]
    Turtle(#[from] turtle::TurtleError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operation {
    Insert,
    Delete,
}

/// Per-operation counts, for reporting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub inserted: usize,
    pub deleted: usize,
}

/// Execute `instruction` against `dataset`.
///
/// `scope` keeps blank nodes created by this instruction distinct from
/// blank nodes of loaded documents and other instructions.
pub fn apply_update(
    dataset: &mut Dataset,
    instruction: &str,
    base: Option<&str>,
    scope: &str,
) -> Result<UpdateSummary, UpdateError> {
    let mut scanner = Scanner::new(instruction);
    let mut prologue = String::new();
    let mut summary = UpdateSummary::default();
    let mut op_index = 0;

    loop {
        scanner.skip_trivia();
        if scanner.at_end() {
            return Ok(summary);
        }
        if scanner.eat(';') {
            continue;
        }
        let position = scanner.pos;
        let keyword = scanner.word();
        match keyword.to_ascii_uppercase().as_str() {
            "PREFIX" => {
                let name = scanner.until_inclusive(':', position)?;
                let iri = scanner.iri(position)?;
                prologue.push_str(&format!("PREFIX {} <{iri}>\n", name.trim()));
            }
            "BASE" => {
                let iri = scanner.iri(position)?;
                prologue.push_str(&format!("BASE <{iri}>\n"));
            }
            "INSERT" | "DELETE" => {
                let operation = if keyword.eq_ignore_ascii_case("INSERT") {
                    Operation::Insert
                } else {
                    Operation::Delete
                };
                scanner.skip_trivia();
                let data = scanner.word();
                if !data.eq_ignore_ascii_case("DATA") {
                    return Err(UpdateError::Unsupported(format!(
                        "{keyword} {data}"
                    )));
                }
                let body = scanner.braced(position)?;
                op_index += 1;
                let op_scope = format!("{scope}/{op_index}");
                for (graph_name, triples) in split_graph_blocks(&body, position)? {
                    let text = format!("{prologue}{}", terminate(&triples));
                    let mut parsed = Graph::new("urn:x-sempipe:update");
                    turtle::parse_into(&text, base, &op_scope, &mut parsed)?;
                    let target_name = match graph_name {
                        Some(reference) => resolve_graph_name(&prologue, &reference, base)?,
                        None => DEFAULT_GRAPH.to_string(),
                    };
                    let target = dataset.graph_mut(&target_name);
                    match operation {
                        Operation::Insert => {
                            for triple in parsed.iter() {
                                if target.insert(triple.clone()) {
                                    summary.inserted += 1;
                                }
                            }
                        }
                        Operation::Delete => {
                            for triple in parsed.iter() {
                                if triple.subject.is_blank() || triple.object.is_blank() {
                                    return Err(UpdateError::BlankInDelete);
                                }
                                if target.remove(triple) {
                                    summary.deleted += 1;
                                }
                            }
                        }
                    }
                }
            }
            "" => {
                return Err(UpdateError::Syntax {
                    position,
                    message: "expected an update operation".into(),
                });
            }
            _ => return Err(UpdateError::Unsupported(keyword)),
        }
    }
}

/// Triple blocks may omit the final `.`, the Turtle reader requires it.
fn terminate(triples: &str) -> String {
    let trimmed = triples.trim();
    if trimmed.is_empty() || trimmed.ends_with('.') {
        trimmed.to_string()
    } else {
        format!("{trimmed} .")
    }
}

/// Resolve a `GRAPH` name (IRI or prefixed name) by parsing a one-triple
/// document with the same prologue.
fn resolve_graph_name(
    prologue: &str,
    reference: &str,
    base: Option<&str>,
) -> Result<String, UpdateError> {
    let document = format!("{prologue}{reference} {reference} {reference} .");
    let mut graph = Graph::new("urn:x-sempipe:graph-name");
    turtle::parse_into(&document, base, "graph-name", &mut graph)?;
    Ok(graph
        .iter()
        .next()
        .map(|t| t.subject.value().to_string())
        .unwrap_or_default())
}

/// Split a data block into `(graph, triples)` parts; `None` is the default graph.
fn split_graph_blocks(
    body: &str,
    position: usize,
) -> Result<Vec<(Option<String>, String)>, UpdateError> {
    let mut parts = Vec::new();
    let mut default = String::new();
    let mut scanner = Scanner::new(body);
    loop {
        let start = scanner.pos;
        scanner.skip_to_graph_keyword();
        default.push_str(&scanner.slice(start, scanner.pos));
        if scanner.at_end() {
            break;
        }
        scanner.word();
        scanner.skip_trivia();
        let name_start = scanner.pos;
        while scanner.peek().is_some_and(|c| !c.is_whitespace() && c != '{') {
            scanner.pos += 1;
        }
        let name = scanner.slice(name_start, scanner.pos);
        if name.is_empty() {
            return Err(UpdateError::Syntax {
                position,
                message: "GRAPH without a name".into(),
            });
        }
        let triples = scanner.braced(position)?;
        parts.push((Some(name), triples));
    }
    if !default.trim().is_empty() {
        parts.insert(0, (None, default));
    }
    Ok(parts)
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        self.chars[start.min(end)..end].iter().collect()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        self.slice(start, self.pos)
    }

    fn until_inclusive(&mut self, end: char, position: usize) -> Result<String, UpdateError> {
        self.skip_trivia();
        let start = self.pos;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == end {
                return Ok(self.slice(start, self.pos));
            }
        }
        Err(UpdateError::Syntax {
            position,
            message: format!("expected '{end}'"),
        })
    }

    fn iri(&mut self, position: usize) -> Result<String, UpdateError> {
        self.skip_trivia();
        if !self.eat('<') {
            return Err(UpdateError::Syntax {
                position,
                message: "expected IRI".into(),
            });
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '>' {
                let iri = self.slice(start, self.pos);
                self.pos += 1;
                return Ok(iri);
            }
            self.pos += 1;
        }
        Err(UpdateError::Syntax {
            position,
            message: "unterminated IRI".into(),
        })
    }

    /// Skip a string literal starting at the current quote character.
    fn skip_string(&mut self) {
        let Some(quote) = self.peek() else { return };
        let long = self.chars.get(self.pos + 1) == Some(&quote)
            && self.chars.get(self.pos + 2) == Some(&quote);
        self.pos += if long { 3 } else { 1 };
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 2;
                continue;
            }
            if c == quote {
                if !long {
                    self.pos += 1;
                    return;
                }
                if self.chars.get(self.pos + 1) == Some(&quote)
                    && self.chars.get(self.pos + 2) == Some(&quote)
                {
                    self.pos += 3;
                    return;
                }
            }
            self.pos += 1;
        }
    }

    /// Content between a `{` and its matching `}`, ignoring braces in
    /// strings, IRIs and comments.
    fn braced(&mut self, position: usize) -> Result<String, UpdateError> {
        self.skip_trivia();
        if !self.eat('{') {
            return Err(UpdateError::Syntax {
                position,
                message: "expected '{'".into(),
            });
        }
        let start = self.pos;
        let mut depth = 1;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    self.skip_string();
                    continue;
                }
                '<' => {
                    while self.peek().is_some_and(|c| c != '>') {
                        self.pos += 1;
                    }
                }
                '#' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let body = self.slice(start, self.pos);
                        self.pos += 1;
                        return Ok(body);
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(UpdateError::Syntax {
            position,
            message: "unbalanced braces".into(),
        })
    }

    /// Advance to the next top-level `GRAPH` keyword, or to the end.
    fn skip_to_graph_keyword(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    self.skip_string();
                    continue;
                }
                '<' => {
                    while self.peek().is_some_and(|c| c != '>') {
                        self.pos += 1;
                    }
                }
                '#' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                    continue;
                }
                c if c.is_ascii_alphabetic() => {
                    let preceded_by_name = self.pos > 0 && is_name_char(self.chars[self.pos - 1]);
                    let start = self.pos;
                    let word = self.word();
                    let followed_by_name = self.peek().is_some_and(|c| c == ':' || c == '_');
                    if word.eq_ignore_ascii_case("GRAPH") && !preceded_by_name && !followed_by_name {
                        self.pos = start;
                        return;
                    }
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.')
}
