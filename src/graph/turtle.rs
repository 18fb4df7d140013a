//! Turtle reader for configuration and data documents.
//!
//! Covers the subset configuration documents use: `@prefix`/`PREFIX`,
//! `@base`/`BASE`, IRIs (relative ones resolved against the document base),
//! prefixed names, `a`, string literals in all four quoting styles with
//! language tags or datatypes, numbers, booleans, `;`/`,` lists, blank node
//! labels, `[ … ]` property lists and `( … )` collections.
//!
//! Blank node labels are scoped: the same `_:x` in two documents yields two
//! distinct nodes, so documents can be merged without relabelling.

use super::{Graph, Term, Triple};
use crate::vocab::{rdf, xsd};
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq)]
pub enum TurtleError {
    #[error("lexer error at position {position}: {message}")]
    Lexer { position: usize, message: String },
    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },
    #[error("cannot resolve IRI: {0}")]
    IriResolution(String),
    #[error("undefined prefix: {0}")]
    UndefinedPrefix(String),
}

impl TurtleError {
    fn lexer(position: usize, message: impl Into<String>) -> Self {
        Self::Lexer {
            position,
            message: message.into(),
        }
    }

    fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TurtleError>;

/// Parse a whole document into a new graph named after the document.
///
/// The document name doubles as the base IRI for relative references.
pub fn parse_document(input: &str, name: &str) -> Result<Graph> {
    let mut graph = Graph::new(name);
    parse_into(input, Some(name), name, &mut graph)?;
    Ok(graph)
}

/// Parse `input` and add its triples to `graph`.
///
/// `scope` keeps blank node labels of this input apart from those of any
/// other input merged into the same graph. Returns the number of triples
/// that were new to the graph.
pub fn parse_into(input: &str, base: Option<&str>, scope: &str, graph: &mut Graph) -> Result<usize> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        prefixes: HashMap::new(),
        base: base.map(str::to_string),
        scope: scope.to_string(),
        fresh: 0,
        out: Vec::new(),
    };
    parser.parse_document()?;
    Ok(parser.out.into_iter().filter(|t| graph.insert(t.clone())).count())
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Iri(String),
    PName { prefix: String, local: String },
    BlankLabel(String),
    Str(String),
    Integer(String),
    Decimal(String),
    Double(String),
    LangTag(String),
    AtPrefix,
    AtBase,
    SparqlPrefix,
    SparqlBase,
    A,
    True,
    False,
    DoubleCaret,
    Dot,
    Semicolon,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    start: usize,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    tok: Tok::Eof,
                    start,
                });
                return Ok(tokens);
            };
            let tok = match c {
                '<' => self.iri()?,
                '"' | '\'' => self.string(c)?,
                '@' => self.at_word()?,
                '_' if self.peek_at(1) == Some(':') => self.blank_label()?,
                '^' if self.peek_at(1) == Some('^') => {
                    self.pos += 2;
                    Tok::DoubleCaret
                }
                '0'..='9' | '+' | '-' => self.number()?,
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number()?,
                '.' => self.single(Tok::Dot),
                ';' => self.single(Tok::Semicolon),
                ',' => self.single(Tok::Comma),
                '[' => self.single(Tok::LBracket),
                ']' => self.single(Tok::RBracket),
                '(' => self.single(Tok::LParen),
                ')' => self.single(Tok::RParen),
                c if c == ':' || c.is_alphabetic() || c == '_' => self.name()?,
                other => {
                    return Err(TurtleError::lexer(
                        start,
                        format!("unexpected character '{other}'"),
                    ));
                }
            };
            tokens.push(Token { tok, start });
        }
    }

    fn single(&mut self, tok: Tok) -> Tok {
        self.pos += 1;
        tok
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn iri(&mut self) -> Result<Tok> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    return Ok(Tok::Iri(value));
                }
                Some('\\') => {
                    self.pos += 1;
                    value.push(self.unicode_escape(start)?);
                }
                Some(c) if c.is_whitespace() => {
                    return Err(TurtleError::lexer(self.pos, "whitespace inside IRI"));
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
                None => return Err(TurtleError::lexer(start, "unterminated IRI")),
            }
        }
    }

    /// Reads `uXXXX` or `UXXXXXXXX` after a backslash.
    fn unicode_escape(&mut self, start: usize) -> Result<char> {
        let len = match self.peek() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(TurtleError::lexer(self.pos, "invalid escape sequence")),
        };
        self.pos += 1;
        let end = self.pos + len;
        if end > self.chars.len() {
            return Err(TurtleError::lexer(start, "truncated unicode escape"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| TurtleError::lexer(start, format!("invalid unicode escape {hex}")))
    }

    fn string(&mut self, quote: char) -> Result<Tok> {
        let start = self.pos;
        let long = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if long { 3 } else { 1 };
        let mut value = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(TurtleError::lexer(start, "unterminated string"));
            };
            if c == quote {
                if !long {
                    self.pos += 1;
                    return Ok(Tok::Str(value));
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    return Ok(Tok::Str(value));
                }
                value.push(c);
                self.pos += 1;
            } else if c == '\\' {
                self.pos += 1;
                let escaped = match self.peek() {
                    Some('t') => '\t',
                    Some('b') => '\u{8}',
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('f') => '\u{c}',
                    Some('"') => '"',
                    Some('\'') => '\'',
                    Some('\\') => '\\',
                    Some('u') | Some('U') => {
                        value.push(self.unicode_escape(start)?);
                        continue;
                    }
                    _ => return Err(TurtleError::lexer(self.pos, "invalid escape sequence")),
                };
                value.push(escaped);
                self.pos += 1;
            } else if !long && (c == '\n' || c == '\r') {
                return Err(TurtleError::lexer(self.pos, "newline in short string"));
            } else {
                value.push(c);
                self.pos += 1;
            }
        }
    }

    fn at_word(&mut self) -> Result<Tok> {
        let start = self.pos;
        self.pos += 1;
        let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
        match word.as_str() {
            "" => Err(TurtleError::lexer(start, "empty language tag")),
            "prefix" => Ok(Tok::AtPrefix),
            "base" => Ok(Tok::AtBase),
            _ => Ok(Tok::LangTag(word)),
        }
    }

    fn blank_label(&mut self) -> Result<Tok> {
        let start = self.pos;
        self.pos += 2;
        let label = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if label.is_empty() {
            return Err(TurtleError::lexer(start, "empty blank node label"));
        }
        Ok(Tok::BlankLabel(label))
    }

    fn number(&mut self) -> Result<Tok> {
        let start = self.pos;
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.pos += 1;
        }
        text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        let mut decimal = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            decimal = true;
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            text.push('e');
            self.pos += 1;
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.pos += 1;
            }
            let exponent = self.take_while(|c| c.is_ascii_digit());
            if exponent.is_empty() {
                return Err(TurtleError::lexer(start, "missing exponent digits"));
            }
            text.push_str(&exponent);
            return Ok(Tok::Double(text));
        }
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return Err(TurtleError::lexer(start, "expected digits"));
        }
        Ok(if decimal {
            Tok::Decimal(text)
        } else {
            Tok::Integer(text)
        })
    }

    /// Prefixed names and bare keywords.
    fn name(&mut self) -> Result<Tok> {
        let start = self.pos;
        let prefix = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if self.peek() != Some(':') {
            return match prefix.as_str() {
                "a" => Ok(Tok::A),
                "true" => Ok(Tok::True),
                "false" => Ok(Tok::False),
                w if w.eq_ignore_ascii_case("prefix") => Ok(Tok::SparqlPrefix),
                w if w.eq_ignore_ascii_case("base") => Ok(Tok::SparqlBase),
                w => Err(TurtleError::lexer(start, format!("unknown keyword '{w}'"))),
            };
        }
        self.pos += 1;
        let mut local =
            self.take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '%'));
        // A trailing dot terminates the statement, it is not part of the name.
        while local.ends_with('.') {
            local.pop();
            self.pos -= 1;
        }
        Ok(Tok::PName { prefix, local })
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        out
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prefixes: HashMap<String, String>,
    base: Option<String>,
    scope: String,
    fresh: usize,
    out: Vec<Triple>,
}

impl Parser {
    fn current(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn position(&self) -> usize {
        self.tokens[self.pos].start
    }

    fn advance(&mut self) -> Tok {
        let tok = self.tokens[self.pos].tok.clone();
        if tok != Tok::Eof {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Tok) -> Result<()> {
        if *self.current() == expected {
            self.advance();
            Ok(())
        } else {
            Err(TurtleError::parse(
                self.position(),
                format!("expected {expected:?}, found {:?}", self.current()),
            ))
        }
    }

    fn emit(&mut self, subject: Term, predicate: Term, object: Term) {
        self.out.push(Triple::new(subject, predicate, object));
    }

    fn fresh_blank(&mut self) -> Term {
        self.fresh += 1;
        // Zero-padded so generated labels sort in document order.
        Term::blank(format!("{}#b{:05}", self.scope, self.fresh))
    }

    fn labelled_blank(&self, label: &str) -> Term {
        Term::blank(format!("{}#_{}", self.scope, label))
    }

    fn parse_document(&mut self) -> Result<()> {
        loop {
            match self.current() {
                Tok::Eof => return Ok(()),
                Tok::AtPrefix | Tok::SparqlPrefix => self.prefix_directive()?,
                Tok::AtBase | Tok::SparqlBase => self.base_directive()?,
                _ => self.triples()?,
            }
        }
    }

    fn prefix_directive(&mut self) -> Result<()> {
        let turtle_style = self.advance() == Tok::AtPrefix;
        let prefix = match self.advance() {
            Tok::PName { prefix, local } if local.is_empty() => prefix,
            other => {
                return Err(TurtleError::parse(
                    self.position(),
                    format!("expected prefix name, found {other:?}"),
                ));
            }
        };
        let namespace = match self.advance() {
            Tok::Iri(iri) => self.resolve(&iri)?,
            other => {
                return Err(TurtleError::parse(
                    self.position(),
                    format!("expected namespace IRI, found {other:?}"),
                ));
            }
        };
        self.prefixes.insert(prefix, namespace);
        if turtle_style {
            self.expect(Tok::Dot)?;
        }
        Ok(())
    }

    fn base_directive(&mut self) -> Result<()> {
        let turtle_style = self.advance() == Tok::AtBase;
        match self.advance() {
            Tok::Iri(iri) => {
                let resolved = self.resolve(&iri)?;
                self.base = Some(resolved);
            }
            other => {
                return Err(TurtleError::parse(
                    self.position(),
                    format!("expected base IRI, found {other:?}"),
                ));
            }
        }
        if turtle_style {
            self.expect(Tok::Dot)?;
        }
        Ok(())
    }

    fn triples(&mut self) -> Result<()> {
        let property_list_subject = *self.current() == Tok::LBracket;
        let subject = self.subject()?;
        if !(property_list_subject && *self.current() == Tok::Dot) {
            self.predicate_object_list(&subject)?;
        }
        self.expect(Tok::Dot)
    }

    fn subject(&mut self) -> Result<Term> {
        match self.current().clone() {
            Tok::Iri(_) | Tok::PName { .. } => self.iri_term(),
            Tok::BlankLabel(label) => {
                self.advance();
                Ok(self.labelled_blank(&label))
            }
            Tok::LBracket => self.blank_property_list(),
            Tok::LParen => self.collection(),
            other => Err(TurtleError::parse(
                self.position(),
                format!("expected subject, found {other:?}"),
            )),
        }
    }

    fn predicate_object_list(&mut self, subject: &Term) -> Result<()> {
        loop {
            let predicate = match self.current() {
                Tok::A => {
                    self.advance();
                    Term::iri(rdf::TYPE)
                }
                Tok::Iri(_) | Tok::PName { .. } => self.iri_term()?,
                other => {
                    return Err(TurtleError::parse(
                        self.position(),
                        format!("expected predicate, found {other:?}"),
                    ));
                }
            };
            loop {
                let object = self.object()?;
                self.emit(subject.clone(), predicate.clone(), object);
                if *self.current() != Tok::Comma {
                    break;
                }
                self.advance();
            }
            if *self.current() != Tok::Semicolon {
                return Ok(());
            }
            while *self.current() == Tok::Semicolon {
                self.advance();
            }
            if matches!(self.current(), Tok::Dot | Tok::RBracket | Tok::Eof) {
                return Ok(());
            }
        }
    }

    fn object(&mut self) -> Result<Term> {
        match self.current().clone() {
            Tok::Iri(_) | Tok::PName { .. } => self.iri_term(),
            Tok::BlankLabel(label) => {
                self.advance();
                Ok(self.labelled_blank(&label))
            }
            Tok::LBracket => self.blank_property_list(),
            Tok::LParen => self.collection(),
            Tok::Str(value) => {
                self.advance();
                match self.current().clone() {
                    Tok::LangTag(lang) => {
                        self.advance();
                        Ok(Term::lang_literal(value, lang))
                    }
                    Tok::DoubleCaret => {
                        self.advance();
                        let datatype = self.iri_term()?;
                        Ok(Term::typed_literal(value, datatype.value()))
                    }
                    _ => Ok(Term::literal(value)),
                }
            }
            Tok::Integer(n) => {
                self.advance();
                Ok(Term::typed_literal(n, xsd::INTEGER))
            }
            Tok::Decimal(n) => {
                self.advance();
                Ok(Term::typed_literal(n, xsd::DECIMAL))
            }
            Tok::Double(n) => {
                self.advance();
                Ok(Term::typed_literal(n, xsd::DOUBLE))
            }
            Tok::True | Tok::False => {
                let value = self.advance() == Tok::True;
                Ok(Term::typed_literal(value.to_string(), xsd::BOOLEAN))
            }
            other => Err(TurtleError::parse(
                self.position(),
                format!("expected object, found {other:?}"),
            )),
        }
    }

    fn iri_term(&mut self) -> Result<Term> {
        let position = self.position();
        match self.advance() {
            Tok::Iri(iri) => Ok(Term::iri(self.resolve(&iri)?)),
            Tok::PName { prefix, local } => {
                let namespace = self
                    .prefixes
                    .get(&prefix)
                    .ok_or_else(|| TurtleError::UndefinedPrefix(prefix.clone()))?;
                Ok(Term::iri(format!("{namespace}{local}")))
            }
            other => Err(TurtleError::parse(
                position,
                format!("expected IRI, found {other:?}"),
            )),
        }
    }

    fn blank_property_list(&mut self) -> Result<Term> {
        self.expect(Tok::LBracket)?;
        let node = self.fresh_blank();
        if *self.current() != Tok::RBracket {
            self.predicate_object_list(&node)?;
        }
        self.expect(Tok::RBracket)?;
        Ok(node)
    }

    fn collection(&mut self) -> Result<Term> {
        self.expect(Tok::LParen)?;
        if *self.current() == Tok::RParen {
            self.advance();
            return Ok(Term::iri(rdf::NIL));
        }
        let head = self.fresh_blank();
        let mut node = head.clone();
        loop {
            let item = self.object()?;
            self.emit(node.clone(), Term::iri(rdf::FIRST), item);
            if *self.current() == Tok::RParen {
                self.emit(node, Term::iri(rdf::REST), Term::iri(rdf::NIL));
                break;
            }
            if *self.current() == Tok::Eof {
                return Err(TurtleError::parse(self.position(), "unterminated collection"));
            }
            let next = self.fresh_blank();
            self.emit(node, Term::iri(rdf::REST), next.clone());
            node = next;
        }
        self.expect(Tok::RParen)?;
        Ok(head)
    }

    /// Resolve a possibly relative IRI reference against the current base.
    fn resolve(&self, reference: &str) -> Result<String> {
        if has_scheme(reference) {
            return Ok(reference.to_string());
        }
        let base = self.base.as_deref().ok_or_else(|| {
            TurtleError::IriResolution(format!("relative IRI <{reference}> without base"))
        })?;
        let base = Url::parse(base)
            .map_err(|e| TurtleError::IriResolution(format!("base <{base}>: {e}")))?;
        base.join(reference)
            .map(String::from)
            .map_err(|e| TurtleError::IriResolution(format!("<{reference}>: {e}")))
    }
}

/// Whether `reference` starts with `scheme:`.
pub(crate) fn has_scheme(reference: &str) -> bool {
    match reference.find(':') {
        Some(colon) => {
            let scheme = &reference[..colon];
            scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TripleSource;

    const BASE: &str = "file:///site/sempipeconf.n3";

    fn parse(input: &str) -> Graph {
        parse_document(input, BASE).unwrap()
    }

    #[test]
    fn parses_prefixed_triples_with_lists() {
        let g = parse(
            r#"
            @prefix ex: <http://example.org/> .
            ex:alice a ex:Person ;
                     ex:name "Alice" , "Al"@en ;
                     ex:age 30 .
            "#,
        );
        let alice = Term::iri("http://example.org/alice");
        assert_eq!(
            g.value(&alice, rdf::TYPE),
            Some(Term::iri("http://example.org/Person"))
        );
        assert_eq!(
            g.objects(&alice, "http://example.org/name"),
            vec![Term::literal("Alice"), Term::lang_literal("Al", "en")]
        );
        assert_eq!(
            g.value(&alice, "http://example.org/age"),
            Some(Term::typed_literal("30", xsd::INTEGER))
        );
    }

    #[test]
    fn relative_iris_resolve_against_document() {
        let g = parse("<./> <http://x/p> <about/> .\n<> <http://x/p> <../up> .");
        assert!(g.contains(
            &Term::iri("file:///site/"),
            "http://x/p",
            &Term::iri("file:///site/about/")
        ));
        assert!(g.contains(
            &Term::iri(BASE),
            "http://x/p",
            &Term::iri("file:///up")
        ));
    }

    #[test]
    fn absolute_iris_are_kept_verbatim() {
        let g = parse("<http://Example.org> <http://x/p> <urn:thing> .");
        assert_eq!(
            g.value(&Term::iri("http://Example.org"), "http://x/p"),
            Some(Term::iri("urn:thing"))
        );
    }

    #[test]
    fn sparql_style_directives() {
        let g = parse("PREFIX ex: <http://example.org/>\nBASE <http://base.org/dir/>\n<a> ex:p ex:o .");
        assert!(g.contains(
            &Term::iri("http://base.org/dir/a"),
            "http://example.org/p",
            &Term::iri("http://example.org/o")
        ));
    }

    #[test]
    fn blank_property_lists_and_collections() {
        let g = parse(
            r#"
            @prefix ex: <http://example.org/> .
            ex:r ex:rep [ ex:ct "text/html" ; ex:q 0.8 ] ;
                 ex:steps ( <a.xsl> <b.xsl> ) ;
                 ex:none () .
            "#,
        );
        let r = Term::iri("http://example.org/r");
        let rep = g.value(&r, "http://example.org/rep").unwrap();
        assert!(rep.is_blank());
        assert_eq!(
            g.value(&rep, "http://example.org/q"),
            Some(Term::typed_literal("0.8", xsd::DECIMAL))
        );
        let steps = g.value(&r, "http://example.org/steps").unwrap();
        assert_eq!(
            g.list(&steps),
            vec![
                Term::iri("file:///site/a.xsl"),
                Term::iri("file:///site/b.xsl")
            ]
        );
        assert_eq!(
            g.value(&r, "http://example.org/none"),
            Some(Term::iri(rdf::NIL))
        );
    }

    #[test]
    fn blank_labels_are_scoped_per_input() {
        let mut g = Graph::new("urn:merged");
        parse_into("_:x <http://x/p> \"1\" .", None, "doc1", &mut g).unwrap();
        parse_into("_:x <http://x/p> \"1\" .", None, "doc2", &mut g).unwrap();
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn string_escapes_and_long_strings() {
        let g = parse("<http://x/s> <http://x/p> \"a\\tb\\u00e9\" , '''multi\nline \"quoted\"''' .");
        let values: Vec<String> = g
            .objects(&Term::iri("http://x/s"), "http://x/p")
            .iter()
            .map(|t| t.value().to_string())
            .collect();
        assert_eq!(values, vec!["a\tb\u{e9}", "multi\nline \"quoted\""]);
    }

    #[test]
    fn local_name_does_not_swallow_statement_dot() {
        let g = parse("@prefix ex: <http://example.org/> .\nex:a ex:b ex:c.");
        assert!(g.contains(
            &Term::iri("http://example.org/a"),
            "http://example.org/b",
            &Term::iri("http://example.org/c")
        ));
    }

    #[test]
    fn comments_and_booleans() {
        let g = parse("# header\n<http://x/s> <http://x/p> true . # trailing\n");
        assert_eq!(
            g.value(&Term::iri("http://x/s"), "http://x/p"),
            Some(Term::typed_literal("true", xsd::BOOLEAN))
        );
    }

    #[test]
    fn undefined_prefix_is_error() {
        let err = parse_document("ex:a ex:b ex:c .", BASE).unwrap_err();
        assert_eq!(err, TurtleError::UndefinedPrefix("ex".into()));
    }

    #[test]
    fn missing_dot_is_parse_error() {
        let err = parse_document("<http://x/a> <http://x/b> <http://x/c>", BASE).unwrap_err();
        assert!(matches!(err, TurtleError::Parse { .. }));
    }

    #[test]
    fn unterminated_string_is_lexer_error() {
        let err = parse_document("<http://x/a> <http://x/b> \"open .", BASE).unwrap_err();
        assert!(matches!(err, TurtleError::Lexer { .. }));
    }

    #[test]
    fn relative_iri_without_base_is_error() {
        let mut g = Graph::new("urn:g");
        let err = parse_into("<a> <b> <c> .", None, "s", &mut g).unwrap_err();
        assert!(matches!(err, TurtleError::IriResolution(_)));
    }

    #[test]
    fn parse_into_reports_new_triples_only() {
        let mut g = Graph::new("urn:g");
        let doc = "<http://x/a> <http://x/b> <http://x/c> .";
        assert_eq!(parse_into(doc, None, "s", &mut g).unwrap(), 1);
        assert_eq!(parse_into(doc, None, "s", &mut g).unwrap(), 0);
    }

    #[test]
    fn has_scheme_detection() {
        assert!(has_scheme("http://x"));
        assert!(has_scheme("urn:isbn:1"));
        assert!(!has_scheme("about/"));
        assert!(!has_scheme("./a:b"));
        assert!(!has_scheme(""));
    }
}
