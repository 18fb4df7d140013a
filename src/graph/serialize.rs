//! Writers for N-Triples, N-Quads and a plain Turtle layout.
//!
//! Internal blank node labels carry their document scope and are not valid
//! output labels, so each write relabels them `_:b0`, `_:b1`, … in order of
//! first appearance.

use super::{DEFAULT_GRAPH, Graph, Term, Triple};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Escape a literal's lexical form for a double-quoted string.
pub fn escape_literal(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len());
    for c in lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Default)]
struct BlankNamer {
    names: HashMap<String, String>,
}

impl BlankNamer {
    fn term(&mut self, term: &Term) -> String {
        match term {
            Term::Blank(label) => {
                let next = self.names.len();
                let name = self
                    .names
                    .entry(label.clone())
                    .or_insert_with(|| format!("b{next}"));
                format!("_:{name}")
            }
            other => other.to_string(),
        }
    }

    fn triple(&mut self, triple: &Triple) -> String {
        format!(
            "{} {} {}",
            self.term(&triple.subject),
            self.term(&triple.predicate),
            self.term(&triple.object)
        )
    }
}

pub fn to_ntriples(graph: &Graph) -> String {
    let mut namer = BlankNamer::default();
    let mut out = String::new();
    for triple in graph.iter() {
        let _ = writeln!(out, "{} .", namer.triple(triple));
    }
    out
}

/// N-Quads for several graphs. Triples of the default graph are written
/// without a graph label.
pub fn to_nquads<'a>(graphs: impl IntoIterator<Item = &'a Graph>) -> String {
    let mut namer = BlankNamer::default();
    let mut out = String::new();
    for graph in graphs {
        for triple in graph.iter() {
            let line = namer.triple(triple);
            if graph.name() == DEFAULT_GRAPH {
                let _ = writeln!(out, "{line} .");
            } else {
                let _ = writeln!(out, "{line} <{}> .", graph.name());
            }
        }
    }
    out
}

/// Turtle with one block per subject, predicates joined by `;` and objects by `,`.
pub fn to_turtle(graph: &Graph) -> String {
    let mut namer = BlankNamer::default();
    let mut subjects: Vec<&Term> = Vec::new();
    let mut by_subject: HashMap<&Term, BTreeMap<&Term, Vec<&Term>>> = HashMap::new();
    for triple in graph.iter() {
        let predicates = by_subject.entry(&triple.subject).or_insert_with(|| {
            subjects.push(&triple.subject);
            BTreeMap::new()
        });
        predicates
            .entry(&triple.predicate)
            .or_default()
            .push(&triple.object);
    }

    let mut out = String::new();
    for subject in subjects {
        let _ = write!(out, "{}", namer.term(subject));
        let predicates = &by_subject[subject];
        for (i, (predicate, objects)) in predicates.iter().enumerate() {
            let objects: Vec<String> = objects.iter().map(|o| namer.term(o)).collect();
            let sep = if i == 0 { " " } else { " ;\n    " };
            let _ = write!(out, "{sep}{} {}", namer.term(predicate), objects.join(" , "));
        }
        out.push_str(" .\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::turtle;

    fn sample() -> Graph {
        let mut g = Graph::new("urn:g");
        g.add(
            Term::iri("http://x/a"),
            Term::iri("http://x/p"),
            Term::literal("line\nbreak"),
        );
        g.add(
            Term::iri("http://x/a"),
            Term::iri("http://x/p"),
            Term::blank("file:///doc#_n"),
        );
        g.add(
            Term::blank("file:///doc#_n"),
            Term::iri("http://x/q"),
            Term::lang_literal("hi", "en"),
        );
        g
    }

    #[test]
    fn escape_literal_handles_quotes_and_controls() {
        assert_eq!(escape_literal("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(escape_literal("plain"), "plain");
    }

    #[test]
    fn ntriples_relabels_blank_nodes() {
        let nt = to_ntriples(&sample());
        assert_eq!(
            nt,
            "<http://x/a> <http://x/p> \"line\\nbreak\" .\n\
             <http://x/a> <http://x/p> _:b0 .\n\
             _:b0 <http://x/q> \"hi\"@en .\n"
        );
    }

    #[test]
    fn nquads_labels_named_graphs_only() {
        let mut default = Graph::new(DEFAULT_GRAPH);
        default.add(Term::iri("http://x/s"), Term::iri("http://x/p"), Term::iri("http://x/o"));
        let mut named = Graph::new("http://x/g");
        named.add(Term::iri("http://x/s"), Term::iri("http://x/p"), Term::literal("1"));
        let nq = to_nquads([&default, &named]);
        assert_eq!(
            nq,
            "<http://x/s> <http://x/p> <http://x/o> .\n\
             <http://x/s> <http://x/p> \"1\" <http://x/g> .\n"
        );
    }

    #[test]
    fn turtle_output_parses_back_to_same_shape() {
        let mut original = sample();
        original.add(Term::iri("http://x/a"), Term::iri("http://x/r"), Term::literal("2"));
        let text = to_turtle(&original);
        let reparsed = turtle::parse_document(&text, "urn:reparsed").unwrap();
        assert_eq!(reparsed.len(), original.len());
        assert!(text.contains(" ;\n    "));
    }
}
