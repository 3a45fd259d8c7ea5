//! # RDF Dataset Model
//!
//! Owned, hasher-agnostic view of a canonical RDF dataset: quads grouped by
//! graph name, in the order the canonical N-Quads listed them. Graph names
//! iterate in sorted order; the default graph is keyed by [`DEFAULT_GRAPH`].
//!
//! The model deliberately accepts inconsistent input through
//! [`Dataset::insert_graph`] so the extractor can validate graph naming
//! itself.

use std::collections::BTreeMap;
use std::fmt;

use sophia_api::quad::Quad as _;
use sophia_api::source::{QuadSource, StreamError};
use sophia_api::term::{Term, TermKind};

use crate::error::JsonLdError;

/// Key of the default graph.
pub const DEFAULT_GRAPH: &str = "@default";

/// Literal object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: String,
    pub language: Option<String>,
}

/// RDF term as it appears in canonical N-Quads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Iri(String),
    /// Blank node label including the `_:` prefix.
    Blank(String),
    Literal(Literal),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    /// Blank node from a label with or without the `_:` prefix.
    pub fn blank(label: impl AsRef<str>) -> Self {
        let label = label.as_ref();
        if label.starts_with("_:") {
            Node::Blank(label.to_owned())
        } else {
            Node::Blank(format!("_:{label}"))
        }
    }

    pub fn literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal(Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        })
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blank(&self) -> Option<&str> {
        match self {
            Node::Blank(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{iri}>"),
            Node::Blank(label) => f.write_str(label),
            Node::Literal(Literal {
                value,
                language: Some(lang),
                ..
            }) => write!(f, "{value:?}@{lang}"),
            Node::Literal(Literal {
                value, datatype, ..
            }) => write!(f, "{value:?}^^<{datatype}>"),
        }
    }
}

/// One quad; `graph` is `None` in the default graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quad {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
    pub graph: Option<Node>,
}

impl Quad {
    pub fn new(subject: Node, predicate: Node, object: Node, graph: Option<Node>) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Dataset key of the graph this quad belongs to.
    pub fn graph_name(&self) -> String {
        match &self.graph {
            None => DEFAULT_GRAPH.to_owned(),
            Some(Node::Iri(s)) | Some(Node::Blank(s)) => s.clone(),
            Some(Node::Literal(l)) => l.value.clone(),
        }
    }
}

/// Quads grouped by graph name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    graphs: BTreeMap<String, Vec<Quad>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `quad` to the graph its graph node names.
    pub fn push(&mut self, quad: Quad) {
        self.graphs.entry(quad.graph_name()).or_default().push(quad);
    }

    /// Store `quads` under `name` verbatim, without checking that their
    /// graph nodes agree with the name.
    pub fn insert_graph(&mut self, name: impl Into<String>, quads: Vec<Quad>) {
        self.graphs.insert(name.into(), quads);
    }

    /// Graphs in sorted name order.
    pub fn graphs(&self) -> impl Iterator<Item = (&str, &[Quad])> {
        self.graphs.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn graph(&self, name: &str) -> Option<&[Quad]> {
        self.graphs.get(name).map(Vec::as_slice)
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    /// Total number of quads.
    pub fn len(&self) -> usize {
        self.graphs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse N-Quads text.
    ///
    /// # Errors
    ///
    /// [`JsonLdError::NQuads`] on syntax errors or generalized terms
    /// (variables, quoted triples).
    pub fn from_nquads(text: &str) -> Result<Self, JsonLdError> {
        let mut dataset = Dataset::new();
        sophia_turtle::parser::nq::parse_str(text)
            .try_for_each_quad(|q| -> Result<(), JsonLdError> {
                let graph = match q.g() {
                    Some(g) => Some(node_from_term(g)?),
                    None => None,
                };
                dataset.push(Quad {
                    subject: node_from_term(q.s())?,
                    predicate: node_from_term(q.p())?,
                    object: node_from_term(q.o())?,
                    graph,
                });
                Ok(())
            })
            .map_err(|e| match e {
                StreamError::SourceError(e) => JsonLdError::NQuads(e.to_string()),
                StreamError::SinkError(e) => e,
            })?;
        Ok(dataset)
    }
}

fn node_from_term<T: Term>(t: T) -> Result<Node, JsonLdError> {
    let node = match t.kind() {
        TermKind::Iri => t.iri().map(|iri| Node::Iri(iri.as_str().to_owned())),
        TermKind::BlankNode => t.bnode_id().map(|b| Node::blank(b.as_str())),
        TermKind::Literal => t.lexical_form().map(|lex| {
            Node::Literal(Literal {
                value: String::from(&*lex),
                datatype: t
                    .datatype()
                    .map(|d| d.as_str().to_owned())
                    .unwrap_or_default(),
                language: t.language_tag().map(|l| l.as_str().to_owned()),
            })
        }),
        _ => None,
    };
    node.ok_or_else(|| JsonLdError::NQuads(format!("unsupported term kind {:?}", t.kind())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NQ: &str = r#"<http://example.com/a> <http://schema.org/name> "Alice" .
<http://example.com/a> <http://schema.org/age> "42"^^<http://www.w3.org/2001/XMLSchema#integer> .
_:b0 <http://schema.org/created> "2020-01-01"@en _:c14n0 .
"#;

    #[test]
    fn parses_default_and_named_graphs() {
        let ds = Dataset::from_nquads(NQ).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.graph_count(), 2);
        let default = ds.graph(DEFAULT_GRAPH).unwrap();
        assert_eq!(default[0].subject, Node::iri("http://example.com/a"));
        assert_eq!(
            default[0].object,
            Node::literal("Alice", "http://www.w3.org/2001/XMLSchema#string")
        );
        assert_eq!(
            default[1].object,
            Node::literal("42", "http://www.w3.org/2001/XMLSchema#integer")
        );
        let named = ds.graph("_:c14n0").unwrap();
        assert_eq!(named[0].subject, Node::blank("b0"));
        assert_eq!(named[0].graph, Some(Node::blank("_:c14n0")));
        match &named[0].object {
            Node::Literal(l) => assert_eq!(l.language.as_deref(), Some("en")),
            other => panic!("unexpected object {other}"),
        }
    }

    #[test]
    fn graphs_iterate_sorted() {
        let ds = Dataset::from_nquads(NQ).unwrap();
        let names: Vec<&str> = ds.graphs().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["@default", "_:c14n0"]);
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = Dataset::from_nquads("<http://a> <http://b> .\n").unwrap_err();
        assert!(matches!(err, JsonLdError::NQuads(_)));
    }

    #[test]
    fn blank_labels_are_normalized() {
        assert_eq!(Node::blank("x"), Node::blank("_:x"));
        assert_eq!(Node::blank("x").to_string(), "_:x");
    }

    #[test]
    fn insert_graph_keeps_quads_verbatim() {
        let mut ds = Dataset::new();
        let quad = Quad::new(
            Node::iri("http://a"),
            Node::iri("http://p"),
            Node::iri("http://o"),
            Some(Node::blank("g1")),
        );
        ds.insert_graph(DEFAULT_GRAPH, vec![quad.clone()]);
        assert_eq!(ds.graph(DEFAULT_GRAPH), Some(&[quad][..]));
    }
}
