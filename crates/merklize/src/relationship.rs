//! # Relationship Graph
//!
//! Recovers the containment structure JSON-LD flattening throws away: for
//! every quad, which quad it hangs under, and for every multi-valued
//! property, which position each child node occupies. Walking parents up
//! to a root quad yields the quad's [`Path`].
//!
//! Quads are identified by `(graph name, index within graph)`; the graph is
//! built fresh per dataset and never modified afterwards.
//!
//! ## Parent Rule
//!
//! The parent of quad `q` is a different quad of `q`'s graph whose object
//! is `q`'s subject. Failing that, when `q` lives in a named graph whose
//! name is a blank node, it is the quad (in any graph) whose object is that
//! blank node. Two candidates are an error, never a guess.

use std::collections::{HashMap, HashSet};

use merklize_core::{MerklizeError, Path, PathSegment};
use merklize_jsonld::{Dataset, Node, Quad};

/// Identity of one quad.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadId {
    pub graph: String,
    pub index: usize,
}

impl QuadId {
    pub fn new(graph: impl Into<String>, index: usize) -> Self {
        Self {
            graph: graph.into(),
            index,
        }
    }
}

/// Subject or object identity; literals never participate in containment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Iri(String),
    Blank(String),
}

impl NodeRef {
    pub fn of(node: &Node) -> Option<Self> {
        match node {
            Node::Iri(s) => Some(NodeRef::Iri(s.clone())),
            Node::Blank(s) => Some(NodeRef::Blank(s.clone())),
            Node::Literal(_) => None,
        }
    }
}

/// Groups the quads that form one multi-valued property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayKey {
    pub subject: NodeRef,
    pub predicate: String,
    pub graph: String,
}

impl ArrayKey {
    /// Key of `quad` stored in `graph`.
    ///
    /// # Errors
    ///
    /// [`MerklizeError::UnsupportedRdf`] for literal subjects,
    /// [`MerklizeError::Dataset`] for non-IRI predicates.
    pub fn of(quad: &Quad, graph: &str) -> Result<Self, MerklizeError> {
        Ok(Self {
            subject: subject_ref(quad)?,
            predicate: predicate_iri(quad)?.to_owned(),
            graph: graph.to_owned(),
        })
    }
}

pub(crate) fn subject_ref(quad: &Quad) -> Result<NodeRef, MerklizeError> {
    NodeRef::of(&quad.subject).ok_or_else(|| {
        MerklizeError::UnsupportedRdf(format!("literal subject {}", quad.subject))
    })
}

pub(crate) fn predicate_iri(quad: &Quad) -> Result<&str, MerklizeError> {
    quad.predicate
        .as_iri()
        .ok_or_else(|| MerklizeError::Dataset(format!("predicate {} is not an IRI", quad.predicate)))
}

fn lookup<'d>(dataset: &'d Dataset, id: &QuadId) -> Result<&'d Quad, MerklizeError> {
    dataset
        .graph(&id.graph)
        .and_then(|quads| quads.get(id.index))
        .ok_or_else(|| {
            MerklizeError::Assertion(format!("quad {}#{} is not in the dataset", id.graph, id.index))
        })
}

/// Parent links and child positions of one dataset.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    parents: HashMap<QuadId, QuadId>,
    children: HashMap<ArrayKey, HashMap<NodeRef, usize>>,
    with_children: HashSet<QuadId>,
}

impl RelationshipGraph {
    /// Build the graph, scanning graphs in name order and quads in dataset
    /// order.
    ///
    /// # Errors
    ///
    /// [`MerklizeError::MultipleParents`] when a quad has two candidate
    /// parents, shape errors for literal subjects or non-IRI predicates.
    pub fn build(dataset: &Dataset) -> Result<Self, MerklizeError> {
        let mut rg = RelationshipGraph::default();
        for (graph, quads) in dataset.graphs() {
            for (index, quad) in quads.iter().enumerate() {
                let Some(parent_id) = find_parent(dataset, graph, index, quad)? else {
                    continue;
                };
                let parent = lookup(dataset, &parent_id)?;
                let key = ArrayKey::of(parent, &parent_id.graph)?;
                let siblings = rg.children.entry(key).or_default();
                let next = siblings.len();
                siblings.entry(subject_ref(quad)?).or_insert(next);

                rg.with_children.insert(parent_id.clone());
                rg.parents.insert(QuadId::new(graph, index), parent_id);
            }
        }
        Ok(rg)
    }

    pub fn parent(&self, id: &QuadId) -> Option<&QuadId> {
        self.parents.get(id)
    }

    /// True when some quad hangs under `id`.
    pub fn has_children(&self, id: &QuadId) -> bool {
        self.with_children.contains(id)
    }

    /// Position of `child` among the children of the property `key`.
    pub fn child_index(&self, key: &ArrayKey, child: &NodeRef) -> Option<usize> {
        self.children.get(key).and_then(|c| c.get(child)).copied()
    }

    /// Path of quad `id`, with `index` appended when the quad's own value
    /// is one of several.
    ///
    /// # Errors
    ///
    /// [`MerklizeError::Assertion`] when the parent links and child lists
    /// disagree.
    pub fn path(
        &self,
        dataset: &Dataset,
        id: &QuadId,
        index: Option<usize>,
    ) -> Result<Path, MerklizeError> {
        let quad = lookup(dataset, id)?;
        // Built leaf first, reversed at the end.
        let mut parts = Vec::new();
        if let Some(i) = index {
            parts.push(PathSegment::Index(i));
        }
        parts.push(PathSegment::Term(predicate_iri(quad)?.to_owned()));

        let mut current = id;
        let mut child = quad;
        let mut steps = 0usize;
        while let Some(parent_id) = self.parents.get(current) {
            steps += 1;
            if steps > self.parents.len() {
                return Err(MerklizeError::Assertion(format!(
                    "parent links of quad {}#{} form a cycle",
                    id.graph, id.index
                )));
            }
            let parent = lookup(dataset, parent_id)?;
            let key = ArrayKey::of(parent, &parent_id.graph)?;
            let siblings = self.children.get(&key).ok_or_else(|| {
                MerklizeError::Assertion("parent has no child list".into())
            })?;
            let position = siblings.get(&subject_ref(child)?).ok_or_else(|| {
                MerklizeError::Assertion("child not found in parent's child list".into())
            })?;
            if siblings.len() > 1 {
                parts.push(PathSegment::Index(*position));
            }
            parts.push(PathSegment::Term(predicate_iri(parent)?.to_owned()));
            current = parent_id;
            child = parent;
        }

        parts.reverse();
        Ok(Path::from(parts))
    }
}

fn find_parent(
    dataset: &Dataset,
    graph: &str,
    index: usize,
    quad: &Quad,
) -> Result<Option<QuadId>, MerklizeError> {
    let subject = subject_ref(quad)?;
    let mut candidates: Vec<QuadId> = dataset
        .graph(graph)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter(|(i, c)| *i != index && NodeRef::of(&c.object).as_ref() == Some(&subject))
        .map(|(i, _)| QuadId::new(graph, i))
        .collect();

    if candidates.is_empty() {
        if let Some(graph_node @ Node::Blank(_)) = &quad.graph {
            for (name, quads) in dataset.graphs() {
                for (i, candidate) in quads.iter().enumerate() {
                    if &candidate.object == graph_node {
                        candidates.push(QuadId::new(name, i));
                    }
                }
            }
        }
    }

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(only.clone())),
        [first, second, ..] => Err(MerklizeError::MultipleParents(format!(
            "quad {graph}#{index} has parents {}#{} and {}#{}",
            first.graph, first.index, second.graph, second.index
        ))),
    }
}
