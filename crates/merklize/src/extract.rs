//! # Entry Extraction
//!
//! Walks a canonical dataset and emits one [`Entry`] per value-bearing
//! quad: typed literals are decoded under their datatype, IRI objects
//! become string values without datatype, and blank node objects are
//! skipped when they only serve as containers.
//!
//! ## Positions of Repeated Values
//!
//! Within one graph, a `(subject, predicate)` pair that occurs once gets no
//! index. A pair that occurs several times gets indices `0, 1, ...` in the
//! order its value-bearing quads are visited (graphs by name, quads in
//! dataset order). Skipped container quads do not consume an index.

use std::collections::HashMap;

use merklize_core::{datatype, Entry, Hasher, MerklizeError, Value};
use merklize_jsonld::{Dataset, Node, DEFAULT_GRAPH};

use crate::relationship::{predicate_iri, ArrayKey, QuadId, RelationshipGraph};

/// Check the structural preconditions of a canonical dataset.
///
/// # Errors
///
/// [`MerklizeError::Dataset`] for empty graph names, default-graph quads
/// carrying a graph node, named-graph quads whose graph node is not the
/// blank node naming the graph, and non-IRI predicates.
pub fn validate_dataset(dataset: &Dataset) -> Result<(), MerklizeError> {
    for (name, quads) in dataset.graphs() {
        if name.is_empty() {
            return Err(MerklizeError::Dataset("graph name is empty".into()));
        }
        for quad in quads {
            match (&quad.graph, name == DEFAULT_GRAPH) {
                (None, true) => {}
                (Some(g), true) => {
                    return Err(MerklizeError::Dataset(format!(
                        "default graph quad has graph node {g}"
                    )))
                }
                (None, false) => {
                    return Err(MerklizeError::Dataset(format!(
                        "quad in graph {name} has no graph node"
                    )))
                }
                (Some(Node::Blank(g)), false) if g == name => {}
                (Some(g), false) => {
                    return Err(MerklizeError::Dataset(format!(
                        "graph {name} holds a quad of graph {g}"
                    )))
                }
            }
            predicate_iri(quad)?;
        }
    }
    Ok(())
}

/// Extract every entry of `dataset`, in emission order.
///
/// # Errors
///
/// Precondition failures from [`validate_dataset`], relationship errors,
/// [`MerklizeError::UnsupportedRdf`] for blank node objects that contain
/// nothing, and value decoding errors.
pub fn extract_entries(dataset: &Dataset, hasher: &dyn Hasher) -> Result<Vec<Entry>, MerklizeError> {
    validate_dataset(dataset)?;
    let rg = RelationshipGraph::build(dataset)?;
    let prime = hasher.prime();
    let mut entries = Vec::with_capacity(dataset.len());

    for (graph, quads) in dataset.graphs() {
        let mut counts: HashMap<ArrayKey, usize> = HashMap::new();
        for quad in quads {
            *counts.entry(ArrayKey::of(quad, graph)?).or_default() += 1;
        }
        let mut next_index: HashMap<ArrayKey, usize> = HashMap::new();

        for (index, quad) in quads.iter().enumerate() {
            let id = QuadId::new(graph, index);
            let (value, datatype) = match &quad.object {
                Node::Literal(lit) => (
                    datatype::decode(&lit.datatype, &lit.value, prime)?,
                    lit.datatype.clone(),
                ),
                Node::Iri(iri) => (Value::String(iri.clone()), String::new()),
                Node::Blank(label) => {
                    if rg.has_children(&id) {
                        continue;
                    }
                    return Err(MerklizeError::UnsupportedRdf(format!(
                        "blank node is not supported: {} {} {label}",
                        quad.subject, quad.predicate
                    )));
                }
            };

            let key = ArrayKey::of(quad, graph)?;
            let position = if counts.get(&key).copied().unwrap_or_default() > 1 {
                let slot = next_index.entry(key).or_default();
                let position = *slot;
                *slot += 1;
                Some(position)
            } else {
                None
            };

            let path = rg.path(dataset, &id, position)?;
            entries.push(Entry::with_datatype(path, value, datatype)?);
        }
    }
    Ok(entries)
}
