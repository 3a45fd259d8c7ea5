//! # JSON-LD Processor — Canonical RDF
//!
//! Converts a JSON-LD document into a canonical [`Dataset`]: JSON-LD to RDF
//! followed by RDF dataset canonicalization (RDFC-1.0, the standardized
//! URDNA2015), so blank node labels and quad order are independent of the
//! document's key and array order.
//!
//! The RDF conversion itself never performs I/O. Every remote context the
//! document references is resolved beforehand through the caller's
//! [`DocumentLoader`] and inlined into the document ([`inline_contexts`]).

use std::fmt::Debug;

use serde_json::{Map, Value};
use sophia_api::parser::QuadParser;
use sophia_api::source::QuadSource;
use sophia_inmem::dataset::LightDataset;
use sophia_jsonld::JsonLdParser;

use crate::context::MAX_CONTEXT_DEPTH;
use crate::error::JsonLdError;
use crate::loader::DocumentLoader;
use crate::rdf::Dataset;

/// JSON-LD to canonical RDF conversion.
pub trait JsonLdProcessor: Send + Sync + Debug {
    /// # Errors
    ///
    /// Loader errors for unresolvable contexts, [`JsonLdError::ToRdf`] and
    /// [`JsonLdError::Canonicalization`] for processing failures.
    fn normalize(&self, doc: &Value, loader: &dyn DocumentLoader) -> Result<Dataset, JsonLdError>;
}

/// Processor backed by `sophia_jsonld` and `sophia_c14n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SophiaProcessor;

impl SophiaProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl JsonLdProcessor for SophiaProcessor {
    fn normalize(&self, doc: &Value, loader: &dyn DocumentLoader) -> Result<Dataset, JsonLdError> {
        let inlined = inline_contexts(doc, loader)?;
        let text = serde_json::to_string(&inlined)
            .map_err(|e| JsonLdError::InvalidDocument(e.to_string()))?;

        let parser = JsonLdParser::new();
        let rdf: LightDataset = QuadParser::parse(&parser, text.as_bytes())
            .collect_quads()
            .map_err(|e| JsonLdError::ToRdf(e.to_string()))?;

        let mut canonical = Vec::new();
        sophia_c14n::rdfc10::normalize(&rdf, &mut canonical)
            .map_err(|e| JsonLdError::Canonicalization(e.to_string()))?;
        let canonical = String::from_utf8(canonical)
            .map_err(|e| JsonLdError::Canonicalization(e.to_string()))?;

        let dataset = Dataset::from_nquads(&canonical)?;
        tracing::debug!(quads = dataset.len(), graphs = dataset.graph_count(), "normalized document");
        Ok(dataset)
    }
}

/// Copy of `doc` in which every `@context` is self-contained: remote
/// references and `@import`s are replaced by the loaded definitions, at the
/// top level, in embedded node objects, and inside scoped term contexts.
///
/// # Errors
///
/// Loader errors, or [`JsonLdError::InvalidContext`] when a loaded document
/// has no `@context` or references nest too deeply.
pub fn inline_contexts(doc: &Value, loader: &dyn DocumentLoader) -> Result<Value, JsonLdError> {
    match doc {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let value = if key == "@context" {
                    inline_context(value, loader, 0)?
                } else {
                    inline_contexts(value, loader)?
                };
                out.insert(key.clone(), value);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| inline_contexts(item, loader))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn inline_context(
    local: &Value,
    loader: &dyn DocumentLoader,
    depth: usize,
) -> Result<Value, JsonLdError> {
    if depth > MAX_CONTEXT_DEPTH {
        return Err(JsonLdError::InvalidContext(format!(
            "remote context inclusion exceeds {MAX_CONTEXT_DEPTH} levels"
        )));
    }
    match local {
        Value::String(url) => {
            let remote = loader.load_document(url)?;
            let inner = remote.document.get("@context").ok_or_else(|| {
                JsonLdError::InvalidContext(format!("remote document {url} has no @context"))
            })?;
            inline_context(inner, loader, depth + 1)
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match inline_context(item, loader, depth)? {
                    Value::Array(nested) => out.extend(nested),
                    other => out.push(other),
                }
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => inline_context_object(map, loader, depth).map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn inline_context_object(
    map: &Map<String, Value>,
    loader: &dyn DocumentLoader,
    depth: usize,
) -> Result<Map<String, Value>, JsonLdError> {
    let mut out = match map.get("@import") {
        Some(Value::String(url)) => {
            let remote = loader.load_document(url)?;
            remote
                .document
                .get("@context")
                .and_then(Value::as_object)
                .cloned()
                .ok_or_else(|| {
                    JsonLdError::InvalidContext(format!("imported context {url} must be an object"))
                })?
        }
        Some(_) => return Err(JsonLdError::InvalidContext("@import must be a string".into())),
        None => Map::new(),
    };
    for (key, value) in map {
        if key == "@import" {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }
    for definition in out.values_mut() {
        let Value::Object(def) = definition else {
            continue;
        };
        if let Some(scoped) = def.get("@context") {
            let inlined = inline_context(scoped, loader, depth + 1)?;
            def.insert("@context".to_owned(), inlined);
        }
    }
    Ok(out)
}
