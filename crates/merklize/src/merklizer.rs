//! # Merklizer — Committed Document Snapshot
//!
//! A [`Merklizer`] is built once per document and never changes afterwards.
//! Construction runs the whole pipeline:
//!
//! ```text
//! bytes ─▶ JSON ─▶ compacted view (safe mode check)
//!            └──▶ canonical RDF ─▶ entries ─▶ tree.insert(H(path), H(value))
//! ```
//!
//! ## Security Invariant
//!
//! The entry map and the tree are populated from the same entries in the
//! same pass; a key the tree proves present always has an entry. A proof
//! of existence without an entry is reported as an internal assertion
//! failure, never as a missing field.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use merklize_core::{
    Entry, Hasher, MerkleTree, MerklizeError, Path, PathSegment, Proof, SharedHasher, Value,
};
use merklize_jsonld::{compact_document, path_from_document, DocumentLoader};
use num_bigint::BigUint;

use crate::extract::extract_entries;
use crate::options::MerklizeOptions;

/// Merklized JSON-LD document.
pub struct Merklizer {
    source: Vec<u8>,
    compacted: serde_json::Value,
    tree: Box<dyn MerkleTree>,
    entries: HashMap<String, Entry>,
    hasher: SharedHasher,
    safe_mode: bool,
    loader: Arc<dyn DocumentLoader>,
}

impl fmt::Debug for Merklizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merklizer")
            .field("root", &self.tree.root())
            .field("entries", &self.entries.len())
            .field("safe_mode", &self.safe_mode)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl Merklizer {
    /// Merklize a JSON-LD document.
    ///
    /// # Errors
    ///
    /// - [`MerklizeError::InvalidDocument`] for malformed JSON.
    /// - [`MerklizeError::InvalidProperty`] in safe mode.
    /// - [`MerklizeError::JsonLd`] for context, RDF or canonicalization
    ///   failures.
    /// - Dataset, relationship and value errors from entry extraction.
    pub fn merklize(document: &[u8], mut options: MerklizeOptions) -> Result<Self, MerklizeError> {
        let doc: serde_json::Value = serde_json::from_slice(document)
            .map_err(|e| MerklizeError::InvalidDocument(e.to_string()))?;
        let hasher = options.hasher();
        let loader = options.document_loader()?;
        let safe_mode = options.safe_mode();

        let compacted = compact_document(&doc, loader.as_ref(), safe_mode)?;
        let dataset = options.processor().normalize(&doc, loader.as_ref())?;
        let extracted = extract_entries(&dataset, hasher.as_ref())?;

        let mut tree = options.take_merkle_tree(&hasher);
        let mut entries = HashMap::with_capacity(extracted.len());
        for entry in extracted {
            let (key, value) = entry.key_value_mt_entries(hasher.as_ref())?;
            tree.insert(&key, &value)?;
            entries.insert(key.to_string(), entry);
        }

        tracing::debug!(
            entries = entries.len(),
            quads = dataset.len(),
            root = %tree.root(),
            "merklized document"
        );

        Ok(Self {
            source: document.to_vec(),
            compacted,
            tree,
            entries,
            hasher,
            safe_mode,
            loader,
        })
    }

    /// Root of the tree.
    pub fn root(&self) -> BigUint {
        self.tree.root()
    }

    pub fn hasher(&self) -> &dyn Hasher {
        self.hasher.as_ref()
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// Bytes the snapshot was built from.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// IRI-keyed view of the document.
    pub fn compacted(&self) -> &serde_json::Value {
        &self.compacted
    }

    /// All committed entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entry committed under `path`.
    ///
    /// # Errors
    ///
    /// [`MerklizeError::EntryNotFound`] when nothing is committed there.
    pub fn entry(&self, path: &Path) -> Result<&Entry, MerklizeError> {
        let key = path.mt_entry(self.hasher.as_ref())?;
        self.entries
            .get(&key.to_string())
            .ok_or_else(|| MerklizeError::EntryNotFound(path.to_string()))
    }

    /// Membership or non-membership proof for `path`, with the committed
    /// value when present.
    ///
    /// # Errors
    ///
    /// [`MerklizeError::Assertion`] when the tree proves a key the entry
    /// map does not hold.
    pub fn proof(&self, path: &Path) -> Result<(Proof, Option<Value>), MerklizeError> {
        let key = path.mt_entry(self.hasher.as_ref())?;
        let (proof, _) = self.tree.generate_proof(&key)?;
        if !proof.existence {
            return Ok((proof, None));
        }
        let entry = self.entries.get(&key.to_string()).ok_or_else(|| {
            MerklizeError::Assertion(format!("tree holds {path} but no entry exists"))
        })?;
        Ok((proof, Some(entry.value().clone())))
    }

    /// Value at `path` in the compacted view, as written in the document.
    ///
    /// `{"@graph": ...}` wrappers are transparent and a terminal value
    /// object yields its `@value`.
    ///
    /// # Errors
    ///
    /// [`MerklizeError::Shape`] when an index meets a non-array or a term a
    /// non-object, [`MerklizeError::NotFound`] for missing fields and
    /// out-of-range indices. Messages name the path walked so far.
    pub fn raw_value(&self, path: &Path) -> Result<serde_json::Value, MerklizeError> {
        let mut current = &self.compacted;
        let mut walked = Path::default();

        for segment in path.parts() {
            current = unwrap_graph(current);
            current = match segment {
                PathSegment::Term(term) => {
                    let obj = current.as_object().ok_or_else(|| {
                        MerklizeError::Shape(format!("expected object at '{walked}'"))
                    })?;
                    walked.append([segment.clone()]);
                    obj.get(term).ok_or_else(|| {
                        MerklizeError::NotFound(format!("value not found at '{walked}'"))
                    })?
                }
                PathSegment::Index(i) => {
                    let items = current.as_array().ok_or_else(|| {
                        MerklizeError::Shape(format!("expected array at '{walked}'"))
                    })?;
                    walked.append([segment.clone()]);
                    items.get(*i).ok_or_else(|| {
                        MerklizeError::NotFound(format!("index is out of range at '{walked}'"))
                    })?
                }
            };
        }

        let current = unwrap_graph(current);
        match current.as_object().and_then(|o| o.get("@value")) {
            Some(v) => Ok(v.clone()),
            None => Ok(current.clone()),
        }
    }

    /// Path of a dotted document field (`credentialSubject.1.birthDate`),
    /// resolved against the original document and its contexts.
    pub fn resolve_doc_path(&self, dotted: &str) -> Result<Path, MerklizeError> {
        let doc: serde_json::Value = serde_json::from_slice(&self.source)
            .map_err(|e| MerklizeError::InvalidDocument(e.to_string()))?;
        Ok(path_from_document(&doc, dotted, self.loader.as_ref())?)
    }
}

fn unwrap_graph(value: &serde_json::Value) -> &serde_json::Value {
    match value.as_object() {
        Some(obj) if obj.len() == 1 => obj.get("@graph").unwrap_or(value),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merklize_jsonld::StaticLoader;
    use serde_json::json;

    const EX: &str = "http://example.com/";

    fn merklize(doc: serde_json::Value) -> Merklizer {
        let options = MerklizeOptions::new().with_document_loader(Arc::new(StaticLoader::new()));
        Merklizer::merklize(doc.to_string().as_bytes(), options).unwrap()
    }

    fn sample() -> Merklizer {
        merklize(json!({
            "@context": {"@vocab": EX},
            "@id": "http://example.com/doc",
            "name": "doc",
            "nested": {"inner": {"@value": "v"}},
            "list": [1, 2]
        }))
    }

    #[test]
    fn entries_and_tree_agree() {
        let m = sample();
        assert!(m.entry_count() > 0);
        for entry in m.entries() {
            let (proof, value) = m.proof(entry.path()).unwrap();
            assert!(proof.existence);
            assert_eq!(value.as_ref(), Some(entry.value()));
        }
    }

    #[test]
    fn absent_paths() {
        let m = sample();
        let missing = Path::new(["http://example.com/missing"]);
        let (proof, value) = m.proof(&missing).unwrap();
        assert!(!proof.existence);
        assert!(value.is_none());
        let err = m.entry(&missing).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "entry not found: http://example.com/missing");
    }

    #[test]
    fn raw_values_follow_the_view() {
        let m = sample();
        assert_eq!(
            m.raw_value(&Path::new([format!("{EX}name")])).unwrap(),
            json!("doc")
        );
        assert_eq!(
            m.raw_value(&Path::new([format!("{EX}nested"), format!("{EX}inner")]))
                .unwrap(),
            json!("v")
        );
        assert_eq!(
            m.raw_value(&Path::new([PathSegment::from(format!("{EX}list")), 1.into()]))
                .unwrap(),
            json!(2)
        );
    }

    #[test]
    fn raw_value_errors_name_the_walked_prefix() {
        let m = sample();
        let err = m
            .raw_value(&Path::new([
                PathSegment::from(format!("{EX}list")),
                5.into(),
            ]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("index is out of range at '{EX}list / [5]'")
        );
        let err = m
            .raw_value(&Path::new([
                PathSegment::from(format!("{EX}name")),
                0.into(),
            ]))
            .unwrap_err();
        assert_eq!(err.to_string(), format!("expected array at '{EX}name'"));
        let err = m
            .raw_value(&Path::new([format!("{EX}list"), format!("{EX}x")]))
            .unwrap_err();
        assert_eq!(err.to_string(), format!("expected object at '{EX}list'"));
        assert!(m.raw_value(&Path::new([format!("{EX}nope")])).unwrap_err().is_not_found());
    }

    #[test]
    fn graph_wrappers_are_transparent() {
        assert_eq!(
            unwrap_graph(&json!({"@graph": {"a": 1}})),
            &json!({"a": 1})
        );
        assert_eq!(unwrap_graph(&json!({"a": 1})), &json!({"a": 1}));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Merklizer::merklize(b"{not json", MerklizeOptions::new()).unwrap_err();
        assert!(matches!(err, MerklizeError::InvalidDocument(_)));
    }

    #[test]
    fn merklizer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Merklizer>();
    }

    mod proptests {
        use super::*;
        use merklize_crypto::verify_proof;
        use proptest::prelude::*;

        fn scalar() -> impl Strategy<Value = serde_json::Value> {
            prop_oneof![
                "[a-z]{1,12}".prop_map(serde_json::Value::from),
                any::<i32>().prop_map(serde_json::Value::from),
                any::<bool>().prop_map(serde_json::Value::from),
            ]
        }

        fn document() -> impl Strategy<Value = serde_json::Value> {
            prop::collection::btree_map(
                "[a-z]{1,8}",
                prop::collection::vec(scalar(), 1..4),
                1..6,
            )
            .prop_map(|fields| {
                let mut doc = serde_json::Map::new();
                doc.insert("@context".into(), json!({"@vocab": EX}));
                doc.insert("@id".into(), json!("http://example.com/generated"));
                for (key, mut values) in fields {
                    let value = if values.len() == 1 {
                        values.remove(0)
                    } else {
                        serde_json::Value::Array(values)
                    };
                    doc.insert(key, value);
                }
                serde_json::Value::Object(doc)
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn every_entry_proves_existence(doc in document()) {
                let m = merklize(doc);
                prop_assert!(m.entry_count() > 0);
                let root = m.root();
                for entry in m.entries() {
                    let (proof, value) = m.proof(entry.path()).unwrap();
                    prop_assert!(proof.existence);
                    prop_assert_eq!(value.as_ref(), Some(entry.value()));
                    let (key, leaf) = entry.key_value_mt_entries(m.hasher()).unwrap();
                    prop_assert!(verify_proof(m.hasher(), &root, &proof, &key, &leaf).unwrap());
                }
            }
        }
    }
}
