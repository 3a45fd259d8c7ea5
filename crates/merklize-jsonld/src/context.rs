//! # JSON-LD Active Context
//!
//! Processes local contexts (objects, arrays, remote references) into an
//! immutable [`Context`] value: term definitions, `@vocab`, `@base` and
//! default language. Parsing never mutates its receiver; every call returns
//! a new context, so recursive descent over a document can hand each level
//! its own context without cloning discipline at the call sites.
//!
//! Supported:
//!
//! - simple and expanded term definitions (`@id`, `@reverse`, `@type`,
//!   `@container`, `@language`, `@protected`, `@context`)
//! - compact IRIs (`prefix:suffix`) and terms defined in terms of other
//!   terms of the same local context, in any order
//! - `@vocab`, `@base`, `@language`, `@import`, `null` resets
//! - property-scoped and type-scoped contexts (stored on the term and
//!   applied on demand)
//! - remote contexts through a [`DocumentLoader`], depth-limited
//!
//! Protected-term redefinition is not enforced; it only restricts which
//! documents are valid and never changes the IRI a term expands to.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use url::Url;

use crate::error::JsonLdError;
use crate::loader::DocumentLoader;

/// Maximum nesting of remote context references.
pub const MAX_CONTEXT_DEPTH: usize = 32;

/// True for JSON-LD 1.1 keywords.
pub fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "@base"
            | "@container"
            | "@context"
            | "@direction"
            | "@graph"
            | "@id"
            | "@import"
            | "@included"
            | "@index"
            | "@json"
            | "@language"
            | "@list"
            | "@nest"
            | "@none"
            | "@prefix"
            | "@propagate"
            | "@protected"
            | "@reverse"
            | "@set"
            | "@type"
            | "@value"
            | "@version"
            | "@vocab"
    )
}

/// Definition of one term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDefinition {
    id: Option<String>,
    reverse: bool,
    type_mapping: Option<String>,
    container: Vec<String>,
    language: Option<String>,
    scoped_context: Option<Value>,
    protected: bool,
}

impl TermDefinition {
    /// Expanded IRI or keyword; `None` for terms explicitly mapped to null.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Expanded `@type` coercion (a datatype IRI, `@id`, `@vocab`, ...).
    pub fn type_mapping(&self) -> Option<&str> {
        self.type_mapping.as_deref()
    }

    pub fn container(&self) -> &[String] {
        &self.container
    }

    pub fn has_container(&self, keyword: &str) -> bool {
        self.container.iter().any(|c| c == keyword)
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Property-scoped (or, for types, type-scoped) local context.
    pub fn scoped_context(&self) -> Option<&Value> {
        self.scoped_context.as_ref()
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }
}

/// Active context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    terms: BTreeMap<String, TermDefinition>,
    vocab: Option<String>,
    base: Option<String>,
    language: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty context resolving relative IRIs against `base`.
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ..Self::default()
        }
    }

    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermDefinition)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Apply a local context (`@context` value) on top of this one.
    ///
    /// # Errors
    ///
    /// [`JsonLdError::InvalidContext`] for malformed definitions and cyclic
    /// term mappings, loader errors for unreachable remote contexts.
    pub fn parse(&self, local: &Value, loader: &dyn DocumentLoader) -> Result<Context, JsonLdError> {
        self.process(local, loader, 0)
    }

    /// Apply the `@context` embedded in `node`, if any.
    pub fn apply_embedded(
        &self,
        node: &Map<String, Value>,
        loader: &dyn DocumentLoader,
    ) -> Result<Context, JsonLdError> {
        match node.get("@context") {
            Some(local) => self.parse(local, loader),
            None => Ok(self.clone()),
        }
    }

    /// Apply the type-scoped contexts of `node`'s types, in lexicographic
    /// order of the type terms.
    pub fn type_scoped(
        &self,
        node: &Map<String, Value>,
        loader: &dyn DocumentLoader,
    ) -> Result<Context, JsonLdError> {
        let types = self.node_types(node);
        let mut scoped = self.clone();
        for t in types {
            if let Some(local) = self.terms.get(t).and_then(|d| d.scoped_context.as_ref()) {
                scoped = scoped.parse(local, loader)?;
            }
        }
        Ok(scoped)
    }

    /// Unexpanded type terms of `node`, sorted.
    pub fn node_types<'n>(&self, node: &'n Map<String, Value>) -> Vec<&'n str> {
        let mut types: Vec<&str> = Vec::new();
        for (key, value) in node {
            if self.expand_iri(key, true).as_deref() != Some("@type") {
                continue;
            }
            match value {
                Value::String(s) => types.push(s),
                Value::Array(items) => types.extend(items.iter().filter_map(Value::as_str)),
                _ => {}
            }
        }
        types.sort_unstable();
        types
    }

    /// Expand `value` to an absolute IRI or keyword.
    ///
    /// With `vocab` set, terms and `@vocab` apply (property and type
    /// position); otherwise relative references resolve against `@base`
    /// (`@id` position). Returns `None` when nothing applies or the term is
    /// mapped to null.
    pub fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_owned());
        }
        if vocab {
            if let Some(def) = self.terms.get(value) {
                return def.id.clone();
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_owned());
            }
            if let Some(Some(prefix_iri)) = self.terms.get(prefix).map(|d| d.id.as_deref()) {
                return Some(format!("{prefix_iri}{suffix}"));
            }
            return Some(value.to_owned());
        }
        if vocab {
            return self.vocab.as_ref().map(|v| format!("{v}{value}"));
        }
        let base = Url::parse(self.base.as_deref()?).ok()?;
        base.join(value).ok().map(String::from)
    }

    fn process(
        &self,
        local: &Value,
        loader: &dyn DocumentLoader,
        depth: usize,
    ) -> Result<Context, JsonLdError> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(JsonLdError::InvalidContext(format!(
                "remote context inclusion exceeds {MAX_CONTEXT_DEPTH} levels"
            )));
        }
        match local {
            Value::Array(items) => {
                let mut ctx = self.clone();
                for item in items {
                    ctx = ctx.process(item, loader, depth)?;
                }
                Ok(ctx)
            }
            Value::Null => Ok(Context {
                base: self.base.clone(),
                ..Context::default()
            }),
            Value::String(reference) => {
                let url = self.resolve_reference(reference);
                let remote = loader.load_document(&url)?;
                let inner = remote.document.get("@context").ok_or_else(|| {
                    JsonLdError::InvalidContext(format!("remote document {url} has no @context"))
                })?;
                tracing::debug!(url = %url, "applying remote context");
                self.process(inner, loader, depth + 1)
            }
            Value::Object(map) => self.apply_object(map, loader),
            other => Err(JsonLdError::InvalidContext(format!(
                "local context must be an object, array, string or null, got {other}"
            ))),
        }
    }

    fn resolve_reference(&self, reference: &str) -> String {
        if Url::parse(reference).is_ok() {
            return reference.to_owned();
        }
        self.base
            .as_deref()
            .and_then(|b| Url::parse(b).ok())
            .and_then(|b| b.join(reference).ok())
            .map(String::from)
            .unwrap_or_else(|| reference.to_owned())
    }

    fn apply_object(
        &self,
        map: &Map<String, Value>,
        loader: &dyn DocumentLoader,
    ) -> Result<Context, JsonLdError> {
        let mut ctx = self.clone();

        let merged;
        let map = match map.get("@import") {
            Some(import) => {
                let url = import.as_str().ok_or_else(|| {
                    JsonLdError::InvalidContext("@import must be a string".into())
                })?;
                let url = self.resolve_reference(url);
                let remote = loader.load_document(&url)?;
                let imported = remote
                    .document
                    .get("@context")
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        JsonLdError::InvalidContext(format!(
                            "imported context {url} must be an object"
                        ))
                    })?;
                let mut combined = imported.clone();
                for (k, v) in map {
                    if k != "@import" {
                        combined.insert(k.clone(), v.clone());
                    }
                }
                merged = combined;
                &merged
            }
            None => map,
        };

        if let Some(base) = map.get("@base") {
            ctx.base = match base {
                Value::Null => None,
                Value::String(b) => Some(ctx.resolve_reference(b)),
                _ => return Err(JsonLdError::InvalidContext("@base must be a string".into())),
            };
        }
        if let Some(vocab) = map.get("@vocab") {
            ctx.vocab = match vocab {
                Value::Null => None,
                Value::String(v) => Some(ctx.expand_iri(v, true).unwrap_or_else(|| v.clone())),
                _ => return Err(JsonLdError::InvalidContext("@vocab must be a string".into())),
            };
        }
        if let Some(language) = map.get("@language") {
            ctx.language = language.as_str().map(str::to_lowercase);
        }

        let mut definer = TermDefiner {
            local: map,
            state: HashMap::new(),
        };
        for key in map.keys() {
            if key.starts_with('@') {
                continue;
            }
            definer.define(&mut ctx, key)?;
        }
        Ok(ctx)
    }
}

/// Creates term definitions of one local context, resolving dependencies
/// between its terms on demand.
struct TermDefiner<'a> {
    local: &'a Map<String, Value>,
    /// `false` while a term is being defined, `true` once done.
    state: HashMap<String, bool>,
}

impl<'a> TermDefiner<'a> {
    fn define(&mut self, ctx: &mut Context, term: &str) -> Result<(), JsonLdError> {
        match self.state.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(JsonLdError::InvalidContext(format!(
                    "cyclic IRI mapping for term {term}"
                )))
            }
            None => {}
        }
        let local = self.local;
        let Some(value) = local.get(term) else {
            return Ok(());
        };
        self.state.insert(term.to_owned(), false);

        let mut def = TermDefinition::default();
        // `Some(None)` records an explicit `"@id": null`.
        let mut explicit_id: Option<Option<&str>> = None;
        match value {
            Value::Null => explicit_id = Some(None),
            Value::String(s) => explicit_id = Some(Some(s.as_str())),
            Value::Object(m) => {
                if let Some(id) = m.get("@id") {
                    explicit_id = Some(match id {
                        Value::Null => None,
                        Value::String(s) => Some(s.as_str()),
                        _ => {
                            return Err(JsonLdError::InvalidContext(format!(
                                "@id of term {term} must be a string"
                            )))
                        }
                    });
                }
                if let Some(Value::String(r)) = m.get("@reverse") {
                    explicit_id = Some(Some(r.as_str()));
                    def.reverse = true;
                }
                if let Some(t) = m.get("@type") {
                    let t = t.as_str().ok_or_else(|| {
                        JsonLdError::InvalidContext(format!("@type of term {term} must be a string"))
                    })?;
                    def.type_mapping = Some(if is_keyword(t) {
                        t.to_owned()
                    } else {
                        self.expand(ctx, t)?.unwrap_or_else(|| t.to_owned())
                    });
                }
                if let Some(c) = m.get("@container") {
                    def.container = match c {
                        Value::String(s) => vec![s.clone()],
                        Value::Array(items) => items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_owned)
                            .collect(),
                        Value::Null => Vec::new(),
                        _ => {
                            return Err(JsonLdError::InvalidContext(format!(
                                "invalid @container for term {term}"
                            )))
                        }
                    };
                }
                if let Some(scoped) = m.get("@context") {
                    def.scoped_context = Some(scoped.clone());
                }
                if let Some(language) = m.get("@language") {
                    def.language = language.as_str().map(str::to_lowercase);
                }
                if let Some(Value::Bool(p)) = m.get("@protected") {
                    def.protected = *p;
                }
            }
            _ => {
                return Err(JsonLdError::InvalidContext(format!(
                    "invalid term definition for {term}"
                )))
            }
        }

        def.id = match explicit_id {
            Some(None) => None,
            Some(Some(raw)) if is_keyword(raw) => Some(raw.to_owned()),
            Some(Some(raw)) if raw == term => self.expand_prefixed(ctx, raw)?,
            Some(Some(raw)) => Some(self.expand(ctx, raw)?.unwrap_or_else(|| raw.to_owned())),
            None if term.contains(':') => self.expand_prefixed(ctx, term)?,
            None => ctx.vocab.as_ref().map(|v| format!("{v}{term}")),
        };

        ctx.terms.insert(term.to_owned(), def);
        self.state.insert(term.to_owned(), true);
        Ok(())
    }

    /// Vocabulary-relative expansion that first defines any term of the
    /// local context it depends on.
    fn expand(&mut self, ctx: &mut Context, value: &str) -> Result<Option<String>, JsonLdError> {
        if is_keyword(value) {
            return Ok(Some(value.to_owned()));
        }
        if self.local.contains_key(value) {
            self.define(ctx, value)?;
        }
        if let Some(def) = ctx.terms.get(value) {
            return Ok(def.id.clone());
        }
        self.expand_prefixed(ctx, value)
    }

    fn expand_prefixed(
        &mut self,
        ctx: &mut Context,
        value: &str,
    ) -> Result<Option<String>, JsonLdError> {
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Ok(Some(value.to_owned()));
            }
            if self.local.contains_key(prefix) {
                self.define(ctx, prefix)?;
            }
            if let Some(Some(prefix_iri)) = ctx.terms.get(prefix).map(|d| d.id.as_deref()) {
                return Ok(Some(format!("{prefix_iri}{suffix}")));
            }
            return Ok(Some(value.to_owned()));
        }
        Ok(ctx.vocab.as_ref().map(|v| format!("{v}{value}")))
    }
}
