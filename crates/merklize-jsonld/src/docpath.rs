//! # Dotted Path Resolution
//!
//! Turns human-friendly dotted shortcuts (`credentialSubject.1.birthDate`)
//! into IRI [`Path`]s, either against a live document or against a bare
//! JSON-LD context document.
//!
//! Digit-only tokens are array indices; every other token is a term of the
//! active context at that level. Resolution is recursive descent: each level
//! derives a fresh [`Context`] from its parent's and never modifies it.

use merklize_core::{Path, PathSegment};
use serde_json::Value;

use crate::context::Context;
use crate::error::JsonLdError;
use crate::loader::DocumentLoader;

fn tokens(dotted: &str) -> Result<Vec<&str>, JsonLdError> {
    if dotted.is_empty() {
        return Err(JsonLdError::EmptyPath);
    }
    let parts: Vec<&str> = dotted.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(JsonLdError::Shape(format!("empty segment in path '{dotted}'")));
    }
    Ok(parts)
}

fn as_index(token: &str) -> Option<&str> {
    token.bytes().all(|b| b.is_ascii_digit()).then_some(token)
}

// ---------------------------------------------------------------------------
// Document paths
// ---------------------------------------------------------------------------

/// Resolve a dotted field path against the document itself, honoring
/// embedded, property-scoped and type-scoped contexts at every level.
///
/// # Errors
///
/// - [`JsonLdError::Shape`]: an index applied to a non-array, a term applied
///   to a non-object, or an empty array.
/// - [`JsonLdError::NotFound`]: missing field or index out of range.
/// - [`JsonLdError::UnknownTerm`]: the field has no IRI mapping.
pub fn path_from_document(
    doc: &Value,
    dotted: &str,
    loader: &dyn DocumentLoader,
) -> Result<Path, JsonLdError> {
    let parts = tokens(dotted)?;
    let segments = DocumentWalker { loader }.walk(&Context::new(), doc, &parts, 0)?;
    Ok(Path::from(segments))
}

struct DocumentWalker<'l> {
    loader: &'l dyn DocumentLoader,
}

impl DocumentWalker<'_> {
    fn walk(
        &self,
        ctx: &Context,
        node: &Value,
        parts: &[&str],
        consumed: usize,
    ) -> Result<Vec<PathSegment>, JsonLdError> {
        let Some(token) = parts.get(consumed) else {
            return Ok(Vec::new());
        };
        let at = parts[..consumed].join(".");

        if let Some(digits) = as_index(token) {
            let Value::Array(items) = node else {
                return Err(JsonLdError::Shape(format!("expected array at '{at}'")));
            };
            if items.is_empty() {
                return Err(JsonLdError::Shape(format!("array is empty at '{at}'")));
            }
            let item = digits
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx).map(|item| (idx, item)));
            let Some((idx, item)) = item else {
                return Err(JsonLdError::NotFound(format!(
                    "index {digits} is out of range at '{at}'"
                )));
            };
            let mut segments = vec![PathSegment::Index(idx)];
            segments.extend(self.walk(ctx, item, parts, consumed + 1)?);
            return Ok(segments);
        }

        let obj = match node {
            Value::Object(obj) => obj,
            Value::Array(items) if items.is_empty() => {
                return Err(JsonLdError::Shape(format!("array is empty at '{at}'")))
            }
            _ => return Err(JsonLdError::Shape(format!("expected object at '{at}'"))),
        };
        let ctx = ctx.apply_embedded(obj, self.loader)?;
        let typed = ctx.type_scoped(obj, self.loader)?;

        let Some(child) = obj.get(*token) else {
            return Err(JsonLdError::NotFound(format!(
                "no term '{token}' in the document at '{at}'"
            )));
        };
        let iri = typed
            .expand_iri(token, true)
            .ok_or_else(|| JsonLdError::UnknownTerm((*token).to_owned()))?;
        let child_ctx = match typed.term(token).and_then(|d| d.scoped_context()) {
            Some(scoped) => ctx.parse(scoped, self.loader)?,
            None => ctx,
        };

        let mut segments = vec![PathSegment::Term(iri)];
        segments.extend(self.walk(&child_ctx, child, parts, consumed + 1)?);
        Ok(segments)
    }
}

// ---------------------------------------------------------------------------
// Context paths
// ---------------------------------------------------------------------------

struct ContextWalk {
    path: Path,
    last_type: Option<String>,
}

fn walk_context(
    ctx_doc: &Value,
    dotted: &str,
    loader: &dyn DocumentLoader,
) -> Result<ContextWalk, JsonLdError> {
    let parts = tokens(dotted)?;
    let local = ctx_doc
        .get("@context")
        .ok_or_else(|| JsonLdError::InvalidDocument("context document has no @context".into()))?;
    let mut ctx = Context::new().parse(local, loader)?;
    let mut segments = Vec::with_capacity(parts.len());
    let mut last_type = None;

    for token in parts {
        if let Some(digits) = as_index(token) {
            let idx = digits
                .parse::<usize>()
                .map_err(|_| JsonLdError::Shape(format!("index {digits} is too large")))?;
            segments.push(PathSegment::Index(idx));
            last_type = None;
            continue;
        }
        let def = ctx
            .term(token)
            .ok_or_else(|| JsonLdError::UnknownTerm(token.to_owned()))?;
        let iri = def
            .id()
            .ok_or_else(|| JsonLdError::UnknownTerm(token.to_owned()))?
            .to_owned();
        last_type = def.type_mapping().map(str::to_owned);
        let scoped = def.scoped_context().cloned();
        segments.push(PathSegment::Term(iri));
        if let Some(scoped) = scoped {
            ctx = ctx.parse(&scoped, loader)?;
        }
    }
    Ok(ContextWalk {
        path: Path::from(segments),
        last_type,
    })
}

/// Resolve a dotted shortcut (usually `Type.field.nested`) against a JSON-LD
/// context document, i.e. a document whose `@context` defines the terms.
///
/// # Errors
///
/// [`JsonLdError::UnknownTerm`] when a token has no `@id`.
pub fn path_from_context(
    ctx_doc: &Value,
    dotted: &str,
    loader: &dyn DocumentLoader,
) -> Result<Path, JsonLdError> {
    walk_context(ctx_doc, dotted, loader).map(|w| w.path)
}

/// Path of `field` within credentials of type `type_name`: the shortcut
/// `type_name.field` without its leading type segment.
pub fn field_path_from_context(
    ctx_doc: &Value,
    type_name: &str,
    field: &str,
    loader: &dyn DocumentLoader,
) -> Result<Path, JsonLdError> {
    let full = path_from_context(ctx_doc, &format!("{type_name}.{field}"), loader)?;
    Ok(Path::from(full.parts()[1..].to_vec()))
}

/// Declared `@type` of the term the shortcut ends at, `None` when the term
/// has no type coercion.
pub fn type_from_context(
    ctx_doc: &Value,
    dotted: &str,
    loader: &dyn DocumentLoader,
) -> Result<Option<String>, JsonLdError> {
    walk_context(ctx_doc, dotted, loader).map(|w| w.last_type)
}

/// IRI of a type name defined by a context document.
pub fn type_id_from_context(
    ctx_doc: &Value,
    type_name: &str,
    loader: &dyn DocumentLoader,
) -> Result<String, JsonLdError> {
    let path = path_from_context(ctx_doc, type_name, loader)?;
    match path.parts() {
        [PathSegment::Term(iri)] => Ok(iri.clone()),
        _ => Err(JsonLdError::UnknownTerm(type_name.to_owned())),
    }
}
