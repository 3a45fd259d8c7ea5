//! # Compacted View
//!
//! IRI-keyed view of a JSON-LD document used for raw value lookups. Every
//! property key is replaced by its expanded IRI, `@id` and `@type` values
//! are expanded, and values coerced by their term definition are wrapped
//! into value or node objects. Array order is the document's own.
//!
//! ## Safe Mode
//!
//! A property that does not expand to an absolute IRI or keyword is an
//! error in safe mode ([`JsonLdError::InvalidProperty`]). Outside safe mode
//! it is dropped from the view, exactly as JSON-LD expansion drops it from
//! the RDF dataset.

use serde_json::{Map, Value};

use crate::context::{is_keyword, Context, TermDefinition};
use crate::error::JsonLdError;
use crate::loader::DocumentLoader;

/// Build the compacted view of `doc`.
///
/// A top-level array becomes `{"@graph": [...]}`.
///
/// # Errors
///
/// [`JsonLdError::InvalidDocument`] for scalar documents,
/// [`JsonLdError::InvalidProperty`] in safe mode, context errors.
pub fn compact_document(
    doc: &Value,
    loader: &dyn DocumentLoader,
    safe_mode: bool,
) -> Result<Value, JsonLdError> {
    let compactor = Compactor { loader, safe_mode };
    let root = Context::new();
    match doc {
        Value::Object(obj) => compactor.node(&root, obj),
        Value::Array(items) => {
            let graph = items
                .iter()
                .map(|item| compactor.value(&root, item, None))
                .collect::<Result<Vec<_>, _>>()?;
            let mut out = Map::new();
            out.insert("@graph".to_owned(), Value::Array(graph));
            Ok(Value::Object(out))
        }
        other => Err(JsonLdError::InvalidDocument(format!(
            "document must be an object or array, got {}",
            json_kind(other)
        ))),
    }
}

struct Compactor<'l> {
    loader: &'l dyn DocumentLoader,
    safe_mode: bool,
}

impl Compactor<'_> {
    fn node(&self, ctx: &Context, obj: &Map<String, Value>) -> Result<Value, JsonLdError> {
        let ctx = ctx.apply_embedded(obj, self.loader)?;
        let typed = ctx.type_scoped(obj, self.loader)?;
        let mut out = Map::new();

        for (key, value) in obj {
            if key == "@context" {
                continue;
            }
            let Some(iri) = typed.expand_iri(key, true).filter(|iri| is_absolute_or_keyword(iri))
            else {
                if key.starts_with('@') {
                    continue;
                }
                if self.safe_mode {
                    return Err(JsonLdError::InvalidProperty(key.clone()));
                }
                tracing::debug!(property = %key, "dropping property without IRI mapping");
                continue;
            };

            let compacted = match iri.as_str() {
                "@id" => match value {
                    Value::String(s) => Value::String(typed.expand_iri(s, false).unwrap_or_else(|| s.clone())),
                    other => other.clone(),
                },
                "@type" => self.types(&typed, value),
                "@graph" | "@list" | "@set" | "@included" => self.value(&ctx, value, None)?,
                k if k.starts_with('@') => value.clone(),
                _ => {
                    let def = typed.term(key);
                    let child = match def.and_then(TermDefinition::scoped_context) {
                        Some(scoped) => ctx.parse(scoped, self.loader)?,
                        None => ctx.clone(),
                    };
                    self.value(&child, value, def)?
                }
            };
            merge_into(&mut out, iri, compacted);
        }
        Ok(Value::Object(out))
    }

    fn types(&self, ctx: &Context, value: &Value) -> Value {
        let expand = |t: &str| Value::String(ctx.expand_iri(t, true).unwrap_or_else(|| t.to_owned()));
        match value {
            Value::String(t) => expand(t),
            Value::Array(items) => {
                let mut types: Vec<Value> = items
                    .iter()
                    .map(|t| t.as_str().map_or_else(|| t.clone(), expand))
                    .collect();
                if types.len() == 1 {
                    types.remove(0)
                } else {
                    Value::Array(types)
                }
            }
            other => other.clone(),
        }
    }

    fn value(
        &self,
        ctx: &Context,
        value: &Value,
        def: Option<&TermDefinition>,
    ) -> Result<Value, JsonLdError> {
        match value {
            Value::Array(items) => {
                let mut out = items
                    .iter()
                    .map(|item| self.value(ctx, item, def))
                    .collect::<Result<Vec<_>, _>>()?;
                if def.is_some_and(|d| d.has_container("@list")) {
                    let mut list = Map::new();
                    list.insert("@list".to_owned(), Value::Array(out));
                    return Ok(Value::Object(list));
                }
                if out.len() == 1 {
                    Ok(out.remove(0))
                } else {
                    Ok(Value::Array(out))
                }
            }
            Value::Object(obj) if obj.contains_key("@value") => Ok(self.value_object(ctx, obj)),
            Value::Object(obj) if obj.contains_key("@list") => {
                let items = match &obj["@list"] {
                    Value::Array(items) => items
                        .iter()
                        .map(|item| self.value(ctx, item, None))
                        .collect::<Result<Vec<_>, _>>()?,
                    single => vec![self.value(ctx, single, None)?],
                };
                let mut list = Map::new();
                list.insert("@list".to_owned(), Value::Array(items));
                Ok(Value::Object(list))
            }
            Value::Object(obj) => self.node(ctx, obj),
            Value::Null => Ok(Value::Null),
            scalar => Ok(coerce(ctx, scalar, def)),
        }
    }

    fn value_object(&self, ctx: &Context, obj: &Map<String, Value>) -> Value {
        let mut out = Map::new();
        for (key, value) in obj {
            match key.as_str() {
                "@type" => {
                    out.insert(key.clone(), self.types(ctx, value));
                }
                "@value" | "@language" | "@direction" | "@index" => {
                    out.insert(key.clone(), value.clone());
                }
                _ => {}
            }
        }
        if out.len() == 1 {
            if let Some(v) = out.remove("@value") {
                return v;
            }
        }
        Value::Object(out)
    }
}

/// Wrap a scalar according to its term's `@type` coercion.
fn coerce(ctx: &Context, scalar: &Value, def: Option<&TermDefinition>) -> Value {
    let Some(mapping) = def.and_then(TermDefinition::type_mapping) else {
        return scalar.clone();
    };
    let mut out = Map::new();
    match (mapping, scalar) {
        ("@id", Value::String(s)) => {
            out.insert("@id".to_owned(), Value::String(ctx.expand_iri(s, false).unwrap_or_else(|| s.clone())));
        }
        ("@vocab", Value::String(s)) => {
            out.insert("@id".to_owned(), Value::String(ctx.expand_iri(s, true).unwrap_or_else(|| s.clone())));
        }
        (m, _) if is_keyword(m) => return scalar.clone(),
        (datatype, _) => {
            out.insert("@type".to_owned(), Value::String(datatype.to_owned()));
            out.insert("@value".to_owned(), scalar.clone());
        }
    }
    Value::Object(out)
}

fn merge_into(out: &mut Map<String, Value>, key: String, value: Value) {
    match out.get_mut(&key) {
        None => {
            out.insert(key, value);
        }
        Some(Value::Array(existing)) => match value {
            Value::Array(more) => existing.extend(more),
            single => existing.push(single),
        },
        Some(existing) => {
            let first = existing.take();
            let mut merged = vec![first];
            match value {
                Value::Array(more) => merged.extend(more),
                single => merged.push(single),
            }
            *existing = Value::Array(merged);
        }
    }
}

fn is_absolute_or_keyword(iri: &str) -> bool {
    is_keyword(iri) || iri.contains(':')
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
