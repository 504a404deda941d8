//! Active context: term definitions built up from layered context declarations

use super::error::{JsonLdError, JsonLdResult};
use super::loader::ContextLoader;
use crate::graph::{is_absolute_iri, resolve_iri};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Remote contexts may include other contexts; this bounds the nesting.
pub const MAX_CONTEXT_DEPTH: usize = 16;

/// How string values of a term are coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMapping {
    /// Value is an IRI reference (document-relative)
    Id,
    /// Value is a vocabulary-relative IRI
    Vocab,
    /// Value is embedded JSON
    Json,
    /// Value is a literal of this datatype
    Datatype(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMapping {
    List,
    Set,
    Language,
}

/// A single term definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    /// Expanded IRI, or a keyword when the term is an alias
    pub iri: String,
    pub type_mapping: Option<TypeMapping>,
    pub container: Option<ContainerMapping>,
    /// `Some(None)` clears the default language for this term
    pub language: Option<Option<String>>,
}

impl TermDefinition {
    fn new(iri: String) -> Self {
        Self {
            iri,
            type_mapping: None,
            container: None,
            language: None,
        }
    }
}

/// The result of processing an ordered list of context declarations.
///
/// Later declarations override earlier ones. A term mapped to `null`
/// is kept as `None` so it shadows `@vocab`.
#[derive(Debug, Clone, Default)]
pub struct ActiveContext {
    terms: HashMap<String, Option<TermDefinition>>,
    vocab: Option<String>,
    base: Option<String>,
    language: Option<String>,
}

impl ActiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Definition for an exact term, if one is in effect.
    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term).and_then(|d| d.as_ref())
    }

    /// Apply a local context (string reference, object, array or null).
    pub fn process(&self, local: &Value, loader: &dyn ContextLoader) -> JsonLdResult<Self> {
        self.process_at_depth(local, loader, 0)
    }

    fn process_at_depth(
        &self,
        local: &Value,
        loader: &dyn ContextLoader,
        depth: usize,
    ) -> JsonLdResult<Self> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(JsonLdError::ContextOverflow(MAX_CONTEXT_DEPTH));
        }

        let entries: Vec<&Value> = match local {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        let mut result = self.clone();
        for entry in entries {
            match entry {
                Value::Null => result = ActiveContext::new(),
                Value::String(reference) => {
                    let document = dereference(reference, loader)?;
                    let embedded = match document {
                        Value::Object(mut map) if map.contains_key("@context") => {
                            map.remove("@context").unwrap_or(Value::Null)
                        }
                        other => other,
                    };
                    result = result.process_at_depth(&embedded, loader, depth + 1)?;
                }
                Value::Object(definitions) => result.apply_definitions(definitions)?,
                other => {
                    return Err(JsonLdError::InvalidContext {
                        message: format!("unexpected context entry: {}", other),
                    })
                }
            }
        }
        Ok(result)
    }

    fn apply_definitions(&mut self, local: &Map<String, Value>) -> JsonLdResult<()> {
        if let Some(base) = local.get("@base") {
            self.base = match base {
                Value::Null => None,
                Value::String(b) => Some(match &self.base {
                    Some(current) if !is_absolute_iri(b) => resolve_iri(current, b)
                        .map_err(|e| invalid(format!("invalid @base '{}': {}", b, e)))?,
                    _ => b.clone(),
                }),
                other => return Err(invalid(format!("@base must be a string, found {}", other))),
            };
        }
        if let Some(vocab) = local.get("@vocab") {
            self.vocab = match vocab {
                Value::Null => None,
                Value::String(v) => Some(
                    self.expand_iri(v, true)
                        .ok_or_else(|| invalid(format!("invalid @vocab '{}'", v)))?,
                ),
                other => return Err(invalid(format!("@vocab must be a string, found {}", other))),
            };
        }
        if let Some(language) = local.get("@language") {
            self.language = match language {
                Value::Null => None,
                Value::String(l) => Some(l.to_lowercase()),
                other => return Err(invalid(format!("@language must be a string, found {}", other))),
            };
        }

        let mut defined = HashMap::new();
        for term in local.keys() {
            if !term.starts_with('@') {
                self.define_term(term, local, &mut defined)?;
            }
        }
        Ok(())
    }

    /// Create the definition for `term`, defining any prefix it depends on
    /// (from the same local context) first.
    fn define_term(
        &mut self,
        term: &str,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> JsonLdResult<()> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(JsonLdError::CyclicIriMapping {
                    term: term.to_string(),
                })
            }
            None => {}
        }
        defined.insert(term.to_string(), false);

        let definition = match &local[term] {
            Value::Null => None,
            Value::String(iri) => Some(TermDefinition::new(
                self.expand_for_definition(term, iri, local, defined)?,
            )),
            Value::Object(entry) => self.object_definition(term, entry, local, defined)?,
            _ => {
                return Err(JsonLdError::InvalidIriMapping {
                    term: term.to_string(),
                })
            }
        };

        self.terms.insert(term.to_string(), definition);
        defined.insert(term.to_string(), true);
        Ok(())
    }

    fn object_definition(
        &mut self,
        term: &str,
        entry: &Map<String, Value>,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> JsonLdResult<Option<TermDefinition>> {
        // Reverse properties are not materialised.
        if entry.contains_key("@reverse") {
            return Ok(None);
        }

        let iri = match entry.get("@id") {
            Some(Value::Null) => return Ok(None),
            Some(Value::String(id)) => self.expand_for_definition(term, id, local, defined)?,
            Some(_) => {
                return Err(JsonLdError::InvalidIriMapping {
                    term: term.to_string(),
                })
            }
            None => self.expand_for_definition(term, term, local, defined)?,
        };
        let mut definition = TermDefinition::new(iri);

        if let Some(type_value) = entry.get("@type") {
            let Value::String(t) = type_value else {
                return Err(invalid(format!("@type of term '{}' must be a string", term)));
            };
            definition.type_mapping = Some(match t.as_str() {
                "@id" => TypeMapping::Id,
                "@vocab" => TypeMapping::Vocab,
                "@json" => TypeMapping::Json,
                other => {
                    let datatype = self.expand_for_definition(term, other, local, defined)?;
                    if !is_absolute_iri(&datatype) {
                        return Err(invalid(format!("invalid @type '{}' of term '{}'", other, term)));
                    }
                    TypeMapping::Datatype(datatype)
                }
            });
        }

        if let Some(container) = entry.get("@container") {
            let values: Vec<&Value> = match container {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            definition.container = values.iter().find_map(|v| match v.as_str() {
                Some("@list") => Some(ContainerMapping::List),
                Some("@set") => Some(ContainerMapping::Set),
                Some("@language") => Some(ContainerMapping::Language),
                _ => None,
            });
        }

        if let Some(language) = entry.get("@language") {
            definition.language = Some(language.as_str().map(str::to_lowercase));
        }

        Ok(Some(definition))
    }

    /// Expand the IRI a term maps to, defining a prefix from the same local
    /// context first when the value is a compact IRI or another term.
    fn expand_for_definition(
        &mut self,
        term: &str,
        value: &str,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> JsonLdResult<String> {
        if value.starts_with('@') {
            return Ok(value.to_string());
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix != term && !suffix.starts_with("//") && local.contains_key(prefix) {
                self.define_term(prefix, local, defined)?;
            }
        } else if value != term && local.contains_key(value) {
            self.define_term(value, local, defined)?;
        }

        // A term never expands through its own (not yet created) definition.
        let shadowed = self.terms.remove(term);
        let expanded = self.expand_iri(value, true);
        if let Some(previous) = shadowed {
            self.terms.insert(term.to_string(), previous);
        }

        match expanded {
            Some(iri) if iri.starts_with("_:") || is_absolute_iri(&iri) => Ok(iri),
            _ => Err(JsonLdError::InvalidIriMapping {
                term: term.to_string(),
            }),
        }
    }

    /// Expand a term, compact IRI or relative reference.
    ///
    /// `vocab` selects vocabulary-relative expansion (properties, types);
    /// otherwise the value is resolved against `@base` (node identifiers).
    /// Returns `None` when the value cannot be made into an IRI or keyword.
    pub fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        if value.starts_with('@') {
            return Some(value.to_string());
        }
        if vocab {
            if let Some(definition) = self.terms.get(value) {
                return definition.as_ref().map(|d| d.iri.clone());
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(Some(definition)) = self.terms.get(prefix) {
                return Some(format!("{}{}", definition.iri, suffix));
            }
            if is_absolute_iri(value) {
                return Some(value.to_string());
            }
        }
        if vocab {
            return self.vocab.as_ref().map(|v| format!("{}{}", v, value));
        }
        self.base
            .as_ref()
            .and_then(|base| resolve_iri(base, value).ok())
    }
}

fn invalid(message: String) -> JsonLdError {
    JsonLdError::InvalidContext { message }
}

/// A reference that is itself a JSON object is an inline context.
fn dereference(reference: &str, loader: &dyn ContextLoader) -> JsonLdResult<Value> {
    let trimmed = reference.trim_start();
    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed).map_err(|e| JsonLdError::LoadingContextFailed {
            reference: reference.to_string(),
            message: e.to_string(),
        });
    }
    loader.load(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonld::StaticContextLoader;
    use serde_json::json;

    fn process(local: Value) -> ActiveContext {
        ActiveContext::new()
            .process(&local, &StaticContextLoader::new())
            .unwrap()
    }

    #[test]
    fn prefixes_defined_in_same_context_resolve_in_any_order() {
        let ctx = process(json!({
            "name": "schema:name",
            "schema": "http://schema.org/"
        }));
        assert_eq!(ctx.expand_iri("name", true).as_deref(), Some("http://schema.org/name"));
        assert_eq!(
            ctx.expand_iri("schema:Person", true).as_deref(),
            Some("http://schema.org/Person")
        );
    }

    #[test]
    fn later_contexts_override_earlier_ones() {
        let ctx = process(json!([
            {"name": "http://a.example/name"},
            {"name": "http://b.example/name"}
        ]));
        assert_eq!(ctx.expand_iri("name", true).as_deref(), Some("http://b.example/name"));
    }

    #[test]
    fn unknown_terms_do_not_expand_without_vocab() {
        let ctx = process(json!({"name": "http://schema.org/name"}));
        assert_eq!(ctx.expand_iri("age", true), None);

        let with_vocab = process(json!({"@vocab": "http://example.org/"}));
        assert_eq!(
            with_vocab.expand_iri("age", true).as_deref(),
            Some("http://example.org/age")
        );
    }

    #[test]
    fn null_term_shadows_vocab() {
        let ctx = process(json!([{"@vocab": "http://example.org/"}, {"secret": null}]));
        assert_eq!(ctx.expand_iri("secret", true), None);
    }

    #[test]
    fn keyword_aliases_expand_to_keywords() {
        let ctx = process(json!({"id": "@id", "type": "@type"}));
        assert_eq!(ctx.expand_iri("id", true).as_deref(), Some("@id"));
        assert_eq!(ctx.expand_iri("type", true).as_deref(), Some("@type"));
    }

    #[test]
    fn object_definitions_carry_coercion() {
        let ctx = process(json!({
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "knows": {"@id": "http://xmlns.com/foaf/0.1/knows", "@type": "@id"},
            "born": {"@id": "http://example.org/born", "@type": "xsd:date"},
            "tags": {"@id": "http://example.org/tags", "@container": "@list"},
            "label": {"@id": "http://example.org/label", "@language": "NL"}
        }));
        assert_eq!(ctx.term("knows").unwrap().type_mapping, Some(TypeMapping::Id));
        assert_eq!(
            ctx.term("born").unwrap().type_mapping,
            Some(TypeMapping::Datatype("http://www.w3.org/2001/XMLSchema#date".into()))
        );
        assert_eq!(ctx.term("tags").unwrap().container, Some(ContainerMapping::List));
        assert_eq!(ctx.term("label").unwrap().language, Some(Some("nl".into())));
    }

    #[test]
    fn cyclic_definitions_are_rejected() {
        let result = ActiveContext::new().process(
            &json!({"a": "b:x", "b": "a:y"}),
            &StaticContextLoader::new(),
        );
        assert!(matches!(result, Err(JsonLdError::CyclicIriMapping { .. })));
    }

    #[test]
    fn remote_contexts_are_loaded_and_unwrapped() {
        let loader = StaticContextLoader::new().with(
            "http://example.org/ctx.jsonld",
            json!({"@context": {"name": "http://schema.org/name"}}),
        );
        let ctx = ActiveContext::new()
            .process(&json!("http://example.org/ctx.jsonld"), &loader)
            .unwrap();
        assert_eq!(ctx.expand_iri("name", true).as_deref(), Some("http://schema.org/name"));
    }

    #[test]
    fn inline_context_references_skip_the_loader() {
        let ctx = ActiveContext::new()
            .process(
                &json!(r#"{"name": "http://schema.org/name"}"#),
                &StaticContextLoader::new(),
            )
            .unwrap();
        assert!(ctx.term("name").is_some());
    }

    #[test]
    fn self_including_context_overflows() {
        let loader = StaticContextLoader::new().with("urn:loop", json!({"@context": "urn:loop"}));
        let result = ActiveContext::new().process(&json!("urn:loop"), &loader);
        assert!(matches!(result, Err(JsonLdError::ContextOverflow(_))));
    }

    #[test]
    fn null_resets_the_context() {
        let ctx = process(json!([{"name": "http://schema.org/name"}, null]));
        assert!(ctx.term("name").is_none());
    }

    #[test]
    fn relative_references_resolve_against_base() {
        let ctx = process(json!({"@base": "http://example.org/data/people?x=1#frag"}));
        let expand = |value: &str| ctx.expand_iri(value, false);
        assert_eq!(expand("alice").as_deref(), Some("http://example.org/data/alice"));
        assert_eq!(expand("/root").as_deref(), Some("http://example.org/root"));
        assert_eq!(expand("#me").as_deref(), Some("http://example.org/data/people?x=1#me"));
        assert_eq!(expand("?q").as_deref(), Some("http://example.org/data/people?q"));
        assert_eq!(expand("//other.org/x").as_deref(), Some("http://other.org/x"));
        assert_eq!(expand("../up").as_deref(), Some("http://example.org/up"));
        assert_eq!(expand("urn:x:1").as_deref(), Some("urn:x:1"));
    }

    #[test]
    fn relative_base_resolves_against_the_current_one() {
        let ctx = process(json!([
            {"@base": "http://example.org/a/b/"},
            {"@base": "../c/"}
        ]));
        assert_eq!(
            ctx.expand_iri("d", false).as_deref(),
            Some("http://example.org/a/c/d")
        );
    }
}
