//! JSON-LD document → RDF graph
//!
//! Expansion and RDF conversion happen in one walk over the compact
//! document: each key is expanded through the active context and turned
//! into triples immediately. Keys that do not expand to an absolute IRI
//! produce nothing.

use super::context::{ActiveContext, ContainerMapping, TermDefinition, TypeMapping};
use super::error::{JsonLdError, JsonLdResult};
use super::loader::ContextLoader;
use crate::graph::vocab::{rdf, xsd};
use crate::graph::{
    is_absolute_iri, BlankNode, Graph, Literal, NamedNode, NamedNodeRef, Subject, Term, Triple,
};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use tracing::debug;

/// Convert a JSON-LD document (with its `@context`) into a graph.
///
/// Blank nodes are labelled `b0`, `b1`, ... in document order; labels written
/// in the document (`_:x`) are mapped onto the same scheme, so they are only
/// meaningful within the returned graph.
pub fn to_rdf(document: &Value, loader: &dyn ContextLoader) -> JsonLdResult<Graph> {
    let mut converter = Converter {
        loader,
        graph: Graph::new(),
        labels: HashMap::new(),
        next_label: 0,
    };

    let root = ActiveContext::new();
    match document {
        Value::Object(object) => {
            converter.node(object, &root)?;
        }
        Value::Array(items) => {
            for item in items {
                let Value::Object(object) = item else {
                    return Err(JsonLdError::NotAnObject);
                };
                converter.node(object, &root)?;
            }
        }
        _ => return Err(JsonLdError::NotAnObject),
    }
    Ok(converter.graph)
}

struct Converter<'a> {
    loader: &'a dyn ContextLoader,
    graph: Graph,
    labels: HashMap<String, BlankNode>,
    next_label: usize,
}

impl Converter<'_> {
    fn fresh_blank(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.next_label));
        self.next_label += 1;
        node
    }

    fn labelled_blank(&mut self, label: &str) -> BlankNode {
        if let Some(node) = self.labels.get(label) {
            return node.clone();
        }
        let node = self.fresh_blank();
        self.labels.insert(label.to_string(), node.clone());
        node
    }

    /// Resolve an identifier to a subject; `None` when it cannot be made absolute.
    fn identify(&mut self, id: &str, context: &ActiveContext, vocab: bool) -> Option<Subject> {
        let expanded = context.expand_iri(id, vocab)?;
        if let Some(label) = expanded.strip_prefix("_:") {
            return Some(Subject::BlankNode(self.labelled_blank(label)));
        }
        NamedNode::new(expanded).ok().map(Subject::NamedNode)
    }

    fn emit(&mut self, subject: &Subject, predicate: &NamedNode, object: Term) {
        let triple = Triple::new(subject.clone(), predicate.clone(), object);
        self.graph.insert(&triple);
    }

    /// Convert a node object, returning the node it describes.
    ///
    /// Returns `None` for a node whose `@id` cannot be made absolute; its
    /// properties are skipped.
    fn node(
        &mut self,
        object: &Map<String, Value>,
        context: &ActiveContext,
    ) -> JsonLdResult<Option<Subject>> {
        let scoped;
        let context = match object.get("@context") {
            Some(local) => {
                scoped = context.process(local, self.loader)?;
                &scoped
            }
            None => context,
        };

        let keywords: Vec<(&String, &Value, String)> = object
            .iter()
            .filter(|(key, _)| key.as_str() != "@context")
            .filter_map(|(key, value)| context.expand_iri(key, true).map(|e| (key, value, e)))
            .collect();

        let subject = match keywords.iter().find(|(_, _, e)| e == "@id") {
            Some((_, Value::String(id), _)) => match self.identify(id, context, false) {
                Some(subject) => subject,
                None => {
                    debug!(id = %id, "skipping node with non-absolute @id");
                    return Ok(None);
                }
            },
            Some((_, other, _)) => {
                return Err(JsonLdError::InvalidValueObject(format!(
                    "@id must be a string, found {}",
                    other
                )))
            }
            None => Subject::BlankNode(self.fresh_blank()),
        };

        for (key, value, expanded) in keywords {
            match expanded.as_str() {
                "@id" => {}
                "@type" => self.types(&subject, value, context),
                "@graph" => self.graph_members(value, context)?,
                keyword if keyword.starts_with('@') => {
                    debug!(keyword, "ignoring unsupported keyword");
                }
                iri if is_absolute_iri(iri) => {
                    let predicate = NamedNode::new_unchecked(iri);
                    let definition = context.term(key).cloned();
                    self.property(&subject, &predicate, value, definition.as_ref(), context)?;
                }
                other => debug!(key = %key, expanded = other, "dropping property without absolute IRI"),
            }
        }

        Ok(Some(subject))
    }

    fn types(&mut self, subject: &Subject, value: &Value, context: &ActiveContext) {
        let type_predicate = rdf::TYPE.into_owned();
        for item in as_items(value) {
            let Some(name) = item.as_str() else { continue };
            match self.identify(name, context, true) {
                Some(node) => self.emit(subject, &type_predicate, node.into()),
                None => debug!(type_name = name, "dropping type without absolute IRI"),
            }
        }
    }

    fn graph_members(&mut self, value: &Value, context: &ActiveContext) -> JsonLdResult<()> {
        for item in as_items(value) {
            if let Value::Object(member) = item {
                self.node(member, context)?;
            }
        }
        Ok(())
    }

    fn property(
        &mut self,
        subject: &Subject,
        predicate: &NamedNode,
        value: &Value,
        definition: Option<&TermDefinition>,
        context: &ActiveContext,
    ) -> JsonLdResult<()> {
        let container = definition.and_then(|d| d.container);
        let is_json = definition.and_then(|d| d.type_mapping.as_ref()) == Some(&TypeMapping::Json);

        if is_json {
            let literal = json_literal(value);
            self.emit(subject, predicate, literal.into());
            return Ok(());
        }

        match (container, value) {
            (Some(ContainerMapping::List), Value::Array(items)) => {
                let head = self.list(items, definition, context)?;
                self.emit(subject, predicate, head);
            }
            (Some(ContainerMapping::Language), Value::Object(by_language)) => {
                for (language, texts) in by_language {
                    for text in as_items(texts) {
                        let literal = text.as_str().and_then(|t| language_literal(t, language));
                        if let Some(literal) = literal {
                            self.emit(subject, predicate, literal.into());
                        }
                    }
                }
            }
            _ => {
                for object in self.values(value, definition, context)? {
                    self.emit(subject, predicate, object);
                }
            }
        }
        Ok(())
    }

    /// Objects produced by one property value (arrays flatten).
    fn values(
        &mut self,
        value: &Value,
        definition: Option<&TermDefinition>,
        context: &ActiveContext,
    ) -> JsonLdResult<Vec<Term>> {
        let coercion = definition.and_then(|d| d.type_mapping.as_ref());
        let term = match value {
            Value::Null => None,
            Value::Bool(b) => Some(
                Literal::new_typed_literal(b.to_string(), datatype_or(coercion, xsd::BOOLEAN))
                    .into(),
            ),
            Value::Number(n) => Some(number_literal(n, coercion).into()),
            Value::String(s) => self.string_value(s, definition, context),
            Value::Array(items) => {
                let mut terms = Vec::new();
                for item in items {
                    terms.extend(self.values(item, definition, context)?);
                }
                return Ok(terms);
            }
            Value::Object(object) => return self.object_value(object, definition, context),
        };
        Ok(term.into_iter().collect())
    }

    fn string_value(
        &mut self,
        text: &str,
        definition: Option<&TermDefinition>,
        context: &ActiveContext,
    ) -> Option<Term> {
        match definition.and_then(|d| d.type_mapping.as_ref()) {
            Some(TypeMapping::Id) => self.identify(text, context, false).map(Term::from),
            Some(TypeMapping::Vocab) => self.identify(text, context, true).map(Term::from),
            Some(TypeMapping::Datatype(datatype)) => Some(
                Literal::new_typed_literal(text, NamedNode::new_unchecked(datatype.as_str())).into(),
            ),
            Some(TypeMapping::Json) => Some(json_literal(&Value::String(text.to_string())).into()),
            None => {
                let language = match definition.and_then(|d| d.language.as_ref()) {
                    Some(explicit) => explicit.as_deref(),
                    None => context.language(),
                };
                match language {
                    Some(lang) => language_literal(text, lang).map(Term::from),
                    None => Some(Literal::new_simple_literal(text).into()),
                }
            }
        }
    }

    fn object_value(
        &mut self,
        object: &Map<String, Value>,
        definition: Option<&TermDefinition>,
        context: &ActiveContext,
    ) -> JsonLdResult<Vec<Term>> {
        let keyword = |name: &str| {
            object
                .iter()
                .find(|(k, _)| context.expand_iri(k, true).as_deref() == Some(name))
                .map(|(_, v)| v)
        };

        if let Some(value) = keyword("@value") {
            return Ok(value_object(value, keyword("@type"), keyword("@language"), context)?
                .into_iter()
                .collect());
        }
        if let Some(Value::Array(items)) = keyword("@list") {
            return Ok(vec![self.list(items, definition, context)?]);
        }
        if let Some(items) = keyword("@set") {
            return self.values(items, definition, context);
        }
        Ok(self.node(object, context)?.map(Term::from).into_iter().collect())
    }

    /// Build an `rdf:first`/`rdf:rest` chain and return its head.
    fn list(
        &mut self,
        items: &[Value],
        definition: Option<&TermDefinition>,
        context: &ActiveContext,
    ) -> JsonLdResult<Term> {
        let mut members = Vec::new();
        for item in items {
            members.extend(self.values(item, definition, context)?);
        }

        let nil: Term = rdf::NIL.into_owned().into();
        let first = rdf::FIRST.into_owned();
        let rest = rdf::REST.into_owned();

        let cells: Vec<BlankNode> = members.iter().map(|_| self.fresh_blank()).collect();
        for (i, member) in members.into_iter().enumerate() {
            let cell = Subject::BlankNode(cells[i].clone());
            self.emit(&cell, &first, member);
            let next = cells.get(i + 1).map_or_else(|| nil.clone(), |b| b.clone().into());
            self.emit(&cell, &rest, next);
        }
        Ok(cells.first().map_or(nil, |b| b.clone().into()))
    }
}

fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Datatypes in term definitions were validated when the context was processed.
fn datatype_or(coercion: Option<&TypeMapping>, default: NamedNodeRef<'_>) -> NamedNode {
    match coercion {
        Some(TypeMapping::Datatype(datatype)) => NamedNode::new_unchecked(datatype.as_str()),
        _ => default.into_owned(),
    }
}

/// A language-tagged string; malformed tags drop the value.
fn language_literal(text: &str, language: &str) -> Option<Literal> {
    match Literal::new_language_tagged_literal(text, language) {
        Ok(literal) => Some(literal),
        Err(e) => {
            debug!(language, error = %e, "dropping value with malformed language tag");
            None
        }
    }
}

/// `{"@value": ..., "@type"?: ..., "@language"?: ...}`
fn value_object(
    value: &Value,
    datatype: Option<&Value>,
    language: Option<&Value>,
    context: &ActiveContext,
) -> JsonLdResult<Option<Term>> {
    let datatype = match datatype {
        Some(Value::String(t)) if t == "@json" => return Ok(Some(json_literal(value).into())),
        Some(Value::String(t)) => Some(
            context
                .expand_iri(t, true)
                .filter(|iri| is_absolute_iri(iri))
                .map(NamedNode::new_unchecked)
                .ok_or_else(|| JsonLdError::InvalidValueObject(format!("invalid @type '{}'", t)))?,
        ),
        Some(other) => {
            return Err(JsonLdError::InvalidValueObject(format!(
                "@type must be a string, found {}",
                other
            )))
        }
        None => None,
    };

    let literal = match (value, datatype, language.and_then(Value::as_str)) {
        (Value::Null, _, _) => return Ok(None),
        (Value::String(s), None, Some(lang)) => Literal::new_language_tagged_literal(s.as_str(), lang)
            .map_err(|e| JsonLdError::InvalidValueObject(format!("invalid @language '{}': {}", lang, e)))?,
        (Value::String(s), Some(dt), _) => Literal::new_typed_literal(s.as_str(), dt),
        (Value::String(s), None, None) => Literal::new_simple_literal(s.as_str()),
        (Value::Bool(b), dt, _) => Literal::new_typed_literal(
            b.to_string(),
            dt.unwrap_or_else(|| xsd::BOOLEAN.into_owned()),
        ),
        (Value::Number(n), Some(dt), _) => number_literal(n, Some(&TypeMapping::Datatype(dt.as_str().to_string()))),
        (Value::Number(n), None, _) => number_literal(n, None),
        (other, _, _) => {
            return Err(JsonLdError::InvalidValueObject(format!(
                "@value must be a scalar, found {}",
                other
            )))
        }
    };
    Ok(Some(literal.into()))
}

/// Integral numbers become `xsd:integer`, everything else (or anything
/// coerced to `xsd:double`) a canonical `xsd:double`.
fn number_literal(number: &Number, coercion: Option<&TypeMapping>) -> Literal {
    let coerced_double =
        matches!(coercion, Some(TypeMapping::Datatype(dt)) if dt == xsd::DOUBLE.as_str());
    let integral = match (number.as_i64(), number.as_u64(), number.as_f64()) {
        (Some(i), _, _) => Some(i.to_string()),
        (_, Some(u), _) => Some(u.to_string()),
        (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e21 => Some(format!("{:.0}", f)),
        _ => None,
    };

    match integral {
        Some(lexical) if !coerced_double => {
            Literal::new_typed_literal(lexical, datatype_or(coercion, xsd::INTEGER))
        }
        _ => {
            let value = number.as_f64().unwrap_or(f64::NAN);
            Literal::new_typed_literal(canonical_double(value), datatype_or(coercion, xsd::DOUBLE))
        }
    }
}

/// Canonical `xsd:double` lexical form, e.g. `1.5E0`, `1.0E-1`.
fn canonical_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let formatted = format!("{:E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{}.0E{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

fn json_literal(value: &Value) -> Literal {
    Literal::new_typed_literal(value.to_string(), rdf::JSON)
}
